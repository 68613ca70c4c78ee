//! # Rendering System
//!
//! Turns a loaded scene into backend draw submissions.
//!
//! ## Architecture
//!
//! - **Renderer**: Walks the active scene's hierarchy and composes matrices
//! - **Camera / Viewport**: View and projection, canvas region rules
//! - **GeometryBuffer**: Interleaved vertex data and `u32` indices
//! - **ShaderVariant**: Program selection from vertex layout and material maps
//! - **LightSet**: Ordered scene lights, packed for uniform upload
//! - **DrawBackend**: Seam to the graphics API; [`HeadlessBackend`] records draws
//!
//! ## Current Limitations
//!
//! - Faces with five or more vertices contribute only their first three to the index buffer
//! - Spot lights are stored but the packed light arrays carry position and color only

pub mod camera;
pub mod headless;
pub mod lighting;
pub mod mesh;
pub mod renderer;
pub mod shader_config;

pub use camera::{Camera, Viewport};
pub use headless::{DrawRecord, HeadlessBackend};
pub use lighting::{Light, LightSet, LightType};
pub use mesh::{GeometryBuffer, VertexFormat};
pub use renderer::{DrawBackend, DrawMode, DrawSubmission, FrameOutcome, ProgramId, ProgramSlot, Renderer};
pub use shader_config::{ShaderFeatures, ShaderVariant};

use thiserror::Error;

/// High-level rendering error types
///
/// Backend failures are reported through these variants so callers never see
/// graphics-API specific error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A shader variant could not be compiled or linked
    ///
    /// The node that needed it is marked failed and skipped on later frames;
    /// the rest of the scene keeps drawing.
    #[error("Shader '{variant}' failed to compile: {message}")]
    ShaderCompile {
        /// Core name of the variant
        variant: String,
        /// Compiler or linker output
        message: String,
    },

    /// Backend-specific error occurred
    ///
    /// Wraps failures while binding buffers, textures or issuing draw calls.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
