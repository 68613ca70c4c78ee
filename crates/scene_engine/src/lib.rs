//! # Scene Engine
//!
//! Core of a script-driven 3D scene viewer.
//!
//! ## Features
//!
//! - **OBJ Loading**: Wavefront geometry packed into interleaved, deduplicated vertex buffers
//! - **Scene Scripts**: Line-oriented scene descriptions with deferred post-load commands
//! - **Scene Graph**: Parent/child model hierarchy with per-node transforms
//! - **Hierarchical Rendering**: Matrix composition down the hierarchy behind a backend seam
//! - **Asynchronous Loading**: Geometry completions arrive over a channel and apply on one thread
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ViewerConfig::load_or_default("viewer.toml")?;
//!     let mut context = SceneContext::new(config);
//!     context.run_script("demo", "camera 0 0 5 0 0 0 0 1 0\nobject box cube\nrotate box y 30\n")?;
//!
//!     let mut backend = HeadlessBackend::new();
//!     context.render_frame(&mut backend);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod assets;
pub mod render;
pub mod scene;

mod engine;

pub use engine::{ContextError, SceneContext};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        ContextError, SceneContext,
        foundation::math::{Axis, Mat4, Vec3},
        config::{Config, ViewerConfig},
        assets::{FileGeometryResolver, GeometryResolver, LoadReply, LoadedModel, ObjLoader},
        render::{Camera, DrawBackend, FrameOutcome, GeometryBuffer, HeadlessBackend, Light, LightSet, Renderer},
        scene::{ModelNode, SceneData, SceneRegistry, SceneScriptError, SceneScriptInterpreter},
    };
}
