//! Asset management system
//!
//! Geometry, material and texture loading. Everything here is pure parsing or
//! file lookup; nothing touches the graphics API.

pub mod obj_loader;
pub mod image_loader;
pub mod materials;
pub mod object_file_map;
pub mod resolver;

pub use obj_loader::{ObjError, ObjLoader};
pub use image_loader::{ImageData, TextureCache};
pub use materials::{MtlData, MtlError, MtlParser};
pub use object_file_map::ObjectFileMap;
pub use resolver::{
    FileGeometryResolver, GeometryResolver, LoadCompletion, LoadReply, LoadTicket, LoadedModel,
    ModelTextures,
};

use thiserror::Error;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found on any search path
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Geometry document could not be parsed
    #[error("Invalid geometry: {0}")]
    Format(#[from] ObjError),

    /// Material library could not be parsed
    #[error("Invalid material: {0}")]
    Material(String),

    /// Image could not be decoded
    #[error("Invalid image: {0}")]
    Image(String),

    /// IO error during asset loading
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
