//! Material loading
//!
//! Wavefront MTL parsing. Models carry the first material of the library their
//! OBJ file names with `mtllib`.

pub mod mtl_parser;

pub use mtl_parser::{MtlData, MtlError, MtlParser};
