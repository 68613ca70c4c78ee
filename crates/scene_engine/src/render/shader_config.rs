//! Shader variant selection
//!
//! Every model is drawn with one program chosen from the vertex attributes its
//! geometry carries and the maps its material binds. The variant name is built
//! from a fixed core (`Texture`, `Normal`, `NormalMap`, in that order), so a
//! textured, lit, bump-mapped model uses `vertexTextureNormalNormalMapShader`
//! and `fragmentTextureNormalNormalMapShader`.

use bitflags::bitflags;

use crate::assets::MtlData;
use crate::render::GeometryBuffer;

bitflags! {
    /// Optional stages a shader variant includes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShaderFeatures: u8 {
        /// Texture coordinates and a diffuse sampler
        const TEXTURE = 1 << 0;
        /// Per-vertex normals
        const NORMAL = 1 << 1;
        /// Normal-map sampler on top of the normals
        const NORMAL_MAP = 1 << 2;
    }
}

/// Shader program variant for one model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ShaderVariant {
    features: ShaderFeatures,
}

impl ShaderVariant {
    /// Variant with exactly these features
    pub const fn new(features: ShaderFeatures) -> Self {
        Self { features }
    }

    /// Variant for a geometry buffer and the material bound to it
    pub fn select(geometry: &GeometryBuffer, material: Option<&MtlData>) -> Self {
        let format = geometry.format();
        let mut features = ShaderFeatures::empty();
        features.set(ShaderFeatures::TEXTURE, format.has_texture);
        features.set(ShaderFeatures::NORMAL, format.has_normal);
        features.set(
            ShaderFeatures::NORMAL_MAP,
            material.is_some_and(MtlData::has_normal_map),
        );
        Self { features }
    }

    /// Features included
    pub const fn features(&self) -> ShaderFeatures {
        self.features
    }

    /// Name fragment shared by the vertex and fragment stage
    pub fn core_name(&self) -> String {
        let mut name = String::new();
        if self.features.contains(ShaderFeatures::TEXTURE) {
            name.push_str("Texture");
        }
        if self.features.contains(ShaderFeatures::NORMAL) {
            name.push_str("Normal");
        }
        if self.features.contains(ShaderFeatures::NORMAL_MAP) {
            name.push_str("NormalMap");
        }
        name
    }

    /// Vertex stage name, e.g. `vertexTextureShader`
    pub fn vertex_shader_name(&self) -> String {
        format!("vertex{}Shader", self.core_name())
    }

    /// Fragment stage name, e.g. `fragmentTextureShader`
    pub fn fragment_shader_name(&self) -> String {
        format!("fragment{}Shader", self.core_name())
    }
}
