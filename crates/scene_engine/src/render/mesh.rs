//! Packed geometry produced by the OBJ loader
//!
//! A [`GeometryBuffer`] holds one interleaved vertex stream and a triangle index
//! list. Every vertex starts with its position; texture coordinates and normals
//! follow in that fixed order when the document declares them. Buffers are
//! immutable once built and are shared between model nodes through `Arc`.

/// Floats per position attribute
pub const POSITION_COMPONENTS: usize = 3;
/// Floats per texture coordinate attribute
pub const TEXTURE_COMPONENTS: usize = 2;
/// Floats per normal attribute
pub const NORMAL_COMPONENTS: usize = 3;

const FLOAT_BYTES: usize = std::mem::size_of::<f32>();

/// Which optional attributes accompany every vertex position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VertexFormat {
    /// Texture coordinates follow the position
    pub has_texture: bool,
    /// A normal follows the position (and texture coordinates, if any)
    pub has_normal: bool,
}

impl VertexFormat {
    /// Position only
    pub const BARE: Self = Self {
        has_texture: false,
        has_normal: false,
    };

    /// Floats per interleaved vertex
    pub const fn floats_per_vertex(self) -> usize {
        let mut floats = POSITION_COMPONENTS;
        if self.has_texture {
            floats += TEXTURE_COMPONENTS;
        }
        if self.has_normal {
            floats += NORMAL_COMPONENTS;
        }
        floats
    }

    /// Byte stride between consecutive vertices
    pub const fn stride(self) -> usize {
        self.floats_per_vertex() * FLOAT_BYTES
    }

    /// Byte offset of the texture coordinates, 0 when absent
    pub const fn texture_offset(self) -> usize {
        if self.has_texture {
            POSITION_COMPONENTS * FLOAT_BYTES
        } else {
            0
        }
    }

    /// Byte offset of the normal, 0 when absent
    pub const fn normal_offset(self) -> usize {
        if !self.has_normal {
            return 0;
        }
        if self.has_texture {
            (POSITION_COMPONENTS + TEXTURE_COMPONENTS) * FLOAT_BYTES
        } else {
            POSITION_COMPONENTS * FLOAT_BYTES
        }
    }
}

/// Deduplicated, interleaved vertex data plus triangle indices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryBuffer {
    vertices: Vec<f32>,
    indices: Vec<u32>,
    format: VertexFormat,
    material_file: Option<String>,
}

impl GeometryBuffer {
    /// Assemble a buffer from already packed data.
    ///
    /// The loader is the only producer; the invariants (index count a multiple
    /// of three, every index inside the vertex stream) are checked in debug builds.
    pub fn new(
        vertices: Vec<f32>,
        indices: Vec<u32>,
        format: VertexFormat,
        material_file: Option<String>,
    ) -> Self {
        let buffer = Self {
            vertices,
            indices,
            format,
            material_file,
        };
        debug_assert!(buffer.indices.len() % 3 == 0);
        debug_assert!(buffer
            .indices
            .iter()
            .all(|&i| (i as usize) < buffer.packed_vertex_count()));
        buffer
    }

    /// Interleaved vertex floats
    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    /// Triangle vertex indices
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Attribute layout of every vertex
    pub const fn format(&self) -> VertexFormat {
        self.format
    }

    /// Material library named by `mtllib`, if any
    pub fn material_file(&self) -> Option<&str> {
        self.material_file.as_deref()
    }

    /// Number of distinct packed vertices in the interleaved stream
    pub fn packed_vertex_count(&self) -> usize {
        self.vertices.len() / self.format.floats_per_vertex()
    }

    /// Number of vertices drawn, one per index entry
    pub fn num_vertices(&self) -> usize {
        self.indices.len()
    }

    /// Number of triangles drawn
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Byte stride of one interleaved vertex
    pub const fn stride(&self) -> usize {
        self.format.stride()
    }

    /// Byte offset of the texture coordinates, 0 when absent
    pub const fn texture_offset(&self) -> usize {
        self.format.texture_offset()
    }

    /// Byte offset of the normals, 0 when absent
    pub const fn normal_offset(&self) -> usize {
        self.format.normal_offset()
    }

    /// Position of one packed vertex
    pub fn position(&self, packed_index: usize) -> Option<[f32; 3]> {
        let start = packed_index * self.format.floats_per_vertex();
        self.vertices
            .get(start..start + POSITION_COMPONENTS)
            .map(|p| [p[0], p[1], p[2]])
    }

    /// Vertex stream as bytes, ready for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index list as bytes, ready for upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Shader name fragment for the attributes present (`""`, `"Texture"`, `"TextureNormal"`, ...)
    pub fn shader_core_name(&self) -> &'static str {
        match (self.format.has_texture, self.format.has_normal) {
            (false, false) => "",
            (true, false) => "Texture",
            (false, true) => "Normal",
            (true, true) => "TextureNormal",
        }
    }
}
