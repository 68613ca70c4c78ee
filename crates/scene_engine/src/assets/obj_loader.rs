//! OBJ file loader for 3D models
//!
//! Parses the Wavefront subset the viewer understands (`v`, `vt`, `vn`, `f`,
//! `mtllib`, `usemtl`) into a deduplicated [`GeometryBuffer`].
//!
//! The first face token fixes the vertex format for the whole document: how many
//! slash-separated slots a token has and which of them are filled. Every later
//! token must have exactly that shape. Faces with four vertices are split into a
//! fan of two triangles; faces with five or more vertices only contribute their
//! first three.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use crate::render::{GeometryBuffer, VertexFormat};

/// OBJ loading errors
#[derive(Error, Debug)]
pub enum ObjError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed vertex or face record
    #[error("format error on line {line}: {message}")]
    Format {
        /// 1-based line number
        line: usize,
        /// What was wrong with the record
        message: String,
    },
}

impl ObjError {
    fn format(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line,
            message: message.into(),
        }
    }
}

/// Slot layout of a face token: `v`, `v/t`, `v//n`, `v/t/n`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FaceShape {
    slots: usize,
    texture: bool,
    normal: bool,
}

impl FaceShape {
    const fn vertex_format(self) -> VertexFormat {
        VertexFormat {
            has_texture: self.texture,
            has_normal: self.normal,
        }
    }
}

/// Zero-based attribute indices of one face token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VertexKey {
    position: usize,
    texture: Option<usize>,
    normal: Option<usize>,
}

/// OBJ parser entry points
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file and return its packed geometry
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<GeometryBuffer, ObjError> {
        let path = path.as_ref();
        log::debug!("Loading OBJ from {}", path.display());
        let document = std::fs::read_to_string(path)?;
        Self::parse(&document)
    }

    /// Parse one OBJ document
    pub fn parse(document: &str) -> Result<GeometryBuffer, ObjError> {
        let mut parser = ObjParser::default();
        for (line_index, line) in document.lines().enumerate() {
            parser.parse_line(line_index + 1, line)?;
        }
        let geometry = parser.finish();
        log::debug!(
            "Parsed OBJ: {} packed vertices, {} triangles, format {:?}",
            geometry.packed_vertex_count(),
            geometry.num_triangles(),
            geometry.format()
        );
        Ok(geometry)
    }
}

#[derive(Default)]
struct ObjParser {
    positions: Vec<[f32; 3]>,
    tex_coords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
    shape: Option<FaceShape>,
    packed: HashMap<VertexKey, u32>,
    vertices: Vec<f32>,
    indices: Vec<u32>,
    material_file: Option<String>,
}

impl ObjParser {
    fn parse_line(&mut self, line_num: usize, line: &str) -> Result<(), ObjError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        let mut tokens = line.split_whitespace();
        let Some(record) = tokens.next() else {
            return Ok(());
        };

        match record {
            "v" => {
                let [x, y, z] = parse_floats::<3>(&mut tokens, line_num, "v")?;
                self.positions.push([x, y, z]);
            }
            "vt" => {
                let [u, v] = parse_floats::<2>(&mut tokens, line_num, "vt")?;
                self.tex_coords.push([u, v]);
            }
            "vn" => {
                let [x, y, z] = parse_floats::<3>(&mut tokens, line_num, "vn")?;
                self.normals.push([x, y, z]);
            }
            "f" => {
                let face: Vec<&str> = tokens.collect();
                self.parse_face(line_num, &face)?;
            }
            "mtllib" => {
                let name: Vec<&str> = tokens.collect();
                if name.is_empty() {
                    return Err(ObjError::format(line_num, "mtllib missing file name"));
                }
                self.material_file = Some(name.join(" "));
            }
            "usemtl" => {}
            other => log::trace!("Line {}: ignoring OBJ record '{}'", line_num, other),
        }
        Ok(())
    }

    fn parse_face(&mut self, line_num: usize, tokens: &[&str]) -> Result<(), ObjError> {
        if tokens.len() < 3 {
            return Err(ObjError::format(
                line_num,
                format!("face needs at least 3 vertices, found {}", tokens.len()),
            ));
        }

        let keys = tokens
            .iter()
            .map(|token| self.parse_vertex_token(line_num, token))
            .collect::<Result<Vec<_>, _>>()?;

        let triangles: &[[usize; 3]] = match keys.len() {
            3 => &[[0, 1, 2]],
            4 => &[[0, 1, 2], [0, 2, 3]],
            n => {
                log::debug!(
                    "Line {}: face with {} vertices, only the first three are used",
                    line_num,
                    n
                );
                &[[0, 1, 2]]
            }
        };

        for triangle in triangles {
            for &corner in triangle {
                let index = self.pack_vertex(line_num, keys[corner])?;
                self.indices.push(index);
            }
        }
        Ok(())
    }

    fn parse_vertex_token(&mut self, line_num: usize, token: &str) -> Result<VertexKey, ObjError> {
        let slots: Vec<&str> = token.split('/').collect();
        if slots.len() > 3 {
            return Err(ObjError::format(
                line_num,
                format!("vertex '{}' has more than 3 components", token),
            ));
        }

        let shape = FaceShape {
            slots: slots.len(),
            texture: slots.get(1).is_some_and(|s| !s.is_empty()),
            normal: slots.get(2).is_some_and(|s| !s.is_empty()),
        };
        match self.shape {
            None => self.shape = Some(shape),
            Some(established) if established != shape => {
                return Err(ObjError::format(
                    line_num,
                    format!("vertex '{}' does not match the face format of this file", token),
                ));
            }
            Some(_) => {}
        }

        let position = resolve_index(slots[0], self.positions.len(), line_num, "position")?;
        let texture = if shape.texture {
            if self.tex_coords.is_empty() {
                return Err(ObjError::format(
                    line_num,
                    format!("vertex '{}' references a texture coordinate but none are declared", token),
                ));
            }
            Some(resolve_index(slots[1], self.tex_coords.len(), line_num, "texture")?)
        } else {
            None
        };
        let normal = if shape.normal {
            if self.normals.is_empty() {
                return Err(ObjError::format(
                    line_num,
                    format!("vertex '{}' references a normal but none are declared", token),
                ));
            }
            Some(resolve_index(slots[2], self.normals.len(), line_num, "normal")?)
        } else {
            None
        };

        Ok(VertexKey {
            position,
            texture,
            normal,
        })
    }

    /// Index of `key` in the packed stream, appending its attributes on first use
    fn pack_vertex(&mut self, line_num: usize, key: VertexKey) -> Result<u32, ObjError> {
        if let Some(&index) = self.packed.get(&key) {
            return Ok(index);
        }

        let index = u32::try_from(self.packed.len())
            .map_err(|_| ObjError::format(line_num, "too many distinct vertices"))?;

        self.vertices.extend_from_slice(&self.positions[key.position]);
        if let Some(t) = key.texture {
            self.vertices.extend_from_slice(&self.tex_coords[t]);
        }
        if let Some(n) = key.normal {
            self.vertices.extend_from_slice(&self.normals[n]);
        }
        self.packed.insert(key, index);
        Ok(index)
    }

    fn finish(self) -> GeometryBuffer {
        let format = self.shape.map_or(VertexFormat::BARE, FaceShape::vertex_format);
        GeometryBuffer::new(self.vertices, self.indices, format, self.material_file)
    }
}

/// Convert a 1-based OBJ index into a checked 0-based one
fn resolve_index(slot: &str, available: usize, line_num: usize, kind: &str) -> Result<usize, ObjError> {
    let one_based: usize = slot
        .parse()
        .map_err(|_| ObjError::format(line_num, format!("invalid {} index '{}'", kind, slot)))?;
    if one_based == 0 || one_based > available {
        return Err(ObjError::format(
            line_num,
            format!("{} index {} out of range (1..={})", kind, one_based, available),
        ));
    }
    Ok(one_based - 1)
}

/// Parse the first `N` floats of a record, ignoring any extra components
fn parse_floats<'a, const N: usize>(
    tokens: &mut impl Iterator<Item = &'a str>,
    line_num: usize,
    record: &str,
) -> Result<[f32; N], ObjError> {
    let mut values = [0.0; N];
    for value in &mut values {
        let token = tokens
            .next()
            .ok_or_else(|| ObjError::format(line_num, format!("{} needs {} values", record, N)))?;
        *value = token.parse().map_err(|_| {
            ObjError::format(line_num, format!("{} has invalid value '{}'", record, token))
        })?;
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXTURED_SQUARE: &str = "\
# square made of two triangles sharing an edge
mtllib square.mtl
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl red
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
";

    fn positions_of_triangle(geometry: &GeometryBuffer, triangle: usize) -> Vec<[f32; 3]> {
        geometry.indices()[triangle * 3..triangle * 3 + 3]
            .iter()
            .map(|&i| geometry.position(i as usize).unwrap())
            .collect()
    }

    #[test]
    fn test_shared_tokens_are_deduplicated() {
        let geometry = ObjLoader::parse(TEXTURED_SQUARE).unwrap();

        assert_eq!(geometry.indices(), &[0, 1, 2, 0, 2, 3]);
        assert_eq!(geometry.packed_vertex_count(), 4);
        assert_eq!(geometry.vertices().len(), 4 * 8);
        assert_eq!(geometry.num_vertices(), 6);
        assert_eq!(geometry.num_triangles(), 2);
        assert_eq!(geometry.material_file(), Some("square.mtl"));
        assert_eq!(geometry.shader_core_name(), "TextureNormal");

        // third packed vertex: position, uv, normal
        assert_eq!(&geometry.vertices()[16..24], &[1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_indices_stay_in_bounds() {
        let geometry = ObjLoader::parse(TEXTURED_SQUARE).unwrap();
        assert_eq!(geometry.indices().len() % 3, 0);
        assert!(geometry
            .indices()
            .iter()
            .all(|&i| (i as usize) < geometry.packed_vertex_count()));
    }

    #[test]
    fn test_same_position_different_normal_is_a_new_vertex() {
        let doc = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nvn 0 0 -1\nf 1//1 2//1 3//1\nf 1//2 3//2 2//2\n";
        let geometry = ObjLoader::parse(doc).unwrap();
        assert_eq!(geometry.packed_vertex_count(), 6);
        assert_eq!(geometry.shader_core_name(), "Normal");
    }

    #[test]
    fn test_quad_is_fanned() {
        let doc = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let geometry = ObjLoader::parse(doc).unwrap();

        assert_eq!(geometry.num_triangles(), 2);
        assert_eq!(
            positions_of_triangle(&geometry, 0),
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]]
        );
        assert_eq!(
            positions_of_triangle(&geometry, 1),
            vec![[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]
        );
    }

    #[test]
    fn test_pentagon_keeps_first_triangle_only() {
        let doc = "v 0 0 0\nv 1 0 0\nv 2 1 0\nv 1 2 0\nv 0 1 0\nf 1 2 3 4 5\n";
        let geometry = ObjLoader::parse(doc).unwrap();
        assert_eq!(geometry.indices(), &[0, 1, 2]);
        assert_eq!(geometry.packed_vertex_count(), 3);
    }

    #[test]
    fn test_format_change_is_rejected() {
        let doc = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\nf 1//1 2//1 3//1\nf 1/1 2/1 3/1\n";
        let err = ObjLoader::parse(doc).unwrap_err();
        assert!(matches!(err, ObjError::Format { line: 7, .. }), "{err}");
    }

    #[test]
    fn test_too_many_components_is_rejected() {
        let doc = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/1/1/1 2 3\n";
        assert!(matches!(ObjLoader::parse(doc), Err(ObjError::Format { line: 4, .. })));
    }

    #[test]
    fn test_short_face_is_rejected() {
        let doc = "v 0 0 0\nv 1 0 0\nf 1 2\n";
        assert!(matches!(ObjLoader::parse(doc), Err(ObjError::Format { line: 3, .. })));
    }

    #[test]
    fn test_texture_reference_without_records_is_rejected() {
        let doc = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/1 2/1 3/1\n";
        let err = ObjLoader::parse(doc).unwrap_err();
        assert!(err.to_string().contains("texture"), "{err}");

        let doc = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1//1 2//1 3//1\n";
        let err = ObjLoader::parse(doc).unwrap_err();
        assert!(err.to_string().contains("normal"), "{err}");
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let doc = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n";
        assert!(ObjLoader::parse(doc).is_err());
        let doc = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n";
        assert!(ObjLoader::parse(doc).is_err());
    }

    #[test]
    fn test_bad_number_names_the_line() {
        let doc = "v 0 0 0\nv 1 zero 0\n";
        let err = ObjLoader::parse(doc).unwrap_err();
        assert_eq!(err.to_string(), "format error on line 2: v has invalid value 'zero'");
    }

    #[test]
    fn test_document_without_faces_is_empty_and_bare() {
        let geometry = ObjLoader::parse("# nothing here\nv 0 0 0\n").unwrap();
        assert_eq!(geometry.num_triangles(), 0);
        assert_eq!(geometry.format(), VertexFormat::BARE);
    }
}
