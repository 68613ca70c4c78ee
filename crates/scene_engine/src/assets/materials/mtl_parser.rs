//! MTL (Material Template Library) file parser
//!
//! Reads the part of a Wavefront .mtl library the viewer binds: material names
//! and their diffuse and bump/normal texture maps. Colour and shading records
//! are skipped. Materials keep their declaration order, since a model takes
//! the first one.

use indexmap::IndexMap;
use thiserror::Error;

/// Malformed material library record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MtlError {
    /// `newmtl` without a name
    #[error("line {line}: newmtl missing material name")]
    MissingName {
        /// 1-based line number
        line: usize,
    },

    /// Texture map record without a file
    #[error("line {line}: {record} missing texture path")]
    MissingTexture {
        /// 1-based line number
        line: usize,
        /// Record keyword, e.g. `map_Kd`
        record: String,
    },
}

/// Texture maps of one material
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MtlData {
    /// Material name
    pub name: String,
    /// Diffuse texture map (map_Kd)
    pub diffuse_map: Option<String>,
    /// Bump/normal map (map_Bump or bump)
    pub normal_map: Option<String>,
}

impl MtlData {
    /// A diffuse texture is bound for this material
    pub fn has_diffuse_map(&self) -> bool {
        self.diffuse_map.as_deref().is_some_and(|m| !m.is_empty())
    }

    /// A bump/normal map is bound for this material
    pub fn has_normal_map(&self) -> bool {
        self.normal_map.as_deref().is_some_and(|m| !m.is_empty())
    }
}

/// MTL file parser
pub struct MtlParser;

impl MtlParser {
    /// Parse MTL file contents into materials keyed by name, in declaration order.
    ///
    /// Map records that appear before any `newmtl` are ignored.
    pub fn parse(contents: &str) -> Result<IndexMap<String, MtlData>, MtlError> {
        let mut materials = IndexMap::new();
        let mut current: Option<MtlData> = None;

        for (index, line) in contents.lines().enumerate() {
            let line_num = index + 1;
            let mut tokens = line.split_whitespace();
            let Some(record) = tokens.next() else {
                continue;
            };

            match record {
                "newmtl" => {
                    if let Some(done) = current.take() {
                        materials.insert(done.name.clone(), done);
                    }
                    let name = tokens.next().ok_or(MtlError::MissingName { line: line_num })?;
                    current = Some(MtlData {
                        name: name.to_string(),
                        ..MtlData::default()
                    });
                }
                "map_Kd" => {
                    let path = Self::texture_path(tokens, line_num, record)?;
                    if let Some(material) = current.as_mut() {
                        material.diffuse_map = Some(path);
                    }
                }
                "map_Bump" | "bump" => {
                    let path = Self::texture_path(tokens, line_num, record)?;
                    if let Some(material) = current.as_mut() {
                        material.normal_map = Some(path);
                    }
                }
                _ => {}
            }
        }

        if let Some(done) = current {
            materials.insert(done.name.clone(), done);
        }
        Ok(materials)
    }

    /// Rest of the line; texture paths may contain spaces
    fn texture_path<'a>(
        tokens: impl Iterator<Item = &'a str>,
        line: usize,
        record: &str,
    ) -> Result<String, MtlError> {
        let path = tokens.collect::<Vec<_>>().join(" ");
        if path.is_empty() {
            return Err(MtlError::MissingTexture {
                line,
                record: record.to_string(),
            });
        }
        Ok(path)
    }
}
