//! Geometry resolution and the load completion channel
//!
//! Scene scripts name geometry by reference; a [`GeometryResolver`] turns the
//! reference into a [`LoadedModel`]. Resolution may finish immediately or at any
//! later point. Either way the result travels back through the [`LoadReply`]
//! the resolver was handed, which sends one [`LoadCompletion`] down a crossbeam
//! channel owned by the scene registry. Completions are only ever applied on the
//! thread that owns the registry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam::channel::Sender;

use super::{AssetError, MtlData, MtlParser, ObjLoader, ObjectFileMap};
use crate::config::AssetSettings;
use crate::render::GeometryBuffer;

/// Identifies the `object` command a completion belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    /// Scene that issued the request
    pub scene: String,
    /// Generation of that scene when the request was issued
    pub generation: u64,
    /// Object name the geometry will be inserted under
    pub object: String,
}

/// Texture files named by a model's material, resolved next to the material file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelTextures {
    /// Diffuse color map (`map_Kd`)
    pub diffuse: Option<PathBuf>,
    /// Normal map (`map_Bump`)
    pub normal_map: Option<PathBuf>,
}

/// Everything a model node needs from a resolved geometry reference
#[derive(Debug, Clone)]
pub struct LoadedModel {
    /// Parsed geometry, shared by every node that references the same file
    pub geometry: Arc<GeometryBuffer>,
    /// First material of the geometry's material library, if it had one
    pub material: Option<Arc<MtlData>>,
    /// Texture files named by that material
    pub textures: ModelTextures,
    /// OBJ file the geometry was read from
    pub model_path: PathBuf,
}

impl LoadedModel {
    /// Wrap geometry that did not come from a file
    pub fn from_geometry(geometry: GeometryBuffer) -> Self {
        Self {
            geometry: Arc::new(geometry),
            material: None,
            textures: ModelTextures::default(),
            model_path: PathBuf::new(),
        }
    }
}

/// Outcome of one geometry request
#[derive(Debug)]
pub struct LoadCompletion {
    /// Request this completion answers
    pub ticket: LoadTicket,
    /// Resolved model or the reason it could not be resolved
    pub result: Result<LoadedModel, AssetError>,
}

/// One-shot handle a resolver uses to deliver its result
#[derive(Debug)]
pub struct LoadReply {
    ticket: LoadTicket,
    sender: Sender<LoadCompletion>,
}

impl LoadReply {
    /// Create a reply that will answer `ticket` over `sender`
    pub fn new(ticket: LoadTicket, sender: Sender<LoadCompletion>) -> Self {
        Self { ticket, sender }
    }

    /// Request being answered
    pub fn ticket(&self) -> &LoadTicket {
        &self.ticket
    }

    /// Deliver the result.
    ///
    /// A registry that has gone away is not an error; the result is dropped.
    pub fn complete(self, result: Result<LoadedModel, AssetError>) {
        let object = self.ticket.object.clone();
        if self
            .sender
            .send(LoadCompletion {
                ticket: self.ticket,
                result,
            })
            .is_err()
        {
            log::debug!("Load of '{}' completed after its registry was dropped", object);
        }
    }
}

/// Turns geometry references into loaded models
pub trait GeometryResolver {
    /// Start resolving `reference`; answer through `reply` now or later.
    fn request(&mut self, reference: &str, reply: LoadReply);
}

/// File-backed resolver with a per-reference cache
#[derive(Debug, Default)]
pub struct FileGeometryResolver {
    search_paths: Vec<PathBuf>,
    objects: ObjectFileMap,
    cache: HashMap<String, LoadedModel>,
}

impl FileGeometryResolver {
    /// Create a resolver over `search_paths` using `objects` for logical names
    pub fn new(search_paths: Vec<PathBuf>, objects: ObjectFileMap) -> Self {
        Self {
            search_paths,
            objects,
            cache: HashMap::new(),
        }
    }

    /// Create a resolver from the asset section of the viewer config
    pub fn from_settings(settings: &AssetSettings) -> Self {
        Self::new(
            settings.search_paths.clone(),
            ObjectFileMap::new(settings.objects.clone()),
        )
    }

    /// Resolve `reference` synchronously, reusing an earlier result when cached
    pub fn load(&mut self, reference: &str) -> Result<LoadedModel, AssetError> {
        if let Some(model) = self.cache.get(reference) {
            log::trace!("Geometry cache hit for '{}'", reference);
            return Ok(model.clone());
        }

        let relative = self.objects.resolve(reference);
        let model_path = self
            .locate(relative)
            .ok_or_else(|| AssetError::NotFound(relative.to_string()))?;

        let geometry = ObjLoader::load_obj(&model_path)?;
        log::debug!(
            "Parsed {:?}: {} packed vertices, {} triangles",
            model_path,
            geometry.packed_vertex_count(),
            geometry.num_triangles()
        );

        let model_dir = model_path.parent().map(Path::to_path_buf).unwrap_or_default();
        let material = match geometry.material_file() {
            Some(file) => Self::load_material(&model_dir.join(file))?,
            None => None,
        };
        let textures = material
            .as_deref()
            .map(|m| ModelTextures {
                diffuse: m.diffuse_map.as_ref().map(|map| model_dir.join(map)),
                normal_map: m.normal_map.as_ref().map(|map| model_dir.join(map)),
            })
            .unwrap_or_default();

        let model = LoadedModel {
            geometry: Arc::new(geometry),
            material,
            textures,
            model_path,
        };
        self.cache.insert(reference.to_string(), model.clone());
        Ok(model)
    }

    /// Number of cached references
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn locate(&self, relative: &str) -> Option<PathBuf> {
        let direct = PathBuf::from(relative);
        if direct.is_absolute() {
            return direct.is_file().then_some(direct);
        }
        self.search_paths
            .iter()
            .map(|dir| dir.join(relative))
            .find(|candidate| candidate.is_file())
            .or_else(|| direct.is_file().then_some(direct))
    }

    /// First material declared in the library; a missing library is tolerated
    fn load_material(path: &Path) -> Result<Option<Arc<MtlData>>, AssetError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                log::warn!("Material library {:?} unavailable: {}", path, e);
                return Ok(None);
            }
        };
        let materials = MtlParser::parse(&contents)
            .map_err(|e| AssetError::Material(format!("{}: {}", path.display(), e)))?;
        Ok(materials.into_iter().next().map(|(_, m)| Arc::new(m)))
    }
}

impl GeometryResolver for FileGeometryResolver {
    fn request(&mut self, reference: &str, reply: LoadReply) {
        let result = self.load(reference);
        reply.complete(result);
    }
}
