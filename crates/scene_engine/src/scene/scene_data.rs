//! Per-scene state
//!
//! A [`SceneData`] is what one execution of a scene script produces: a camera,
//! the light set, the graph of loaded model nodes, and the post-load commands
//! still waiting for their target to arrive.

use indexmap::IndexMap;

use super::model_node::ModelNode;
use super::scene_graph::SceneGraph;
use crate::foundation::math::Vec3;
use crate::render::{Camera, LightSet};

/// State of one named scene
#[derive(Debug, Default)]
pub struct SceneData {
    name: String,
    source: String,
    generation: u64,
    /// Scene camera; the default one until the script declares its own
    pub camera: Camera,
    camera_declared: bool,
    /// Lights declared by the script
    pub lights: LightSet,
    graph: SceneGraph,
    post_load_commands: IndexMap<String, Vec<String>>,
    models_loading: usize,
    models_loaded: usize,
    pending_objects: Vec<String>,
    failed_objects: Vec<String>,
    /// Frames rendered while this scene was active
    pub frame_number: u64,
}

impl SceneData {
    /// Create an empty scene for the given script text
    pub fn new(name: impl Into<String>, source: impl Into<String>, generation: u64) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            generation,
            ..Self::default()
        }
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Script text the scene was built from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Registration generation; loads issued for an older generation are stale
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a `camera` line has set the view yet
    pub const fn camera_declared(&self) -> bool {
        self.camera_declared
    }

    /// Set the camera view from a `camera` line. A second declaration
    /// overwrites the first.
    pub fn declare_camera(&mut self, eye: Vec3, look_at: Vec3, up: Vec3) {
        if self.camera_declared {
            log::warn!("Scene '{}' already has a camera, overwriting it", self.name);
        }
        self.camera.set_view(eye, look_at, up);
        self.camera_declared = true;
    }

    /// Model nodes of the scene
    pub const fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Model nodes of the scene, mutable
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// Model names in insertion order
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.graph.names()
    }

    /// Named model node
    pub fn model(&self, name: &str) -> Option<&ModelNode> {
        self.graph.get(name)
    }

    /// Named model node, mutable
    pub fn model_mut(&mut self, name: &str) -> Option<&mut ModelNode> {
        self.graph.get_mut(name)
    }

    /// Number of `object` commands issued
    pub const fn models_loading(&self) -> usize {
        self.models_loading
    }

    /// Number of `object` commands resolved, successfully or not
    pub const fn models_loaded(&self) -> usize {
        self.models_loaded
    }

    /// Objects whose load has been issued but not resolved yet
    pub fn pending_objects(&self) -> &[String] {
        &self.pending_objects
    }

    /// Objects whose geometry could not be resolved
    pub fn failed_objects(&self) -> &[String] {
        &self.failed_objects
    }

    /// At least one object was declared and every declared object has resolved
    pub const fn scene_loaded(&self) -> bool {
        self.models_loading > 0 && self.models_loading == self.models_loaded
    }

    /// Count a newly issued load
    pub(crate) fn begin_load(&mut self, object: &str) {
        self.models_loading += 1;
        self.pending_objects.push(object.to_string());
    }

    /// Count a load as resolved, inserting its node on success
    pub(crate) fn finish_load(&mut self, object: &str, node: Option<ModelNode>) {
        if let Some(index) = self.pending_objects.iter().position(|o| o == object) {
            self.pending_objects.remove(index);
        }
        match node {
            Some(node) => {
                self.graph.insert(node);
            }
            None => self.failed_objects.push(object.to_string()),
        }
        self.models_loaded = (self.models_loaded + 1).min(self.models_loading);
    }

    /// Queue a command line for `target`, behind anything already queued for it
    pub fn queue_post_load(&mut self, target: &str, line: impl Into<String>) {
        let line = line.into();
        log::debug!("Queued for '{}' in scene '{}': {}", target, self.name, line);
        self.post_load_commands
            .entry(target.to_string())
            .or_default()
            .push(line);
    }

    /// Queued command lines per target, in queuing order
    pub const fn post_load_commands(&self) -> &IndexMap<String, Vec<String>> {
        &self.post_load_commands
    }

    /// Number of queued command lines
    pub fn pending_commands(&self) -> usize {
        self.post_load_commands.values().map(Vec::len).sum()
    }

    /// Take every queued command, leaving the queue empty
    pub(crate) fn take_post_load_commands(&mut self) -> IndexMap<String, Vec<String>> {
        std::mem::take(&mut self.post_load_commands)
    }
}
