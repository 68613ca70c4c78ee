//! Scene registry
//!
//! Owns every named scene, remembers which one is active, and receives the
//! completions of geometry loads. Resolvers never touch a scene directly: they
//! answer through a [`LoadReply`], and the completion waits in a crossbeam
//! channel until the registry's owner pumps it with [`SceneRegistry::pump_loads`]
//! or [`SceneRegistry::wait_for_load`]. All scene mutation therefore happens on
//! the owning thread and the registry needs no locks.

use std::time::Duration;

use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use indexmap::IndexMap;

use super::model_node::ModelNode;
use super::scene_data::SceneData;
use super::script::SceneScriptError;
use crate::assets::{LoadCompletion, LoadReply, LoadTicket};

/// Named scenes plus the active-scene selection
#[derive(Debug)]
pub struct SceneRegistry {
    scenes: IndexMap<String, SceneData>,
    active: String,
    next_generation: u64,
    sender: Sender<LoadCompletion>,
    receiver: Receiver<LoadCompletion>,
}

impl Default for SceneRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            scenes: IndexMap::new(),
            active: String::new(),
            next_generation: 0,
            sender,
            receiver,
        }
    }

    /// Register a fresh, empty scene under `name` and return its generation.
    ///
    /// A scene already registered under the name is replaced; loads still in
    /// flight for it are discarded when they complete. The first scene ever
    /// registered becomes the active one.
    pub fn register(&mut self, name: &str, source: &str) -> u64 {
        self.next_generation += 1;
        let generation = self.next_generation;
        let scene = SceneData::new(name, source, generation);

        if self.scenes.insert(name.to_string(), scene).is_some() {
            log::info!("Scene '{}' replaced (generation {})", name, generation);
        } else {
            log::info!("Scene '{}' registered", name);
        }

        if self.active.is_empty() {
            self.active = name.to_string();
            log::info!("Active scene is now '{}'", name);
        }
        generation
    }

    /// Scene by name
    pub fn scene(&self, name: &str) -> Option<&SceneData> {
        self.scenes.get(name)
    }

    /// Scene by name, mutable
    pub fn scene_mut(&mut self, name: &str) -> Option<&mut SceneData> {
        self.scenes.get_mut(name)
    }

    /// Scene by name, or `UnknownScene`
    pub fn require_scene(&mut self, name: &str) -> Result<&mut SceneData, SceneScriptError> {
        self.scenes
            .get_mut(name)
            .ok_or_else(|| SceneScriptError::UnknownScene(name.to_string()))
    }

    /// Whether a scene is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.scenes.contains_key(name)
    }

    /// Scene names in registration order
    pub fn scene_names(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }

    /// Every scene, in registration order
    pub fn scenes_mut(&mut self) -> impl Iterator<Item = &mut SceneData> {
        self.scenes.values_mut()
    }

    /// Number of scenes
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// No scenes registered
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Name of the active scene, empty until a scene is registered
    pub fn active_scene_name(&self) -> &str {
        &self.active
    }

    /// The active scene
    pub fn active_scene(&self) -> Option<&SceneData> {
        self.scenes.get(&self.active)
    }

    /// The active scene, mutable
    pub fn active_scene_mut(&mut self) -> Option<&mut SceneData> {
        self.scenes.get_mut(&self.active)
    }

    /// Make `name` the active scene. Names that are not registered are ignored.
    pub fn set_active_scene(&mut self, name: &str) -> bool {
        if !self.scenes.contains_key(name) {
            log::debug!("Ignoring activation of unknown scene '{}'", name);
            return false;
        }
        if self.active != name {
            self.active = name.to_string();
            log::info!("Active scene is now '{}'", name);
        }
        true
    }

    /// At least one scene exists and every scene has loaded
    pub fn scenes_loaded(&self) -> bool {
        !self.scenes.is_empty() && self.scenes.values().all(SceneData::scene_loaded)
    }

    /// Reply handle for one `object` command of a scene generation
    pub fn load_reply(&self, scene: &str, generation: u64, object: &str) -> LoadReply {
        LoadReply::new(
            LoadTicket {
                scene: scene.to_string(),
                generation,
                object: object.to_string(),
            },
            self.sender.clone(),
        )
    }

    /// Apply every completion that has arrived. Returns how many were applied.
    pub fn pump_loads(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.receiver.try_recv() {
            if self.apply_completion(completion) {
                applied += 1;
            }
        }
        applied
    }

    /// Block until one completion arrives or `timeout` passes, then apply it.
    ///
    /// Returns false when nothing arrived in time.
    pub fn wait_for_load(&mut self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Ok(completion) => {
                self.apply_completion(completion);
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Insert a resolved model, or record the failure. Stale completions are dropped.
    fn apply_completion(&mut self, completion: LoadCompletion) -> bool {
        let LoadCompletion { ticket, result } = completion;
        let Some(scene) = self.scenes.get_mut(&ticket.scene) else {
            log::debug!("Dropping load of '{}' for unknown scene '{}'", ticket.object, ticket.scene);
            return false;
        };
        if scene.generation() != ticket.generation {
            log::debug!(
                "Dropping stale load of '{}' for scene '{}' (generation {} != {})",
                ticket.object,
                ticket.scene,
                ticket.generation,
                scene.generation()
            );
            return false;
        }

        match result {
            Ok(model) => {
                log::debug!(
                    "Loaded '{}' for scene '{}' from {:?}",
                    ticket.object,
                    ticket.scene,
                    model.model_path
                );
                let node = ModelNode::new(ticket.object.clone(), model);
                scene.finish_load(&ticket.object, Some(node));
            }
            Err(e) => {
                let missing = SceneScriptError::MissingResource {
                    scene: ticket.scene.clone(),
                    objects: vec![ticket.object.clone()],
                };
                log::warn!("{} ({})", missing, e);
                scene.finish_load(&ticket.object, None);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetError, LoadedModel};
    use crate::render::{GeometryBuffer, VertexFormat};

    fn model() -> LoadedModel {
        LoadedModel::from_geometry(GeometryBuffer::new(Vec::new(), Vec::new(), VertexFormat::BARE, None))
    }

    #[test]
    fn test_first_scene_becomes_active() {
        let mut registry = SceneRegistry::new();
        assert_eq!(registry.active_scene_name(), "");
        registry.register("one", "");
        registry.register("two", "");

        assert_eq!(registry.active_scene_name(), "one");
        assert!(!registry.set_active_scene("three"));
        assert_eq!(registry.active_scene_name(), "one");
        assert!(registry.set_active_scene("two"));
        assert_eq!(registry.active_scene().map(SceneData::name), Some("two"));
        assert_eq!(registry.scene_names().collect::<Vec<_>>(), vec!["one", "two"]);
    }

    #[test]
    fn test_completions_resolve_counters() {
        let mut registry = SceneRegistry::new();
        let generation = registry.register("s", "");
        registry.scene_mut("s").unwrap().begin_load("a");
        registry.scene_mut("s").unwrap().begin_load("b");

        registry.load_reply("s", generation, "b").complete(Ok(model()));
        assert_eq!(registry.pump_loads(), 1);
        assert!(!registry.scenes_loaded());

        registry
            .load_reply("s", generation, "a")
            .complete(Err(AssetError::NotFound("a.obj".to_string())));
        assert!(registry.wait_for_load(Duration::from_millis(10)));

        let scene = registry.scene("s").unwrap();
        assert!(scene.scene_loaded());
        assert!(registry.scenes_loaded());
        assert_eq!(scene.model_names().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(scene.failed_objects(), ["a"]);
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let mut registry = SceneRegistry::new();
        let old = registry.register("s", "first");
        let reply = registry.load_reply("s", old, "a");

        let new = registry.register("s", "second");
        assert_ne!(old, new);
        registry.scene_mut("s").unwrap().begin_load("a");

        reply.complete(Ok(model()));
        assert_eq!(registry.pump_loads(), 0);
        let scene = registry.scene("s").unwrap();
        assert_eq!(scene.source(), "second");
        assert_eq!(scene.models_loaded(), 0);
    }

    #[test]
    fn test_wait_times_out_without_completions() {
        let mut registry = SceneRegistry::new();
        assert!(!registry.wait_for_load(Duration::from_millis(5)));
        assert!(!registry.scenes_loaded());
    }
}
