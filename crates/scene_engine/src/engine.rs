//! Scene context
//!
//! The explicitly constructed application root. It owns the configuration,
//! the scene registry, the geometry resolver, the texture cache and the
//! renderer, and drives the per-frame sequence: apply arrived loads, run the
//! post-load commands of scenes that just finished loading, draw.

use std::path::Path;
use std::time::Instant;

use thiserror::Error;

use crate::assets::{FileGeometryResolver, GeometryResolver, TextureCache};
use crate::config::{ConfigError, ViewerConfig};
use crate::render::{DrawBackend, FrameOutcome, Renderer};
use crate::scene::{SceneRegistry, SceneScriptError, SceneScriptInterpreter};

/// Application root holding every subsystem
pub struct SceneContext {
    config: ViewerConfig,
    registry: SceneRegistry,
    resolver: Box<dyn GeometryResolver>,
    textures: TextureCache,
    renderer: Renderer,
}

impl SceneContext {
    /// Create a context that resolves geometry from files
    pub fn new(config: ViewerConfig) -> Self {
        let resolver = FileGeometryResolver::from_settings(&config.assets);
        Self::with_resolver(config, Box::new(resolver))
    }

    /// Create a context around a custom resolver
    pub fn with_resolver(config: ViewerConfig, resolver: Box<dyn GeometryResolver>) -> Self {
        log::info!(
            "Initializing scene context ({}x{}, {} search path(s))",
            config.render.width,
            config.render.height,
            config.assets.search_paths.len()
        );
        Self {
            textures: TextureCache::new(config.assets.search_paths.clone()),
            renderer: Renderer::from_settings(&config.render),
            registry: SceneRegistry::new(),
            resolver,
            config,
        }
    }

    /// The configuration this context was built from
    pub const fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// The scene registry
    pub const fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    /// Mutable access to the scene registry
    pub fn registry_mut(&mut self) -> &mut SceneRegistry {
        &mut self.registry
    }

    /// The texture cache
    pub fn textures_mut(&mut self) -> &mut TextureCache {
        &mut self.textures
    }

    /// The renderer
    pub const fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Mutable access to the renderer
    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    /// Execute a scene script without waiting for its geometry
    pub fn execute_script(&mut self, scene_name: &str, script: &str) -> Result<(), SceneScriptError> {
        SceneScriptInterpreter::execute(&mut self.registry, self.resolver.as_mut(), scene_name, script)
    }

    /// Execute a scene script and wait until the scene is loaded and its
    /// post-load commands have run
    pub fn run_script(&mut self, scene_name: &str, script: &str) -> Result<(), SceneScriptError> {
        self.execute_script(scene_name, script)?;
        self.wait_for_scene(scene_name)
    }

    /// Read a scene script from disk and run it
    pub fn load_scene(&mut self, scene_name: &str, path: impl AsRef<Path>) -> Result<(), ContextError> {
        let path = path.as_ref();
        log::info!("Loading scene '{}' from {}", scene_name, path.display());
        let script = std::fs::read_to_string(path)?;
        self.run_script(scene_name, &script)?;
        Ok(())
    }

    /// Run every start-up scene of the configuration and activate the first
    pub fn load_configured_scenes(&mut self) -> Result<usize, ContextError> {
        let entries = self.config.scenes.clone();
        for entry in &entries {
            self.load_scene(&entry.name, &entry.script)?;
        }
        if let Some(first) = entries.first() {
            self.registry.set_active_scene(&first.name);
        }
        Ok(entries.len())
    }

    /// Per-frame housekeeping: apply arrived loads, then run the post-load
    /// commands of every loaded scene that still has some queued.
    ///
    /// Errors from post-load commands are logged; the scene keeps whatever
    /// was applied before the failing command.
    pub fn update(&mut self) -> usize {
        let applied = self.registry.pump_loads();
        for scene in self.registry.scenes_mut() {
            if !scene.scene_loaded() || scene.pending_commands() == 0 {
                continue;
            }
            if let Err(e) = SceneScriptInterpreter::apply_post_load(scene) {
                log::error!("Post-load commands of scene '{}' failed: {}", scene.name(), e);
            }
        }
        applied
    }

    /// Wait until every object of `scene_name` has resolved, then apply its
    /// post-load commands.
    ///
    /// Gives up after the configured load timeout and reports the objects
    /// still outstanding as `MissingResource`.
    pub fn wait_for_scene(&mut self, scene_name: &str) -> Result<(), SceneScriptError> {
        let timeout = self.config.loading.timeout();
        let poll_interval = self.config.loading.poll_interval();
        let started = Instant::now();

        loop {
            self.registry.pump_loads();
            let scene = self
                .registry
                .scene(scene_name)
                .ok_or_else(|| SceneScriptError::UnknownScene(scene_name.to_string()))?;

            if scene.scene_loaded() {
                break;
            }
            if scene.models_loading() == 0 {
                // Nothing to wait for: a scene of only cameras and lights
                if scene.pending_commands() == 0 {
                    return Ok(());
                }
                return Err(SceneScriptError::MissingResource {
                    scene: scene_name.to_string(),
                    objects: scene.post_load_commands().keys().cloned().collect(),
                });
            }

            let elapsed = started.elapsed();
            if timeout.is_some_and(|limit| elapsed >= limit) {
                let outstanding = scene.pending_objects().to_vec();
                log::warn!(
                    "Scene '{}' timed out with {} of {} object(s) loaded",
                    scene_name,
                    scene.models_loaded(),
                    scene.models_loading()
                );
                return Err(SceneScriptError::MissingResource {
                    scene: scene_name.to_string(),
                    objects: outstanding,
                });
            }

            let wait = timeout.map_or(poll_interval, |limit| poll_interval.min(limit - elapsed));
            if !self.registry.wait_for_load(wait) {
                if let Some(scene) = self.registry.scene(scene_name) {
                    log::debug!(
                        "Scene '{}': {} of {} object(s) loaded",
                        scene_name,
                        scene.models_loaded(),
                        scene.models_loading()
                    );
                }
            }
        }

        let scene = self.registry.require_scene(scene_name)?;
        SceneScriptInterpreter::apply_post_load(scene)?;
        Ok(())
    }

    /// Draw one frame of the active scene
    pub fn render_frame(&mut self, backend: &mut dyn DrawBackend) -> FrameOutcome {
        self.renderer
            .render_frame(&mut self.registry, &mut self.textures, backend)
    }
}

/// Context-level errors
#[derive(Error, Debug)]
pub enum ContextError {
    /// A scene script file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A scene script failed
    #[error("Scene script error: {0}")]
    Script(#[from] SceneScriptError),

    /// The configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{LoadReply, LoadedModel};
    use crate::render::{GeometryBuffer, HeadlessBackend, VertexFormat};
    use std::time::Duration;

    /// Completes `cube` immediately and never answers anything else
    struct PartialResolver {
        held: Vec<LoadReply>,
    }

    impl GeometryResolver for PartialResolver {
        fn request(&mut self, reference: &str, reply: LoadReply) {
            if reference == "cube" {
                let geometry = GeometryBuffer::new(
                    vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
                    vec![0, 1, 2],
                    VertexFormat::BARE,
                    None,
                );
                reply.complete(Ok(LoadedModel::from_geometry(geometry)));
            } else {
                self.held.push(reply);
            }
        }
    }

    fn context() -> SceneContext {
        let config = ViewerConfig::new().with_load_timeout(Some(Duration::from_millis(30)));
        SceneContext::with_resolver(config, Box::new(PartialResolver { held: Vec::new() }))
    }

    #[test]
    fn test_run_script_applies_post_load() {
        let mut ctx = context();
        ctx.run_script("s", "camera 0 0 5 0 0 0 0 1 0\nobject a cube\ntranslate a 1 0 0\n")
            .unwrap();

        let scene = ctx.registry().scene("s").unwrap();
        assert!(scene.scene_loaded());
        assert_eq!(scene.pending_commands(), 0);

        let mut backend = HeadlessBackend::new();
        assert_eq!(
            ctx.render_frame(&mut backend),
            FrameOutcome::Rendered { drawn: 1, skipped: 0 }
        );
    }

    #[test]
    fn test_timeout_names_outstanding_objects() {
        let mut ctx = context();
        let result = ctx.run_script("s", "object a cube\nobject b never\n");
        assert_eq!(
            result,
            Err(SceneScriptError::MissingResource {
                scene: "s".to_string(),
                objects: vec!["b".to_string()],
            })
        );

        let mut backend = HeadlessBackend::new();
        assert_eq!(ctx.render_frame(&mut backend), FrameOutcome::Waiting);
    }

    #[test]
    fn test_update_applies_commands_once_loaded() {
        let mut ctx = context();
        ctx.execute_script("s", "object a cube\nscale a 2 2 2\n").unwrap();
        assert_eq!(ctx.update(), 1);

        let scene = ctx.registry().scene("s").unwrap();
        assert_eq!(scene.pending_commands(), 0);
        assert_eq!(
            scene.model("a").unwrap().transform().scale(),
            crate::foundation::math::Vec3::new(2.0, 2.0, 2.0)
        );
    }

    #[test]
    fn test_scene_without_objects() {
        let mut ctx = context();
        ctx.run_script("lights", "light point 0 0 0 1 1 1\n").unwrap();
        assert!(matches!(
            ctx.run_script("orphan", "rotate a x 10\n"),
            Err(SceneScriptError::MissingResource { ref objects, .. }) if objects == &["a".to_string()]
        ));
        assert!(matches!(
            ctx.wait_for_scene("nope"),
            Err(SceneScriptError::UnknownScene(_))
        ));
    }

    #[test]
    fn test_load_scene_reports_missing_file() {
        let mut ctx = context();
        assert!(matches!(
            ctx.load_scene("s", "/definitely/not/here.scene"),
            Err(ContextError::Io(_))
        ));
    }
}
