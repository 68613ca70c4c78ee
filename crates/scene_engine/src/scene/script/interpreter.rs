//! Scene script execution
//!
//! Executing a script registers a fresh scene, applies the immediate commands
//! in order, requests geometry for every `object`, and files the transform and
//! hierarchy commands under the model they wait for. Once every object has
//! resolved, [`SceneScriptInterpreter::apply_post_load`] drains that queue.

use super::command::{preprocess, SceneCommand};
use super::SceneScriptError;
use crate::assets::GeometryResolver;
use crate::scene::{SceneData, SceneRegistry};

/// Executes scene scripts against a registry
pub struct SceneScriptInterpreter;

impl SceneScriptInterpreter {
    /// Build the scene `scene_name` from `script`.
    ///
    /// Any scene of the same name is replaced. Lines are applied in order; the
    /// first malformed line aborts the rest of the script, leaving the effects
    /// of the lines before it in place.
    pub fn execute(
        registry: &mut SceneRegistry,
        resolver: &mut dyn GeometryResolver,
        scene_name: &str,
        script: &str,
    ) -> Result<(), SceneScriptError> {
        let generation = registry.register(scene_name, script);
        let mut requested = 0;

        for (line, text) in preprocess(script) {
            let command = SceneCommand::parse(line, text)?;

            if let SceneCommand::Object { name, reference } = &command {
                let reply = registry.load_reply(scene_name, generation, name);
                registry.require_scene(scene_name)?.begin_load(name);
                log::debug!("Requesting '{}' as '{}' for scene '{}'", reference, name, scene_name);
                resolver.request(reference, reply);
                requested += 1;
                continue;
            }

            let scene = registry.require_scene(scene_name)?;
            match command.deferred_target() {
                Some(target) => scene.queue_post_load(target, text),
                None => Self::apply_immediate(scene, command),
            }
        }

        if let Some(scene) = registry.scene(scene_name) {
            log::info!(
                "Scene '{}' parsed: {} object(s) requested, {} command(s) deferred, {} light(s)",
                scene_name,
                requested,
                scene.pending_commands(),
                scene.lights.len()
            );
        }
        Ok(())
    }

    fn apply_immediate(scene: &mut SceneData, command: SceneCommand) {
        match command {
            SceneCommand::Camera { eye, look_at, up } => scene.declare_camera(eye, look_at, up),
            SceneCommand::Light(light) => scene.lights.add(light),
            other => log::debug!("Not an immediate command: {:?}", other),
        }
    }

    /// Apply every queued command of `scene`, target by target in queuing order.
    ///
    /// Commands for a model that never arrived are dropped with a warning.
    /// Returns the number of commands applied.
    pub fn apply_post_load(scene: &mut SceneData) -> Result<usize, SceneScriptError> {
        let queued = scene.take_post_load_commands();
        let mut applied = 0;

        for (target, lines) in queued {
            if !scene.graph().contains(&target) {
                log::warn!(
                    "Dropping {} queued command(s) for missing model '{}' in scene '{}'",
                    lines.len(),
                    target,
                    scene.name()
                );
                continue;
            }

            for line in lines {
                let command = SceneCommand::parse(0, &line)?;
                if command.deferred_target() != Some(target.as_str()) {
                    return Err(SceneScriptError::CommandMismatch {
                        target,
                        command: line,
                    });
                }
                Self::apply_deferred(scene, command)?;
                applied += 1;
            }
        }

        log::info!("Applied {} post-load command(s) in scene '{}'", applied, scene.name());
        Ok(applied)
    }

    fn apply_deferred(scene: &mut SceneData, command: SceneCommand) -> Result<(), SceneScriptError> {
        match command {
            SceneCommand::Rotate {
                target,
                axis,
                degrees,
            } => {
                if let Some(node) = scene.model_mut(&target) {
                    node.rotate_by(axis, degrees);
                }
            }
            SceneCommand::Translate { target, offset } => {
                if let Some(node) = scene.model_mut(&target) {
                    node.translate_by(&offset);
                }
            }
            SceneCommand::Scale { target, factors } => {
                if let Some(node) = scene.model_mut(&target) {
                    node.scale_by(&factors);
                }
            }
            SceneCommand::Child {
                parent,
                child,
                offset,
            } => {
                if !scene.graph().contains(&child) {
                    return Err(SceneScriptError::MissingChild { parent, child });
                }
                scene
                    .graph_mut()
                    .attach(&parent, &child, offset)
                    .map_err(SceneScriptError::InvalidHierarchy)?;
            }
            other => log::debug!("Not a deferred command: {:?}", other),
        }
        Ok(())
    }
}
