//! Scene script language
//!
//! A scene script is line oriented: `#` starts a comment, blank lines are
//! skipped, and the first word of every remaining line (case-insensitive)
//! names the command.
//!
//! ```text
//! camera ex ey ez lx ly lz ux uy uz
//! light point px py pz r g b
//! light directional dx dy dz r g b
//! light spot px py pz r g b dx dy dz cutoff exponent
//! object <name> <geometry-reference>
//! rotate <name> <x|y|z> <degrees>
//! translate <name> <dx> <dy> <dz>
//! scale <name> <sx> <sy> <sz>
//! child <parent> <child> <dx> <dy> <dz>
//! ```
//!
//! `camera`, `light` and `object` act immediately. The transform and hierarchy
//! commands wait in the scene's post-load queue until every object has loaded.

mod command;
mod interpreter;

pub use command::{preprocess, SceneCommand};
pub use interpreter::SceneScriptInterpreter;

use thiserror::Error;

use super::scene_graph::HierarchyError;

/// Scene script errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneScriptError {
    /// First word of a line is not a command
    #[error("line {line}: unknown command '{command}'")]
    UnknownCommand {
        /// 1-based line number, 0 for a queued command
        line: usize,
        /// The unrecognised word
        command: String,
    },

    /// Too few parameters for a command
    #[error("line {line}: '{command}' needs {expected} parameters, found {found}")]
    MissingParameter {
        /// 1-based line number, 0 for a queued command
        line: usize,
        /// Command (and light type) being parsed
        command: String,
        /// Parameters required
        expected: usize,
        /// Parameters given
        found: usize,
    },

    /// A parameter is not a number or not an axis
    #[error("line {line}: '{command}' has invalid parameter '{value}'")]
    InvalidParameter {
        /// 1-based line number, 0 for a queued command
        line: usize,
        /// Command being parsed
        command: String,
        /// Offending token
        value: String,
    },

    /// `light` names a type other than point, directional or spot
    #[error("line {line}: unknown light type '{light_type}'")]
    UnknownLightType {
        /// 1-based line number
        line: usize,
        /// The unrecognised type
        light_type: String,
    },

    /// `child` names a model that is not in the scene
    #[error("cannot attach missing model '{child}' under '{parent}'")]
    MissingChild {
        /// Parent model
        parent: String,
        /// Missing child model
        child: String,
    },

    /// `child` would break the tree shape
    #[error("invalid hierarchy: {0}")]
    InvalidHierarchy(HierarchyError),

    /// A queued command was filed under a different model than it names
    #[error("queued command '{command}' does not target '{target}'")]
    CommandMismatch {
        /// Model the command was queued for
        target: String,
        /// The queued line
        command: String,
    },

    /// Objects of a scene never resolved
    #[error("scene '{scene}' is missing resources: {}", objects.join(", "))]
    MissingResource {
        /// Scene waiting on the objects
        scene: String,
        /// Objects not available
        objects: Vec<String>,
    },

    /// No scene is registered under the name
    #[error("unknown scene '{0}'")]
    UnknownScene(String),
}
