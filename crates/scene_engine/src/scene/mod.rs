//! Scene management system
//!
//! Scenes are built by scene scripts and hold everything the renderer walks
//! each frame.
//!
//! ## Architecture
//!
//! ```text
//! Scene script
//!      ↓  SceneScriptInterpreter
//! SceneRegistry ──── LoadReply ───→ GeometryResolver
//!      ↑                                  │
//!      └──────── LoadCompletion ──────────┘
//!      ↓
//! SceneData (camera, lights, SceneGraph of ModelNodes, post-load queue)
//!      ↓
//! Renderer
//! ```
//!
//! The registry:
//! - Owns every named scene and the active-scene selection
//! - Receives geometry completions over a channel and applies them on its own thread
//! - Drops completions that belong to a scene which has since been rebuilt

mod model_node;
mod scene_data;
mod scene_graph;
mod scene_manager;
pub mod script;

pub use model_node::{ModelNode, NodeTransform};
pub use scene_data::SceneData;
pub use scene_graph::{HierarchyError, SceneGraph};
pub use scene_manager::SceneRegistry;
pub use script::{SceneCommand, SceneScriptError, SceneScriptInterpreter};
