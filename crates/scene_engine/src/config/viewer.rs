//! Viewer configuration
//!
//! Groups the asset, loading, render and start-up scene settings. Every section
//! falls back to its defaults field by field, so a config file only needs the
//! values it changes.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::Config;

/// Built-in logical object names and the OBJ files they resolve to
const DEFAULT_OBJECTS: &[(&str, &str)] = &[
    ("tri-plain", "tri_plain/triangle.obj"),
    ("tri-tex", "triangle_texture/triangle.obj"),
    ("normal_square", "normal_square/square.obj"),
    ("square", "square/square.obj"),
    ("square-four-vertex", "square_four_vertex/square.obj"),
    ("square_four_by_four", "square_four_by_four/square.obj"),
    ("cube", "cube/cube.obj"),
    ("cube-tex", "textured_cube/cube.obj"),
    ("house", "house/house_obj.obj"),
    ("windmill", "windmill/windmill2.obj"),
    ("lion", "lion/lion_centered_triangulated.obj"),
    ("lion-2%", "lion/lion_2_percent_of_triangles.obj"),
    ("capsule", "capsule/capsule.obj"),
    ("sphere", "sphere/sphere.obj"),
    ("sun", "sun/sphere.obj"),
    ("mercury", "mercury/sphere.obj"),
    ("earth", "earth/sphere.obj"),
    ("rock", "rock/sphere.obj"),
    ("rod", "rod/rod.obj"),
    ("small_sphere", "small_sphere/sphere.obj"),
    ("teapot-centered", "teapot/teapot_centered.obj"),
];

/// Top-level viewer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Where geometry, materials and textures are found
    pub assets: AssetSettings,
    /// Asynchronous load behaviour
    pub loading: LoadingSettings,
    /// Headless render settings
    pub render: RenderSettings,
    /// Scene scripts executed at start-up, in order
    pub scenes: Vec<SceneEntry>,
}

impl ViewerConfig {
    /// Create a configuration with every section at its default
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a start-up scene script
    pub fn with_scene(mut self, name: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        self.scenes.push(SceneEntry {
            name: name.into(),
            script: script.into(),
        });
        self
    }

    /// Replace the asset search paths
    pub fn with_search_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.assets.search_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Set or clear the load timeout
    pub fn with_load_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.loading.timeout_ms = timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
        self
    }
}

impl Config for ViewerConfig {}

/// Asset lookup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    /// Directories tried in order when resolving a file reference
    pub search_paths: Vec<PathBuf>,
    /// Logical object name to OBJ path
    pub objects: BTreeMap<String, String>,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            search_paths: vec![PathBuf::from("assets"), PathBuf::from(".")],
            objects: DEFAULT_OBJECTS
                .iter()
                .map(|(name, path)| ((*name).to_string(), (*path).to_string()))
                .collect(),
        }
    }
}

/// Asynchronous load settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadingSettings {
    /// Give up waiting for outstanding loads after this long; `None` waits forever
    pub timeout_ms: Option<u64>,
    /// How often a waiting scene reports progress
    pub poll_interval_ms: u64,
}

impl LoadingSettings {
    /// Load timeout as a duration
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Poll interval as a duration, never zero
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for LoadingSettings {
    fn default() -> Self {
        Self {
            timeout_ms: Some(10_000),
            poll_interval_ms: 100,
        }
    }
}

/// Headless render settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Number of frames the headless viewer renders
    pub frames: u32,
    /// Draw triangle outlines instead of filled triangles
    pub wireframe: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            frames: 3,
            wireframe: false,
        }
    }
}

/// A scene script to execute at start-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneEntry {
    /// Scene name
    pub name: String,
    /// Path of the scene script
    pub script: PathBuf,
}
