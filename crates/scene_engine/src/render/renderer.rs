//! Hierarchy renderer
//!
//! Walks the active scene once per frame and hands one [`DrawSubmission`] per
//! model node to a [`DrawBackend`]. The backend is the seam to the graphics
//! API; everything above it (matrix composition, shader variant selection and
//! caching, texture lookup, viewport rules) lives here.
//!
//! ## Matrix composition
//!
//! Roots are visited in model insertion order with an identity parent matrix.
//! For every node:
//!
//! ```text
//! from_parent = parent * Rx * Ry * Rz * T        (from-parent fields)
//! local       = from_parent * model_matrix       (T * R * S, or S when attached)
//! ```
//!
//! `local` is stashed on the node for the duration of its draw, then cleared.
//! Each child receives its own copy of `from_parent`, so the scale of a parent
//! never reaches its children.

use std::time::{Duration, Instant};

use super::camera::{Camera, Viewport};
use super::mesh::GeometryBuffer;
use super::shader_config::ShaderVariant;
use super::RenderResult;
use crate::assets::{ImageData, TextureCache};
use crate::config::RenderSettings;
use crate::foundation::collections::NodeHandle;
use crate::foundation::math::Mat4;
use crate::scene::{ModelNode, SceneGraph, SceneRegistry};

/// Period of the normal-map texture scroll
const UV_SCROLL_PERIOD: Duration = Duration::from_secs(25);

/// Backend handle of a compiled shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Per-node shader program state. Compilation is attempted at most once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProgramSlot {
    /// Not compiled yet
    #[default]
    Uncompiled,
    /// Compiled and ready for use
    Ready(ProgramId),
    /// Compilation failed; the node is not drawn
    Failed,
}

/// How triangles are rasterised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    /// One indexed draw of filled triangles
    Solid,
    /// One closed outline per triangle
    Wireframe,
}

impl DrawMode {
    /// Number of backend draw calls this mode needs for `geometry`
    pub fn draw_calls(self, geometry: &GeometryBuffer) -> usize {
        match self {
            Self::Solid => usize::from(geometry.num_triangles() > 0),
            Self::Wireframe => geometry.num_triangles(),
        }
    }
}

/// Everything a backend needs to draw one model node
#[derive(Debug, Clone)]
pub struct DrawSubmission<'a> {
    /// Node being drawn
    pub node: &'a str,
    /// Program compiled for the node's variant
    pub program: ProgramId,
    /// Variant the program was compiled from
    pub variant: ShaderVariant,
    /// Composed hierarchical model matrix
    pub model_matrix: Mat4,
    /// Camera view matrix
    pub view_matrix: Mat4,
    /// Camera projection matrix
    pub projection_matrix: Mat4,
    /// Canvas region to draw into
    pub viewport: Viewport,
    /// Packed vertices and indices
    pub geometry: &'a GeometryBuffer,
    /// Solid or wireframe
    pub mode: DrawMode,
    /// Light positions as `x y z` triples
    pub light_positions: &'a [f32],
    /// Light colors as `r g b` triples
    pub light_colors: &'a [f32],
    /// Diffuse texture, when the material binds one
    pub diffuse_texture: Option<&'a ImageData>,
    /// Normal map, when the material binds one
    pub normal_texture: Option<&'a ImageData>,
    /// Texture-coordinate scroll applied with a normal map
    pub uv_offset: [f32; 2],
}

/// The graphics API seam
pub trait DrawBackend {
    /// Compile and link the program for `variant`
    fn compile_program(&mut self, variant: &ShaderVariant) -> RenderResult<ProgramId>;

    /// Issue the draw calls for one node
    fn draw(&mut self, submission: &DrawSubmission<'_>) -> RenderResult<()>;
}

/// Result of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The active scene is missing, still loading, or has no camera
    Waiting,
    /// The scene was traversed
    Rendered {
        /// Nodes handed to the backend
        drawn: usize,
        /// Nodes skipped because their program is unusable or the draw failed
        skipped: usize,
    },
}

/// Camera and light data shared by every draw of a frame
struct FrameParams {
    view_matrix: Mat4,
    projection_matrix: Mat4,
    viewport: Viewport,
    mode: DrawMode,
    light_positions: Vec<f32>,
    light_colors: Vec<f32>,
    uv_offset: [f32; 2],
}

#[derive(Default)]
struct FrameStats {
    drawn: usize,
    skipped: usize,
}

/// Frame-rate counter reporting once per second
#[derive(Debug)]
struct FpsCounter {
    frames: u32,
    window_start: Instant,
    last_fps: u32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            frames: 0,
            window_start: Instant::now(),
            last_fps: 0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        if self.window_start.elapsed() >= Duration::from_secs(1) {
            self.last_fps = self.frames;
            log::debug!("FPS: {}", self.last_fps);
            self.frames = 0;
            self.window_start = Instant::now();
        }
    }
}

/// Draws the active scene of a registry
#[derive(Debug)]
pub struct Renderer {
    width: u32,
    height: u32,
    force_wireframe: bool,
    started: Instant,
    fps: FpsCounter,
    frames_rendered: u64,
}

impl Renderer {
    /// Create a renderer for a canvas of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            force_wireframe: false,
            started: Instant::now(),
            fps: FpsCounter::new(),
            frames_rendered: 0,
        }
    }

    /// Create a renderer from the render section of the viewer config
    pub fn from_settings(settings: &RenderSettings) -> Self {
        let mut renderer = Self::new(settings.width, settings.height);
        renderer.force_wireframe = settings.wireframe;
        renderer
    }

    /// Change the canvas size
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            log::info!("Canvas resized: {}x{} -> {}x{}", self.width, self.height, width, height);
        }
        self.width = width;
        self.height = height;
    }

    /// Canvas size in pixels
    pub const fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Frames traversed so far
    pub const fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Frame rate measured over the last full second
    pub const fn fps(&self) -> u32 {
        self.fps.last_fps
    }

    /// Draw the active scene once
    pub fn render_frame(
        &mut self,
        registry: &mut SceneRegistry,
        textures: &mut TextureCache,
        backend: &mut dyn DrawBackend,
    ) -> FrameOutcome {
        let Some(scene) = registry.active_scene_mut() else {
            return FrameOutcome::Waiting;
        };
        if !scene.scene_loaded() {
            log::trace!("Scene '{}' still loading", scene.name());
            return FrameOutcome::Waiting;
        }
        let frame = self.frame_params(&scene.camera, scene.lights.positions(), scene.lights.colors());
        scene.frame_number += 1;

        let graph = scene.graph_mut();
        let roots: Vec<NodeHandle> = graph.roots().collect();
        let mut stats = FrameStats::default();
        for root in roots {
            Self::render_hierarchy(graph, root, &Mat4::identity(), &frame, textures, backend, &mut stats);
        }

        self.frames_rendered += 1;
        self.fps.tick();
        FrameOutcome::Rendered {
            drawn: stats.drawn,
            skipped: stats.skipped,
        }
    }

    fn frame_params(&self, camera: &Camera, light_positions: Vec<f32>, light_colors: Vec<f32>) -> FrameParams {
        let viewport = Viewport::fit(self.width, self.height, camera.use_perspective);
        let mode = if camera.render_solid && !self.force_wireframe {
            DrawMode::Solid
        } else {
            DrawMode::Wireframe
        };
        let phase = self.started.elapsed().as_secs_f32() % UV_SCROLL_PERIOD.as_secs_f32()
            / UV_SCROLL_PERIOD.as_secs_f32()
            * std::f32::consts::TAU;

        FrameParams {
            view_matrix: camera.view_matrix(),
            projection_matrix: camera.projection_matrix(viewport.aspect()),
            viewport,
            mode,
            light_positions,
            light_colors,
            uv_offset: [phase.sin(), 0.0],
        }
    }

    fn render_hierarchy(
        graph: &mut SceneGraph,
        handle: NodeHandle,
        parent_matrix: &Mat4,
        frame: &FrameParams,
        textures: &mut TextureCache,
        backend: &mut dyn DrawBackend,
        stats: &mut FrameStats,
    ) {
        let Some(node) = graph.node_mut(handle) else {
            return;
        };

        let from_parent = parent_matrix * node.from_parent_matrix();
        let local = from_parent * node.model_matrix();

        node.set_hierarchical_matrix(Some(local));
        Self::draw_node(node, frame, textures, backend, stats);
        node.set_hierarchical_matrix(None);

        let children = node.children().to_vec();
        for child in children {
            let hierarchy_matrix = from_parent;
            Self::render_hierarchy(graph, child, &hierarchy_matrix, frame, textures, backend, stats);
        }
    }

    fn draw_node(
        node: &mut ModelNode,
        frame: &FrameParams,
        textures: &mut TextureCache,
        backend: &mut dyn DrawBackend,
        stats: &mut FrameStats,
    ) {
        let variant = node.shader_variant();
        let program = match node.program() {
            ProgramSlot::Ready(program) => program,
            ProgramSlot::Failed => {
                stats.skipped += 1;
                return;
            }
            ProgramSlot::Uncompiled => match backend.compile_program(&variant) {
                Ok(program) => {
                    log::info!(
                        "Compiled {} / {} for '{}'",
                        variant.vertex_shader_name(),
                        variant.fragment_shader_name(),
                        node.name()
                    );
                    node.set_program(ProgramSlot::Ready(program));
                    program
                }
                Err(e) => {
                    log::error!("Model '{}' will not be drawn: {}", node.name(), e);
                    node.set_program(ProgramSlot::Failed);
                    stats.skipped += 1;
                    return;
                }
            },
        };

        let diffuse = node
            .textures()
            .diffuse
            .as_ref()
            .filter(|_| node.has_diffuse_map())
            .and_then(|path| Self::load_texture(textures, node.name(), &path.to_string_lossy()));
        let normal = node
            .textures()
            .normal_map
            .as_ref()
            .filter(|_| node.has_normal_map())
            .and_then(|path| Self::load_texture(textures, node.name(), &path.to_string_lossy()));

        let submission = DrawSubmission {
            node: node.name(),
            program,
            variant,
            model_matrix: node.draw_matrix(),
            view_matrix: frame.view_matrix,
            projection_matrix: frame.projection_matrix,
            viewport: frame.viewport,
            geometry: node.geometry(),
            mode: frame.mode,
            light_positions: &frame.light_positions,
            light_colors: &frame.light_colors,
            diffuse_texture: diffuse.as_deref(),
            normal_texture: normal.as_deref(),
            uv_offset: if normal.is_some() { frame.uv_offset } else { [0.0, 0.0] },
        };

        match backend.draw(&submission) {
            Ok(()) => stats.drawn += 1,
            Err(e) => {
                log::error!("Drawing '{}' failed: {}", node.name(), e);
                stats.skipped += 1;
            }
        }
    }

    fn load_texture(
        textures: &mut TextureCache,
        node: &str,
        name: &str,
    ) -> Option<std::sync::Arc<ImageData>> {
        match textures.load(name) {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("Texture '{}' for '{}' unavailable: {}", name, node, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::LoadedModel;
    use crate::foundation::math::{Mat4Ext, Vec3};
    use crate::render::{HeadlessBackend, VertexFormat};
    use approx::assert_relative_eq;

    fn triangle() -> LoadedModel {
        LoadedModel::from_geometry(GeometryBuffer::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0, 1, 2],
            VertexFormat::BARE,
            None,
        ))
    }

    /// Registry with one loaded scene holding the named triangles
    fn loaded_registry(names: &[&str]) -> SceneRegistry {
        let mut registry = SceneRegistry::new();
        let generation = registry.register("s", "");
        for name in names {
            registry.scene_mut("s").unwrap().begin_load(name);
            registry.load_reply("s", generation, name).complete(Ok(triangle()));
        }
        registry.pump_loads();
        registry
    }

    fn render(registry: &mut SceneRegistry, backend: &mut HeadlessBackend) -> FrameOutcome {
        let mut renderer = Renderer::new(800, 600);
        let mut textures = TextureCache::default();
        renderer.render_frame(registry, &mut textures, backend)
    }

    #[test]
    fn test_waits_until_loaded() {
        let mut backend = HeadlessBackend::new();
        let mut empty = SceneRegistry::new();
        assert_eq!(render(&mut empty, &mut backend), FrameOutcome::Waiting);

        let mut loading = SceneRegistry::new();
        loading.register("s", "");
        loading.scene_mut("s").unwrap().begin_load("a");
        assert_eq!(render(&mut loading, &mut backend), FrameOutcome::Waiting);
        assert!(backend.draws().is_empty());
    }

    #[test]
    fn test_undeclared_camera_uses_default_view() {
        let mut registry = loaded_registry(&["a"]);
        assert!(!registry.scene("s").unwrap().camera_declared());

        let mut backend = HeadlessBackend::new();
        assert_eq!(
            render(&mut registry, &mut backend),
            FrameOutcome::Rendered { drawn: 1, skipped: 0 }
        );
        let expected = Camera::default().view_matrix();
        let draw = &backend.draws()[0];
        assert_relative_eq!(
            draw.mvp,
            Camera::default().projection_matrix(draw.viewport.aspect()) * expected,
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_child_renders_offset_from_parent() {
        let mut registry = loaded_registry(&["root", "child"]);
        {
            let scene = registry.scene_mut("s").unwrap();
            scene
                .graph_mut()
                .attach("root", "child", Vec3::new(1.0, 0.0, 0.0))
                .unwrap();
            // Attached: moves the root's placement, which the child follows
            scene.model_mut("root").unwrap().translate_by(&Vec3::new(5.0, 0.0, 0.0));
        }

        let mut backend = HeadlessBackend::new();
        assert_eq!(
            render(&mut registry, &mut backend),
            FrameOutcome::Rendered { drawn: 2, skipped: 0 }
        );

        let draws = backend.draws();
        assert_eq!(draws[0].node, "root");
        assert_relative_eq!(draws[0].model_matrix.origin(), Vec3::new(5.0, 0.0, 0.0), epsilon = 1e-5);
        assert_eq!(draws[1].node, "child");
        assert_relative_eq!(draws[1].model_matrix.origin(), Vec3::new(6.0, 0.0, 0.0), epsilon = 1e-5);

        // Stash is frame scoped
        let scene = registry.scene("s").unwrap();
        assert!(scene.model("child").unwrap().hierarchical_matrix().is_none());
        assert_eq!(scene.frame_number, 1);
    }

    #[test]
    fn test_parent_placed_before_attach_stays_put() {
        let mut registry = loaded_registry(&["sun", "earth"]);
        {
            let scene = registry.scene_mut("s").unwrap();
            let sun = scene.model_mut("sun").unwrap();
            sun.translate_by(&Vec3::new(5.0, 0.0, 0.0));
            sun.rotate_by(crate::foundation::math::Axis::Z, 90.0);
            scene
                .graph_mut()
                .attach("sun", "earth", Vec3::new(1.0, 0.0, 0.0))
                .unwrap();
        }

        let mut backend = HeadlessBackend::new();
        render(&mut registry, &mut backend);

        // Own placement stays local to the sun; the earth only follows the zero offset chain
        let draws = backend.draws();
        assert_relative_eq!(draws[0].model_matrix.origin(), Vec3::new(5.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(draws[1].model_matrix.origin(), Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_parent_scale_not_inherited() {
        let mut registry = loaded_registry(&["root", "child"]);
        {
            let scene = registry.scene_mut("s").unwrap();
            scene.model_mut("root").unwrap().scale_by(&Vec3::new(3.0, 3.0, 3.0));
            scene
                .graph_mut()
                .attach("root", "child", Vec3::new(2.0, 0.0, 0.0))
                .unwrap();
        }
        let mut backend = HeadlessBackend::new();
        render(&mut registry, &mut backend);

        let child = &backend.draws()[1];
        assert_relative_eq!(child.model_matrix.origin(), Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-5);
        let p = child.model_matrix.transform_point(&crate::foundation::math::Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.coords, Vec3::new(3.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_rotated_parent_carries_child() {
        let mut registry = loaded_registry(&["sun", "earth", "moon"]);
        {
            let graph = registry.scene_mut("s").unwrap().graph_mut();
            graph.attach("sun", "earth", Vec3::new(5.0, 0.0, 0.0)).unwrap();
            graph.attach("earth", "moon", Vec3::new(1.0, 0.0, 0.0)).unwrap();
            graph.get_mut("sun").unwrap().rotate_by(crate::foundation::math::Axis::Z, 90.0);
        }
        let mut backend = HeadlessBackend::new();
        render(&mut registry, &mut backend);

        let names: Vec<&str> = backend.draws().iter().map(|d| d.node.as_str()).collect();
        assert_eq!(names, vec!["sun", "earth", "moon"]);
        assert_relative_eq!(backend.draws()[1].model_matrix.origin(), Vec3::new(0.0, 5.0, 0.0), epsilon = 1e-4);
        assert_relative_eq!(backend.draws()[2].model_matrix.origin(), Vec3::new(0.0, 6.0, 0.0), epsilon = 1e-4);
    }

    #[test]
    fn test_failed_program_is_cached_and_children_still_draw() {
        let mut registry = loaded_registry(&["parent", "child"]);
        {
            let scene = registry.scene_mut("s").unwrap();
            scene.graph_mut().attach("parent", "child", Vec3::zeros()).unwrap();
            scene.model_mut("parent").unwrap().set_program(ProgramSlot::Failed);
        }
        let mut backend = HeadlessBackend::new();
        let mut renderer = Renderer::new(800, 600);
        let mut textures = TextureCache::default();

        for _ in 0..2 {
            assert_eq!(
                renderer.render_frame(&mut registry, &mut textures, &mut backend),
                FrameOutcome::Rendered { drawn: 1, skipped: 1 }
            );
        }
        // Child compiled once, reused on the second frame
        assert_eq!(backend.compile_requests(), 1);
        assert_eq!(renderer.frames_rendered(), 2);
    }

    #[test]
    fn test_compile_failure_skips_node() {
        let mut registry = loaded_registry(&["a"]);
        let mut backend = HeadlessBackend::new().with_failing_variant(ShaderVariant::default());
        assert_eq!(
            render(&mut registry, &mut backend),
            FrameOutcome::Rendered { drawn: 0, skipped: 1 }
        );
        assert_eq!(
            registry.scene("s").unwrap().model("a").unwrap().program(),
            ProgramSlot::Failed
        );
    }

    #[test]
    fn test_wireframe_when_not_solid() {
        let mut registry = loaded_registry(&["a"]);
        {
            let camera = &mut registry.scene_mut("s").unwrap().camera;
            camera.render_solid = false;
            camera.use_perspective = false;
        }
        let mut backend = HeadlessBackend::new();
        render(&mut registry, &mut backend);

        let draw = &backend.draws()[0];
        assert_eq!(draw.mode, DrawMode::Wireframe);
        assert_eq!(draw.draw_calls, 1);
        assert_eq!(draw.viewport, Viewport { x: 100, y: 0, width: 600, height: 600 });
    }

    #[test]
    fn test_draw_calls_per_mode() {
        let quad = GeometryBuffer::new(
            vec![0.0; 12],
            vec![0, 1, 2, 0, 2, 3],
            VertexFormat::BARE,
            None,
        );
        assert_eq!(DrawMode::Solid.draw_calls(&quad), 1);
        assert_eq!(DrawMode::Wireframe.draw_calls(&quad), 2);
        assert_eq!(DrawMode::Solid.draw_calls(&GeometryBuffer::default()), 0);
    }
}
