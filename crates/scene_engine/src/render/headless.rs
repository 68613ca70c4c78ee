//! Headless draw backend
//!
//! Records what would have been drawn instead of talking to a GPU. Used by the
//! viewer's offline mode and by tests that check composed matrices.

use std::collections::{HashMap, HashSet};

use super::camera::Viewport;
use super::renderer::{DrawBackend, DrawMode, DrawSubmission, ProgramId};
use super::shader_config::ShaderVariant;
use super::{RenderError, RenderResult};
use crate::foundation::math::Mat4;

/// One recorded draw
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    /// Node that was drawn
    pub node: String,
    /// Program used
    pub program: ProgramId,
    /// Variant the program was compiled from
    pub variant: ShaderVariant,
    /// Composed model matrix
    pub model_matrix: Mat4,
    /// Projection * view * model
    pub mvp: Mat4,
    /// Canvas region
    pub viewport: Viewport,
    /// Solid or wireframe
    pub mode: DrawMode,
    /// Draw calls a GPU backend would have issued
    pub draw_calls: usize,
    /// Indices submitted
    pub index_count: usize,
    /// Number of lights bound
    pub light_count: usize,
    /// A diffuse texture was bound
    pub diffuse_bound: bool,
    /// A normal map was bound
    pub normal_map_bound: bool,
}

/// Backend that compiles nothing and draws nothing, but remembers both
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    programs: HashMap<ShaderVariant, ProgramId>,
    failing: HashSet<ShaderVariant>,
    compile_requests: usize,
    draws: Vec<DrawRecord>,
}

impl HeadlessBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Make compilation of `variant` fail
    #[must_use]
    pub fn with_failing_variant(mut self, variant: ShaderVariant) -> Self {
        self.failing.insert(variant);
        self
    }

    /// Draws recorded since the last [`Self::take_draws`]
    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    /// Drain the recorded draws
    pub fn take_draws(&mut self) -> Vec<DrawRecord> {
        std::mem::take(&mut self.draws)
    }

    /// Number of compile requests received
    pub const fn compile_requests(&self) -> usize {
        self.compile_requests
    }

    /// Number of distinct programs linked
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }
}

impl DrawBackend for HeadlessBackend {
    fn compile_program(&mut self, variant: &ShaderVariant) -> RenderResult<ProgramId> {
        self.compile_requests += 1;
        if self.failing.contains(variant) {
            return Err(RenderError::ShaderCompile {
                variant: variant.core_name(),
                message: "rejected by headless backend".to_string(),
            });
        }

        let next = ProgramId(u32::try_from(self.programs.len()).unwrap_or(u32::MAX).saturating_add(1));
        let program = *self.programs.entry(*variant).or_insert(next);
        log::trace!("Headless program {:?} for variant '{}'", program, variant.core_name());
        Ok(program)
    }

    fn draw(&mut self, submission: &DrawSubmission<'_>) -> RenderResult<()> {
        if !self.programs.values().any(|program| *program == submission.program) {
            return Err(RenderError::Backend(format!(
                "program {:?} was never linked",
                submission.program
            )));
        }

        self.draws.push(DrawRecord {
            node: submission.node.to_string(),
            program: submission.program,
            variant: submission.variant,
            model_matrix: submission.model_matrix,
            mvp: submission.projection_matrix * submission.view_matrix * submission.model_matrix,
            viewport: submission.viewport,
            mode: submission.mode,
            draw_calls: submission.mode.draw_calls(submission.geometry),
            index_count: submission.geometry.indices().len(),
            light_count: submission.light_positions.len() / 3,
            diffuse_bound: submission.diffuse_texture.is_some(),
            normal_map_bound: submission.normal_texture.is_some(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{GeometryBuffer, VertexFormat};

    #[test]
    fn test_programs_are_shared_per_variant() {
        let mut backend = HeadlessBackend::new();
        let bare = ShaderVariant::default();
        let first = backend.compile_program(&bare).unwrap();
        let second = backend.compile_program(&bare).unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.compile_requests(), 2);
        assert_eq!(backend.program_count(), 1);
    }

    #[test]
    fn test_draw_with_unknown_program_fails() {
        let mut backend = HeadlessBackend::new();
        let geometry = GeometryBuffer::new(vec![0.0; 9], vec![0, 1, 2], VertexFormat::BARE, None);
        let submission = DrawSubmission {
            node: "a",
            program: ProgramId(42),
            variant: ShaderVariant::default(),
            model_matrix: Mat4::identity(),
            view_matrix: Mat4::identity(),
            projection_matrix: Mat4::identity(),
            viewport: Viewport::fit(10, 10, true),
            geometry: &geometry,
            mode: DrawMode::Solid,
            light_positions: &[],
            light_colors: &[],
            diffuse_texture: None,
            normal_texture: None,
            uv_offset: [0.0, 0.0],
        };

        assert!(matches!(backend.draw(&submission), Err(RenderError::Backend(_))));
        assert!(backend.draws().is_empty());
    }
}
