//! Model nodes and their transform state
//!
//! A [`ModelNode`] places one loaded geometry buffer in a scene. Its transform
//! is a [`NodeTransform`], which is either standalone (the node's own
//! translate/rotate/scale) or attached (the own fields plus a translate/rotate
//! placement relative to the parent). Only the scene graph switches a node
//! between the two, when links are made or broken; the translate and rotate
//! accessors here read and write the placement while attached.

use std::path::Path;
use std::sync::Arc;

use crate::assets::{LoadedModel, ModelTextures, MtlData};
use crate::foundation::collections::NodeHandle;
use crate::foundation::math::{Axis, Mat4, Mat4Ext, Vec3};
use crate::render::{GeometryBuffer, ProgramSlot, ShaderVariant};

/// Transform state of a model node
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeTransform {
    /// Node with no parent and no children
    Standalone {
        /// Translation
        translate: Vec3,
        /// Rotation about X, Y and Z in degrees
        rotate: Vec3,
        /// Per-axis scale
        scale: Vec3,
    },
    /// Node that is part of a hierarchy
    Attached {
        /// Translation relative to the parent
        from_parent_translate: Vec3,
        /// Rotation relative to the parent, degrees
        from_parent_rotate: Vec3,
        /// Own translation, kept from standalone mode
        translate: Vec3,
        /// Own rotation in degrees, kept from standalone mode
        rotate: Vec3,
        /// Per-axis scale, never inherited by children
        scale: Vec3,
    },
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::Standalone {
            translate: Vec3::zeros(),
            rotate: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl NodeTransform {
    /// Whether the node is part of a hierarchy
    pub const fn is_attached(&self) -> bool {
        matches!(self, Self::Attached { .. })
    }

    /// Active translation: own, or relative to the parent
    pub fn translate(&self) -> Vec3 {
        match self {
            Self::Standalone { translate, .. } => *translate,
            Self::Attached {
                from_parent_translate,
                ..
            } => *from_parent_translate,
        }
    }

    /// Active rotation in degrees: own, or relative to the parent
    pub fn rotate(&self) -> Vec3 {
        match self {
            Self::Standalone { rotate, .. } => *rotate,
            Self::Attached {
                from_parent_rotate, ..
            } => *from_parent_rotate,
        }
    }

    /// Per-axis scale
    pub fn scale(&self) -> Vec3 {
        match self {
            Self::Standalone { scale, .. } | Self::Attached { scale, .. } => *scale,
        }
    }

    fn translate_mut(&mut self) -> &mut Vec3 {
        match self {
            Self::Standalone { translate, .. } => translate,
            Self::Attached {
                from_parent_translate,
                ..
            } => from_parent_translate,
        }
    }

    fn rotate_mut(&mut self) -> &mut Vec3 {
        match self {
            Self::Standalone { rotate, .. } => rotate,
            Self::Attached {
                from_parent_rotate, ..
            } => from_parent_rotate,
        }
    }

    fn scale_mut(&mut self) -> &mut Vec3 {
        match self {
            Self::Standalone { scale, .. } | Self::Attached { scale, .. } => scale,
        }
    }

    /// Join a hierarchy with a zero from-parent placement. The own fields
    /// are kept, so the node's model matrix does not change.
    pub fn attach(&mut self) {
        if let Self::Standalone {
            translate,
            rotate,
            scale,
        } = *self
        {
            *self = Self::Attached {
                from_parent_translate: Vec3::zeros(),
                from_parent_rotate: Vec3::zeros(),
                translate,
                rotate,
                scale,
            };
        }
    }

    /// Leave the hierarchy, dropping the from-parent placement
    pub fn detach(&mut self) {
        if let Self::Attached {
            translate,
            rotate,
            scale,
            ..
        } = *self
        {
            *self = Self::Standalone {
                translate,
                rotate,
                scale,
            };
        }
    }

    /// `translate * Rx * Ry * Rz * scale` of the own fields, in either mode
    pub fn model_matrix(&self) -> Mat4 {
        match self {
            Self::Standalone {
                translate,
                rotate,
                scale,
            }
            | Self::Attached {
                translate,
                rotate,
                scale,
                ..
            } => Mat4::translate_rotate_scale(translate, rotate, scale),
        }
    }

    /// `Rx * Ry * Rz * translate` of the from-parent fields; identity when standalone
    pub fn from_parent_matrix(&self) -> Mat4 {
        match self {
            Self::Standalone { .. } => Mat4::identity(),
            Self::Attached {
                from_parent_translate,
                from_parent_rotate,
                ..
            } => {
                Mat4::rotation_xyz_degrees(from_parent_rotate)
                    * Mat4::new_translation(from_parent_translate)
            }
        }
    }
}

/// One placed instance of a loaded geometry buffer
#[derive(Debug, Clone)]
pub struct ModelNode {
    name: String,
    model: LoadedModel,
    transform: NodeTransform,
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,
    hierarchical_matrix: Option<Mat4>,
    program: ProgramSlot,
}

impl ModelNode {
    /// Create a standalone node with an identity transform
    pub fn new(name: impl Into<String>, model: LoadedModel) -> Self {
        Self {
            name: name.into(),
            model,
            transform: NodeTransform::default(),
            parent: None,
            children: Vec::new(),
            hierarchical_matrix: None,
            program: ProgramSlot::default(),
        }
    }

    /// Object name the node was declared under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared geometry
    pub fn geometry(&self) -> &Arc<GeometryBuffer> {
        &self.model.geometry
    }

    /// Material bound to the geometry, if any
    pub fn material(&self) -> Option<&MtlData> {
        self.model.material.as_deref()
    }

    /// Texture files named by the material
    pub fn textures(&self) -> &ModelTextures {
        &self.model.textures
    }

    /// OBJ file the geometry came from
    pub fn model_path(&self) -> &Path {
        &self.model.model_path
    }

    /// Material binds a non-empty diffuse map
    pub fn has_diffuse_map(&self) -> bool {
        self.material().is_some_and(MtlData::has_diffuse_map)
    }

    /// Material binds a non-empty normal map
    pub fn has_normal_map(&self) -> bool {
        self.material().is_some_and(MtlData::has_normal_map)
    }

    /// Shader variant for this node's attributes and material
    pub fn shader_variant(&self) -> ShaderVariant {
        ShaderVariant::select(&self.model.geometry, self.material())
    }

    /// Parent node, if attached below one
    pub const fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Children in attachment order
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// Current transform state
    pub const fn transform(&self) -> &NodeTransform {
        &self.transform
    }

    pub(crate) fn transform_mut(&mut self) -> &mut NodeTransform {
        &mut self.transform
    }

    /// Whether the node has a parent or children
    pub const fn is_hierarchical(&self) -> bool {
        self.transform.is_attached()
    }

    /// Active translation on one axis
    pub fn translate(&self, axis: Axis) -> f32 {
        self.transform.translate()[axis.index()]
    }

    /// Write the active translation on one axis
    pub fn set_translate(&mut self, axis: Axis, value: f32) {
        self.transform.translate_mut()[axis.index()] = value;
    }

    /// Active rotation on one axis, degrees
    pub fn rotate(&self, axis: Axis) -> f32 {
        self.transform.rotate()[axis.index()]
    }

    /// Write the active rotation on one axis, degrees
    pub fn set_rotate(&mut self, axis: Axis, degrees: f32) {
        self.transform.rotate_mut()[axis.index()] = degrees;
    }

    /// Scale on one axis
    pub fn scale(&self, axis: Axis) -> f32 {
        self.transform.scale()[axis.index()]
    }

    /// Write the scale on one axis
    pub fn set_scale(&mut self, axis: Axis, value: f32) {
        self.transform.scale_mut()[axis.index()] = value;
    }

    /// Add degrees to the active rotation on one axis
    pub fn rotate_by(&mut self, axis: Axis, degrees: f32) {
        self.transform.rotate_mut()[axis.index()] += degrees;
    }

    /// Add an offset to the active translation
    pub fn translate_by(&mut self, offset: &Vec3) {
        *self.transform.translate_mut() += offset;
    }

    /// Multiply the scale per axis
    pub fn scale_by(&mut self, factors: &Vec3) {
        let scale = self.transform.scale_mut();
        *scale = scale.component_mul(factors);
    }

    /// Set the translation relative to the parent
    pub(crate) fn set_from_parent_translate(&mut self, offset: Vec3) {
        if let NodeTransform::Attached {
            from_parent_translate,
            ..
        } = &mut self.transform
        {
            *from_parent_translate = offset;
        }
    }

    /// Zero the active translation and rotation and restore unit scale
    pub fn reset_transform(&mut self) {
        *self.transform.translate_mut() = Vec3::zeros();
        *self.transform.rotate_mut() = Vec3::zeros();
        *self.transform.scale_mut() = Vec3::new(1.0, 1.0, 1.0);
    }

    /// Own model matrix; see [`NodeTransform::model_matrix`]
    pub fn model_matrix(&self) -> Mat4 {
        self.transform.model_matrix()
    }

    /// Placement relative to the parent; see [`NodeTransform::from_parent_matrix`]
    pub fn from_parent_matrix(&self) -> Mat4 {
        self.transform.from_parent_matrix()
    }

    /// Composed matrix stashed for the draw in progress
    pub const fn hierarchical_matrix(&self) -> Option<&Mat4> {
        self.hierarchical_matrix.as_ref()
    }

    pub(crate) fn set_hierarchical_matrix(&mut self, matrix: Option<Mat4>) {
        self.hierarchical_matrix = matrix;
    }

    /// Matrix submitted for drawing: the stashed hierarchical one while a draw
    /// is in progress, the own model matrix otherwise
    pub fn draw_matrix(&self) -> Mat4 {
        self.hierarchical_matrix
            .unwrap_or_else(|| self.transform.model_matrix())
    }

    /// Compiled shader program state
    pub const fn program(&self) -> ProgramSlot {
        self.program
    }

    pub(crate) fn set_program(&mut self, program: ProgramSlot) {
        self.program = program;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Point3;
    use crate::render::VertexFormat;
    use approx::assert_relative_eq;

    fn node(name: &str) -> ModelNode {
        let geometry = GeometryBuffer::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0, 1, 2],
            VertexFormat::BARE,
            None,
        );
        ModelNode::new(name, LoadedModel::from_geometry(geometry))
    }

    #[test]
    fn test_standalone_accessors_write_own_fields() {
        let mut n = node("a");
        n.set_translate(Axis::X, 3.0);
        n.set_rotate(Axis::Y, 45.0);
        n.set_scale(Axis::Z, 2.0);

        assert!(!n.is_hierarchical());
        assert_eq!(
            *n.transform(),
            NodeTransform::Standalone {
                translate: Vec3::new(3.0, 0.0, 0.0),
                rotate: Vec3::new(0.0, 45.0, 0.0),
                scale: Vec3::new(1.0, 1.0, 2.0),
            }
        );
        assert_eq!(n.from_parent_matrix(), Mat4::identity());
    }

    #[test]
    fn test_attached_accessors_write_from_parent_fields() {
        let mut n = node("a");
        n.set_translate(Axis::X, 2.0);
        n.transform_mut().attach();

        // Placement starts at zero; the own translation stays in the model matrix
        assert_relative_eq!(n.translate(Axis::X), 0.0);
        n.set_translate(Axis::X, 7.0);
        match *n.transform() {
            NodeTransform::Attached {
                from_parent_translate,
                translate,
                ..
            } => {
                assert_relative_eq!(from_parent_translate.x, 7.0);
                assert_relative_eq!(translate.x, 2.0);
            }
            NodeTransform::Standalone { .. } => panic!("expected attached transform"),
        }

        n.set_scale(Axis::X, 3.0);
        let p = n.model_matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.coords, Vec3::new(5.0, 0.0, 0.0));

        n.transform_mut().detach();
        assert!(!n.is_hierarchical());
        assert_relative_eq!(n.translate(Axis::X), 2.0);
    }

    #[test]
    fn test_attach_keeps_model_matrix() {
        let mut n = node("sun");
        n.set_translate(Axis::X, 5.0);
        n.set_rotate(Axis::Z, 90.0);
        let before = n.model_matrix();

        n.transform_mut().attach();
        assert_relative_eq!(n.model_matrix(), before, epsilon = 1e-6);
        assert_relative_eq!(n.model_matrix().origin(), Vec3::new(5.0, 0.0, 0.0), epsilon = 1e-5);
        assert_eq!(n.from_parent_matrix(), Mat4::identity());
    }

    #[test]
    fn test_cumulative_updates() {
        let mut n = node("a");
        n.rotate_by(Axis::X, 10.0);
        n.rotate_by(Axis::X, 20.0);
        n.translate_by(&Vec3::new(1.0, 2.0, 3.0));
        n.translate_by(&Vec3::new(1.0, 0.0, 0.0));
        n.scale_by(&Vec3::new(2.0, 3.0, 4.0));
        n.scale_by(&Vec3::new(0.5, 1.0, 1.0));

        assert_relative_eq!(n.rotate(Axis::X), 30.0);
        assert_relative_eq!(n.transform().translate(), Vec3::new(2.0, 2.0, 3.0));
        assert_relative_eq!(n.transform().scale(), Vec3::new(1.0, 3.0, 4.0));

        n.reset_transform();
        assert_eq!(*n.transform(), NodeTransform::default());
    }

    #[test]
    fn test_from_parent_matrix_rotates_after_translating() {
        let mut n = node("a");
        n.transform_mut().attach();
        n.set_from_parent_translate(Vec3::new(1.0, 0.0, 0.0));
        n.set_rotate(Axis::Z, 90.0);

        // R * T: the offset is itself rotated
        let origin = n.from_parent_matrix().origin();
        assert_relative_eq!(origin, Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_draw_matrix_prefers_stash() {
        let mut n = node("a");
        n.set_translate(Axis::Y, 4.0);
        assert_relative_eq!(n.draw_matrix().origin(), Vec3::new(0.0, 4.0, 0.0));

        n.set_hierarchical_matrix(Some(Mat4::new_translation(&Vec3::new(9.0, 0.0, 0.0))));
        assert_relative_eq!(n.draw_matrix().origin(), Vec3::new(9.0, 0.0, 0.0));
        n.set_hierarchical_matrix(None);
        assert!(n.hierarchical_matrix().is_none());
        assert_eq!(n.shader_variant().core_name(), "");
    }
}
