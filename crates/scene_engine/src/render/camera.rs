//! # Scene Camera
//!
//! The camera a scene script declares with the `camera` command, plus the
//! viewport rule the renderer applies to it.
//!
//! ## Design Principles
//! - **Library-agnostic**: no graphics API types, only nalgebra matrices
//! - **On-demand matrices**: view and projection are computed per call; the
//!   camera stores only the authored values
//! - **Right-handed, Y-up** view space, matching the conventions of the OBJ
//!   assets the viewer loads

use crate::foundation::math::{utils, Mat4, Point3, Vec3};

/// Camera for perspective and orthographic projections
///
/// Holds the eye position, the point looked at and the up vector exactly as a
/// scene script gives them, together with the projection parameters the
/// presentation layer may toggle.
///
/// # Orthographic Extent
/// The orthographic volume is sized so that it covers the same height at the
/// look-at point as the perspective frustum does. Switching projection mode
/// therefore keeps the subject roughly the same size on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space
    pub eye: Vec3,

    /// Point the camera is looking at in world space
    pub look_at: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,

    /// Vertical field of view in degrees
    pub fov_degrees: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,

    /// Perspective projection when true, orthographic otherwise
    pub use_perspective: bool,

    /// Filled triangles when true, per-triangle outlines otherwise
    pub render_solid: bool,
}

impl Camera {
    /// Create a perspective camera from the values of a `camera` command
    ///
    /// # Arguments
    /// * `eye` - Camera position in world space
    /// * `look_at` - Point in world space to look at
    /// * `up` - Up vector; need not be perpendicular to the view direction
    ///
    /// # Example
    /// ```rust
    /// use scene_engine::foundation::math::Vec3;
    /// use scene_engine::render::Camera;
    ///
    /// let camera = Camera::new(
    ///     Vec3::new(0.0, 2.0, 5.0),
    ///     Vec3::zeros(),
    ///     Vec3::new(0.0, 1.0, 0.0),
    /// );
    /// assert!(camera.use_perspective);
    /// ```
    pub fn new(eye: Vec3, look_at: Vec3, up: Vec3) -> Self {
        Self {
            eye,
            look_at,
            up,
            ..Self::default()
        }
    }

    /// Overwrite the eye, look-at and up vectors, keeping projection settings
    pub fn set_view(&mut self, eye: Vec3, look_at: Vec3, up: Vec3) {
        self.eye = eye;
        self.look_at = look_at;
        self.up = up;
        log::trace!("Camera view updated - eye: {:?}, look_at: {:?}, up: {:?}", eye, look_at, up);
    }

    /// Generate view matrix for world-to-camera space transformation
    ///
    /// # Mathematical Implementation
    /// Standard right-handed look-at: translate the world by `-eye`, then
    /// rotate so the camera looks down its negative Z axis.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(
            &Point3::from(self.eye),
            &Point3::from(self.look_at),
            &self.up,
        )
    }

    /// Generate the projection matrix for a viewport of the given aspect ratio
    ///
    /// # Arguments
    /// * `aspect` - Viewport width divided by height
    ///
    /// # Orthographic Mode
    /// The viewport is square in orthographic mode (see [`Viewport::fit`]),
    /// so the volume uses equal horizontal and vertical extents.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let fov = utils::deg_to_rad(self.fov_degrees);
        if self.use_perspective {
            Mat4::new_perspective(aspect, fov, self.near, self.far)
        } else {
            let distance = (self.look_at - self.eye).norm().max(self.near);
            let half = distance * (fov / 2.0).tan();
            Mat4::new_orthographic(-half, half, -half, half, self.near, self.far)
        }
    }
}

impl Default for Camera {
    /// Default camera looking at the origin from +Z
    ///
    /// # Default Configuration
    /// - Eye: (0, 0, 5)
    /// - Look-at: (0, 0, 0)
    /// - Up: (0, 1, 0)
    /// - FOV: 45 degrees
    /// - Near / far: 0.1 / 1000.0
    /// - Perspective, solid
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 5.0),
            look_at: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
            use_perspective: true,
            render_solid: true,
        }
    }
}

/// Region of the canvas a frame is drawn into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Left edge in pixels
    pub x: u32,
    /// Bottom edge in pixels
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Viewport {
    /// Viewport for a canvas: the whole canvas for perspective, the largest
    /// centred square for orthographic
    pub fn fit(canvas_width: u32, canvas_height: u32, use_perspective: bool) -> Self {
        if use_perspective {
            return Self {
                x: 0,
                y: 0,
                width: canvas_width,
                height: canvas_height,
            };
        }
        let side = canvas_width.min(canvas_height);
        Self {
            x: (canvas_width - side) / 2,
            y: (canvas_height - side) / 2,
            width: side,
            height: side,
        }
    }

    /// Width divided by height, 1.0 for an empty viewport
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}
