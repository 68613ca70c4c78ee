//! Lighting system
//!
//! A scene owns one [`LightSet`]. Scene scripts append lights to it; the
//! renderer hands the packed arrays to every draw submission.

use crate::foundation::math::Vec3;

/// Light types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    /// Directional light (like sunlight)
    Directional,
    /// Point light (like a lightbulb)
    Point,
    /// Spot light (like a flashlight)
    Spot,
}

impl LightType {
    /// Parse the light type keyword of a `light` command (case-insensitive)
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "point" => Some(Self::Point),
            "directional" => Some(Self::Directional),
            "spot" => Some(Self::Spot),
            _ => None,
        }
    }
}

/// Light source
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Light type
    pub light_type: LightType,
    /// Light position (point/spot), or the direction light travels (directional)
    pub position: Vec3,
    /// Light color
    pub color: Vec3,
    /// Cone axis for spot lights
    pub direction: Vec3,
    /// Cone cutoff for spot lights
    pub cutoff: f32,
    /// Falloff exponent for spot lights
    pub exponent: f32,
}

impl Light {
    /// Create a point light
    pub fn point(position: Vec3, color: Vec3) -> Self {
        Self {
            light_type: LightType::Point,
            position,
            color,
            direction: Vec3::zeros(),
            cutoff: 0.0,
            exponent: 0.0,
        }
    }

    /// Create a directional light
    pub fn directional(direction: Vec3, color: Vec3) -> Self {
        Self {
            light_type: LightType::Directional,
            position: direction,
            color,
            direction: Vec3::zeros(),
            cutoff: 0.0,
            exponent: 0.0,
        }
    }

    /// Create a spot light
    pub fn spot(position: Vec3, color: Vec3, direction: Vec3, cutoff: f32, exponent: f32) -> Self {
        Self {
            light_type: LightType::Spot,
            position,
            color,
            direction,
            cutoff,
            exponent,
        }
    }
}

/// The lights of one scene, in the order they were declared
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightSet {
    lights: Vec<Light>,
}

impl LightSet {
    /// Create an empty light set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a light
    pub fn add(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// All lights in declaration order
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Lights of one type, in declaration order
    pub fn of_type(&self, light_type: LightType) -> impl Iterator<Item = &Light> {
        self.lights.iter().filter(move |l| l.light_type == light_type)
    }

    /// Number of lights
    pub fn len(&self) -> usize {
        self.lights.len()
    }

    /// No lights declared
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Positions (or directions) packed as `x y z` triples for uniform upload
    pub fn positions(&self) -> Vec<f32> {
        self.lights
            .iter()
            .flat_map(|l| [l.position.x, l.position.y, l.position.z])
            .collect()
    }

    /// Colors packed as `r g b` triples for uniform upload
    pub fn colors(&self) -> Vec<f32> {
        self.lights
            .iter()
            .flat_map(|l| [l.color.x, l.color.y, l.color.z])
            .collect()
    }
}
