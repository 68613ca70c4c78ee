//! Tokenising scene script lines into commands

use super::SceneScriptError;
use crate::foundation::math::{Axis, Vec3};
use crate::render::{Light, LightType};

/// One parsed scene script line
#[derive(Debug, Clone, PartialEq)]
pub enum SceneCommand {
    /// `camera ex ey ez lx ly lz ux uy uz`
    Camera {
        /// Eye position
        eye: Vec3,
        /// Point looked at
        look_at: Vec3,
        /// Up vector
        up: Vec3,
    },
    /// `light <type> ...`
    Light(Light),
    /// `object <name> <reference>`
    Object {
        /// Name the node is registered under
        name: String,
        /// Geometry reference handed to the resolver
        reference: String,
    },
    /// `rotate <name> <axis> <degrees>`
    Rotate {
        /// Model to rotate
        target: String,
        /// Axis to rotate about
        axis: Axis,
        /// Degrees added to the current rotation
        degrees: f32,
    },
    /// `translate <name> <dx> <dy> <dz>`
    Translate {
        /// Model to move
        target: String,
        /// Offset added to the current translation
        offset: Vec3,
    },
    /// `scale <name> <sx> <sy> <sz>`
    Scale {
        /// Model to scale
        target: String,
        /// Factors multiplied into the current scale
        factors: Vec3,
    },
    /// `child <parent> <child> <dx> <dy> <dz>`
    Child {
        /// Parent model
        parent: String,
        /// Model attached below the parent
        child: String,
        /// Child position relative to the parent
        offset: Vec3,
    },
}

impl SceneCommand {
    /// Parse one preprocessed line
    pub fn parse(line: usize, text: &str) -> Result<Self, SceneScriptError> {
        let mut tokens = text.split_whitespace();
        let Some(first) = tokens.next() else {
            return Err(SceneScriptError::UnknownCommand {
                line,
                command: String::new(),
            });
        };
        let command = first.to_ascii_lowercase();
        let params: Vec<&str> = tokens.collect();
        let args = Args {
            line,
            command: &command,
            params: &params,
        };

        match command.as_str() {
            "camera" => {
                args.require(9)?;
                Ok(Self::Camera {
                    eye: args.vec3(0)?,
                    look_at: args.vec3(3)?,
                    up: args.vec3(6)?,
                })
            }
            "light" => Self::parse_light(&args),
            "object" => {
                args.require(2)?;
                Ok(Self::Object {
                    name: params[0].to_string(),
                    reference: params[1].to_string(),
                })
            }
            "rotate" => {
                args.require(3)?;
                let axis = Axis::parse(params[1]).ok_or_else(|| args.invalid(1))?;
                Ok(Self::Rotate {
                    target: params[0].to_string(),
                    axis,
                    degrees: args.float(2)?,
                })
            }
            "translate" => {
                args.require(4)?;
                Ok(Self::Translate {
                    target: params[0].to_string(),
                    offset: args.vec3(1)?,
                })
            }
            "scale" => {
                args.require(4)?;
                Ok(Self::Scale {
                    target: params[0].to_string(),
                    factors: args.vec3(1)?,
                })
            }
            "child" => {
                args.require(5)?;
                Ok(Self::Child {
                    parent: params[0].to_string(),
                    child: params[1].to_string(),
                    offset: args.vec3(2)?,
                })
            }
            _ => Err(SceneScriptError::UnknownCommand {
                line,
                command: first.to_string(),
            }),
        }
    }

    fn parse_light(args: &Args<'_>) -> Result<Self, SceneScriptError> {
        args.require(1)?;
        let type_token = args.params[0];
        let light_type =
            LightType::parse(type_token).ok_or_else(|| SceneScriptError::UnknownLightType {
                line: args.line,
                light_type: type_token.to_string(),
            })?;

        let light = match light_type {
            LightType::Point => {
                args.require(7)?;
                Light::point(args.vec3(1)?, args.vec3(4)?)
            }
            LightType::Directional => {
                args.require(7)?;
                Light::directional(args.vec3(1)?, args.vec3(4)?)
            }
            LightType::Spot => {
                args.require(12)?;
                Light::spot(
                    args.vec3(1)?,
                    args.vec3(4)?,
                    args.vec3(7)?,
                    args.float(10)?,
                    args.float(11)?,
                )
            }
        };
        Ok(Self::Light(light))
    }

    /// Model a deferred command is queued under: the target of a transform
    /// command, the parent of a `child` command
    pub fn deferred_target(&self) -> Option<&str> {
        match self {
            Self::Rotate { target, .. }
            | Self::Translate { target, .. }
            | Self::Scale { target, .. } => Some(target),
            Self::Child { parent, .. } => Some(parent),
            Self::Camera { .. } | Self::Light(_) | Self::Object { .. } => None,
        }
    }
}

/// Parameters of one line, for count checks and number parsing
struct Args<'a> {
    line: usize,
    command: &'a str,
    params: &'a [&'a str],
}

impl Args<'_> {
    fn require(&self, expected: usize) -> Result<(), SceneScriptError> {
        if self.params.len() < expected {
            return Err(SceneScriptError::MissingParameter {
                line: self.line,
                command: self.command.to_string(),
                expected,
                found: self.params.len(),
            });
        }
        Ok(())
    }

    fn invalid(&self, index: usize) -> SceneScriptError {
        SceneScriptError::InvalidParameter {
            line: self.line,
            command: self.command.to_string(),
            value: self.params.get(index).copied().unwrap_or_default().to_string(),
        }
    }

    fn float(&self, index: usize) -> Result<f32, SceneScriptError> {
        self.params
            .get(index)
            .and_then(|token| token.parse::<f32>().ok())
            .ok_or_else(|| self.invalid(index))
    }

    fn vec3(&self, start: usize) -> Result<Vec3, SceneScriptError> {
        Ok(Vec3::new(
            self.float(start)?,
            self.float(start + 1)?,
            self.float(start + 2)?,
        ))
    }
}

/// Strip comments and blank lines, keeping 1-based line numbers
pub fn preprocess(script: &str) -> impl Iterator<Item = (usize, &str)> {
    script.lines().enumerate().filter_map(|(index, raw)| {
        let text = raw.split('#').next().unwrap_or_default().trim();
        (!text.is_empty()).then_some((index + 1, text))
    })
}
