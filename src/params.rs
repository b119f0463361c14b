//! Simulation parameters
//!
//! Parameters are fixed when a [`Simulation`](crate::Simulation) is built; only
//! the area can change afterwards, through `resize`. They can be loaded from a
//! YAML or JSON file in which every field is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::geometry::{Area, Vector};
use crate::io::{FormatRegistry, IoError, IoResult};
use crate::model::MAX_BODY_MASS;

/// Default repulsion constant
pub const DEFAULT_REPULSION: f64 = 25.0;

/// Default spring stiffness (force per unit of stretch)
pub const DEFAULT_SPRING_STIFFNESS: f64 = 0.0001;

/// Default spring rest length
pub const DEFAULT_SPRING_LENGTH: f64 = 50.0;

/// Default body mass
pub const DEFAULT_BODY_MASS: f64 = 1.0;

/// Default friction coefficient
pub const DEFAULT_FRICTION: f64 = 0.1;

/// Default centripetal coefficient
pub const DEFAULT_CENTRIPETAL: f64 = 0.01;

/// Default speed limit (distance per tick)
pub const DEFAULT_SPEED_LIMIT: f64 = 5.0;

/// Default Barnes-Hut approximation threshold (0 = exact)
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Constant standing in for gravity in the friction law
pub const GRAVITY: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// Simulation bounds; `None` lets the bodies roam freely
    pub area: Option<Area>,
    pub repulsion: f64,
    pub spring_stiffness: f64,
    pub spring_length: f64,
    pub body_mass: f64,
    pub friction: f64,
    pub centripetal: f64,
    pub speed_limit: f64,
    pub threshold: f64,
    /// Seed for random placement; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            area: Some(Area::default()),
            repulsion: DEFAULT_REPULSION,
            spring_stiffness: DEFAULT_SPRING_STIFFNESS,
            spring_length: DEFAULT_SPRING_LENGTH,
            body_mass: DEFAULT_BODY_MASS,
            friction: DEFAULT_FRICTION,
            centripetal: DEFAULT_CENTRIPETAL,
            speed_limit: DEFAULT_SPEED_LIMIT,
            threshold: DEFAULT_THRESHOLD,
            seed: None,
        }
    }
}

impl SimulationParameters {
    /// Parameters with no bounds at all
    pub fn unbounded() -> Self {
        Self {
            area: None,
            ..Self::default()
        }
    }

    pub fn with_area(mut self, area: Area) -> Self {
        self.area = Some(area);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Point the centripetal force pulls towards
    pub fn center(&self) -> Vector {
        self.area.map(|a| a.center()).unwrap_or(Vector::ZERO)
    }

    /// Area used to place bodies registered without a position
    pub fn placement_area(&self) -> Area {
        self.area.unwrap_or_default()
    }

    /// Check every field, reporting the first one out of range
    pub fn validate(&self) -> Result<()> {
        non_negative("repulsion", self.repulsion)?;
        non_negative("spring_stiffness", self.spring_stiffness)?;
        non_negative("spring_length", self.spring_length)?;
        non_negative("friction", self.friction)?;
        non_negative("centripetal", self.centripetal)?;
        non_negative("threshold", self.threshold)?;
        positive("body_mass", self.body_mass)?;
        if self.body_mass > MAX_BODY_MASS {
            return Err(LayoutError::InvalidParameter {
                name: "body_mass",
                value: self.body_mass.to_string(),
                reason: "must not exceed the maximum body mass",
            });
        }
        positive("speed_limit", self.speed_limit)?;

        if let Some(area) = self.area {
            let finite = area.min.is_finite() && area.max.is_finite();
            if !finite || area.width() < 0.0 || area.height() < 0.0 {
                return Err(LayoutError::InvalidParameter {
                    name: "area",
                    value: format!("{area:?}"),
                    reason: "corners must be finite with min <= max",
                });
            }
        }
        Ok(())
    }

    /// Load and validate parameters from a `.yaml`/`.yml` or `.json` file
    pub fn load(path: &Path) -> IoResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let params: Self = match FormatRegistry::extension_from_path(path) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => {
                serde_json::from_str(&content).map_err(|e| IoError::Parse(e.to_string()))?
            }
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                serde_yaml::from_str(&content).map_err(|e| IoError::Parse(e.to_string()))?
            }
            Some(ext) => return Err(IoError::UnsupportedFormat(ext.to_string())),
            None => return Err(IoError::UnknownExtension(path.display().to_string())),
        };
        params.validate()?;
        tracing::debug!(path = %path.display(), "loaded simulation parameters");
        Ok(params)
    }

    /// Render as YAML, the format `load` reads back
    pub fn to_yaml(&self) -> IoResult<String> {
        serde_yaml::to_string(self).map_err(|e| IoError::Write(e.to_string()))
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(LayoutError::InvalidParameter {
            name,
            value: value.to_string(),
            reason: "must be finite and non-negative",
        })
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LayoutError::InvalidParameter {
            name,
            value: value.to_string(),
            reason: "must be finite and positive",
        })
    }
}
