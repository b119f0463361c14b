//! Bodies, springs and the registration requests that create them

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Vector;

/// Opaque body identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyId(String);

impl BodyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BodyId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BodyId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A simulated node
///
/// Velocity is never stored: it is implied by the distance between the
/// previous and the current position.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: BodyId,
    /// Always strictly positive
    pub mass: f64,
    pub position: Vector,
    pub previous: Vector,
    /// Force/velocity increment accumulated during the current tick
    pub pending: Vector,
    /// Pinned bodies are skipped by the integrator
    pub constrained: bool,
    /// Kinetic energy computed by the last integration pass
    pub kinetic_energy: f64,
}

impl Body {
    pub fn new(id: BodyId, mass: f64, position: Vector) -> Self {
        Self {
            id,
            mass,
            position,
            previous: position,
            pending: Vector::ZERO,
            constrained: false,
            kinetic_energy: 0.0,
        }
    }

    /// Velocity implied by the last committed move
    #[inline]
    pub fn implied_velocity(&self) -> Vector {
        self.position - self.previous
    }

    /// Velocity the next integration pass would start from
    #[inline]
    pub fn expected_increment(&self) -> Vector {
        self.implied_velocity() + self.pending
    }

    #[inline]
    pub fn apply(&mut self, increment: Vector) {
        self.pending += increment;
    }

    /// Drop all motion state: no implied velocity, nothing pending
    pub fn halt(&mut self) {
        self.previous = self.position;
        self.pending = Vector::ZERO;
        self.kinetic_energy = 0.0;
    }

    /// Teleport to `point` and come to rest there
    pub fn move_to(&mut self, point: Vector) {
        self.position = point;
        self.halt();
    }
}

/// Heaviest mass a body may have
///
/// Squared masses and kinetic energies of bodies up to this mass stay finite.
pub const MAX_BODY_MASS: f64 = 1e100;

/// Weighted connection between two bodies, referenced by id
///
/// `Spring(a, b)` and `Spring(b, a)` denote the same entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spring {
    pub id1: BodyId,
    pub id2: BodyId,
    pub length_at_rest: f64,
    pub stiffness: f64,
}

impl Spring {
    /// Order-independent key for the endpoint pair
    pub fn key(&self) -> (BodyId, BodyId) {
        pair_key(&self.id1, &self.id2)
    }
}

pub(crate) fn pair_key(a: &BodyId, b: &BodyId) -> (BodyId, BodyId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

/// Body registration request
///
/// Every field is optional so that a request read from a file can be checked
/// and reported as a whole; missing values fall back to the simulation
/// defaults, except `id` which is mandatory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BodyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constrained: Option<bool>,
}

impl BodySpec {
    pub fn new(id: impl Into<BodyId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn constrained(mut self) -> Self {
        self.constrained = Some(true);
        self
    }

    /// Whether every coordinate that was given is finite
    pub fn has_finite_coordinates(&self) -> bool {
        self.x.is_none_or(f64::is_finite) && self.y.is_none_or(f64::is_finite)
    }

    /// Requested position, only when both coordinates were given
    pub fn position(&self) -> Option<Vector> {
        Some(Vector::new(self.x?, self.y?))
    }
}

/// Spring registration request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpringSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id1: Option<BodyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id2: Option<BodyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stiffness: Option<f64>,
    #[serde(
        default,
        alias = "lengthAtRest",
        skip_serializing_if = "Option::is_none"
    )]
    pub length_at_rest: Option<f64>,
}

impl SpringSpec {
    pub fn new(id1: impl Into<BodyId>, id2: impl Into<BodyId>) -> Self {
        Self {
            id1: Some(id1.into()),
            id2: Some(id2.into()),
            ..Self::default()
        }
    }

    pub fn with_stiffness(mut self, stiffness: f64) -> Self {
        self.stiffness = Some(stiffness);
        self
    }

    pub fn with_length_at_rest(mut self, length: f64) -> Self {
        self.length_at_rest = Some(length);
        self
    }
}
