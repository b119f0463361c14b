use thiserror::Error;

use crate::model::{BodyId, BodySpec, MAX_BODY_MASS, SpringSpec};

/// Errors reported synchronously by the simulation boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// A body registration did not name the body
    #[error("each body must have an identifier: {spec:?}")]
    MissingBodyId { spec: BodySpec },

    /// A spring registration did not name both endpoints
    #[error("a spring must have two body identifiers (id1 and id2): {spec:?}")]
    MissingSpringEndpoint { spec: SpringSpec },

    /// Mass must be strictly positive and finite
    #[error("body '{id}' must have a positive mass, got {mass}")]
    NonPositiveMass { id: BodyId, mass: f64 },

    /// Mass is above [`MAX_BODY_MASS`]
    #[error("body '{id}' has mass {mass:e}, above the maximum of {max:e}", max = MAX_BODY_MASS)]
    ExcessiveMass { id: BodyId, mass: f64 },

    /// A requested coordinate is NaN or infinite
    #[error("body coordinates must be finite: {spec:?}")]
    NonFinitePosition { spec: BodySpec },

    /// The operation targets a body that is not registered
    #[error("unknown body: {0}")]
    UnknownBody(BodyId),

    /// A simulation parameter is out of range
    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Result type for simulation operations
pub type Result<T> = std::result::Result<T, LayoutError>;
