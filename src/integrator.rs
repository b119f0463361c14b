//! Position integration with speed clamping and boundary reflection

use crate::geometry::{Area, Vector};
use crate::model::Body;

/// Clamp a velocity to `limit`, keeping its direction
///
/// Velocities that are not finite are dropped altogether.
pub fn clamp_speed(velocity: Vector, limit: f64) -> Vector {
    if !velocity.is_finite() {
        return Vector::ZERO;
    }
    let speed = velocity.x.hypot(velocity.y);
    if speed > limit {
        velocity * (limit / speed)
    } else {
        velocity
    }
}

/// Advance every free body by one integration pass
///
/// Returns the total kinetic energy of the pass, saturated at `f64::MAX`.
/// Constrained bodies keep their position and lose whatever was pending for
/// them.
pub fn integrate(bodies: &mut [Body], speed_limit: f64, area: Option<Area>) -> f64 {
    bodies
        .iter_mut()
        .map(|body| advance(body, speed_limit, area))
        .sum::<f64>()
        .min(f64::MAX)
}

fn advance(body: &mut Body, speed_limit: f64, area: Option<Area>) -> f64 {
    if body.constrained {
        body.pending = Vector::ZERO;
        body.kinetic_energy = 0.0;
        return 0.0;
    }

    let velocity = clamp_speed(body.expected_increment(), speed_limit);
    let current = body.position;
    let mut next = current + velocity;

    // Bounce: an axis that would leave the area moves backwards instead
    if let Some(area) = area {
        if !area.contains_x(next.x) {
            next.x = current.x - velocity.x;
        }
        if !area.contains_y(next.y) {
            next.y = current.y - velocity.y;
        }
    }

    body.previous = current;
    body.position = next;
    body.pending = Vector::ZERO;
    body.kinetic_energy = (body.mass * velocity.length_squared()).min(f64::MAX);
    body.kinetic_energy
}
