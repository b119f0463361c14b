//! Force generators
//!
//! Each generator adds its contribution to the pending increment of the bodies
//! it acts on. Contributions are already scaled by the elapsed time and are
//! added as they are, without dividing by the body's mass.

use std::collections::HashMap;

use crate::geometry::Vector;
use crate::model::{Body, BodyId, Spring};
use crate::params::GRAVITY;
use crate::quadtree::QuadTree;

/// Accumulate the approximate repulsion of every indexed body
///
/// `index` must have been rebuilt from `bodies` in their current order.
pub fn repulsion(index: &QuadTree, bodies: &mut [Body], strength: f64, time: f64) {
    for (slot, body) in bodies.iter_mut().enumerate() {
        let force = index.repulsion_at(slot, body.position, strength, time);
        body.apply(force);
    }
}

/// Force a spring exerts on its first endpoint
///
/// The second endpoint receives the exact negation. A spring stretched past
/// its rest length pulls `from` towards `to`; a compressed one pushes it away.
#[inline]
pub fn spring_force(
    from: Vector,
    to: Vector,
    length_at_rest: f64,
    stiffness: f64,
    time: f64,
) -> Vector {
    let quotient = (from.distance(to) - length_at_rest) * stiffness;
    (to - from) * (quotient * time)
}

/// Accumulate spring forces
///
/// Springs are resolved through `slots` on every call; a spring whose
/// endpoints are not both registered contributes nothing.
pub fn attraction(
    springs: &[Spring],
    bodies: &mut [Body],
    slots: &HashMap<BodyId, usize>,
    time: f64,
) {
    for spring in springs {
        let (Some(&first), Some(&second)) = (slots.get(&spring.id1), slots.get(&spring.id2))
        else {
            continue;
        };
        if first == second {
            continue;
        }
        let force = spring_force(
            bodies[first].position,
            bodies[second].position,
            spring.length_at_rest,
            spring.stiffness,
            time,
        );
        bodies[first].apply(force);
        bodies[second].apply(-force);
    }
}

/// Accumulate the pull towards `center`, scaled by the squared mass
pub fn centripetal(bodies: &mut [Body], center: Vector, coefficient: f64, time: f64) {
    for body in bodies.iter_mut() {
        let pull = (body.position - center) * (coefficient * body.mass * body.mass * time);
        body.apply(-pull);
    }
}

/// Friction opposing `increment`
///
/// On each axis the result points against the increment (a zero component
/// counts as positive) and never exceeds it in magnitude, so friction can stop
/// a body but never send it backwards.
pub fn friction_for(increment: Vector, mass: f64, coefficient: f64, time: f64) -> Vector {
    // NaN falls to zero as well
    let magnitude = (mass * GRAVITY * coefficient * time).max(0.0);
    Vector::new(
        opposing(increment.x, magnitude),
        opposing(increment.y, magnitude),
    )
}

fn opposing(component: f64, magnitude: f64) -> f64 {
    let direction = if component >= 0.0 { 1.0 } else { -1.0 };
    -direction * magnitude.min(component.abs())
}

/// Accumulate friction against the increment each free body is about to apply
pub fn friction(bodies: &mut [Body], coefficient: f64, time: f64) {
    for body in bodies.iter_mut().filter(|b| !b.constrained) {
        let force = friction_for(body.expected_increment(), body.mass, coefficient, time);
        body.apply(force);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Area;

    fn body(id: &str, mass: f64, x: f64, y: f64) -> Body {
        Body::new(id.into(), mass, Vector::new(x, y))
    }

    fn spring(id1: &str, id2: &str, length_at_rest: f64, stiffness: f64) -> Spring {
        Spring {
            id1: id1.into(),
            id2: id2.into(),
            length_at_rest,
            stiffness,
        }
    }

    fn slots(bodies: &[Body]) -> HashMap<BodyId, usize> {
        bodies
            .iter()
            .enumerate()
            .map(|(slot, b)| (b.id.clone(), slot))
            .collect()
    }

    #[test]
    fn stretched_spring_pulls_endpoints_together() {
        let mut bodies = vec![body("a", 1.0, 0.0, 0.0), body("b", 1.0, 100.0, 0.0)];
        let map = slots(&bodies);

        attraction(&[spring("a", "b", 50.0, 0.01)], &mut bodies, &map, 1.0);

        // (100 - 50) * 0.01 * 100 along +x for a, the negation for b
        assert_eq!(bodies[0].pending, Vector::new(50.0, 0.0));
        assert_eq!(bodies[1].pending, Vector::new(-50.0, 0.0));
    }

    #[test]
    fn compressed_spring_pushes_endpoints_apart() {
        let force = spring_force(Vector::ZERO, Vector::new(0.0, 20.0), 50.0, 0.01, 0.5);

        assert!(force.y < 0.0, "a is pushed away from b");
        assert_eq!(force.x, 0.0);
        assert!((force.y + 3.0).abs() < 1e-12);
    }

    #[test]
    fn zero_stiffness_exerts_nothing() {
        let force = spring_force(Vector::ZERO, Vector::new(300.0, 400.0), 50.0, 0.0, 1.0);

        assert_eq!(force.length(), 0.0);
    }

    #[test]
    fn spring_at_rest_length_exerts_nothing() {
        let force = spring_force(Vector::ZERO, Vector::new(30.0, 40.0), 50.0, 0.5, 1.0);

        assert_eq!(force.length(), 0.0);
    }

    #[test]
    fn unresolved_springs_are_skipped() {
        let mut bodies = vec![body("a", 1.0, 0.0, 0.0)];
        let map = slots(&bodies);

        attraction(
            &[spring("a", "ghost", 50.0, 0.01), spring("a", "a", 50.0, 0.01)],
            &mut bodies,
            &map,
            1.0,
        );

        assert_eq!(bodies[0].pending, Vector::ZERO);
    }

    #[test]
    fn centripetal_pulls_towards_center_by_squared_mass() {
        let center = Area::default().center();
        let mut bodies = vec![
            body("light", 1.0, 500.0, 300.0),
            body("heavy", 2.0, 300.0, 300.0),
        ];

        centripetal(&mut bodies, center, 0.01, 1.0);

        assert_eq!(bodies[0].pending, Vector::new(-1.0, 0.0));
        assert_eq!(bodies[1].pending, Vector::new(4.0, 0.0));
    }

    #[test]
    fn friction_opposes_each_axis() {
        let force = friction_for(Vector::new(5.0, -5.0), 1.0, 0.1, 1.0);

        assert_eq!(force, Vector::new(-1.0, 1.0));
    }

    #[test]
    fn friction_never_reverses_an_increment() {
        let increments = [
            Vector::new(0.3, -0.2),
            Vector::new(-1e-9, 7.0),
            Vector::new(0.0, 0.0),
            Vector::new(-100.0, 100.0),
            Vector::new(2.0, -0.0),
        ];
        for increment in increments {
            for coefficient in [0.1, 0.5, 0.9, 5.0] {
                let force = friction_for(increment, 2.0, coefficient, 0.2);
                let after = increment + force;

                assert!(force.x.abs() <= increment.x.abs());
                assert!(force.y.abs() <= increment.y.abs());
                assert!(after.x * increment.x >= 0.0, "x reversed for {increment:?}");
                assert!(after.y * increment.y >= 0.0, "y reversed for {increment:?}");
            }
        }
    }

    #[test]
    fn friction_with_negative_or_nan_time_is_inert() {
        for time in [-1.0, f64::NAN, f64::NEG_INFINITY] {
            let force = friction_for(Vector::new(0.1, -0.3), 1.0, 0.5, time);

            assert_eq!(force, Vector::ZERO, "time {time}");
        }
    }

    #[test]
    fn friction_skips_constrained_bodies() {
        let mut bodies = vec![body("free", 1.0, 10.0, 0.0), body("pinned", 1.0, 10.0, 0.0)];
        for b in &mut bodies {
            b.previous = Vector::new(5.0, 0.0);
        }
        bodies[1].constrained = true;

        friction(&mut bodies, 0.1, 1.0);

        assert_eq!(bodies[0].pending, Vector::new(-1.0, 0.0));
        assert_eq!(bodies[1].pending, Vector::ZERO);
    }

    #[test]
    fn repulsion_is_equal_and_opposite_for_a_pair() {
        let mut bodies = vec![body("a", 1.0, 200.0, 300.0), body("b", 1.0, 600.0, 300.0)];
        let mut index = QuadTree::new(0.5);
        index.rebuild(Area::default(), &bodies);

        repulsion(&index, &mut bodies, 25.0, 1.0);

        assert!(bodies[0].pending.x < 0.0);
        assert_eq!(bodies[0].pending, -bodies[1].pending);
    }
}
