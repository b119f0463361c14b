//! Simulation context and its boundary operations
//!
//! A [`Simulation`] owns the bodies, the springs and the spatial index, and
//! advances them one [`tick`](Simulation::tick) at a time. It has no opinion
//! on when to stop; [`run_until_settled`](Simulation::run_until_settled) is a
//! convenience for callers that just want a converged layout.

use std::collections::HashMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{LayoutError, Result};
use crate::forces;
use crate::geometry::{Area, Vector};
use crate::integrator::integrate;
use crate::model::{Body, BodyId, BodySpec, MAX_BODY_MASS, Spring, SpringSpec, pair_key};
use crate::params::SimulationParameters;
use crate::quadtree::QuadTree;

/// Energy under which a driven run is considered settled
pub const DEFAULT_ENERGY_THRESHOLD: f64 = 0.06;

/// Outcome of [`Simulation::run_until_settled`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Convergence {
    /// Ticks actually run
    pub ticks: usize,
    /// Energy returned by the last tick
    pub energy: f64,
    /// Whether the energy dropped to the threshold within the tick budget
    pub settled: bool,
}

/// A spring whose endpoints both resolve, ready to be drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment<'a> {
    pub id1: &'a BodyId,
    pub from: Vector,
    pub id2: &'a BodyId,
    pub to: Vector,
}

/// Force-directed layout of bodies connected by springs
#[derive(Debug, Clone)]
pub struct Simulation {
    params: SimulationParameters,
    bodies: Vec<Body>,
    /// Body id to its slot in `bodies`
    slots: HashMap<BodyId, usize>,
    springs: Vec<Spring>,
    /// Unordered endpoint pair to its slot in `springs`
    spring_slots: HashMap<(BodyId, BodyId), usize>,
    index: QuadTree,
    rng: ChaCha8Rng,
}

impl Simulation {
    /// Create an empty simulation, validating `params` first
    pub fn new(params: SimulationParameters) -> Result<Self> {
        params.validate()?;
        let rng = match params.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };
        Ok(Self {
            index: QuadTree::new(params.threshold),
            params,
            bodies: Vec::new(),
            slots: HashMap::new(),
            springs: Vec::new(),
            spring_slots: HashMap::new(),
            rng,
        })
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    /// Register a body, or update the one already registered under its id
    ///
    /// On update, the constrained flag always takes the requested value
    /// (absent means free), a requested mass replaces the current one, and
    /// giving both coordinates moves the body. Moving or pinning a body stops
    /// it. New bodies without both coordinates land at a random point of the
    /// placement area.
    pub fn upsert_body(&mut self, spec: BodySpec) -> Result<&Body> {
        let Some(id) = spec.id.clone() else {
            return Err(LayoutError::MissingBodyId { spec });
        };
        if let Some(mass) = spec.mass {
            if !(mass.is_finite() && mass > 0.0) {
                return Err(LayoutError::NonPositiveMass { id, mass });
            }
            if mass > MAX_BODY_MASS {
                return Err(LayoutError::ExcessiveMass { id, mass });
            }
        }
        if !spec.has_finite_coordinates() {
            return Err(LayoutError::NonFinitePosition { spec });
        }
        let constrained = spec.constrained.unwrap_or(false);

        let slot = match self.slots.get(&id) {
            Some(&slot) => {
                let body = &mut self.bodies[slot];
                if let Some(mass) = spec.mass {
                    body.mass = mass;
                }
                body.constrained = constrained;
                if constrained {
                    body.halt();
                }
                if let Some(point) = spec.position() {
                    body.move_to(point);
                }
                slot
            }
            None => {
                let position = match spec.position() {
                    Some(point) => point,
                    None => self.params.placement_area().random_point(&mut self.rng),
                };
                let mass = spec.mass.unwrap_or(self.params.body_mass);
                let mut body = Body::new(id.clone(), mass, position);
                body.constrained = constrained;
                tracing::trace!(%id, x = position.x, y = position.y, "registered body");

                let slot = self.bodies.len();
                self.bodies.push(body);
                self.slots.insert(id, slot);
                slot
            }
        };
        Ok(&self.bodies[slot])
    }

    /// Register a spring, or update the one joining the same two bodies
    ///
    /// Endpoints may name bodies that are not registered yet; such a spring
    /// exerts nothing until both exist.
    pub fn upsert_spring(&mut self, spec: SpringSpec) -> Result<&Spring> {
        let (Some(id1), Some(id2)) = (spec.id1.clone(), spec.id2.clone()) else {
            return Err(LayoutError::MissingSpringEndpoint { spec });
        };
        let stiffness = spec.stiffness.unwrap_or(self.params.spring_stiffness);
        let length_at_rest = spec.length_at_rest.unwrap_or(self.params.spring_length);

        let key = pair_key(&id1, &id2);
        let slot = match self.spring_slots.get(&key) {
            Some(&slot) => {
                let spring = &mut self.springs[slot];
                spring.stiffness = stiffness;
                spring.length_at_rest = length_at_rest;
                slot
            }
            None => {
                let slot = self.springs.len();
                self.springs.push(Spring {
                    id1,
                    id2,
                    length_at_rest,
                    stiffness,
                });
                self.spring_slots.insert(key, slot);
                slot
            }
        };
        Ok(&self.springs[slot])
    }

    /// Move a body to `point` and pin it there
    pub fn reposition(&mut self, id: &BodyId, point: Vector) -> Result<()> {
        let slot = self.slot_of(id)?;
        if !point.is_finite() {
            let spec = BodySpec::new(id.clone()).at(point.x, point.y);
            return Err(LayoutError::NonFinitePosition { spec });
        }
        let body = &mut self.bodies[slot];
        body.move_to(point);
        body.constrained = true;
        Ok(())
    }

    /// Remove a body, returning it
    ///
    /// Springs that reference it stay registered and resume pulling if a
    /// body with the same id is registered again.
    pub fn remove_body(&mut self, id: &BodyId) -> Result<Body> {
        let slot = self.slot_of(id)?;
        self.slots.remove(id);
        let body = self.bodies.swap_remove(slot);
        if let Some(moved) = self.bodies.get(slot) {
            self.slots.insert(moved.id.clone(), slot);
        }
        tracing::debug!(%id, "removed body");
        Ok(body)
    }

    fn slot_of(&self, id: &BodyId) -> Result<usize> {
        self.slots
            .get(id)
            .copied()
            .ok_or_else(|| LayoutError::UnknownBody(id.clone()))
    }

    /// Advance the layout by `elapsed` time units and return the kinetic energy
    ///
    /// Friction is computed from the step that was just taken and then
    /// integrated on its own, so every tick moves each free body twice. The
    /// energy returned is the one of that second, friction-only pass.
    ///
    /// An `elapsed` time that is negative or not finite leaves the layout
    /// untouched and returns the energy of the previous tick.
    pub fn tick(&mut self, elapsed: f64) -> f64 {
        if !(elapsed.is_finite() && elapsed >= 0.0) {
            tracing::warn!(elapsed, "ignoring tick with invalid elapsed time");
            return self.kinetic_energy();
        }
        let params = &self.params;

        let root = params
            .area
            .or_else(|| Area::fit(self.bodies.iter().map(|b| b.position)));
        match root {
            Some(area) => {
                self.index.rebuild(area, &self.bodies);
            }
            None => self.index.clear(),
        }

        forces::repulsion(&self.index, &mut self.bodies, params.repulsion, elapsed);
        forces::attraction(&self.springs, &mut self.bodies, &self.slots, elapsed);
        forces::centripetal(
            &mut self.bodies,
            params.center(),
            params.centripetal,
            elapsed,
        );
        integrate(&mut self.bodies, params.speed_limit, params.area);

        forces::friction(&mut self.bodies, params.friction, elapsed);
        let energy = integrate(&mut self.bodies, params.speed_limit, params.area);

        tracing::trace!(elapsed, energy, bodies = self.bodies.len(), "tick");
        energy
    }

    /// Tick until the energy drops to `energy_threshold` or `max_ticks` ran
    pub fn run_until_settled(
        &mut self,
        time_step: f64,
        energy_threshold: f64,
        max_ticks: usize,
    ) -> Convergence {
        let mut report = Convergence {
            ticks: 0,
            energy: self.kinetic_energy(),
            settled: false,
        };

        while report.ticks < max_ticks {
            report.energy = self.tick(time_step);
            report.ticks += 1;
            if !report.energy.is_finite() {
                tracing::warn!(
                    ticks = report.ticks,
                    energy = report.energy,
                    "energy is not finite"
                );
                break;
            }
            if report.energy <= energy_threshold {
                report.settled = true;
                break;
            }
        }

        if report.settled {
            tracing::info!(ticks = report.ticks, energy = report.energy, "layout settled");
        } else {
            tracing::info!(
                ticks = report.ticks,
                energy = report.energy,
                "tick budget exhausted before the layout settled"
            );
        }
        report
    }

    /// Change the simulation area and scatter every body inside it
    ///
    /// Bodies are relocated at random and lose their motion; pinned bodies
    /// stay pinned at their new location.
    pub fn resize(&mut self, area: Area) -> Result<()> {
        let params = SimulationParameters {
            area: Some(area),
            ..self.params.clone()
        };
        params.validate()?;
        self.params = params;

        for body in &mut self.bodies {
            let point = area.random_point(&mut self.rng);
            body.move_to(point);
        }
        tracing::debug!(
            x = area.min.x,
            y = area.min.y,
            width = area.width(),
            height = area.height(),
            bodies = self.bodies.len(),
            "resized simulation area"
        );
        Ok(())
    }

    pub fn position_of(&self, id: &BodyId) -> Option<Vector> {
        self.body(id).map(|b| b.position)
    }

    pub fn body(&self, id: &BodyId) -> Option<&Body> {
        self.slots.get(id).map(|&slot| &self.bodies[slot])
    }

    /// Every body position, ordered by id
    pub fn positions(&self) -> Vec<(BodyId, Vector)> {
        let mut positions: Vec<_> = self
            .bodies
            .iter()
            .map(|b| (b.id.clone(), b.position))
            .collect();
        positions.sort_by(|a, b| a.0.cmp(&b.0));
        positions
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn springs(&self) -> &[Spring] {
        &self.springs
    }

    /// Springs whose endpoints are both registered, with their positions
    pub fn segments(&self) -> impl Iterator<Item = Segment<'_>> + '_ {
        self.springs.iter().filter_map(|spring| {
            let from = self.position_of(&spring.id1)?;
            let to = self.position_of(&spring.id2)?;
            Some(Segment {
                id1: &spring.id1,
                from,
                id2: &spring.id2,
                to,
            })
        })
    }

    /// Total kinetic energy of the last integration pass
    pub fn kinetic_energy(&self) -> f64 {
        self.bodies.iter().map(|b| b.kinetic_energy).sum()
    }

    /// Spatial index as built by the last tick
    pub fn index(&self) -> &QuadTree {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}
