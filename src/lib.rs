//! quadforce - force-directed layout of weighted graphs in two dimensions.
//!
//! Bodies repel each other through a Barnes-Hut quadtree, springs pull
//! connected bodies towards their rest length, and friction plus a
//! centripetal pull let the layout settle. A [`Simulation`] is advanced one
//! tick at a time; each tick returns the kinetic energy left in the system.
//!
//! ```
//! use quadforce::{BodySpec, Simulation, SimulationParameters, SpringSpec};
//!
//! let mut simulation = Simulation::new(SimulationParameters::default().with_seed(7))?;
//! simulation.upsert_body(BodySpec::new("a").at(300.0, 300.0))?;
//! simulation.upsert_body(BodySpec::new("b").at(500.0, 300.0))?;
//! simulation.upsert_spring(SpringSpec::new("a", "b").with_stiffness(0.01))?;
//!
//! let energy = simulation.tick(0.2);
//! assert!(energy.is_finite());
//! # Ok::<(), quadforce::LayoutError>(())
//! ```

pub mod error;
pub mod forces;
pub mod geometry;
pub mod integrator;
pub mod io;
pub mod model;
pub mod params;
pub mod quadtree;
pub mod simulation;

pub use error::{LayoutError, Result};
pub use geometry::{Area, Vector};
pub use io::{GraphDocument, IoError, IoResult, LayoutDocument};
pub use model::{Body, BodyId, BodySpec, Spring, SpringSpec};
pub use params::SimulationParameters;
pub use quadtree::{QuadTree, brute_force_repulsion};
pub use simulation::{Convergence, DEFAULT_ENERGY_THRESHOLD, Segment, Simulation};
