//! Per-tick simulation pipeline
//!
//! grid rebuild → forces → integrate → collide, each a data-parallel pass
//! separated by a barrier. [`Simulation`] owns the buffers and runs the passes
//! in order.

mod buffer;
mod collision;
mod dispatch;
mod forces;
mod grid;
mod integrator;
mod interaction;
mod molecular;
mod particle;
mod simulation;

pub use buffer::DoubleBuffer;
pub use collision::{CollisionReport, CollisionResolver, COINCIDENT_DISTANCE};
pub use forces::{ForceEvaluator, ForceLaw, InverseSquare, PairContext};
pub use grid::{Candidates, SpatialGrid, MAX_CELLS_PER_AXIS};
pub use integrator::integrate;
pub use interaction::InteractionTable;
pub use molecular::{BondRule, LennardJones, MolecularLaw, MolecularSettings};
pub use particle::Particle;
pub use simulation::{Simulation, SimulationState, TickStats};
