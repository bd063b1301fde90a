//! Motes Core
//!
//! The simulation kernel for typed particle interaction:
//! - Spatial partitioning (uniform bucket grid)
//! - Directional interaction table
//! - Pairwise force evaluation with swappable force laws
//! - Semi-implicit Euler integration with reflective walls
//! - Double-buffered iterative collision resolution
//!
//! Hosts build a [`SimulationConfig`], construct a [`Simulation`] with an
//! injected random source, call [`Simulation::advance`] once per tick and read
//! [`Simulation::particles`] between ticks.

pub mod config;
pub mod error;
pub mod kernel;
pub mod math;
pub mod spawn;
pub mod time;

pub use config::{
    ForceModel, ImpulsePolicy, InteractionRule, ParticleType, SimulationConfig, SimulationParams,
    SpawnSettings,
};
pub use error::ConfigError;
pub use glam;
pub use kernel::{
    BondRule, CollisionResolver, ForceEvaluator, ForceLaw, InteractionTable, LennardJones,
    MolecularSettings, Particle, Simulation, SimulationState, SpatialGrid, TickStats,
};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
