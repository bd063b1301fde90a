use super::collision::CollisionResolver;
use super::forces::ForceEvaluator;
use super::grid::{Candidates, SpatialGrid};
use super::integrator::integrate;
use super::interaction::InteractionTable;
use super::particle::Particle;
use crate::config::{
    validate_types, ForceModel, InteractionRule, ParticleType, SimulationConfig, SimulationParams,
    SpawnSettings,
};
use crate::error::ConfigError;
use crate::spawn::spawn_particles;
use crate::time::SimulationTime;
use glam::Vec3;
use motes_metrics::{time_stage, StageProfiler};
use rand::Rng;

/// Particle array plus the clock, as seen by readers between ticks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationState {
    pub particles: Vec<Particle>,
    pub time: SimulationTime,
}

/// Summary of the most recent tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickStats {
    pub tick: u64,
    /// Penetrating pairs found by the first collision pass.
    pub contacts: usize,
    /// Penetrating pairs still present after the last collision pass.
    /// Only counted with the `metrics` feature.
    pub residual_contacts: usize,
    /// Particles outside the world box when the grid was rebuilt.
    pub dropped_from_grid: usize,
    pub kinetic_energy: f64,
    pub max_speed: f32,
}

/// Owns the particle array and runs the per-tick pipeline.
///
/// `advance` takes `&mut self`, so readers only ever see the state between
/// ticks. Configuration can be replaced between ticks through the `set_*`
/// methods, which validate before swapping anything in.
#[derive(Debug)]
pub struct Simulation {
    types: Vec<ParticleType>,
    rules: Vec<InteractionRule>,
    params: SimulationParams,
    force_model: ForceModel,
    spawn: SpawnSettings,

    table: InteractionTable,
    evaluator: ForceEvaluator,
    grid: SpatialGrid,
    collisions: CollisionResolver,
    forces: Vec<Vec3>,

    state: SimulationState,
    stats: TickStats,
    profiler: StageProfiler,
}

impl Simulation {
    /// Validate `config` and spawn its particles with the given random source.
    pub fn new<R>(config: SimulationConfig, rng: &mut R) -> Result<Self, ConfigError>
    where
        R: Rng + ?Sized,
    {
        config.validate()?;
        let particles = spawn_particles(&config.types, &config.params, &config.spawn, rng)?;
        Self::build(config, particles)
    }

    /// Validate `config` and adopt host-placed particles as-is.
    ///
    /// The type table's spawn counts are ignored.
    pub fn from_particles(
        config: SimulationConfig,
        particles: Vec<Particle>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        validate_particles(&particles, config.types.len(), config.params.world_size)?;
        Self::build(config, particles)
    }

    fn build(config: SimulationConfig, particles: Vec<Particle>) -> Result<Self, ConfigError> {
        let SimulationConfig {
            types,
            rules,
            params,
            force_model,
            spawn,
        } = config;

        let table = InteractionTable::from_rules(types.len(), &rules)?;
        let evaluator = ForceEvaluator::new(&force_model, types.len())?;
        let grid = SpatialGrid::new(params.world_size, params.cell_size);
        let collisions = CollisionResolver::new(&params);
        let forces = vec![Vec3::ZERO; particles.len()];

        tracing::info!(
            particles = particles.len(),
            types = types.len(),
            rules = rules.len(),
            grid_dims = ?grid.dims(),
            "Simulation created"
        );

        Ok(Self {
            types,
            rules,
            params,
            force_model,
            spawn,
            table,
            evaluator,
            grid,
            collisions,
            forces,
            state: SimulationState {
                particles,
                time: SimulationTime::new(),
            },
            stats: TickStats::default(),
            profiler: StageProfiler::new(),
        })
    }

    /// Run one tick of `dt` seconds.
    ///
    /// Non-positive or non-finite `dt` leaves the state untouched.
    pub fn advance(&mut self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            tracing::warn!(dt, "Ignoring tick with invalid time step");
            return;
        }
        self.profiler.begin_tick();
        let count = self.state.particles.len();

        let dropped = time_stage!(self.profiler, "grid", {
            if self.params.use_partitioning {
                self.grid
                    .rebuild(self.state.particles.iter().map(|p| p.position));
                self.grid.dropped()
            } else {
                0
            }
        });

        time_stage!(self.profiler, "forces", {
            let candidates = if self.params.use_partitioning {
                Candidates::Grid(&self.grid)
            } else {
                Candidates::All(count)
            };
            self.evaluator.evaluate(
                &self.state.particles,
                &self.table,
                candidates,
                &self.params,
                &mut self.forces,
            );
        });

        time_stage!(self.profiler, "integrate", {
            integrate(&mut self.state.particles, &self.forces, &self.params, dt);
        });

        let report = time_stage!(self.profiler, "collide", {
            self.collisions
                .resolve(&mut self.state.particles, &self.params)
        });

        self.state.time.advance_tick(dt);

        let (kinetic_energy, max_speed) = self
            .state
            .particles
            .iter()
            .fold((0.0f64, 0.0f32), |(energy, speed), p| {
                (energy + p.kinetic_energy(), speed.max(p.velocity.length()))
            });

        self.stats = TickStats {
            tick: self.state.time.tick_count(),
            contacts: report.initial_contacts(),
            residual_contacts: report.residual_contacts,
            dropped_from_grid: dropped,
            kinetic_energy,
            max_speed,
        };

        if dropped > 0 {
            tracing::debug!(tick = self.stats.tick, dropped, "Particles outside grid bounds");
        }
        tracing::trace!(
            tick = self.stats.tick,
            contacts = self.stats.contacts,
            residual = self.stats.residual_contacts,
            kinetic_energy = self.stats.kinetic_energy,
            "Tick complete"
        );
    }

    // ------------------------------------------------------------------
    // Readout
    // ------------------------------------------------------------------

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.state.particles
    }

    /// The particle array as raw bytes, ready for a GPU upload.
    #[inline]
    pub fn particle_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.state.particles)
    }

    #[inline]
    pub fn stats(&self) -> TickStats {
        self.stats
    }

    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.state.time.tick_count()
    }

    /// Simulated seconds since creation.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.state.time.elapsed()
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn types(&self) -> &[ParticleType] {
        &self.types
    }

    pub fn rules(&self) -> &[InteractionRule] {
        &self.rules
    }

    pub fn table(&self) -> &InteractionTable {
        &self.table
    }

    pub fn force_model(&self) -> &ForceModel {
        &self.force_model
    }

    /// Stage timings; all zero unless built with the `metrics` feature.
    pub fn profiler(&self) -> &StageProfiler {
        &self.profiler
    }

    /// Current configuration, suitable for saving as a preset.
    pub fn config(&self) -> SimulationConfig {
        SimulationConfig {
            types: self.types.clone(),
            rules: self.rules.clone(),
            params: self.params.clone(),
            force_model: self.force_model.clone(),
            spawn: self.spawn.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Between-tick reconfiguration
    // ------------------------------------------------------------------

    /// Replace the global parameters. Rejected parameters leave the old ones in place.
    pub fn set_params(&mut self, params: SimulationParams) -> Result<(), ConfigError> {
        params.validate()?;
        validate_types(&self.types, &params)?;
        validate_fit(&self.state.particles, params.world_size)?;

        if params.world_size != self.params.world_size || params.cell_size != self.params.cell_size {
            self.grid.reconfigure(params.world_size, params.cell_size);
            self.collisions.reconfigure(&params);
        }
        self.params = params;
        tracing::info!("Simulation parameters updated");
        Ok(())
    }

    /// Replace the interaction rules and rebuild the table.
    pub fn set_rules(&mut self, rules: Vec<InteractionRule>) -> Result<(), ConfigError> {
        self.table = InteractionTable::from_rules(self.types.len(), &rules)?;
        tracing::info!(rules = rules.len(), "Interaction table rebuilt");
        self.rules = rules;
        Ok(())
    }

    pub fn set_force_model(&mut self, model: ForceModel) -> Result<(), ConfigError> {
        self.evaluator = ForceEvaluator::new(&model, self.types.len())?;
        self.force_model = model;
        tracing::info!(model = ?self.force_model, "Force model changed");
        Ok(())
    }
}

fn validate_particles(
    particles: &[Particle],
    type_count: usize,
    world_size: Vec3,
) -> Result<(), ConfigError> {
    for (index, p) in particles.iter().enumerate() {
        if p.type_index as usize >= type_count {
            return Err(ConfigError::ParticleTypeOutOfRange {
                particle: index,
                type_index: p.type_index,
                type_count,
            });
        }
        if !(p.mass.is_finite() && p.mass > 0.0) {
            return Err(ConfigError::InvalidParticle {
                particle: index,
                reason: "mass must be finite and > 0",
            });
        }
        if !(p.radius.is_finite() && p.radius > 0.0) {
            return Err(ConfigError::InvalidParticle {
                particle: index,
                reason: "radius must be finite and > 0",
            });
        }
        if !(p.position.is_finite() && p.velocity.is_finite()) {
            return Err(ConfigError::InvalidParticle {
                particle: index,
                reason: "position and velocity must be finite",
            });
        }
    }
    validate_fit(particles, world_size)
}

/// Every sphere must fit inside the box.
fn validate_fit(particles: &[Particle], world_size: Vec3) -> Result<(), ConfigError> {
    let limit = world_size.min_element() * 0.5;
    match particles.iter().position(|p| p.radius > limit) {
        Some(particle) => Err(ConfigError::ParticleExceedsWorld {
            particle,
            radius: particles[particle].radius,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImpulsePolicy;
    use crate::kernel::molecular::{BondRule, MolecularSettings};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_config(parallel: bool) -> SimulationConfig {
        SimulationConfig {
            types: vec![
                ParticleType::new("a", 1.0, 0.3, 60),
                ParticleType::new("b", 2.0, 0.5, 40),
            ],
            rules: vec![
                InteractionRule::new(0, 1, 0.8),
                InteractionRule::new(1, 0, -0.5),
                InteractionRule::new(1, 1, 0.3),
            ],
            params: SimulationParams {
                world_size: Vec3::splat(20.0),
                cell_size: 4.0,
                interaction_radius: 4.0,
                parallel,
                ..SimulationParams::default()
            },
            ..SimulationConfig::default()
        }
    }

    fn two_types() -> Vec<ParticleType> {
        vec![
            ParticleType::new("a", 1.0, 0.1, 0),
            ParticleType::new("b", 1.0, 0.1, 0),
        ]
    }

    fn run(config: SimulationConfig, seed: u64, ticks: usize) -> Vec<Particle> {
        let mut sim = Simulation::new(config, &mut StdRng::seed_from_u64(seed)).unwrap();
        for _ in 0..ticks {
            sim.advance(1.0 / 60.0);
        }
        sim.particles().to_vec()
    }

    #[test]
    fn same_seed_is_bit_identical() {
        let a = run(small_config(true), 11, 40);
        let b = run(small_config(true), 11, 40);
        assert_eq!(bytemuck::cast_slice::<Particle, u8>(&a), bytemuck::cast_slice::<Particle, u8>(&b));
    }

    #[test]
    fn parallel_matches_sequential() {
        let a = run(small_config(true), 5, 40);
        let b = run(small_config(false), 5, 40);
        assert_eq!(bytemuck::cast_slice::<Particle, u8>(&a), bytemuck::cast_slice::<Particle, u8>(&b));
    }

    #[test]
    fn free_particles_move_in_straight_lines() {
        let config = SimulationConfig {
            types: two_types(),
            rules: Vec::new(),
            params: SimulationParams {
                damping: 1.0,
                bounce_force: 1.0,
                ..SimulationParams::default()
            },
            ..SimulationConfig::default()
        };
        let start = vec![
            Particle::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(1.0, 0.5, 0.0), 0, 1.0, 0.1),
            Particle::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(0.0, -1.0, 2.0), 1, 1.0, 0.1),
        ];
        let mut sim = Simulation::from_particles(config, start.clone()).unwrap();
        let dt = 0.01;
        for _ in 0..100 {
            sim.advance(dt);
        }
        for (now, then) in sim.particles().iter().zip(&start) {
            assert_eq!(now.velocity, then.velocity);
            let expected = then.position + then.velocity * 1.0;
            assert!((now.position - expected).length() < 1.0e-4, "{:?}", now.position);
        }
        assert!((sim.elapsed() - 1.0).abs() < 1.0e-6);
    }

    #[test]
    fn particles_stay_in_the_box() {
        let mut config = small_config(true);
        config.spawn.initial_speed = 15.0;
        config.params.bounce_force = 1.0;
        config.params.max_velocity = 40.0;
        let mut sim = Simulation::new(config, &mut StdRng::seed_from_u64(3)).unwrap();
        let half = sim.params().half_extent();
        for _ in 0..120 {
            sim.advance(1.0 / 30.0);
            for p in sim.particles() {
                assert!(p.position.abs().cmple(half).all(), "{:?}", p.position);
            }
        }
        assert_eq!(sim.stats().dropped_from_grid, 0);
    }

    #[test]
    fn overlapping_pair_is_pushed_apart() {
        let config = SimulationConfig {
            types: vec![ParticleType::new("a", 1.0, 0.5, 0)],
            rules: Vec::new(),
            params: SimulationParams {
                collision_elasticity: 0.0,
                collision_iterations: 3,
                ..SimulationParams::default()
            },
            ..SimulationConfig::default()
        };
        let particles = vec![
            Particle::new(Vec3::ZERO, Vec3::ZERO, 0, 1.0, 0.5),
            Particle::new(Vec3::new(0.3, 0.2, 0.0), Vec3::ZERO, 0, 1.0, 0.5),
        ];
        let mut sim = Simulation::from_particles(config, particles).unwrap();
        sim.advance(0.016);

        let p = sim.particles();
        assert!(p[0].position.distance(p[1].position) >= 1.0 - 1.0e-4);
        assert_eq!(sim.stats().contacts, 1);
    }

    #[test]
    fn directional_rule_moves_only_the_source() {
        let config = SimulationConfig {
            types: two_types(),
            rules: vec![InteractionRule::new(0, 1, 1.0)],
            params: SimulationParams {
                interaction_radius: 10.0,
                min_distance: 0.1,
                max_force: 1000.0,
                ..SimulationParams::default()
            },
            ..SimulationConfig::default()
        };
        let particles = vec![
            Particle::new(Vec3::ZERO, Vec3::ZERO, 0, 1.0, 0.1),
            Particle::new(Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO, 1, 1.0, 0.1),
        ];
        let mut sim = Simulation::from_particles(config, particles).unwrap();
        sim.advance(0.016);

        let p = sim.particles();
        assert!(p[0].velocity.x > 0.0);
        assert_eq!(p[0].velocity.y, 0.0);
        assert!(p[0].position.x > 0.0);
        assert_eq!(p[1].velocity, Vec3::ZERO);
        assert_eq!(p[1].position, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn damping_applies_before_position_step() {
        let config = SimulationConfig {
            types: two_types(),
            rules: Vec::new(),
            params: SimulationParams {
                damping: 0.9,
                ..SimulationParams::default()
            },
            ..SimulationConfig::default()
        };
        let particles = vec![Particle::new(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 0, 1.0, 0.1)];
        let mut sim = Simulation::from_particles(config, particles).unwrap();
        sim.advance(1.0);

        assert_eq!(sim.particles()[0].velocity, Vec3::new(9.0, 0.0, 0.0));
        assert_eq!(sim.particles()[0].position, Vec3::new(9.0, 0.0, 0.0));
    }

    #[test]
    fn invalid_time_steps_are_ignored() {
        let mut sim = Simulation::new(small_config(false), &mut StdRng::seed_from_u64(1)).unwrap();
        let before = sim.particles().to_vec();
        sim.advance(0.0);
        sim.advance(-1.0);
        sim.advance(f32::NAN);
        sim.advance(f32::INFINITY);
        assert_eq!(sim.tick_count(), 0);
        assert_eq!(sim.particles(), before.as_slice());
    }

    #[test]
    fn brute_force_matches_grid_for_first_tick() {
        let gridded = run(small_config(false), 9, 1);
        let mut config = small_config(false);
        config.params.use_partitioning = false;
        let brute = run(config, 9, 1);
        for (a, b) in gridded.iter().zip(&brute) {
            assert!((a.position - b.position).length() < 1.0e-4);
        }
    }

    #[test]
    fn rejected_params_keep_the_old_ones() {
        let mut sim = Simulation::new(small_config(false), &mut StdRng::seed_from_u64(1)).unwrap();
        let bad = SimulationParams {
            damping: 1.5,
            ..sim.params().clone()
        };
        assert!(sim.set_params(bad).is_err());
        assert_eq!(sim.params().damping, 0.98);

        let good = SimulationParams {
            cell_size: 0.0,
            impulse_policy: ImpulsePolicy::Unconditional,
            ..sim.params().clone()
        };
        sim.set_params(good).unwrap();
        sim.advance(0.016);
        assert_eq!(sim.tick_count(), 1);
        assert_eq!(sim.params().impulse_policy, ImpulsePolicy::Unconditional);
    }

    #[test]
    fn set_rules_rebuilds_the_table() {
        let mut sim = Simulation::new(small_config(false), &mut StdRng::seed_from_u64(1)).unwrap();
        sim.set_rules(vec![InteractionRule::new(1, 1, -2.0)]).unwrap();
        assert_eq!(sim.table().coefficient(1, 1), -2.0);
        assert_eq!(sim.table().coefficient(0, 1), 0.0);

        let err = sim.set_rules(vec![InteractionRule::new(0, 9, 1.0)]);
        assert!(err.is_err());
        assert_eq!(sim.table().coefficient(1, 1), -2.0);
        assert_eq!(sim.rules().len(), 1);
    }

    #[test]
    fn molecular_model_stays_finite() {
        let mut sim = Simulation::new(small_config(true), &mut StdRng::seed_from_u64(2)).unwrap();
        let model = ForceModel::Molecular(MolecularSettings {
            bonds: vec![BondRule::new(0, 1, 5.0, 1.0)],
            ..MolecularSettings::default()
        });
        sim.set_force_model(model).unwrap();
        for _ in 0..30 {
            sim.advance(1.0 / 60.0);
        }
        assert!(sim
            .particles()
            .iter()
            .all(|p| p.position.is_finite() && p.velocity.is_finite()));
        assert!(sim.stats().kinetic_energy.is_finite());
    }

    #[test]
    fn host_particles_are_validated() {
        let config = SimulationConfig {
            types: two_types(),
            rules: Vec::new(),
            ..SimulationConfig::default()
        };
        let bad_type = vec![Particle::new(Vec3::ZERO, Vec3::ZERO, 2, 1.0, 0.1)];
        assert!(matches!(
            Simulation::from_particles(config.clone(), bad_type),
            Err(ConfigError::ParticleTypeOutOfRange { particle: 0, type_index: 2, .. })
        ));

        let bad_mass = vec![Particle::new(Vec3::ZERO, Vec3::ZERO, 0, 0.0, 0.1)];
        assert!(matches!(
            Simulation::from_particles(config.clone(), bad_mass),
            Err(ConfigError::InvalidParticle { particle: 0, .. })
        ));

        let small_world = SimulationConfig {
            params: SimulationParams {
                world_size: Vec3::splat(2.0),
                cell_size: 1.0,
                ..SimulationParams::default()
            },
            ..config
        };
        let too_big = vec![
            Particle::new(Vec3::ZERO, Vec3::ZERO, 0, 1.0, 0.1),
            Particle::new(Vec3::ZERO, Vec3::ZERO, 1, 1.0, 5.0),
        ];
        assert!(matches!(
            Simulation::from_particles(small_world, too_big),
            Err(ConfigError::ParticleExceedsWorld { particle: 1, .. })
        ));
    }

    #[test]
    fn shrinking_the_world_checks_live_particles() {
        let config = SimulationConfig {
            types: two_types(),
            rules: Vec::new(),
            ..SimulationConfig::default()
        };
        let particles = vec![Particle::new(Vec3::ZERO, Vec3::ZERO, 0, 1.0, 3.0)];
        let mut sim = Simulation::from_particles(config, particles).unwrap();
        let old_world = sim.params().world_size;

        let shrunk = SimulationParams {
            world_size: Vec3::splat(4.0),
            cell_size: 1.0,
            ..sim.params().clone()
        };
        assert!(matches!(
            sim.set_params(shrunk),
            Err(ConfigError::ParticleExceedsWorld { particle: 0, .. })
        ));
        assert_eq!(sim.params().world_size, old_world);

        let roomy = SimulationParams {
            world_size: Vec3::splat(8.0),
            cell_size: 1.0,
            ..sim.params().clone()
        };
        sim.set_params(roomy).unwrap();
        assert_eq!(sim.params().world_size, Vec3::splat(8.0));
    }

    #[test]
    fn readout_and_stats() {
        let mut sim = Simulation::new(small_config(true), &mut StdRng::seed_from_u64(8)).unwrap();
        assert_eq!(sim.particle_bytes().len(), 100 * std::mem::size_of::<Particle>());
        sim.advance(0.02);
        sim.advance(0.02);

        let stats = sim.stats();
        assert_eq!(stats.tick, 2);
        assert!(stats.kinetic_energy > 0.0);
        assert!(stats.max_speed.is_finite() && stats.max_speed > 0.0);
        assert_eq!(sim.config().types, sim.types());
    }
}
