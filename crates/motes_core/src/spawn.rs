//! Initial particle placement from a type-weighted spawn plan

use crate::config::{ParticleType, SimulationParams, SpawnSettings};
use crate::error::ConfigError;
use crate::kernel::Particle;
use glam::Vec3;
use rand::Rng;

/// Spawn `spawn_count` particles of each type, in type order.
///
/// Positions are uniform inside the world box shrunk by each type's radius,
/// so every spawned particle starts in wall-contact-free space. Velocity
/// components are uniform in `[-initial_speed, initial_speed]`.
pub fn spawn_particles<R>(
    types: &[ParticleType],
    params: &SimulationParams,
    spawn: &SpawnSettings,
    rng: &mut R,
) -> Result<Vec<Particle>, ConfigError>
where
    R: Rng + ?Sized,
{
    let total: usize = types.iter().map(|t| t.spawn_count).sum();
    if total == 0 {
        return Err(ConfigError::EmptySpawnPlan);
    }

    let half = params.half_extent();
    let mut particles = Vec::with_capacity(total);

    for (type_index, ty) in types.iter().enumerate() {
        let extent = (half - Vec3::splat(ty.radius)).max(Vec3::ZERO);
        for _ in 0..ty.spawn_count {
            let position = Vec3::new(
                uniform_centered(rng, extent.x),
                uniform_centered(rng, extent.y),
                uniform_centered(rng, extent.z),
            );
            let velocity = Vec3::new(
                uniform_centered(rng, spawn.initial_speed),
                uniform_centered(rng, spawn.initial_speed),
                uniform_centered(rng, spawn.initial_speed),
            );
            particles.push(Particle::new(
                position,
                velocity,
                type_index as u32,
                ty.mass,
                ty.radius,
            ));
        }
    }

    tracing::debug!(count = particles.len(), types = types.len(), "Spawned particles");
    Ok(particles)
}

#[inline]
fn uniform_centered<R: Rng + ?Sized>(rng: &mut R, extent: f32) -> f32 {
    let u: f32 = rng.random();
    (2.0 * u - 1.0) * extent
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn types() -> Vec<ParticleType> {
        vec![
            ParticleType::new("a", 1.0, 0.5, 10),
            ParticleType::new("b", 2.0, 1.0, 5),
        ]
    }

    #[test]
    fn spawns_in_type_order_inside_box() {
        let params = SimulationParams {
            world_size: Vec3::new(10.0, 4.0, 6.0),
            ..SimulationParams::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let particles =
            spawn_particles(&types(), &params, &SpawnSettings::default(), &mut rng).unwrap();

        assert_eq!(particles.len(), 15);
        assert!(particles[..10].iter().all(|p| p.type_index == 0 && p.mass == 1.0));
        assert!(particles[10..].iter().all(|p| p.type_index == 1 && p.radius == 1.0));

        let half = params.half_extent();
        for p in &particles {
            let limit = half - Vec3::splat(p.radius);
            assert!(p.position.abs().cmple(limit).all(), "{:?}", p.position);
            assert!(p.velocity.abs().cmple(Vec3::ONE).all());
        }
    }

    #[test]
    fn same_seed_same_particles() {
        let params = SimulationParams::default();
        let spawn = SpawnSettings { initial_speed: 3.0 };
        let a = spawn_particles(&types(), &params, &spawn, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = spawn_particles(&types(), &params, &spawn, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_plan_is_rejected() {
        let mut types = types();
        for t in &mut types {
            t.spawn_count = 0;
        }
        let mut rng = StdRng::seed_from_u64(1);
        let result = spawn_particles(
            &types,
            &SimulationParams::default(),
            &SpawnSettings::default(),
            &mut rng,
        );
        assert_eq!(result, Err(ConfigError::EmptySpawnPlan));
    }
}
