//! Semi-implicit Euler step with per-axis reflective walls

use super::particle::Particle;
use crate::config::SimulationParams;
use crate::math::clamp_magnitude;
use glam::Vec3;
use rayon::prelude::*;

/// Advance every particle by `dt` using the forces from this tick.
///
/// Velocity is updated and damped before position, so the position step
/// uses the post-damping velocity.
pub fn integrate(particles: &mut [Particle], forces: &[Vec3], params: &SimulationParams, dt: f32) {
    debug_assert_eq!(particles.len(), forces.len());
    let half = params.half_extent();
    let step = |(particle, force): (&mut Particle, &Vec3)| {
        step_particle(particle, *force, params, dt);
        confine(particle, half, params.bounce_force);
    };

    if params.parallel {
        particles.par_iter_mut().zip(forces.par_iter()).for_each(step);
    } else {
        particles.iter_mut().zip(forces.iter()).for_each(step);
    }
}

#[inline]
fn step_particle(particle: &mut Particle, force: Vec3, params: &SimulationParams, dt: f32) {
    let acceleration = clamp_magnitude(force / particle.mass, params.max_acceleration);
    let velocity = (particle.velocity + acceleration * dt) * params.damping;
    particle.velocity = clamp_magnitude(velocity, params.max_velocity);
    particle.position += particle.velocity * dt;
}

/// Keep the particle's sphere inside the box centred at the origin.
///
/// Each axis is handled on its own: a particle past `half - radius` is put
/// back on the wall and that velocity component is reversed and scaled by
/// `bounce`.
#[inline]
pub(crate) fn confine(particle: &mut Particle, half: Vec3, bounce: f32) {
    let limit = (half - Vec3::splat(particle.radius)).max(Vec3::ZERO);
    for axis in 0..3 {
        let p = particle.position[axis];
        if p > limit[axis] {
            particle.position[axis] = limit[axis];
            particle.velocity[axis] = -particle.velocity[axis] * bounce;
        } else if p < -limit[axis] {
            particle.position[axis] = -limit[axis];
            particle.velocity[axis] = -particle.velocity[axis] * bounce;
        }
    }
}
