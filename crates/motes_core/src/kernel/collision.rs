//! Iterative sphere-sphere collision resolution
//!
//! Each pass reads the front buffer and writes only particle A's own record
//! into the back buffer, then the buffers swap. A pass therefore sees the
//! complete output of the previous one and never a half-written array.

use super::buffer::DoubleBuffer;
use super::dispatch::fill_and_count;
#[cfg(feature = "metrics")]
use super::dispatch::map_sum;
use super::grid::{Candidates, SpatialGrid};
use super::integrator::confine;
use super::particle::Particle;
use crate::config::{ImpulsePolicy, SimulationParams};
use glam::Vec3;

/// Pairs closer than this are treated as coincident and left alone.
pub const COINCIDENT_DISTANCE: f32 = 0.001;

/// Contact counts from one call to [`CollisionResolver::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// Penetrating pairs seen by each pass, in order.
    pub pass_contacts: Vec<usize>,
    /// Penetrating pairs left after the last pass. Only counted with the
    /// `metrics` feature; 0 otherwise.
    pub residual_contacts: usize,
}

impl CollisionReport {
    /// Contacts found by the first pass, before any correction.
    pub fn initial_contacts(&self) -> usize {
        self.pass_contacts.first().copied().unwrap_or(self.residual_contacts)
    }
}

#[derive(Debug, Clone)]
pub struct CollisionResolver {
    buffer: DoubleBuffer<Particle>,
    grid: SpatialGrid,
}

impl CollisionResolver {
    pub fn new(params: &SimulationParams) -> Self {
        Self {
            buffer: DoubleBuffer::new(),
            grid: SpatialGrid::new(params.world_size, params.cell_size),
        }
    }

    pub fn reconfigure(&mut self, params: &SimulationParams) {
        self.grid.reconfigure(params.world_size, params.cell_size);
    }

    /// Run `collision_iterations` passes over `particles` in place.
    pub fn resolve(&mut self, particles: &mut [Particle], params: &SimulationParams) -> CollisionReport {
        let mut report = CollisionReport::default();
        if particles.len() < 2 {
            return report;
        }

        let max_radius = particles.iter().map(|p| p.radius).fold(0.0f32, f32::max);
        let half = params.half_extent();
        self.buffer.load(particles);

        for _ in 0..params.collision_iterations {
            let (read, write) = self.buffer.split();
            let candidates = broad_phase(&mut self.grid, read, params);
            let touching = fill_and_count(write, params.parallel, |i| {
                resolve_particle(i, read, candidates, max_radius, half, params)
            });
            self.buffer.swap();
            report.pass_contacts.push(touching / 2);
        }

        let settled = self.buffer.front();
        #[cfg(feature = "metrics")]
        {
            let candidates = broad_phase(&mut self.grid, settled, params);
            let touching = map_sum(settled.len(), params.parallel, |i| {
                count_contacts(i, settled, candidates, max_radius)
            });
            report.residual_contacts = touching / 2;
        }

        particles.copy_from_slice(settled);
        report
    }
}

fn broad_phase<'a>(
    grid: &'a mut SpatialGrid,
    particles: &[Particle],
    params: &SimulationParams,
) -> Candidates<'a> {
    if params.use_partitioning {
        grid.rebuild(particles.iter().map(|p| p.position));
        Candidates::Grid(grid)
    } else {
        Candidates::All(particles.len())
    }
}

/// Penetration normal and depth for A against B, if they overlap.
#[inline]
fn contact(a: &Particle, b: &Particle) -> Option<(Vec3, f32)> {
    let delta = b.position - a.position;
    let distance = delta.length();
    let touching = a.radius + b.radius;
    if distance <= COINCIDENT_DISTANCE || !(distance < touching) {
        return None;
    }
    Some((delta / distance, touching - distance))
}

fn resolve_particle(
    index: usize,
    read: &[Particle],
    candidates: Candidates<'_>,
    max_radius: f32,
    half: Vec3,
    params: &SimulationParams,
) -> (Particle, usize) {
    let a = read[index];
    let mut position_delta = Vec3::ZERO;
    let mut velocity_delta = Vec3::ZERO;
    let mut contacts = 0;

    candidates.for_each(a.position, a.radius + max_radius, |j| {
        if j == index {
            return;
        }
        let b = &read[j];
        let Some((normal, penetration)) = contact(&a, b) else {
            return;
        };
        contacts += 1;

        position_delta -= normal * (penetration * b.mass / (a.mass + b.mass));

        let vn = (b.velocity - a.velocity).dot(normal);
        let (elasticity, scale) = match params.impulse_policy {
            ImpulsePolicy::SkipSeparating if vn >= 0.0 => return,
            ImpulsePolicy::SkipSeparating | ImpulsePolicy::Unconditional => {
                (params.collision_elasticity, 1.0)
            }
            ImpulsePolicy::TemperatureScaled => {
                (params.collision_elasticity * params.temperature, params.temperature)
            }
        };
        let impulse = -(1.0 + elasticity) * vn / (1.0 / a.mass + 1.0 / b.mass) * scale;
        velocity_delta -= normal * (impulse / a.mass);
    });

    let mut out = a;
    out.position += position_delta;
    out.velocity += velocity_delta;
    confine(&mut out, half, params.bounce_force);
    (out, contacts)
}

#[cfg(feature = "metrics")]
fn count_contacts(
    index: usize,
    particles: &[Particle],
    candidates: Candidates<'_>,
    max_radius: f32,
) -> usize {
    let a = &particles[index];
    let mut contacts = 0;
    candidates.for_each(a.position, a.radius + max_radius, |j| {
        if j != index && contact(a, &particles[j]).is_some() {
            contacts += 1;
        }
    });
    contacts
}
