//! Pairwise force evaluation
//!
//! For every particle A, each candidate B within `interaction_radius` adds
//! `safe_normalize(B - A) * magnitude` to A's force. The pass only reads the
//! particle array and writes A's own slot of a separate force buffer, so it
//! runs as a parallel map over particle indices.

use super::dispatch::for_each_indexed;
use super::grid::Candidates;
use super::interaction::InteractionTable;
use super::molecular::MolecularLaw;
use super::particle::Particle;
use crate::config::{ForceModel, SimulationParams};
use crate::error::ConfigError;
use crate::math::safe_normalize;
use glam::Vec3;

/// Everything a force law may look at for one ordered pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairContext {
    pub source_type: usize,
    pub target_type: usize,
    /// Interaction table entry for `(source_type, target_type)`.
    pub coefficient: f32,
    /// True separation.
    pub distance: f32,
    /// Separation floored to `min_distance`.
    pub clamped_distance: f32,
}

/// Signed force magnitude along A to B. Positive attracts.
///
/// The evaluator clamps the result to `±max_force`; laws need not.
pub trait ForceLaw: Send + Sync {
    fn magnitude(&self, pair: &PairContext, params: &SimulationParams) -> f32;
}

/// `coefficient * interaction_strength / d²` with `d` floored to `min_distance`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InverseSquare;

impl ForceLaw for InverseSquare {
    #[inline]
    fn magnitude(&self, pair: &PairContext, params: &SimulationParams) -> f32 {
        let d = pair.clamped_distance;
        pair.coefficient * params.interaction_strength / (d * d)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ActiveLaw {
    InverseSquare(InverseSquare),
    Molecular(MolecularLaw),
}

impl ForceLaw for ActiveLaw {
    #[inline]
    fn magnitude(&self, pair: &PairContext, params: &SimulationParams) -> f32 {
        match self {
            ActiveLaw::InverseSquare(law) => law.magnitude(pair, params),
            ActiveLaw::Molecular(law) => law.magnitude(pair, params),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForceEvaluator {
    law: ActiveLaw,
}

impl Default for ForceEvaluator {
    fn default() -> Self {
        Self {
            law: ActiveLaw::InverseSquare(InverseSquare),
        }
    }
}

impl ForceEvaluator {
    pub fn new(model: &ForceModel, type_count: usize) -> Result<Self, ConfigError> {
        let law = match model {
            ForceModel::InverseSquare => ActiveLaw::InverseSquare(InverseSquare),
            ForceModel::Molecular(settings) => {
                ActiveLaw::Molecular(MolecularLaw::new(settings, type_count)?)
            }
        };
        Ok(Self { law })
    }

    /// Fill `forces[i]` with the net force on particle `i`.
    pub fn evaluate(
        &self,
        particles: &[Particle],
        table: &InteractionTable,
        candidates: Candidates<'_>,
        params: &SimulationParams,
        forces: &mut [Vec3],
    ) {
        debug_assert_eq!(particles.len(), forces.len());
        for_each_indexed(forces, params.parallel, |i| {
            net_force(&self.law, i, particles, table, candidates, params)
        });
    }

    /// Net force on one particle, summed in candidate order.
    pub fn force_on(
        &self,
        index: usize,
        particles: &[Particle],
        table: &InteractionTable,
        candidates: Candidates<'_>,
        params: &SimulationParams,
    ) -> Vec3 {
        net_force(&self.law, index, particles, table, candidates, params)
    }
}

fn net_force<L: ForceLaw + ?Sized>(
    law: &L,
    index: usize,
    particles: &[Particle],
    table: &InteractionTable,
    candidates: Candidates<'_>,
    params: &SimulationParams,
) -> Vec3 {
    let a = &particles[index];
    let source_type = a.type_index as usize;
    let radius_sq = params.interaction_radius * params.interaction_radius;
    let mut force = Vec3::ZERO;

    candidates.for_each(a.position, params.interaction_radius, |j| {
        if j == index {
            return;
        }
        let b = &particles[j];
        let delta = b.position - a.position;
        let distance_sq = delta.length_squared();
        if !(distance_sq <= radius_sq) {
            return;
        }

        let distance = distance_sq.sqrt();
        let target_type = b.type_index as usize;
        let pair = PairContext {
            source_type,
            target_type,
            coefficient: table.coefficient(source_type, target_type),
            distance,
            clamped_distance: distance.max(params.min_distance),
        };
        let magnitude = law.magnitude(&pair, params);
        let magnitude = if magnitude.is_nan() {
            0.0
        } else {
            magnitude.clamp(-params.max_force, params.max_force)
        };
        force += safe_normalize(delta) * magnitude;
    });

    force
}
