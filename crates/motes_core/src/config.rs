//! Simulation configuration supplied by the host
//!
//! Everything here is plain data with serde derives so hosts can keep presets
//! in whatever file format they like. Validation happens once, when a
//! configuration is handed to the kernel, never per tick.

use crate::error::ConfigError;
use crate::kernel::MolecularSettings;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Static descriptor for one particle species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleType {
    /// Label only; the kernel never reads it.
    #[serde(default)]
    pub name: String,
    pub mass: f32,
    pub radius: f32,
    #[serde(default)]
    pub spawn_count: usize,
}

impl ParticleType {
    pub fn new(name: impl Into<String>, mass: f32, radius: f32, spawn_count: usize) -> Self {
        Self {
            name: name.into(),
            mass,
            radius,
            spawn_count,
        }
    }

    fn validate(&self, type_index: usize, world_size: Vec3) -> Result<(), ConfigError> {
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(ConfigError::InvalidMass {
                type_index,
                mass: self.mass,
            });
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ConfigError::InvalidRadius {
                type_index,
                radius: self.radius,
            });
        }
        if self.radius > world_size.min_element() * 0.5 {
            return Err(ConfigError::RadiusExceedsWorld {
                type_index,
                radius: self.radius,
            });
        }
        Ok(())
    }
}

/// How strongly particles of type `source` react to particles of type `target`.
///
/// Rules are directional: `(a, b)` says nothing about `(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionRule {
    pub source: usize,
    pub target: usize,
    /// Positive attracts, negative repels. Not clamped.
    pub coefficient: f32,
}

impl InteractionRule {
    pub fn new(source: usize, target: usize, coefficient: f32) -> Self {
        Self {
            source,
            target,
            coefficient,
        }
    }
}

/// Whether the collision impulse is applied to separating pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpulsePolicy {
    /// Skip the impulse when `dot(relative_velocity, normal) >= 0`.
    #[default]
    SkipSeparating,
    /// Always apply the impulse.
    Unconditional,
    /// Always apply; elasticity and impulse are both multiplied by `temperature`.
    TemperatureScaled,
}

/// Which pairwise force law the evaluator runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForceModel {
    /// Signed inverse-square scaled by the interaction table.
    #[default]
    InverseSquare,
    /// Hookean springs for bonded type pairs, Lennard-Jones otherwise.
    Molecular(MolecularSettings),
}

/// Global parameters, read-only during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Full extent of the world box, centred at the origin.
    pub world_size: Vec3,
    /// Velocity multiplier applied every tick, in (0, 1].
    pub damping: f32,
    pub interaction_strength: f32,
    /// Pairs further apart than this exert no force.
    pub interaction_radius: f32,
    /// Distance floor used in force formulas.
    pub min_distance: f32,
    pub max_force: f32,
    pub max_velocity: f32,
    pub max_acceleration: f32,
    /// Fraction of an axis velocity kept (and reversed) on wall contact.
    pub bounce_force: f32,
    pub collision_elasticity: f32,
    pub collision_iterations: usize,
    pub impulse_policy: ImpulsePolicy,
    /// External thermal factor read by `TemperatureScaled` collisions and bond breaking.
    pub temperature: f32,
    /// Grid cell edge; `<= 0` degenerates the grid to brute force.
    pub cell_size: f32,
    pub use_partitioning: bool,
    /// Run per-particle passes on the rayon pool.
    pub parallel: bool,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            world_size: Vec3::splat(50.0),
            damping: 0.98,
            interaction_strength: 10.0,
            interaction_radius: 8.0,
            min_distance: 0.5,
            max_force: 100.0,
            max_velocity: 20.0,
            max_acceleration: 50.0,
            bounce_force: 0.8,
            collision_elasticity: 0.5,
            collision_iterations: 3,
            impulse_policy: ImpulsePolicy::SkipSeparating,
            temperature: 1.0,
            cell_size: 8.0,
            use_partitioning: true,
            parallel: true,
        }
    }
}

impl SimulationParams {
    pub fn half_extent(&self) -> Vec3 {
        self.world_size * 0.5
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (axis, value) in self.world_size.to_array().into_iter().enumerate() {
            if !(value.is_finite() && value > 0.0) {
                let name = ["world_size.x", "world_size.y", "world_size.z"][axis];
                return Err(ConfigError::param(name, value, "a finite value > 0"));
            }
        }
        if !(self.damping.is_finite() && self.damping > 0.0 && self.damping <= 1.0) {
            return Err(ConfigError::param("damping", self.damping, "a value in (0, 1]"));
        }
        if !(self.min_distance.is_finite() && self.min_distance > 0.0) {
            return Err(ConfigError::param(
                "min_distance",
                self.min_distance,
                "a finite value > 0",
            ));
        }
        if !self.interaction_strength.is_finite() {
            return Err(ConfigError::param(
                "interaction_strength",
                self.interaction_strength,
                "a finite value",
            ));
        }
        if !self.cell_size.is_finite() {
            return Err(ConfigError::param("cell_size", self.cell_size, "a finite value"));
        }

        let non_negative = [
            ("interaction_radius", self.interaction_radius),
            ("max_force", self.max_force),
            ("max_velocity", self.max_velocity),
            ("max_acceleration", self.max_acceleration),
            ("bounce_force", self.bounce_force),
            ("collision_elasticity", self.collision_elasticity),
            ("temperature", self.temperature),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::param(name, value, "a finite value >= 0"));
            }
        }
        Ok(())
    }
}

/// Parameters for the initial uniform spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSettings {
    /// Each velocity component is drawn uniformly from `[-initial_speed, initial_speed]`.
    pub initial_speed: f32,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self { initial_speed: 1.0 }
    }
}

/// Everything the kernel needs to build a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub types: Vec<ParticleType>,
    #[serde(default)]
    pub rules: Vec<InteractionRule>,
    #[serde(default)]
    pub params: SimulationParams,
    #[serde(default)]
    pub force_model: ForceModel,
    #[serde(default)]
    pub spawn: SpawnSettings,
}

impl Default for SimulationConfig {
    /// Three species chasing each other in a loop, with mild self-repulsion.
    fn default() -> Self {
        Self {
            types: vec![
                ParticleType::new("red", 1.0, 0.3, 200),
                ParticleType::new("green", 1.5, 0.4, 150),
                ParticleType::new("blue", 0.8, 0.25, 250),
            ],
            rules: vec![
                InteractionRule::new(0, 1, 0.6),
                InteractionRule::new(1, 2, 0.4),
                InteractionRule::new(2, 0, 0.5),
                InteractionRule::new(0, 0, -0.3),
                InteractionRule::new(1, 0, -0.2),
            ],
            params: SimulationParams::default(),
            force_model: ForceModel::InverseSquare,
            spawn: SpawnSettings::default(),
        }
    }
}

impl SimulationConfig {
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn total_spawn_count(&self) -> usize {
        self.types.iter().map(|t| t.spawn_count).sum()
    }

    /// Check types, rules, parameters and the force model together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.params.validate()?;
        validate_types(&self.types, &self.params)?;
        validate_rules(&self.rules, self.types.len())?;
        if let ForceModel::Molecular(settings) = &self.force_model {
            settings.validate(self.types.len())?;
        }
        if !(self.spawn.initial_speed.is_finite() && self.spawn.initial_speed >= 0.0) {
            return Err(ConfigError::param(
                "spawn.initial_speed",
                self.spawn.initial_speed,
                "a finite value >= 0",
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_types(
    types: &[ParticleType],
    params: &SimulationParams,
) -> Result<(), ConfigError> {
    if types.is_empty() {
        return Err(ConfigError::NoParticleTypes);
    }
    types
        .iter()
        .enumerate()
        .try_for_each(|(index, ty)| ty.validate(index, params.world_size))
}

pub(crate) fn validate_rules(
    rules: &[InteractionRule],
    type_count: usize,
) -> Result<(), ConfigError> {
    for (index, rule) in rules.iter().enumerate() {
        if rule.source >= type_count || rule.target >= type_count {
            return Err(ConfigError::RuleTypeOutOfRange {
                rule: index,
                source_type: rule.source,
                target_type: rule.target,
                type_count,
            });
        }
        if !rule.coefficient.is_finite() {
            return Err(ConfigError::NonFiniteCoefficient { rule: index });
        }
    }
    Ok(())
}
