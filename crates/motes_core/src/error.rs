use thiserror::Error;

/// Configuration rejected at setup or between ticks.
///
/// The kernel never returns errors from inside a tick; everything that could
/// make the per-particle math undefined is caught here instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("the particle type table is empty")]
    NoParticleTypes,

    #[error("particle type {type_index} has invalid mass {mass} (must be finite and > 0)")]
    InvalidMass { type_index: usize, mass: f32 },

    #[error("particle type {type_index} has invalid radius {radius} (must be finite and > 0)")]
    InvalidRadius { type_index: usize, radius: f32 },

    #[error("particle type {type_index} radius {radius} does not fit inside the world box")]
    RadiusExceedsWorld { type_index: usize, radius: f32 },

    #[error("rule {rule} references types ({source_type}, {target_type}) but only {type_count} types exist")]
    RuleTypeOutOfRange {
        rule: usize,
        source_type: usize,
        target_type: usize,
        type_count: usize,
    },

    #[error("rule {rule} has a non-finite coefficient")]
    NonFiniteCoefficient { rule: usize },

    #[error("bond {bond} references types ({type_a}, {type_b}) but only {type_count} types exist")]
    BondTypeOutOfRange {
        bond: usize,
        type_a: usize,
        type_b: usize,
        type_count: usize,
    },

    #[error("bond {bond} is invalid: {reason}")]
    InvalidBond { bond: usize, reason: &'static str },

    #[error("parameter `{name}` = {value} is invalid: expected {expected}")]
    InvalidParam {
        name: &'static str,
        value: f32,
        expected: &'static str,
    },

    #[error("the spawn plan produces no particles")]
    EmptySpawnPlan,

    #[error("particle {particle} has type {type_index} but only {type_count} types exist")]
    ParticleTypeOutOfRange {
        particle: usize,
        type_index: u32,
        type_count: usize,
    },

    #[error("particle {particle} is invalid: {reason}")]
    InvalidParticle { particle: usize, reason: &'static str },

    #[error("particle {particle} radius {radius} does not fit inside the world box")]
    ParticleExceedsWorld { particle: usize, radius: f32 },
}

impl ConfigError {
    pub(crate) fn param(name: &'static str, value: f32, expected: &'static str) -> Self {
        ConfigError::InvalidParam {
            name,
            value,
            expected,
        }
    }
}
