//! Bonded springs and Lennard-Jones for the molecular force model

use super::forces::{ForceLaw, PairContext};
use crate::config::SimulationParams;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Hookean bond between two particle types, registered for the unordered pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BondRule {
    pub type_a: usize,
    pub type_b: usize,
    pub stiffness: f32,
    pub optimal_distance: f32,
    /// The bond acts only while `temperature <= break_threshold`.
    #[serde(default = "never_breaks")]
    pub break_threshold: f32,
}

fn never_breaks() -> f32 {
    f32::MAX
}

impl BondRule {
    pub fn new(type_a: usize, type_b: usize, stiffness: f32, optimal_distance: f32) -> Self {
        Self {
            type_a,
            type_b,
            stiffness,
            optimal_distance,
            break_threshold: never_breaks(),
        }
    }

    pub fn with_break_threshold(mut self, break_threshold: f32) -> Self {
        self.break_threshold = break_threshold;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LennardJones {
    /// Well depth.
    pub epsilon: f32,
    /// Distance at which the potential crosses zero.
    pub sigma: f32,
}

impl Default for LennardJones {
    fn default() -> Self {
        Self {
            epsilon: 1.0,
            sigma: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MolecularSettings {
    pub bonds: Vec<BondRule>,
    pub lennard_jones: LennardJones,
}

impl MolecularSettings {
    pub fn validate(&self, type_count: usize) -> Result<(), ConfigError> {
        for (bond, rule) in self.bonds.iter().enumerate() {
            if rule.type_a >= type_count || rule.type_b >= type_count {
                return Err(ConfigError::BondTypeOutOfRange {
                    bond,
                    type_a: rule.type_a,
                    type_b: rule.type_b,
                    type_count,
                });
            }
            if !rule.stiffness.is_finite() {
                return Err(ConfigError::InvalidBond {
                    bond,
                    reason: "stiffness must be finite",
                });
            }
            if !(rule.optimal_distance.is_finite() && rule.optimal_distance >= 0.0) {
                return Err(ConfigError::InvalidBond {
                    bond,
                    reason: "optimal distance must be finite and >= 0",
                });
            }
            if rule.break_threshold.is_nan() {
                return Err(ConfigError::InvalidBond {
                    bond,
                    reason: "break threshold must not be NaN",
                });
            }
        }

        let lj = &self.lennard_jones;
        if !(lj.epsilon.is_finite() && lj.epsilon >= 0.0) {
            return Err(ConfigError::param(
                "lennard_jones.epsilon",
                lj.epsilon,
                "a finite value >= 0",
            ));
        }
        if !(lj.sigma.is_finite() && lj.sigma > 0.0) {
            return Err(ConfigError::param(
                "lennard_jones.sigma",
                lj.sigma,
                "a finite value > 0",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bond {
    stiffness: f32,
    optimal_distance: f32,
    break_threshold: f32,
}

/// Spring force for bonded type pairs, Lennard-Jones for everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct MolecularLaw {
    /// Dense `type_count * type_count`, filled symmetrically.
    bonds: Vec<Option<Bond>>,
    type_count: usize,
    lennard_jones: LennardJones,
}

impl MolecularLaw {
    pub fn new(settings: &MolecularSettings, type_count: usize) -> Result<Self, ConfigError> {
        settings.validate(type_count)?;
        let mut bonds = vec![None; type_count * type_count];
        for rule in &settings.bonds {
            let bond = Some(Bond {
                stiffness: rule.stiffness,
                optimal_distance: rule.optimal_distance,
                break_threshold: rule.break_threshold,
            });
            bonds[rule.type_a * type_count + rule.type_b] = bond;
            bonds[rule.type_b * type_count + rule.type_a] = bond;
        }
        Ok(Self {
            bonds,
            type_count,
            lennard_jones: settings.lennard_jones,
        })
    }

    #[inline]
    fn bond(&self, a: usize, b: usize) -> Option<Bond> {
        if a < self.type_count && b < self.type_count {
            self.bonds[a * self.type_count + b]
        } else {
            None
        }
    }

    /// Signed magnitude along A to B; positive pulls A toward B.
    #[inline]
    fn lennard_jones(&self, distance: f32) -> f32 {
        let LennardJones { epsilon, sigma } = self.lennard_jones;
        let s6 = (sigma / distance).powi(6);
        -24.0 * epsilon / distance * (2.0 * s6 * s6 - s6)
    }
}

impl ForceLaw for MolecularLaw {
    fn magnitude(&self, pair: &PairContext, params: &SimulationParams) -> f32 {
        match self.bond(pair.source_type, pair.target_type) {
            Some(bond) if params.temperature <= bond.break_threshold => {
                bond.stiffness * (pair.distance - bond.optimal_distance)
            }
            _ => self.lennard_jones(pair.clamped_distance) * params.interaction_strength,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: usize, b: usize, distance: f32) -> PairContext {
        PairContext {
            source_type: a,
            target_type: b,
            coefficient: 0.0,
            distance,
            clamped_distance: distance,
        }
    }

    fn params() -> SimulationParams {
        SimulationParams {
            interaction_strength: 1.0,
            temperature: 1.0,
            ..SimulationParams::default()
        }
    }

    #[test]
    fn bonds_are_symmetric_springs() {
        let settings = MolecularSettings {
            bonds: vec![BondRule::new(0, 1, 2.0, 1.5)],
            ..MolecularSettings::default()
        };
        let law = MolecularLaw::new(&settings, 2).unwrap();

        // Stretched: pulls toward the partner.
        assert_eq!(law.magnitude(&pair(0, 1, 2.5), &params()), 2.0);
        assert_eq!(law.magnitude(&pair(1, 0, 2.5), &params()), 2.0);
        // Compressed: pushes apart.
        assert_eq!(law.magnitude(&pair(0, 1, 1.0), &params()), -1.0);
    }

    #[test]
    fn hot_bonds_break_into_lennard_jones() {
        let settings = MolecularSettings {
            bonds: vec![BondRule::new(0, 1, 2.0, 1.5).with_break_threshold(0.5)],
            ..MolecularSettings::default()
        };
        let law = MolecularLaw::new(&settings, 2).unwrap();
        let hot = SimulationParams {
            temperature: 0.75,
            ..params()
        };
        let lj = law.magnitude(&pair(0, 0, 2.5), &hot);
        assert_eq!(law.magnitude(&pair(0, 1, 2.5), &hot), lj);
    }

    #[test]
    fn lennard_jones_repels_close_and_attracts_far() {
        let law = MolecularLaw::new(&MolecularSettings::default(), 1).unwrap();
        let p = params();
        assert!(law.magnitude(&pair(0, 0, 0.9), &p) < 0.0);
        assert!(law.magnitude(&pair(0, 0, 1.5), &p) > 0.0);
        // Equilibrium at 2^(1/6) sigma.
        let r_min = 2.0f32.powf(1.0 / 6.0);
        assert!(law.magnitude(&pair(0, 0, r_min), &p).abs() < 1.0e-4);
    }

    #[test]
    fn validation_catches_bad_bonds() {
        let settings = MolecularSettings {
            bonds: vec![BondRule::new(0, 3, 1.0, 1.0)],
            ..MolecularSettings::default()
        };
        assert!(matches!(
            settings.validate(2),
            Err(ConfigError::BondTypeOutOfRange { bond: 0, type_b: 3, .. })
        ));

        let settings = MolecularSettings {
            bonds: vec![BondRule::new(0, 1, 1.0, -1.0)],
            ..MolecularSettings::default()
        };
        assert!(matches!(
            settings.validate(2),
            Err(ConfigError::InvalidBond { bond: 0, .. })
        ));

        let settings = MolecularSettings {
            lennard_jones: LennardJones {
                epsilon: 1.0,
                sigma: 0.0,
            },
            ..MolecularSettings::default()
        };
        assert!(settings.validate(1).is_err());
    }
}
