//! Preset files
//!
//! A preset is a [`SimulationConfig`] plus the run settings the headless
//! runtime needs (seed, tick count, time step), stored as pretty JSON.

use motes_core::time::DEFAULT_TIMESTEP;
use motes_core::{ConfigError, SimulationConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("failed to access preset file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed preset: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("preset configuration rejected: {0}")]
    Invalid(#[from] ConfigError),

    #[error("preset time step {0} must be finite and > 0")]
    InvalidTimestep(f32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preset {
    pub name: String,
    /// Seed for the spawn RNG.
    pub seed: u64,
    /// Ticks the headless runtime runs before exiting.
    pub ticks: u64,
    /// Seconds per tick.
    pub timestep: f32,
    pub config: SimulationConfig,
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            seed: 0,
            ticks: 600,
            timestep: DEFAULT_TIMESTEP,
            config: SimulationConfig::default(),
        }
    }
}

impl Preset {
    pub fn validate(&self) -> Result<(), PresetError> {
        if !(self.timestep.is_finite() && self.timestep > 0.0) {
            return Err(PresetError::InvalidTimestep(self.timestep));
        }
        self.config.validate()?;
        Ok(())
    }
}

/// Parse and validate a preset.
pub fn from_json_str(json: &str) -> Result<Preset, PresetError> {
    let preset: Preset = serde_json::from_str(json)?;
    preset.validate()?;
    Ok(preset)
}

pub fn to_json_string(preset: &Preset) -> Result<String, PresetError> {
    Ok(serde_json::to_string_pretty(preset)?)
}

pub fn load_preset(path: impl AsRef<Path>) -> Result<Preset, PresetError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)?;
    let preset = from_json_str(&json)?;
    tracing::info!(path = %path.display(), name = %preset.name, "Loaded preset");
    Ok(preset)
}

pub fn save_preset(path: impl AsRef<Path>, preset: &Preset) -> Result<(), PresetError> {
    let path = path.as_ref();
    fs::write(path, to_json_string(preset)?)?;
    tracing::info!(path = %path.display(), name = %preset.name, "Saved preset");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use motes_core::{ForceModel, ImpulsePolicy, MolecularSettings};

    #[test]
    fn json_round_trip_keeps_everything() {
        let mut preset = Preset {
            name: "bonds".to_string(),
            seed: 99,
            ..Preset::default()
        };
        preset.config.params.impulse_policy = ImpulsePolicy::TemperatureScaled;
        preset.config.force_model = ForceModel::Molecular(MolecularSettings::default());

        let json = to_json_string(&preset).unwrap();
        assert!(json.contains("\"temperature_scaled\""));
        assert!(json.contains("\"kind\": \"molecular\""));
        assert_eq!(from_json_str(&json).unwrap(), preset);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let preset = from_json_str(r#"{ "name": "tiny", "ticks": 10 }"#).unwrap();
        assert_eq!(preset.ticks, 10);
        assert_eq!(preset.seed, 0);
        assert_eq!(preset.config, SimulationConfig::default());
    }

    #[test]
    fn invalid_presets_are_rejected() {
        assert!(matches!(
            from_json_str("{ not json"),
            Err(PresetError::Parse(_))
        ));

        let json = r#"{ "config": { "types": [] } }"#;
        assert!(matches!(
            from_json_str(json),
            Err(PresetError::Invalid(ConfigError::NoParticleTypes))
        ));
    }

    #[test]
    fn non_positive_time_steps_are_rejected() {
        for json in [r#"{ "timestep": 0.0 }"#, r#"{ "timestep": -0.5 }"#] {
            assert!(matches!(
                from_json_str(json),
                Err(PresetError::InvalidTimestep(_))
            ));
        }

        let preset = Preset {
            timestep: f32::NAN,
            ..Preset::default()
        };
        assert!(matches!(preset.validate(), Err(PresetError::InvalidTimestep(_))));
        assert!(from_json_str(r#"{ "timestep": 0.01 }"#).is_ok());
    }

    #[test]
    fn save_then_load_from_disk() {
        let path = std::env::temp_dir().join(format!("motes_preset_{}.json", std::process::id()));
        let preset = Preset {
            name: "disk".to_string(),
            ticks: 5,
            ..Preset::default()
        };
        save_preset(&path, &preset).unwrap();
        let loaded = load_preset(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, preset);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_preset("/definitely/not/here/preset.json").unwrap_err();
        assert!(matches!(err, PresetError::Io(_)));
    }
}
