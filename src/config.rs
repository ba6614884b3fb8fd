//! Resus configuration.
//!
//! Loaded from `~/.resus/config.toml`. Every key is optional; a missing file
//! means all defaults.
//!
//! ```toml
//! adrenaline-interval-secs = 180
//! guidance-cooldown-secs = 60
//! rhythm-check-interval-secs = 120
//! cpr-cycle-secs = 120
//! outcome-prompt-secs = 1200
//! default-energy-joules = 200
//! default-mode = "training"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use crate::model::SessionMode;
use crate::protocol::GuidanceTiming;
use crate::resuscitation::Thresholds;

/// Errors that can occur while loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHome,

    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{key} must be greater than zero in {}", path.display())]
    Zero { key: &'static str, path: PathBuf },
}

/// Resus configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Minimum time since the last adrenaline dose before a reminder.
    pub adrenaline_interval_secs: u32,

    /// Quiet period after the rescuer dismisses guidance.
    pub guidance_cooldown_secs: u32,

    /// "Check rhythm" cadence while CPR is in progress.
    pub rhythm_check_interval_secs: u32,

    /// Length of one CPR cycle; the cycle completes itself after this.
    pub cpr_cycle_secs: u32,

    /// Time after ROSC before asking for the patient outcome.
    pub outcome_prompt_secs: u32,

    /// Energy recorded for a shock when none is given.
    pub default_energy_joules: u32,

    pub default_mode: SessionMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            adrenaline_interval_secs: 180,
            guidance_cooldown_secs: 60,
            rhythm_check_interval_secs: 120,
            cpr_cycle_secs: 120,
            outcome_prompt_secs: 1200,
            default_energy_joules: 200,
            default_mode: SessionMode::Training,
        }
    }
}

impl Config {
    /// Load config from `~/.resus/config.toml`, or defaults if it is absent.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path().ok_or(ConfigError::NoHome)?;
        Self::load_from(&path)
    }

    /// Load config from a specific file, or defaults if it is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate(path)?;

        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// The config file path: `~/.resus/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".resus").join("config.toml"))
    }

    /// The thresholds a resuscitation runs with.
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            guidance: GuidanceTiming {
                adrenaline_interval: secs(self.adrenaline_interval_secs),
                cooldown: secs(self.guidance_cooldown_secs),
                rhythm_check_interval: secs(self.rhythm_check_interval_secs),
            },
            cpr_cycle_secs: self.cpr_cycle_secs,
            outcome_prompt_secs: self.outcome_prompt_secs,
        }
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let must_be_positive = [
            ("rhythm-check-interval-secs", self.rhythm_check_interval_secs),
            ("cpr-cycle-secs", self.cpr_cycle_secs),
            ("default-energy-joules", self.default_energy_joules),
        ];
        for (key, value) in must_be_positive {
            if value == 0 {
                return Err(ConfigError::Zero {
                    key,
                    path: path.to_path_buf(),
                });
            }
        }
        Ok(())
    }
}

fn secs(n: u32) -> SignedDuration {
    SignedDuration::from_secs(i64::from(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn write_config(contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.thresholds(), Thresholds::default());
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let (_dir, path) = write_config(
            "adrenaline-interval-secs = 240\n\
             default-mode = \"clinical\"\n",
        );
        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.adrenaline_interval_secs, 240);
        assert_eq!(config.default_mode, SessionMode::Clinical);
        assert_eq!(config.guidance_cooldown_secs, 60);

        let timing = config.thresholds().guidance;
        assert_eq!(timing.adrenaline_interval, SignedDuration::from_secs(240));
        assert_eq!(timing.cooldown, SignedDuration::from_secs(60));
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let (_dir, path) = write_config("cpr-cycle-secs = \"two minutes\"\n");
        let err = Config::load_from(&path).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn unknown_key_is_an_error() {
        let (_dir, path) = write_config("max-cycles = 12\n");
        let err = Config::load_from(&path).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn zero_cycle_length_is_rejected() {
        let (_dir, path) = write_config("cpr-cycle-secs = 0\n");
        let err = Config::load_from(&path).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Zero {
                key: "cpr-cycle-secs",
                ..
            }
        ));
    }
}
