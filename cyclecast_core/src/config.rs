//! Configuration file support for cyclecast.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/cyclecast/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Upper bound for any day-count parameter
pub const MAX_DAY_OFFSET: i64 = 60;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub prediction: PredictionParams,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// User id records are filed under when `--user` is not given
    #[serde(default = "default_user")]
    pub user: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            user: default_user(),
        }
    }
}

/// Tunables for the cycle predictor
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PredictionParams {
    /// Most recent records considered by the period/ovulation forecasts
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Largest plausible period-start-to-ovulation offset, in days
    #[serde(default = "default_max_ovulation_offset")]
    pub max_ovulation_offset: i64,

    /// Offset assumed when no ovulation history matches
    #[serde(default = "default_ovulation_offset")]
    pub default_ovulation_offset: i64,

    /// Cycle-length standard deviation at or below which cycles are very regular
    #[serde(default = "default_high_confidence_stdev")]
    pub high_confidence_stdev: f64,

    /// Standard deviation at or below which cycles are regular
    #[serde(default = "default_medium_confidence_stdev")]
    pub medium_confidence_stdev: f64,

    /// Matched ovulation offsets needed for a high-confidence ovulation forecast
    #[serde(default = "default_min_offsets_for_high")]
    pub min_offsets_for_high: usize,

    #[serde(default = "default_fertile_days")]
    pub fertile_days_before_ovulation: i64,
}

impl Default for PredictionParams {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            max_ovulation_offset: default_max_ovulation_offset(),
            default_ovulation_offset: default_ovulation_offset(),
            high_confidence_stdev: default_high_confidence_stdev(),
            medium_confidence_stdev: default_medium_confidence_stdev(),
            min_offsets_for_high: default_min_offsets_for_high(),
            fertile_days_before_ovulation: default_fertile_days(),
        }
    }
}

impl PredictionParams {
    /// Reject parameter combinations the predictor cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.history_limit < 2 {
            return Err(Error::Config(format!(
                "history_limit must be at least 2, got {}",
                self.history_limit
            )));
        }
        let day_counts = [
            ("max_ovulation_offset", self.max_ovulation_offset),
            ("default_ovulation_offset", self.default_ovulation_offset),
            (
                "fertile_days_before_ovulation",
                self.fertile_days_before_ovulation,
            ),
        ];
        for (name, days) in day_counts {
            if !(0..=MAX_DAY_OFFSET).contains(&days) {
                return Err(Error::Config(format!(
                    "{} must be between 0 and {} days, got {}",
                    name, MAX_DAY_OFFSET, days
                )));
            }
        }
        for (name, stdev) in [
            ("high_confidence_stdev", self.high_confidence_stdev),
            ("medium_confidence_stdev", self.medium_confidence_stdev),
        ] {
            if !stdev.is_finite() || stdev < 0.0 {
                return Err(Error::Config(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, stdev
                )));
            }
        }
        if self.high_confidence_stdev > self.medium_confidence_stdev {
            return Err(Error::Config(format!(
                "high_confidence_stdev ({}) exceeds medium_confidence_stdev ({})",
                self.high_confidence_stdev, self.medium_confidence_stdev
            )));
        }
        Ok(())
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|_| PathBuf::from("."))
    });
    base.join("cyclecast")
}

fn default_user() -> String {
    "local".into()
}

fn default_history_limit() -> usize {
    6
}

fn default_max_ovulation_offset() -> i64 {
    21
}

fn default_ovulation_offset() -> i64 {
    14
}

fn default_high_confidence_stdev() -> f64 {
    2.0
}

fn default_medium_confidence_stdev() -> f64 {
    5.0
}

fn default_min_offsets_for_high() -> usize {
    3
}

fn default_fertile_days() -> i64 {
    5
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.prediction.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|_| PathBuf::from("."))
        });
        base.join("cyclecast").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data.user, "local");
        assert_eq!(config.prediction.history_limit, 6);
        assert_eq!(config.prediction.max_ovulation_offset, 21);
        assert_eq!(config.prediction.default_ovulation_offset, 14);
        assert!(config.prediction.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip_through_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.data.user = "alice".into();
        config.prediction.history_limit = 8;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.data.user, "alice");
        assert_eq!(loaded.prediction, config.prediction);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[prediction]
default_ovulation_offset = 15
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.prediction.default_ovulation_offset, 15);
        assert_eq!(config.prediction.history_limit, 6); // default
        assert_eq!(config.data.user, "local");
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[prediction]\nhigh_confidence_stdev = 6.0\nmedium_confidence_stdev = 5.0\n",
        )
        .unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_oversized_day_counts_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        for line in [
            "default_ovulation_offset = 200000000000000",
            "fertile_days_before_ovulation = 200000000000000",
            "max_ovulation_offset = 61",
        ] {
            std::fs::write(&path, format!("[prediction]\n{}\n", line)).unwrap();
            let err = Config::load_from(&path).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "accepted {}", line);
        }

        let at_limit = PredictionParams {
            max_ovulation_offset: MAX_DAY_OFFSET,
            ..PredictionParams::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_non_finite_thresholds_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[prediction]\nhigh_confidence_stdev = nan\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));

        let params = PredictionParams {
            medium_confidence_stdev: f64::INFINITY,
            ..PredictionParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_history_limit_too_small() {
        let params = PredictionParams {
            history_limit: 1,
            ..PredictionParams::default()
        };
        assert!(params.validate().is_err());
    }
}
