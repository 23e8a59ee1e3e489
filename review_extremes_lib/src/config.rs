//! Run configuration: defaults, optional TOML file, environment overrides.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Sheet row (0-based) holding the column headers. Row 6 in a spreadsheet UI.
pub const DEFAULT_HEADER_ROW_INDEX: usize = 5;

/// Upper bound for either end of the between-page delay range.
pub const MAX_ROW_DELAY_SECS: f64 = 3600.0;

/// Settings for one run over a sheet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// 0-based index of the header row.
    pub header_row_index: usize,
    /// Skip rows whose positive-review cell already has content.
    pub skip_processed: bool,
    pub pacing: PacingConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            header_row_index: DEFAULT_HEADER_ROW_INDEX,
            skip_processed: false,
            pacing: PacingConfig::default(),
        }
    }
}

/// Timing of page loads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Lower bound of the random pause between product pages.
    pub row_delay_min_secs: f64,
    /// Upper bound of the random pause between product pages.
    pub row_delay_max_secs: f64,
    /// Pause granted to the operator when a challenge page is served.
    pub challenge_wait_secs: u64,
    /// Pause after each load before the markup is parsed.
    pub settle_delay_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            row_delay_min_secs: 5.0,
            row_delay_max_secs: 10.0,
            challenge_wait_secs: 15,
            settle_delay_ms: 3000,
            request_timeout_secs: 30,
        }
    }
}

impl PacingConfig {
    /// No pauses at all. Used by tests and `--no-delay`.
    pub fn immediate() -> Self {
        Self {
            row_delay_min_secs: 0.0,
            row_delay_max_secs: 0.0,
            challenge_wait_secs: 0,
            settle_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn challenge_wait(&self) -> Duration {
        Duration::from_secs(self.challenge_wait_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Rejects delays that are negative, not finite, above
    /// [`MAX_ROW_DELAY_SECS`], or in the wrong order, and a zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("pacing.row_delay_min_secs", self.row_delay_min_secs),
            ("pacing.row_delay_max_secs", self.row_delay_max_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    key,
                    message: format!("must be a non-negative number, got {}", value),
                });
            }
            if value > MAX_ROW_DELAY_SECS {
                return Err(ConfigError::Invalid {
                    key,
                    message: format!(
                        "must be at most {} seconds, got {}",
                        MAX_ROW_DELAY_SECS, value
                    ),
                });
            }
        }
        if self.row_delay_min_secs > self.row_delay_max_secs {
            return Err(ConfigError::Invalid {
                key: "pacing.row_delay_min_secs",
                message: format!(
                    "{} is greater than row_delay_max_secs {}",
                    self.row_delay_min_secs, self.row_delay_max_secs
                ),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "pacing.request_timeout_secs",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl AgentConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads a TOML config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Applies `REVIEW_EXTREMES_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.header_row_index = env_usize("REVIEW_EXTREMES_HEADER_ROW", self.header_row_index);
        self.pacing.row_delay_min_secs =
            env_f64("REVIEW_EXTREMES_DELAY_MIN_SECS", self.pacing.row_delay_min_secs);
        self.pacing.row_delay_max_secs =
            env_f64("REVIEW_EXTREMES_DELAY_MAX_SECS", self.pacing.row_delay_max_secs);
        self.pacing.challenge_wait_secs = env_u64(
            "REVIEW_EXTREMES_CHALLENGE_WAIT_SECS",
            self.pacing.challenge_wait_secs,
        );
        self.pacing.settle_delay_ms =
            env_u64("REVIEW_EXTREMES_SETTLE_MS", self.pacing.settle_delay_ms);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pacing.validate()
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AgentConfig::default();
        assert_eq!(cfg.header_row_index, 5);
        assert!(!cfg.skip_processed);
        assert_eq!(cfg.pacing.row_delay_min_secs, 5.0);
        assert_eq!(cfg.pacing.row_delay_max_secs, 10.0);
        assert_eq!(cfg.pacing.challenge_wait(), Duration::from_secs(15));
        assert_eq!(cfg.pacing.settle_delay(), Duration::from_secs(3));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = AgentConfig::from_toml_str(
            r#"
header_row_index = 0

[pacing]
challenge_wait_secs = 30
"#,
        )
        .unwrap();
        assert_eq!(cfg.header_row_index, 0);
        assert_eq!(cfg.pacing.challenge_wait_secs, 30);
        assert_eq!(cfg.pacing.row_delay_max_secs, 10.0);
    }

    #[test]
    fn malformed_toml_is_rejected() {
        let err = AgentConfig::from_toml_str("header_row_index = \"six\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn inverted_delay_range_is_invalid() {
        let mut cfg = AgentConfig::default();
        cfg.pacing.row_delay_min_secs = 12.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid { key: "pacing.row_delay_min_secs", .. })
        ));
    }

    #[test]
    fn negative_delay_is_invalid() {
        let mut cfg = AgentConfig::default();
        cfg.pacing.row_delay_min_secs = -1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn oversized_delay_is_invalid() {
        let mut cfg = AgentConfig::default();
        cfg.pacing.row_delay_max_secs = 1e20;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid { key: "pacing.row_delay_max_secs", .. })
        ));

        cfg.pacing.row_delay_max_secs = MAX_ROW_DELAY_SECS + 1.0;
        assert!(cfg.validate().is_err());

        cfg.pacing.row_delay_max_secs = MAX_ROW_DELAY_SECS;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn immediate_pacing_is_valid() {
        let cfg = AgentConfig {
            pacing: PacingConfig::immediate(),
            ..AgentConfig::default()
        };
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.pacing.settle_delay(), Duration::ZERO);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AgentConfig::load(Path::new("/nonexistent/review-extremes.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/review-extremes.toml"));
    }
}
