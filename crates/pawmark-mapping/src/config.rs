use std::{env, time::Duration};

use pawmark::{PAWMARK_EPOCH, PawmarkId};

/// Runtime configuration for the mapping service.
///
/// Tag assignment partitions the ID space across simultaneously running
/// instances and is mandatory external configuration: every live instance
/// must hold a distinct (data-center, worker) pair, assigned statically at
/// deployment time. Nothing here (or anywhere in the fleet) coordinates
/// tags dynamically, so colliding pairs silently produce colliding IDs.
///
/// All values can come from the environment via [`MappingConfig::from_env`],
/// with defaults suitable for a single-instance deployment.
#[derive(Debug, Clone)]
pub struct MappingConfig {
    /// Data-center tag encoded into every generated ID (`0..=31`).
    ///
    /// Environment variable: `DATA_CENTER_TAG`
    pub data_center_tag: u64,

    /// Worker tag encoded into every generated ID (`0..=31`).
    ///
    /// Environment variable: `WORKER_TAG`
    pub worker_tag: u64,

    /// Zero-point for ID timestamps, as an offset from the Unix epoch.
    ///
    /// Must stay fixed for the lifetime of a deployment: changing it
    /// reorders new IDs against existing ones.
    ///
    /// Environment variable: `EPOCH_MILLIS`
    pub epoch: Duration,

    /// Maximum insert attempts when issuing a short code before giving up
    /// with `GenerationExhausted`.
    ///
    /// Environment variable: `MAX_ISSUE_ATTEMPTS`
    pub max_issue_attempts: u32,

    /// Upper bound on every individual store call.
    ///
    /// Environment variable: `STORE_TIMEOUT_MS`
    pub store_timeout: Duration,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            data_center_tag: 1,
            worker_tag: 1,
            epoch: PAWMARK_EPOCH,
            max_issue_attempts: 5,
            store_timeout: Duration::from_secs(5),
        }
    }
}

/// Why configuration loading failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has unparsable value {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("{var} is {value}, must be at most {max}")]
    OutOfRange {
        var: &'static str,
        value: u64,
        max: u64,
    },

    #[error("MAX_ISSUE_ATTEMPTS must be greater than 0")]
    ZeroAttempts,
}

impl MappingConfig {
    /// Loads configuration from the environment, falling back to defaults
    /// for unset variables.
    ///
    /// A `.env` file in the working directory is honored if present. Tag
    /// ranges are validated here so a misconfigured deployment fails at
    /// startup rather than at first issuance.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        let config = Self {
            data_center_tag: parse_var("DATA_CENTER_TAG", defaults.data_center_tag)?,
            worker_tag: parse_var("WORKER_TAG", defaults.worker_tag)?,
            epoch: Duration::from_millis(parse_var(
                "EPOCH_MILLIS",
                defaults.epoch.as_millis() as u64,
            )?),
            max_issue_attempts: parse_var("MAX_ISSUE_ATTEMPTS", defaults.max_issue_attempts)?,
            store_timeout: Duration::from_millis(parse_var(
                "STORE_TIMEOUT_MS",
                defaults.store_timeout.as_millis() as u64,
            )?),
        };
        config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.data_center_tag > PawmarkId::max_data_center_tag() {
            return Err(ConfigError::OutOfRange {
                var: "DATA_CENTER_TAG",
                value: self.data_center_tag,
                max: PawmarkId::max_data_center_tag(),
            });
        }
        if self.worker_tag > PawmarkId::max_worker_tag() {
            return Err(ConfigError::OutOfRange {
                var: "WORKER_TAG",
                value: self.worker_tag,
                max: PawmarkId::max_worker_tag(),
            });
        }
        if self.max_issue_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        Ok(self)
    }
}

fn parse_var<T: core::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = MappingConfig::default().validate().unwrap();
        assert_eq!(config.max_issue_attempts, 5);
        assert_eq!(config.store_timeout, Duration::from_secs(5));
        assert_eq!(config.epoch, PAWMARK_EPOCH);
    }

    #[test]
    fn oversized_tags_are_rejected() {
        let config = MappingConfig {
            worker_tag: 32,
            ..Default::default()
        };
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::OutOfRange {
                var: "WORKER_TAG",
                value: 32,
                max: 31
            }
        );
    }

    #[test]
    fn zero_attempts_are_rejected() {
        let config = MappingConfig {
            max_issue_attempts: 0,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err(), ConfigError::ZeroAttempts);
    }
}
