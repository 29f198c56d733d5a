//! Configuration for the workflow engine

use crate::{types::Principal, Error, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Longest accepted cooldown (one year)
pub const MAX_COOLDOWN_SECONDS: u64 = 365 * 24 * 3600;

/// Workflow engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// System owner (may replace the regulator)
    pub owner: Principal,

    /// Initial regulator
    pub regulator: Principal,

    /// Default reporting period configuration
    pub period: PeriodConfig,

    /// Submission rate limits
    pub rate_limit: RateLimitConfig,

    /// Per-report metadata bounds
    pub metadata: MetadataBounds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "disclosure-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            owner: Principal::new("owner"),
            regulator: Principal::new("regulator"),
            period: PeriodConfig::default(),
            rate_limit: RateLimitConfig::default(),
            metadata: MetadataBounds::default(),
        }
    }
}

/// Reporting period defaults (used for period 1)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodConfig {
    /// Period duration in days (default: 30)
    pub duration_days: u32,

    /// Submission window in days from period start (default: 7)
    pub submission_window_days: u32,
}

impl Default for PeriodConfig {
    fn default() -> Self {
        Self {
            duration_days: 30,
            submission_window_days: 7,
        }
    }
}

impl PeriodConfig {
    /// Period duration
    pub fn duration(&self) -> Duration {
        Duration::days(i64::from(self.duration_days))
    }

    /// Submission window
    pub fn submission_window(&self) -> Duration {
        Duration::days(i64::from(self.submission_window_days))
    }
}

/// Submission rate limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Minimum time between two submissions from one entity (default: 1 hour)
    pub cooldown_seconds: u64,

    /// Maximum submissions per entity per period (default: 1)
    pub max_submissions_per_period: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: 3600,
            max_submissions_per_period: 1,
        }
    }
}

impl RateLimitConfig {
    /// Cooldown as a duration
    pub fn cooldown(&self) -> Duration {
        Duration::seconds(self.cooldown_seconds.min(MAX_COOLDOWN_SECONDS) as i64)
    }
}

/// Bounds on what accompanies a sealed payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataBounds {
    /// Highest accepted risk score (default: 100)
    pub max_risk_score: u8,

    /// Largest accepted sealed payload (default: 1 MiB)
    pub max_payload_bytes: usize,
}

impl Default for MetadataBounds {
    fn default() -> Self {
        Self {
            max_risk_score: 100,
            max_payload_bytes: 1024 * 1024,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(owner) = std::env::var("DISCLOSURE_OWNER") {
            config.owner = Principal::new(owner);
        }

        if let Ok(regulator) = std::env::var("DISCLOSURE_REGULATOR") {
            config.regulator = Principal::new(regulator);
        }

        if let Ok(days) = std::env::var("DISCLOSURE_PERIOD_DAYS") {
            config.period.duration_days = parse_env("DISCLOSURE_PERIOD_DAYS", &days)?;
        }

        if let Ok(days) = std::env::var("DISCLOSURE_WINDOW_DAYS") {
            config.period.submission_window_days = parse_env("DISCLOSURE_WINDOW_DAYS", &days)?;
        }

        if let Ok(secs) = std::env::var("DISCLOSURE_COOLDOWN_SECS") {
            config.rate_limit.cooldown_seconds = parse_env("DISCLOSURE_COOLDOWN_SECS", &secs)?;
        }

        if let Ok(max) = std::env::var("DISCLOSURE_MAX_SUBMISSIONS") {
            config.rate_limit.max_submissions_per_period =
                parse_env("DISCLOSURE_MAX_SUBMISSIONS", &max)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.owner.is_null() {
            return Err(Error::Config("owner must not be null".to_string()));
        }
        if self.regulator.is_null() {
            return Err(Error::Config("regulator must not be null".to_string()));
        }
        if self.period.duration_days == 0 {
            return Err(Error::Config("period duration must be positive".to_string()));
        }
        if self.period.submission_window_days > self.period.duration_days {
            return Err(Error::Config(format!(
                "submission window ({}d) exceeds period duration ({}d)",
                self.period.submission_window_days, self.period.duration_days
            )));
        }
        if self.rate_limit.max_submissions_per_period == 0 {
            return Err(Error::Config(
                "max submissions per period must be positive".to_string(),
            ));
        }
        if self.rate_limit.cooldown_seconds > MAX_COOLDOWN_SECONDS {
            return Err(Error::Config(format!(
                "cooldown {}s exceeds {}s",
                self.rate_limit.cooldown_seconds, MAX_COOLDOWN_SECONDS
            )));
        }
        if self.metadata.max_risk_score > 100 {
            return Err(Error::Config(format!(
                "max risk score {} exceeds 100",
                self.metadata.max_risk_score
            )));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| Error::Config(format!("Invalid {}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "disclosure-core");
        assert_eq!(config.period.duration_days, 30);
        assert_eq!(config.metadata.max_risk_score, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_window_longer_than_period_rejected() {
        let mut config = Config::default();
        config.period.submission_window_days = 31;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_null_regulator_rejected() {
        let mut config = Config::default();
        config.regulator = Principal::null();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            service_name = "disclosure-core"
            service_version = "0.1.0"
            owner = "ministry"
            regulator = "central-bank"

            [period]
            duration_days = 90
            submission_window_days = 14

            [rate_limit]
            cooldown_seconds = 60
            max_submissions_per_period = 1

            [metadata]
            max_risk_score = 100
            max_payload_bytes = 4096
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.regulator, Principal::new("central-bank"));
        assert_eq!(config.period.submission_window(), Duration::days(14));
        assert_eq!(config.rate_limit.cooldown(), Duration::seconds(60));
        assert!(config.validate().is_ok());
    }
}
