//! # Ray Cast Configuration
//!
//! Timing knobs for the pruning sweeper.
//!
//! ```rust
//! use raycast_core::config::RayCastConfig;
//!
//! let config = RayCastConfig::default();
//! let fast = RayCastConfig::responsive();
//! assert!(fast.ttl() < config.ttl());
//! ```

use crate::error::{ConfigurationError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TTL_MS: u64 = 5_000;
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_PLAYER_GRACE_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RayCastConfig {
    /// Age after which a pending cast is force-settled as a miss (기본: 5000)
    pub ttl_ms: u64,
    /// Period of the automatic sweep (기본: 1000)
    pub sweep_interval_ms: u64,
    /// How long an empty player state survives before it is dropped (기본: 10000)
    pub player_grace_ms: u64,
}

impl Default for RayCastConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TTL_MS,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            player_grace_ms: DEFAULT_PLAYER_GRACE_MS,
        }
    }
}

impl RayCastConfig {
    /// Short TTL for fast-paced games where a late result is useless anyway
    pub fn responsive() -> Self {
        Self { ttl_ms: 1_500, sweep_interval_ms: 250, player_grace_ms: 5_000 }
    }

    /// Long TTL for servers under heavy load
    pub fn lenient() -> Self {
        Self { ttl_ms: 15_000, sweep_interval_ms: 2_000, player_grace_ms: 30_000 }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn player_grace(&self) -> Duration {
        Duration::from_millis(self.player_grace_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ttl_ms == 0 {
            return Err(ConfigurationError::InvalidConfig("ttl_ms must be > 0".to_string()));
        }
        if self.sweep_interval_ms == 0 {
            return Err(ConfigurationError::InvalidConfig(
                "sweep_interval_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a (possibly partial) JSON object; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: RayCastConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = RayCastConfig::default();
        assert_eq!(cfg.ttl(), Duration::from_secs(5));
        assert_eq!(cfg.sweep_interval(), Duration::from_secs(1));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_presets_ordering() {
        let default = RayCastConfig::default();
        assert!(RayCastConfig::responsive().ttl_ms < default.ttl_ms);
        assert!(RayCastConfig::lenient().ttl_ms > default.ttl_ms);
        assert!(RayCastConfig::responsive().validate().is_ok());
        assert!(RayCastConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg = RayCastConfig::from_json(r#"{"ttl_ms": 2500}"#).unwrap();
        assert_eq!(cfg.ttl_ms, 2500);
        assert_eq!(cfg.sweep_interval_ms, DEFAULT_SWEEP_INTERVAL_MS);
        assert_eq!(cfg.player_grace_ms, DEFAULT_PLAYER_GRACE_MS);
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let err = RayCastConfig::from_json(r#"{"ttl_ms": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidConfig(_)));
        assert!(!err.is_programmer_error());
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(RayCastConfig::from_json("{ttl_ms").is_err());
    }

    #[test]
    fn test_config_serialization() {
        let cfg = RayCastConfig::lenient();
        let json = serde_json::to_string(&cfg).unwrap();
        let parsed: RayCastConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cfg);
    }
}
