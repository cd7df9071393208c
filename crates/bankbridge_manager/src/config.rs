use std::collections::BTreeMap;
use std::time::Duration;

use bankbridge_adapters::{sberbank, vtb, SandboxProfile};
use serde::Deserialize;
use thiserror::Error;

const KNOWN_PROVIDERS: &[&str] = &[sberbank::BANK_ID, vtb::BANK_ID];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown provider section [providers.{0}]")]
    UnknownProvider(String),
    #[error("acceptance_rate for {bank_id} must be within [0, 1], got {value}")]
    AcceptanceRate { bank_id: String, value: f64 },
    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: String },
}

/// Runtime configuration of the dispatch layer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub dispatch: DispatchSection,
    pub providers: BTreeMap<String, ProviderOverrides>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DispatchSection {
    /// Bound for adapters that do not declare their own timeout.
    pub default_timeout_ms: u64,
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self {
            default_timeout_ms: 30_000,
        }
    }
}

impl DispatchSection {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

/// Per-provider sandbox settings. Unset fields keep the provider's built-in
/// profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderOverrides {
    pub active: Option<bool>,
    pub acceptance_rate: Option<f64>,
    pub submit_latency_ms: Option<u64>,
    pub status_latency_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub strict_status_lookup: Option<bool>,
}

impl ProviderOverrides {
    pub fn apply(&self, mut profile: SandboxProfile) -> SandboxProfile {
        if let Some(active) = self.active {
            profile.active = active;
        }
        if let Some(rate) = self.acceptance_rate {
            profile.acceptance_rate = rate;
        }
        if let Some(ms) = self.submit_latency_ms {
            profile.submit_latency = Duration::from_millis(ms);
        }
        if let Some(ms) = self.status_latency_ms {
            profile.status_latency = Duration::from_millis(ms);
        }
        if let Some(ms) = self.timeout_ms {
            profile.timeout = Duration::from_millis(ms);
        }
        if let Some(strict) = self.strict_status_lookup {
            profile.strict_status_lookup = strict;
        }
        profile
    }
}

impl ManagerConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.default_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout {
                field: "dispatch.default_timeout_ms".to_string(),
            });
        }

        for (bank_id, overrides) in &self.providers {
            if !KNOWN_PROVIDERS.contains(&bank_id.as_str()) {
                return Err(ConfigError::UnknownProvider(bank_id.clone()));
            }
            if let Some(value) = overrides.acceptance_rate {
                if !(0.0..=1.0).contains(&value) {
                    return Err(ConfigError::AcceptanceRate {
                        bank_id: bank_id.clone(),
                        value,
                    });
                }
            }
            if overrides.timeout_ms == Some(0) {
                return Err(ConfigError::ZeroTimeout {
                    field: format!("providers.{bank_id}.timeout_ms"),
                });
            }
        }
        Ok(())
    }

    /// `base` with this config's overrides for `bank_id` applied.
    pub fn profile_for(&self, bank_id: &str, base: SandboxProfile) -> SandboxProfile {
        match self.providers.get(bank_id) {
            Some(overrides) => overrides.apply(base),
            None => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankbridge_adapters::SberbankSandbox;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ManagerConfig::from_toml_str("").expect("parse");
        assert_eq!(config, ManagerConfig::default());
        assert_eq!(config.dispatch.default_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn overrides_touch_only_named_fields() {
        let config = ManagerConfig::from_toml_str(
            r#"
            [dispatch]
            default_timeout_ms = 5000

            [providers.sberbank]
            active = false
            acceptance_rate = 1.0
            submit_latency_ms = 0
            "#,
        )
        .expect("parse");

        let profile = config.profile_for("sberbank", SberbankSandbox::default_profile());
        assert!(!profile.active);
        assert_eq!(profile.acceptance_rate, 1.0);
        assert_eq!(profile.submit_latency, Duration::ZERO);
        assert_eq!(profile.status_latency, Duration::from_millis(50));
        assert_eq!(profile.timeout, Duration::from_secs(30));

        let untouched = config.profile_for("vtb", SberbankSandbox::default_profile());
        assert_eq!(untouched, SberbankSandbox::default_profile());
    }

    #[test]
    fn rejects_unknown_provider() {
        let err = ManagerConfig::from_toml_str("[providers.alfabank]\nactive = true\n")
            .expect_err("unknown provider");
        assert!(matches!(err, ConfigError::UnknownProvider(id) if id == "alfabank"));
    }

    #[test]
    fn rejects_out_of_range_acceptance() {
        let err = ManagerConfig::from_toml_str("[providers.vtb]\nacceptance_rate = 1.5\n")
            .expect_err("bad rate");
        assert!(matches!(err, ConfigError::AcceptanceRate { .. }));
    }

    #[test]
    fn rejects_zero_timeouts() {
        let err = ManagerConfig::from_toml_str("[dispatch]\ndefault_timeout_ms = 0\n")
            .expect_err("zero timeout");
        assert!(matches!(err, ConfigError::ZeroTimeout { .. }));

        let err = ManagerConfig::from_toml_str("[providers.vtb]\ntimeout_ms = 0\n")
            .expect_err("zero timeout");
        assert!(matches!(err, ConfigError::ZeroTimeout { field } if field == "providers.vtb.timeout_ms"));
    }

    #[test]
    fn rejects_misspelled_fields() {
        let err = ManagerConfig::from_toml_str("[providers.vtb]\nacceptance = 0.5\n")
            .expect_err("typo");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
