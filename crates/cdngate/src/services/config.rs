//! Gateway configuration types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Default container TTL in seconds (one year)
pub const DEFAULT_TTL: u64 = 31_557_600;

/// Exact phrase required to delete the bound container
pub const DELETE_CONFIRMATION: &str = "yes I confirm deletion of current container";

/// What a confirmed container delete does when a blob fails to delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadePolicy {
    /// Stop at the first failing blob and return its error; the container is kept
    #[default]
    Abort,
    /// Try every blob; if any failed, keep the container and report them all
    Continue,
}

/// How blob fetches treat remote failures other than "not found"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorPolicy {
    /// Report them as `FetchOutcome::TransportError`
    #[default]
    Swallow,
    /// Return them as `GatewayError::Store`
    Surface,
}

/// User-provided configuration (every field optional)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayInputConfig {
    /// Container TTL in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cascade: Option<CascadePolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_errors: Option<FetchErrorPolicy>,
}

impl GatewayInputConfig {
    /// Read recognized keys out of an arbitrary JSON value.
    ///
    /// Non-objects, unknown keys and values of the wrong type are ignored.
    pub fn from_value(options: &Value) -> Self {
        let Some(map) = options.as_object() else {
            debug!("Ignoring non-mapping gateway options");
            return Self::default();
        };

        for key in map.keys() {
            if !matches!(key.as_str(), "ttl" | "cascade" | "fetch_errors") {
                debug!("Ignoring unknown gateway option '{}'", key);
            }
        }

        Self {
            ttl: map.get("ttl").and_then(Value::as_u64),
            cascade: map
                .get("cascade")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            fetch_errors: map
                .get("fetch_errors")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
        }
    }
}

/// Resolved gateway configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// TTL in seconds applied when a container is made public
    pub ttl: u64,
    pub cascade: CascadePolicy,
    pub fetch_errors: FetchErrorPolicy,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            cascade: CascadePolicy::default(),
            fetch_errors: FetchErrorPolicy::default(),
        }
    }
}

impl From<GatewayInputConfig> for GatewayConfig {
    fn from(input: GatewayInputConfig) -> Self {
        let mut config = Self::default();
        config.merge(input);
        config
    }
}

impl GatewayConfig {
    /// Override fields that are set in `input`
    pub fn merge(&mut self, input: GatewayInputConfig) {
        if let Some(ttl) = input.ttl {
            self.ttl = ttl;
        }
        if let Some(cascade) = input.cascade {
            self.cascade = cascade;
        }
        if let Some(fetch_errors) = input.fetch_errors {
            self.fetch_errors = fetch_errors;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gateway_config_default() {
        let config = GatewayConfig::default();
        assert_eq!(config.ttl, 31557600);
        assert_eq!(config.cascade, CascadePolicy::Abort);
        assert_eq!(config.fetch_errors, FetchErrorPolicy::Swallow);
    }

    #[test]
    fn test_input_config_overrides_ttl() {
        let input = GatewayInputConfig::from_value(&json!({ "ttl": 3600 }));
        let config: GatewayConfig = input.into();
        assert_eq!(config.ttl, 3600);
        assert_eq!(config.cascade, CascadePolicy::Abort);
    }

    #[test]
    fn test_input_config_ignores_unknown_keys() {
        let input = GatewayInputConfig::from_value(&json!({ "region": "ord", "ttl": 60 }));
        assert_eq!(input.ttl, Some(60));
        assert!(input.cascade.is_none());
    }

    #[test]
    fn test_input_config_ignores_non_mapping() {
        for value in [json!(3600), json!("ttl"), json!([1, 2]), Value::Null] {
            let input = GatewayInputConfig::from_value(&value);
            assert!(input.ttl.is_none(), "Failed for {}", value);
        }
    }

    #[test]
    fn test_input_config_ignores_wrong_types() {
        let input = GatewayInputConfig::from_value(&json!({
            "ttl": "forever",
            "cascade": "sometimes",
        }));
        assert!(input.ttl.is_none());
        assert!(input.cascade.is_none());

        let input = GatewayInputConfig::from_value(&json!({ "ttl": -5 }));
        assert!(input.ttl.is_none());
    }

    #[test]
    fn test_input_config_policies() {
        let input = GatewayInputConfig::from_value(&json!({
            "cascade": "continue",
            "fetch_errors": "surface",
        }));
        let config: GatewayConfig = input.into();
        assert_eq!(config.cascade, CascadePolicy::Continue);
        assert_eq!(config.fetch_errors, FetchErrorPolicy::Surface);
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut config = GatewayConfig {
            ttl: 120,
            cascade: CascadePolicy::Continue,
            fetch_errors: FetchErrorPolicy::Surface,
        };
        config.merge(GatewayInputConfig {
            ttl: Some(240),
            ..Default::default()
        });
        assert_eq!(config.ttl, 240);
        assert_eq!(config.cascade, CascadePolicy::Continue);
        assert_eq!(config.fetch_errors, FetchErrorPolicy::Surface);
    }
}
