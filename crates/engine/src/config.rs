//! Engine configuration, read from the environment.

use std::path::PathBuf;

use rollreq_shared::DecodePolicy;

/// Published requests kept for results lookups.
pub const DEFAULT_REQUEST_LIMIT: usize = 100;
pub const DEFAULT_OUTCOME_BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub server_host: String,
    pub server_port: u16,
    /// SQLite file holding settings and history.
    pub settings_db: String,
    pub outcome_bus_capacity: usize,
    pub request_limit: usize,
    /// JSON roll catalog; the standard catalog is used when unset.
    pub catalog_path: Option<PathBuf>,
    /// How share strings with unreadable rolls are decoded.
    pub decode_policy: DecodePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".into(),
            server_port: 3000,
            settings_db: "settings.db".into(),
            outcome_bus_capacity: DEFAULT_OUTCOME_BUS_CAPACITY,
            request_limit: DEFAULT_REQUEST_LIMIT,
            catalog_path: None,
            decode_policy: DecodePolicy::Lenient,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            server_host: value("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: value("SERVER_PORT")
                .or_else(|| value("PORT"))
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            settings_db: value("SETTINGS_DB").unwrap_or(defaults.settings_db),
            outcome_bus_capacity: value("OUTCOME_BUS_CAPACITY")
                .and_then(|v| v.parse().ok())
                .filter(|capacity: &usize| *capacity > 0)
                .unwrap_or(defaults.outcome_bus_capacity),
            request_limit: value("REQUEST_LIMIT")
                .and_then(|v| v.parse().ok())
                .filter(|limit: &usize| *limit > 0)
                .unwrap_or(defaults.request_limit),
            catalog_path: value("CATALOG_PATH").map(PathBuf::from),
            decode_policy: value("DECODE_POLICY")
                .and_then(|v| parse_decode_policy(&v))
                .unwrap_or(defaults.decode_policy),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_decode_policy(value: &str) -> Option<DecodePolicy> {
    match value.to_ascii_lowercase().as_str() {
        "lenient" => Some(DecodePolicy::Lenient),
        "strict" => Some(DecodePolicy::Strict),
        other => {
            tracing::warn!(value = %other, "Unknown DECODE_POLICY, using lenient");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> EngineConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config(&[]), EngineConfig::default());
    }

    #[test]
    fn port_falls_back_to_port_variable() {
        assert_eq!(config(&[("PORT", "8080")]).server_port, 8080);
        assert_eq!(
            config(&[("SERVER_PORT", "9000"), ("PORT", "8080")]).server_port,
            9000
        );
    }

    #[test]
    fn bad_numbers_use_defaults() {
        let config = config(&[
            ("SERVER_PORT", "http"),
            ("OUTCOME_BUS_CAPACITY", "0"),
            ("REQUEST_LIMIT", "-3"),
        ]);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.outcome_bus_capacity, DEFAULT_OUTCOME_BUS_CAPACITY);
        assert_eq!(config.request_limit, DEFAULT_REQUEST_LIMIT);
    }

    #[test]
    fn catalog_path_and_address() {
        let config = config(&[
            ("CATALOG_PATH", "data/catalog.json"),
            ("SERVER_HOST", "127.0.0.1"),
        ]);
        assert_eq!(config.catalog_path, Some(PathBuf::from("data/catalog.json")));
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn decode_policy_is_configurable() {
        assert_eq!(config(&[]).decode_policy, DecodePolicy::Lenient);
        assert_eq!(
            config(&[("DECODE_POLICY", "Strict")]).decode_policy,
            DecodePolicy::Strict
        );
        assert_eq!(
            config(&[("DECODE_POLICY", "picky")]).decode_policy,
            DecodePolicy::Lenient
        );
    }
}
