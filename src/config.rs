use anyhow::{bail, Context, Result};

// ============================================================================
// Runtime Configuration
// ============================================================================
//
// All settings come from environment variables with local-development
// defaults, so `cargo run` works against a stock setup.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Scylla,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub http_host: String,
    pub http_port: u16,
    pub store: StoreKind,
    pub scylla_node: String,
    pub scylla_keyspace: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_host: "0.0.0.0".to_string(),
            http_port: 8082,
            store: StoreKind::Memory,
            scylla_node: "127.0.0.1:9042".to_string(),
            scylla_keyspace: "deliveries_ks".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("DELIVERY_HTTP_HOST") {
            config.http_host = host;
        }
        if let Some(port) = lookup("DELIVERY_HTTP_PORT") {
            config.http_port = port
                .parse()
                .with_context(|| format!("DELIVERY_HTTP_PORT is not a valid port: {port}"))?;
        }
        if let Some(store) = lookup("DELIVERY_STORE") {
            config.store = match store.to_ascii_lowercase().as_str() {
                "memory" => StoreKind::Memory,
                "scylla" => StoreKind::Scylla,
                other => bail!("DELIVERY_STORE must be 'memory' or 'scylla', got '{other}'"),
            };
        }
        if let Some(node) = lookup("SCYLLA_NODE") {
            config.scylla_node = node;
        }
        if let Some(keyspace) = lookup("SCYLLA_KEYSPACE") {
            config.scylla_keyspace = keyspace;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.http_port, 8082);
        assert_eq!(config.store, StoreKind::Memory);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DELIVERY_HTTP_HOST", "127.0.0.1"),
            ("DELIVERY_HTTP_PORT", "9000"),
            ("DELIVERY_STORE", "Scylla"),
            ("SCYLLA_NODE", "scylla:9042"),
            ("SCYLLA_KEYSPACE", "test_ks"),
        ]))
        .unwrap();

        assert_eq!(config.http_host, "127.0.0.1");
        assert_eq!(config.http_port, 9000);
        assert_eq!(config.store, StoreKind::Scylla);
        assert_eq!(config.scylla_node, "scylla:9042");
        assert_eq!(config.scylla_keyspace, "test_ks");
    }

    #[test]
    fn test_invalid_values() {
        assert!(AppConfig::from_lookup(lookup_from(&[("DELIVERY_HTTP_PORT", "eighty")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("DELIVERY_HTTP_PORT", "70000")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("DELIVERY_STORE", "couchbase")])).is_err());
    }
}
