//! Agent configuration parsing.
//!
//! This module handles parsing of the agent configuration file (TOML)
//! that points the secret binding engine at the exchange and the trust
//! store and describes the node it runs on.

use serde::{Deserialize, Serialize};

/// Top-level agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgentConfig {
    /// Exchange connection settings.
    #[serde(default)]
    pub exchange: ExchangeConfig,

    /// Trust store (secret manager) settings.
    #[serde(default)]
    pub trust_store: TrustStoreConfig,

    /// Local node settings.
    #[serde(default)]
    pub node: NodeConfig,
}

impl AgentConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or the node
    /// architecture is missing.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        if config.node.arch.is_empty() {
            return Err(ConfigError::Validation(
                "node.arch must be set to the architecture the agent runs on".to_string(),
            ));
        }
        Ok(config)
    }

    /// Serialize configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }
}

/// Exchange connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExchangeConfig {
    /// Base URL of the exchange API.
    #[serde(default)]
    pub url: String,

    /// Organization the agent authenticates under.
    #[serde(default)]
    pub org: String,
}

/// Trust store settings.
///
/// Both fields must be set before any secret existence check runs; the
/// verifier rejects an empty address or organization up front.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrustStoreConfig {
    /// Address of the agreement bot exposing the secret manager API.
    #[serde(default)]
    pub address: String,

    /// Organization whose secrets are being checked.
    #[serde(default)]
    pub org: String,
}

/// Local node settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeConfig {
    /// Architecture of the node, used when a service reference leaves
    /// the architecture open.
    #[serde(default)]
    pub arch: String,

    /// Validate wildcard service references against every architecture
    /// variant the exchange lists instead of only the node's own.
    #[serde(default)]
    pub check_all_arches: bool,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading configuration file.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Validation error.
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [exchange]
            url = "https://exchange.example.com/v1"
            org = "nodeorg"

            [trust_store]
            address = "https://agbot.example.com"
            org = "nodeorg"

            [node]
            arch = "amd64"
            check_all_arches = true
        "#;

        let config = AgentConfig::from_toml(toml).unwrap();
        assert_eq!(config.exchange.url, "https://exchange.example.com/v1");
        assert_eq!(config.trust_store.address, "https://agbot.example.com");
        assert_eq!(config.trust_store.org, "nodeorg");
        assert_eq!(config.node.arch, "amd64");
        assert!(config.node.check_all_arches);
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
            [node]
            arch = "arm64"
        "#;

        let config = AgentConfig::from_toml(toml).unwrap();
        assert_eq!(config.node.arch, "arm64");
        assert!(!config.node.check_all_arches);
        assert!(config.trust_store.address.is_empty());
    }

    #[test]
    fn test_missing_node_arch_rejected() {
        let err = AgentConfig::from_toml("").unwrap_err();
        match err {
            ConfigError::Validation(msg) => assert!(msg.contains("node.arch")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let err = AgentConfig::from_toml("[node").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = AgentConfig {
            exchange: ExchangeConfig {
                url: "https://exchange.example.com/v1".to_string(),
                org: "nodeorg".to_string(),
            },
            trust_store: TrustStoreConfig {
                address: "https://agbot.example.com".to_string(),
                org: "nodeorg".to_string(),
            },
            node: NodeConfig {
                arch: "amd64".to_string(),
                check_all_arches: false,
            },
        };
        let reparsed = AgentConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(reparsed.node.arch, "amd64");
        assert_eq!(reparsed.exchange.org, "nodeorg");
    }
}
