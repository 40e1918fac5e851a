//! Configuration management for VaultNexus

use crate::error::{MarketError, Result};
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

#[derive(Debug, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    /// Amount the faucet endpoint credits per request (dev ledger only).
    #[serde(default = "default_faucet_amount")]
    pub faucet_amount: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            faucet_amount: default_faucet_amount(),
        }
    }
}

pub fn load_config() -> Result<Config> {
    load_config_from("config.toml")
}

pub fn load_config_from(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path).unwrap_or_default();
    let config: Config = if config_str.is_empty() {
        // Provide sane defaults when config.toml is absent
        Config {
            network: NetworkConfig {
                api_port: default_api_port(),
            },
            database: DatabaseConfig {
                path: default_database_path(),
            },
            ledger: LedgerConfig::default(),
        }
    } else {
        toml::from_str(&config_str)
            .map_err(|e| MarketError::ConfigError(format!("Failed to parse {}: {}", path, e)))?
    };

    // Validate critical values
    if config.database.path.is_empty() {
        return Err(MarketError::ConfigError(
            "database.path must be set in config.toml".to_string(),
        ));
    }

    Ok(config)
}

fn default_api_port() -> u16 {
    3000
}

fn default_database_path() -> String {
    "./vault-nexus.db".to_string()
}

fn default_faucet_amount() -> u64 {
    1_000_000_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_file_missing() {
        let config = load_config_from("/nonexistent/config.toml").unwrap();
        assert_eq!(config.network.api_port, 3000);
        assert_eq!(config.database.path, "./vault-nexus.db");
        assert_eq!(config.ledger.faucet_amount, 1_000_000_000);
    }

    #[test]
    fn test_parse_with_partial_sections() {
        let toml_str = r#"
            [network]
            api_port = 8080

            [database]
            path = "/tmp/test.db"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.network.api_port, 8080);
        assert_eq!(config.database.path, "/tmp/test.db");
        assert_eq!(config.ledger.faucet_amount, 1_000_000_000);
    }

    #[test]
    fn test_empty_database_path_rejected() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[network]\napi_port = 8080\n\n[database]\npath = \"\"\n").unwrap();
        assert!(load_config_from(path.to_str().unwrap()).is_err());
    }
}
