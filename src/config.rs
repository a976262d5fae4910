//! Configuration management for the farming SDK
//!
//! [`EnvironmentConfig`] collects optional values from configuration files and `FARM_*`
//! environment variables. [`FarmConfig`] is the resolved form, with every value present,
//! that the client and backends consume.

pub mod env;

pub use env::{
    ContractEnvConfig, EnvironmentConfig, FarmingEnvConfig, LoggingEnvConfig, NetworkEnvConfig,
};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::amount::DEFAULT_DISPLAY_PRECISION;
use crate::error::Error;

/// SushiSwap MasterChef on Ethereum mainnet
pub const DEFAULT_MASTER_CHEF: &str = "0xc2EdaD668740f1aA35E4D8f227fB8E17dcA888Cd";

/// Network connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network name (e.g., ethereum)
    pub name: String,
    /// EVM chain ID
    pub chain_id: u64,
    /// JSON-RPC endpoint URL
    pub rpc_url: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "ethereum".to_string(),
            chain_id: 1,
            rpc_url: "https://eth.llamarpc.com".to_string(),
        }
    }
}

/// Contract addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractsConfig {
    /// Farming (MasterChef) contract address
    pub master_chef: String,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            master_chef: DEFAULT_MASTER_CHEF.to_string(),
        }
    }
}

/// Farming behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmingConfig {
    /// Upper bound for each background read in seconds; 0 disables the bound
    pub read_timeout_secs: u64,
    pub reward_symbol: String,
    pub reward_decimals: u8,
    pub display_precision: u8,
    pub confirmation_poll_ms: u64,
    pub confirmation_timeout_secs: u64,
}

impl Default for FarmingConfig {
    fn default() -> Self {
        Self {
            read_timeout_secs: 30,
            reward_symbol: "SUSHI".to_string(),
            reward_decimals: 18,
            display_precision: DEFAULT_DISPLAY_PRECISION,
            confirmation_poll_ms: 2_000,
            confirmation_timeout_secs: 600,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// compact, pretty or json
    pub format: String,
    pub enable_colors: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
            enable_colors: true,
        }
    }
}

/// Complete resolved configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub contracts: ContractsConfig,
    #[serde(default)]
    pub farming: FarmingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FarmConfig {
    /// Load from configuration files and `FARM_*` environment variables
    pub fn from_env() -> Result<Self, Error> {
        let env_config = EnvironmentConfig::load()?;
        Ok(Self::from_env_config(&env_config))
    }

    /// Resolve an environment configuration, filling gaps with defaults
    pub fn from_env_config(env_config: &EnvironmentConfig) -> Self {
        let defaults = Self::default();
        let network = &env_config.network;
        let farming = &env_config.farming;
        let logging = &env_config.logging;

        Self {
            network: NetworkConfig {
                name: network.name.clone().unwrap_or(defaults.network.name),
                chain_id: network.chain_id.unwrap_or(defaults.network.chain_id),
                rpc_url: network.rpc_url.clone().unwrap_or(defaults.network.rpc_url),
            },
            contracts: ContractsConfig {
                master_chef: env_config
                    .contracts
                    .master_chef
                    .clone()
                    .unwrap_or(defaults.contracts.master_chef),
            },
            farming: FarmingConfig {
                read_timeout_secs: farming
                    .read_timeout_secs
                    .unwrap_or(defaults.farming.read_timeout_secs),
                reward_symbol: farming
                    .reward_symbol
                    .clone()
                    .unwrap_or(defaults.farming.reward_symbol),
                reward_decimals: farming
                    .reward_decimals
                    .unwrap_or(defaults.farming.reward_decimals),
                display_precision: farming
                    .display_precision
                    .unwrap_or(defaults.farming.display_precision),
                confirmation_poll_ms: farming
                    .confirmation_poll_ms
                    .unwrap_or(defaults.farming.confirmation_poll_ms),
                confirmation_timeout_secs: farming
                    .confirmation_timeout_secs
                    .unwrap_or(defaults.farming.confirmation_timeout_secs),
            },
            logging: LoggingConfig {
                level: logging.level.clone().unwrap_or(defaults.logging.level),
                format: logging.format.clone().unwrap_or(defaults.logging.format),
                enable_colors: logging
                    .enable_colors
                    .unwrap_or(defaults.logging.enable_colors),
            },
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path)?;
        let config: FarmConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("farm-sdk");
        path.push("config.toml");
        path
    }

    /// Validate by running the resolved values through the environment rules
    pub fn validate(&self) -> Result<(), Error> {
        let env_config = EnvironmentConfig {
            network: NetworkEnvConfig {
                name: Some(self.network.name.clone()),
                chain_id: Some(self.network.chain_id),
                rpc_url: Some(self.network.rpc_url.clone()),
            },
            contracts: ContractEnvConfig {
                master_chef: Some(self.contracts.master_chef.clone()),
            },
            farming: FarmingEnvConfig {
                read_timeout_secs: Some(self.farming.read_timeout_secs),
                reward_symbol: Some(self.farming.reward_symbol.clone()),
                reward_decimals: Some(self.farming.reward_decimals),
                display_precision: Some(self.farming.display_precision),
                confirmation_poll_ms: Some(self.farming.confirmation_poll_ms),
                confirmation_timeout_secs: Some(self.farming.confirmation_timeout_secs),
            },
            logging: LoggingEnvConfig {
                level: Some(self.logging.level.clone()),
                format: Some(self.logging.format.clone()),
                enable_colors: Some(self.logging.enable_colors),
            },
            loaded_files: Vec::new(),
        };
        env_config.validate()
    }

    /// Farming contract address, which is also the LP token spender
    pub fn master_chef_address(&self) -> Result<Address, Error> {
        Address::from_str(&self.contracts.master_chef).map_err(|e| {
            Error::Config(format!(
                "Invalid farm contract address '{}': {}",
                self.contracts.master_chef, e
            ))
        })
    }

    /// Bound applied to each background read; `None` when disabled
    pub fn read_timeout(&self) -> Option<Duration> {
        match self.farming.read_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn confirmation_poll_interval(&self) -> Duration {
        Duration::from_millis(self.farming.confirmation_poll_ms)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.farming.confirmation_timeout_secs)
    }
}
