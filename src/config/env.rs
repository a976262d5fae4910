use config::{Config as ConfigLoader, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::Error;

/// Environment variable prefixes for different configuration sections
const ENV_PREFIX: &str = "FARM";
const ENV_NETWORK_PREFIX: &str = "FARM_NETWORK";
const ENV_CONTRACT_PREFIX: &str = "FARM_CONTRACT";
const ENV_LOG_PREFIX: &str = "FARM_LOG";

/// Network configuration loaded from environment/files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkEnvConfig {
    /// Network name (e.g., "ethereum")
    pub name: Option<String>,
    /// EVM chain ID for EIP-155 transactions
    pub chain_id: Option<u64>,
    /// JSON-RPC endpoint URL
    pub rpc_url: Option<String>,
}

/// Contract addresses loaded from environment/files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractEnvConfig {
    /// Farming (MasterChef) contract address
    pub master_chef: Option<String>,
}

/// Farming behaviour loaded from environment/files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FarmingEnvConfig {
    /// Upper bound for each background chain read (seconds, 0 disables)
    pub read_timeout_secs: Option<u64>,
    /// Reward token symbol for display
    pub reward_symbol: Option<String>,
    /// Reward token decimals
    pub reward_decimals: Option<u8>,
    /// Fraction digits shown for amounts
    pub display_precision: Option<u8>,
    /// Receipt polling interval (milliseconds)
    pub confirmation_poll_ms: Option<u64>,
    /// Give up waiting for a receipt after this long (seconds)
    pub confirmation_timeout_secs: Option<u64>,
}

/// Logging configuration from environment/files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingEnvConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: Option<String>,
    /// Log format (compact, pretty, json)
    pub format: Option<String>,
    /// Enable colored output
    pub enable_colors: Option<bool>,
}

/// Complete environment configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub network: NetworkEnvConfig,
    pub contracts: ContractEnvConfig,
    pub farming: FarmingEnvConfig,
    pub logging: LoggingEnvConfig,
    /// Configuration file paths that were loaded
    #[serde(skip)]
    pub loaded_files: Vec<String>,
}

impl EnvironmentConfig {
    /// Load configuration from files, then environment variables, then validate
    pub fn load() -> Result<Self, Error> {
        let mut env_config = Self::default();

        env_config.load_from_files()?;
        env_config.load_from_env()?;
        env_config.validate()?;

        Ok(env_config)
    }

    /// Load configuration from files
    fn load_from_files(&mut self) -> Result<(), Error> {
        let config_dir =
            env::var(format!("{}_CONFIG_DIR", ENV_PREFIX)).unwrap_or_else(|_| "config".to_string());

        let config_files = ["farm.toml", "farm.json", "config.toml"];
        let search_paths = [config_dir.as_str(), "config", "."];

        for search_path in search_paths {
            for config_file in config_files {
                let file_path = Path::new(search_path).join(config_file);
                let loaded = file_path.to_string_lossy().to_string();
                if file_path.exists() && !self.loaded_files.contains(&loaded) {
                    self.load_config_file(&file_path)?;
                    self.loaded_files.push(loaded);
                }
            }
        }

        Ok(())
    }

    /// Load a specific configuration file
    pub fn load_config_file(&mut self, file_path: &Path) -> Result<(), Error> {
        let file_format = match file_path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => FileFormat::Json,
            _ => FileFormat::Toml,
        };

        let settings = ConfigLoader::builder()
            .add_source(File::from(file_path).format(file_format))
            .build()
            .map_err(|e| Error::Config(format!("Failed to load config file: {}", e)))?;

        if let Ok(network_config) = settings.get::<NetworkEnvConfig>("network") {
            self.merge_network_config(network_config);
        }

        if let Ok(contract_config) = settings.get::<ContractEnvConfig>("contracts") {
            if contract_config.master_chef.is_some() {
                self.contracts.master_chef = contract_config.master_chef;
            }
        }

        if let Ok(farming_config) = settings.get::<FarmingEnvConfig>("farming") {
            self.merge_farming_config(farming_config);
        }

        if let Ok(logging_config) = settings.get::<LoggingEnvConfig>("logging") {
            self.merge_logging_config(logging_config);
        }

        Ok(())
    }

    /// Load configuration from environment variables
    fn load_from_env(&mut self) -> Result<(), Error> {
        if let Ok(name) = env::var(format!("{}_NAME", ENV_NETWORK_PREFIX)) {
            self.network.name = Some(name);
        }
        if let Some(chain_id) = parse_env(&format!("{}_CHAIN_ID", ENV_NETWORK_PREFIX)) {
            self.network.chain_id = Some(chain_id);
        }
        if let Ok(rpc_url) = env::var(format!("{}_RPC_URL", ENV_NETWORK_PREFIX)) {
            self.network.rpc_url = Some(rpc_url);
        }

        if let Ok(master_chef) = env::var(format!("{}_MASTER_CHEF", ENV_CONTRACT_PREFIX)) {
            self.contracts.master_chef = Some(master_chef);
        }

        if let Some(timeout) = parse_env(&format!("{}_READ_TIMEOUT_SECS", ENV_PREFIX)) {
            self.farming.read_timeout_secs = Some(timeout);
        }
        if let Ok(symbol) = env::var(format!("{}_REWARD_SYMBOL", ENV_PREFIX)) {
            self.farming.reward_symbol = Some(symbol);
        }
        if let Some(decimals) = parse_env(&format!("{}_REWARD_DECIMALS", ENV_PREFIX)) {
            self.farming.reward_decimals = Some(decimals);
        }
        if let Some(precision) = parse_env(&format!("{}_DISPLAY_PRECISION", ENV_PREFIX)) {
            self.farming.display_precision = Some(precision);
        }
        if let Some(poll) = parse_env(&format!("{}_CONFIRMATION_POLL_MS", ENV_PREFIX)) {
            self.farming.confirmation_poll_ms = Some(poll);
        }
        if let Some(timeout) = parse_env(&format!("{}_CONFIRMATION_TIMEOUT_SECS", ENV_PREFIX)) {
            self.farming.confirmation_timeout_secs = Some(timeout);
        }

        if let Ok(level) = env::var(format!("{}_LEVEL", ENV_LOG_PREFIX)) {
            self.logging.level = Some(level.to_lowercase());
        }
        if let Ok(format) = env::var(format!("{}_FORMAT", ENV_LOG_PREFIX)) {
            self.logging.format = Some(format.to_lowercase());
        }
        if let Some(colors) = parse_env(&format!("{}_COLORS", ENV_LOG_PREFIX)) {
            self.logging.enable_colors = Some(colors);
        }

        Ok(())
    }

    fn merge_network_config(&mut self, file_config: NetworkEnvConfig) {
        if file_config.name.is_some() {
            self.network.name = file_config.name;
        }
        if file_config.chain_id.is_some() {
            self.network.chain_id = file_config.chain_id;
        }
        if file_config.rpc_url.is_some() {
            self.network.rpc_url = file_config.rpc_url;
        }
    }

    fn merge_farming_config(&mut self, file_config: FarmingEnvConfig) {
        let farming = &mut self.farming;
        farming.read_timeout_secs = file_config.read_timeout_secs.or(farming.read_timeout_secs);
        farming.reward_symbol = file_config.reward_symbol.or(farming.reward_symbol.take());
        farming.reward_decimals = file_config.reward_decimals.or(farming.reward_decimals);
        farming.display_precision = file_config.display_precision.or(farming.display_precision);
        farming.confirmation_poll_ms = file_config
            .confirmation_poll_ms
            .or(farming.confirmation_poll_ms);
        farming.confirmation_timeout_secs = file_config
            .confirmation_timeout_secs
            .or(farming.confirmation_timeout_secs);
    }

    fn merge_logging_config(&mut self, file_config: LoggingEnvConfig) {
        if file_config.level.is_some() {
            self.logging.level = file_config.level;
        }
        if file_config.format.is_some() {
            self.logging.format = file_config.format;
        }
        if file_config.enable_colors.is_some() {
            self.logging.enable_colors = file_config.enable_colors;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(ref rpc_url) = self.network.rpc_url {
            if !rpc_url.starts_with("http://") && !rpc_url.starts_with("https://") {
                return Err(Error::Config(
                    "RPC URL must start with http:// or https://".to_string(),
                ));
            }
        }

        if let Some(ref master_chef) = self.contracts.master_chef {
            let hex = master_chef.strip_prefix("0x").unwrap_or("");
            if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(Error::Config(format!(
                    "Invalid farm contract address '{}'",
                    master_chef
                )));
            }
        }

        if let Some(decimals) = self.farming.reward_decimals {
            if decimals > 77 {
                return Err(Error::Config(
                    "Reward token decimals must be at most 77".to_string(),
                ));
            }
        }

        if let Some(poll) = self.farming.confirmation_poll_ms {
            if poll == 0 {
                return Err(Error::Config(
                    "Confirmation poll interval must be greater than 0".to_string(),
                ));
            }
        }

        if let Some(timeout) = self.farming.confirmation_timeout_secs {
            if timeout == 0 {
                return Err(Error::Config(
                    "Confirmation timeout must be greater than 0".to_string(),
                ));
            }
        }

        if let Some(ref level) = self.logging.level {
            let valid_levels = ["error", "warn", "info", "debug", "trace"];
            if !valid_levels.contains(&level.as_str()) {
                return Err(Error::Config(format!(
                    "Invalid log level '{}'. Must be one of: {:?}",
                    level, valid_levels
                )));
            }
        }

        if let Some(ref format) = self.logging.format {
            let valid_formats = ["compact", "pretty", "json"];
            if !valid_formats.contains(&format.as_str()) {
                return Err(Error::Config(format!(
                    "Invalid log format '{}'. Must be one of: {:?}",
                    format, valid_formats
                )));
            }
        }

        Ok(())
    }

    /// Generate default configuration file
    pub fn generate_default_config() -> Self {
        let mut config = Self::default();

        config.network.name = Some("ethereum".to_string());
        config.network.chain_id = Some(1);
        config.network.rpc_url = Some("https://eth.llamarpc.com".to_string());

        config.contracts.master_chef =
            Some("0xc2EdaD668740f1aA35E4D8f227fB8E17dcA888Cd".to_string());

        config.farming.read_timeout_secs = Some(30);
        config.farming.reward_symbol = Some("SUSHI".to_string());
        config.farming.reward_decimals = Some(18);
        config.farming.display_precision = Some(8);
        config.farming.confirmation_poll_ms = Some(2_000);
        config.farming.confirmation_timeout_secs = Some(600);

        config.logging.level = Some("info".to_string());
        config.logging.format = Some("compact".to_string());
        config.logging.enable_colors = Some(true);

        config
    }

    /// Save configuration to file
    pub fn save_to_file(&self, file_path: &Path) -> Result<(), Error> {
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(file_path, content)?;
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse().ok())
}
