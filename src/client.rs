use alloy_primitives::U256;
use std::sync::Arc;
use tracing::{debug, info};

use crate::amount::format_amount;
use crate::config::FarmConfig;
use crate::error::Error;
use crate::farming::{
    ChainReader, ChainWriter, FarmingOrchestrator, PoolRegistry, StaticPoolRegistry,
};

#[cfg(feature = "evm")]
use crate::protocols::evm::{EvmChainReader, EvmChainWriter, EvmClient, EvmPoolRegistry};
#[cfg(feature = "evm")]
use crate::wallet::TransactionSigner;

/// Farming client: configuration, pool source and orchestrator wired together
#[derive(Clone)]
pub struct FarmClient {
    config: FarmConfig,
    registry: Arc<dyn PoolRegistry>,
    orchestrator: FarmingOrchestrator,
}

impl std::fmt::Debug for FarmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FarmClient")
            .field("config", &self.config)
            .field("spender", &self.orchestrator.spender())
            .finish()
    }
}

impl FarmClient {
    /// Get the resolved configuration
    pub fn config(&self) -> &FarmConfig {
        &self.config
    }

    /// Get the orchestrator that owns the farming state
    pub fn orchestrator(&self) -> &FarmingOrchestrator {
        &self.orchestrator
    }

    /// Refresh the pool list from the configured registry
    pub async fn load_pools(&self) -> Result<usize, Error> {
        self.orchestrator.load_pools(self.registry.as_ref()).await
    }

    /// Format an LP or underlying token amount with the configured precision
    pub fn format_amount(&self, amount: U256, decimals: u8) -> String {
        format_amount(amount, decimals, self.config.farming.display_precision)
    }

    /// Format a reward token amount, e.g. "1.25 SUSHI"
    pub fn format_reward(&self, amount: U256) -> String {
        format!(
            "{} {}",
            format_amount(
                amount,
                self.config.farming.reward_decimals,
                self.config.farming.display_precision
            ),
            self.config.farming.reward_symbol
        )
    }
}

/// Builder for creating a FarmClient
#[derive(Default)]
pub struct FarmClientBuilder {
    config: Option<FarmConfig>,
    reader: Option<Arc<dyn ChainReader>>,
    writer: Option<Arc<dyn ChainWriter>>,
    registry: Option<Arc<dyn PoolRegistry>>,
    #[cfg(feature = "evm")]
    signer: Option<Arc<dyn TransactionSigner>>,
    #[cfg(feature = "evm")]
    pool_ids: Vec<u64>,
}

impl FarmClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this configuration instead of loading it from files and environment
    pub fn with_config(mut self, config: FarmConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a custom chain backend
    pub fn with_backend(
        mut self,
        reader: Arc<dyn ChainReader>,
        writer: Arc<dyn ChainWriter>,
    ) -> Self {
        self.reader = Some(reader);
        self.writer = Some(writer);
        self
    }

    /// Set the source of farmable pools
    pub fn with_registry(mut self, registry: Arc<dyn PoolRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sign with this account and use the EVM backend
    #[cfg(feature = "evm")]
    pub fn with_signer(mut self, signer: Arc<dyn TransactionSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Farm pool ids to list when no registry is set; all farm pools by default
    #[cfg(feature = "evm")]
    pub fn with_pool_ids(mut self, pool_ids: Vec<u64>) -> Self {
        self.pool_ids = pool_ids;
        self
    }

    /// Build the FarmClient
    ///
    /// Without an explicit configuration it is loaded from files and `FARM_*`
    /// environment variables. A custom backend takes precedence over the EVM one.
    pub fn build(self) -> Result<FarmClient, Error> {
        let config = match self.config {
            Some(config) => {
                config.validate()?;
                config
            }
            None => FarmConfig::from_env()?,
        };
        let spender = config.master_chef_address()?;

        let (reader, writer, registry) = match (self.reader, self.writer) {
            (Some(reader), Some(writer)) => {
                debug!("Using custom chain backend");
                let registry = self
                    .registry
                    .unwrap_or_else(|| Arc::new(StaticPoolRegistry::default()));
                (reader, writer, registry)
            }
            #[cfg(feature = "evm")]
            _ => {
                let signer = self.signer.ok_or_else(|| {
                    Error::Config("A signer is required for the EVM backend".to_string())
                })?;
                let account = signer.address();
                let client = EvmClient::new(&config.network.rpc_url, config.network.chain_id)?;

                let reader: Arc<dyn ChainReader> =
                    Arc::new(EvmChainReader::new(client.clone(), spender, account));
                let writer: Arc<dyn ChainWriter> = Arc::new(
                    EvmChainWriter::new(client.clone(), spender, signer)
                        .with_poll_interval(config.confirmation_poll_interval())
                        .with_confirmation_timeout(config.confirmation_timeout()),
                );
                let registry = match self.registry {
                    Some(registry) => registry,
                    None => Arc::new(EvmPoolRegistry::new(
                        client,
                        spender,
                        account,
                        self.pool_ids,
                    )),
                };
                info!(
                    "Connected {} to {} (chain {})",
                    account, config.network.rpc_url, config.network.chain_id
                );
                (reader, writer, registry)
            }
            #[cfg(not(feature = "evm"))]
            _ => {
                return Err(Error::Config(
                    "No chain backend configured; enable the `evm` feature or call with_backend"
                        .to_string(),
                ))
            }
        };

        let orchestrator = FarmingOrchestrator::new(reader, writer, spender)
            .with_read_timeout(config.read_timeout());

        Ok(FarmClient {
            config,
            registry,
            orchestrator,
        })
    }
}
