pub mod amount;
pub mod client;
pub mod config;
pub mod error;
pub mod farming;
pub mod protocols;

// Local signing - optional via "evm" feature
#[cfg(feature = "evm")]
pub mod wallet;

// Log subscriber setup - optional via "logging" feature
#[cfg(feature = "logging")]
pub mod logging;

// Main client exports
pub use client::{FarmClient, FarmClientBuilder};
pub use config::{EnvironmentConfig, FarmConfig};
pub use error::{ActionError, AmountError, Error, ReadError, Unavailable, WriteError};

// Farming core exports
pub use amount::{format_amount, is_empty_amount, parse_amount, DEFAULT_DISPLAY_PRECISION};
pub use farming::{
    ChainReader, ChainWriter, DepositControl, FarmAction, FarmingOrchestrator, FarmingSnapshot,
    PendingTransaction, PoolAsset, PoolRegistry, RewardProjection, StaticPoolRegistry,
    TokenDescriptor, TxOutcome, WithdrawControl,
};

// EVM backend exports
#[cfg(feature = "evm")]
pub use protocols::evm::{EvmChainReader, EvmChainWriter, EvmClient, EvmPoolRegistry};
#[cfg(feature = "evm")]
pub use wallet::{LocalWallet, TransactionSigner};

#[cfg(feature = "logging")]
pub use logging::init_logging;

// Re-export the amount type for user convenience
pub use alloy_primitives::{Address, U256};
