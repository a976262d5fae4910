/// EVM-specific types shared by the client, contract helpers and farming backend
use alloy_primitives::U256;

use crate::error::{Error, ReadError, WriteError};

/// EIP-1559 fee suggestion in wei per gas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSuggestion {
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

impl FeeSuggestion {
    /// Build a suggestion from the latest base fee and tip
    ///
    /// The max fee leaves room for the base fee to double before the next block.
    pub fn from_base_fee(base_fee: U256, priority_fee: U256) -> Self {
        Self {
            max_fee_per_gas: base_fee.saturating_mul(U256::from(2u64)).saturating_add(priority_fee),
            max_priority_fee_per_gas: priority_fee,
        }
    }
}

/// EVM-specific errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvmError {
    #[error("Invalid Ethereum address: {0}")]
    InvalidAddress(String),

    #[error("ABI encoding/decoding error: {0}")]
    AbiError(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Gas estimation failed: {0}")]
    GasEstimationError(String),

    #[error("Transaction reverted: {0}")]
    TransactionReverted(String),

    #[error("Transaction {0} not confirmed in time")]
    ConfirmationTimeout(String),

    #[error("Pool {0} has nothing staked")]
    EmptyPool(u64),
}

impl From<EvmError> for Error {
    fn from(err: EvmError) -> Self {
        Error::Evm(err.to_string())
    }
}

impl From<EvmError> for ReadError {
    fn from(err: EvmError) -> Self {
        match err {
            EvmError::RpcError(msg) => ReadError::Network(msg),
            other => ReadError::Chain(other.to_string()),
        }
    }
}

impl From<EvmError> for WriteError {
    fn from(err: EvmError) -> Self {
        match err {
            // eth_estimateGas fails with the revert reason when the call would revert
            EvmError::TransactionReverted(msg) | EvmError::GasEstimationError(msg) => {
                WriteError::Reverted(msg)
            }
            EvmError::RpcError(msg) => WriteError::Network(msg),
            other => WriteError::Network(other.to_string()),
        }
    }
}
