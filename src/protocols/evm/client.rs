/// EVM Client
///
/// Thin wrapper over an alloy HTTP provider covering what the farming backend needs:
/// contract calls, gas and fee estimation, nonces, raw transaction submission and
/// receipt lookup.
use alloy_primitives::{Address, Bytes, TxKind, B256, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types_eth::{BlockNumberOrTag, TransactionReceipt, TransactionRequest};
use alloy_sol_types::SolCall;
use alloy_transport_http::{Client, Http};
use tracing::debug;

use crate::error::Error;
use crate::protocols::evm::contracts::{Erc20, LpPair, MasterChef};
use crate::protocols::evm::tx::{Eip1559Transaction, SignedEip1559Transaction};
use crate::protocols::evm::types::{EvmError, FeeSuggestion};

/// EVM Client for blockchain interactions
#[derive(Clone)]
pub struct EvmClient {
    /// Alloy provider for RPC communication
    provider: alloy_provider::RootProvider<Http<Client>>,
    /// Chain ID for transaction signing
    chain_id: u64,
}

impl EvmClient {
    /// Create a new EVM client with the given RPC endpoint and chain ID
    pub fn new(rpc_url: &str, chain_id: u64) -> Result<Self, Error> {
        let url = reqwest::Url::parse(rpc_url)
            .map_err(|e| Error::Config(format!("Invalid RPC URL: {}", e)))?;
        let provider = ProviderBuilder::new().on_http(url);

        Ok(Self { provider, chain_id })
    }

    /// Get the chain ID
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Execute a read-only call of raw calldata
    pub async fn call_raw(&self, to: Address, data: Vec<u8>) -> Result<Bytes, EvmError> {
        let tx_request = TransactionRequest {
            to: Some(TxKind::Call(to)),
            input: Bytes::from(data).into(),
            ..Default::default()
        };

        self.provider
            .call(&tx_request)
            .await
            .map_err(|e| EvmError::RpcError(e.to_string()))
    }

    /// Call a contract method (read-only) and decode its return values
    pub async fn call_contract<T: SolCall>(
        &self,
        contract_address: Address,
        call: T,
    ) -> Result<T::Return, EvmError> {
        let result = self.call_raw(contract_address, call.abi_encode()).await?;
        T::abi_decode_returns(&result, false).map_err(|e| {
            EvmError::AbiError(format!("Failed to decode {} result: {}", T::SIGNATURE, e))
        })
    }

    /// Estimate gas for a transaction sent by `from`
    pub async fn estimate_gas(
        &self,
        tx: &Eip1559Transaction,
        from: Address,
    ) -> Result<u64, EvmError> {
        let gas = self
            .provider
            .estimate_gas(&tx.to_request(from))
            .await
            .map_err(|e| EvmError::GasEstimationError(e.to_string()))?;

        Ok(gas)
    }

    /// Get the current block number
    pub async fn get_block_number(&self) -> Result<u64, EvmError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| EvmError::RpcError(e.to_string()))
    }

    /// Get the current gas price (legacy)
    pub async fn get_gas_price(&self) -> Result<U256, EvmError> {
        let gas_price = self
            .provider
            .get_gas_price()
            .await
            .map_err(|e| EvmError::RpcError(e.to_string()))?;

        Ok(U256::from(gas_price))
    }

    /// Get EIP-1559 fee data as (base fee, priority fee)
    pub async fn get_fee_data(&self) -> Result<(U256, U256), EvmError> {
        let fee_history = self
            .provider
            .get_fee_history(1, BlockNumberOrTag::Latest, &[50.0])
            .await
            .map_err(|e| EvmError::RpcError(e.to_string()))?;

        if let (Some(base_fee), Some(reward)) = (
            fee_history.base_fee_per_gas.last(),
            fee_history
                .reward
                .as_ref()
                .and_then(|r| r.last())
                .and_then(|r| r.first()),
        ) {
            Ok((U256::from(*base_fee), U256::from(*reward)))
        } else {
            // Fallback to gas price
            let gas_price = self.get_gas_price().await?;
            Ok((gas_price, gas_price / U256::from(10)))
        }
    }

    /// Suggested EIP-1559 fees for the next block
    pub async fn fee_suggestion(&self) -> Result<FeeSuggestion, EvmError> {
        let (base_fee, priority_fee) = self.get_fee_data().await?;
        Ok(FeeSuggestion::from_base_fee(base_fee, priority_fee))
    }

    /// Nonce for the next transaction of `address`, counting pending ones
    pub async fn get_pending_nonce(&self, address: Address) -> Result<u64, EvmError> {
        self.provider
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(|e| EvmError::RpcError(e.to_string()))
    }

    /// Submit a signed transaction
    pub async fn send_raw_transaction(
        &self,
        signed_tx: &SignedEip1559Transaction,
    ) -> Result<B256, EvmError> {
        let pending = self
            .provider
            .send_raw_transaction(signed_tx.raw())
            .await
            .map_err(|e| EvmError::RpcError(e.to_string()))?;

        let tx_hash = *pending.tx_hash();
        debug!("Broadcast transaction {}", tx_hash);
        Ok(tx_hash)
    }

    /// Get transaction receipt by hash
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TransactionReceipt>, EvmError> {
        self.provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| EvmError::RpcError(e.to_string()))
    }

    /// Create an ERC-20 helper for the given contract address
    pub fn erc20(&self, address: Address) -> Erc20 {
        Erc20::new(self.clone(), address)
    }

    /// Create a MasterChef helper for the given contract address
    pub fn master_chef(&self, address: Address) -> MasterChef {
        MasterChef::new(self.clone(), address)
    }

    /// Create an LP pair helper for the given contract address
    pub fn lp_pair(&self, address: Address) -> LpPair {
        LpPair::new(self.clone(), address)
    }
}
