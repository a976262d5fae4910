/// `ChainWriter` that signs and broadcasts farm transactions
use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::WriteError;
use crate::farming::{ChainWriter, Confirmation, PendingTransaction, PoolAsset};
use crate::protocols::evm::client::EvmClient;
use crate::protocols::evm::contracts::{Erc20, MasterChef};
use crate::protocols::evm::tx::Eip1559Transaction;
use crate::protocols::evm::types::EvmError;
use crate::wallet::TransactionSigner;

/// Gas estimate buffer for farm calls
pub const GAS_BUFFER_PERCENT: u64 = 20;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(600);

/// Sends approve, deposit and withdraw transactions for the signer's account
#[derive(Clone)]
pub struct EvmChainWriter {
    client: EvmClient,
    master_chef: Address,
    signer: Arc<dyn TransactionSigner>,
    poll_interval: Duration,
    confirmation_timeout: Duration,
}

impl EvmChainWriter {
    pub fn new(client: EvmClient, master_chef: Address, signer: Arc<dyn TransactionSigner>) -> Self {
        Self {
            client,
            master_chef,
            signer,
            poll_interval: DEFAULT_POLL_INTERVAL,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }

    /// Receipt polling interval
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Give up waiting for a receipt after this long
    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    /// Build, sign and broadcast a call, returning a handle that resolves on its receipt
    async fn send(&self, to: Address, call_data: Vec<u8>) -> Result<PendingTransaction, WriteError> {
        let from = self.signer.address();

        let (nonce, fees) = futures::try_join!(
            self.client.get_pending_nonce(from),
            self.client.fee_suggestion(),
        )?;

        let tx = Eip1559Transaction::contract_call(self.client.chain_id(), nonce, to, call_data)
            .fees(&fees);
        let gas_estimate = self.client.estimate_gas(&tx, from).await?;
        let tx = tx.buffered_gas_limit(gas_estimate, GAS_BUFFER_PERCENT);

        let signed = self.signer.sign_transaction(&tx).await?;
        let tx_hash = self.client.send_raw_transaction(&signed).await?;
        info!("Submitted transaction {} to {} (nonce {})", tx_hash, to, nonce);

        let confirmation = wait_for_receipt(
            self.client.clone(),
            tx_hash,
            self.poll_interval,
            self.confirmation_timeout,
        );
        Ok(PendingTransaction::new(tx_hash, confirmation))
    }
}

/// Poll for the receipt of `tx_hash` until it is mined or `timeout` elapses
///
/// RPC failures while polling are transient; only a failed receipt status or the
/// timeout end the wait with an error.
async fn wait_for_receipt(
    client: EvmClient,
    tx_hash: B256,
    poll_interval: Duration,
    timeout: Duration,
) -> Result<Confirmation, WriteError> {
    let poll = async {
        loop {
            match client.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) if receipt.status() => {
                    return Ok(Confirmation {
                        tx_hash,
                        block_number: receipt.block_number,
                    });
                }
                Ok(Some(_)) => {
                    return Err(WriteError::Reverted(format!(
                        "transaction {} reverted",
                        tx_hash
                    )));
                }
                Ok(None) => debug!("Transaction {} not mined yet", tx_hash),
                Err(e) => warn!("Failed to fetch receipt for {}: {}", tx_hash, e),
            }
            tokio::time::sleep(poll_interval).await;
        }
    };

    match tokio::time::timeout(timeout, poll).await {
        Ok(result) => result,
        Err(_) => Err(EvmError::ConfirmationTimeout(tx_hash.to_string()).into()),
    }
}

#[async_trait]
impl ChainWriter for EvmChainWriter {
    async fn approve(
        &self,
        pool: &PoolAsset,
        spender: Address,
    ) -> Result<PendingTransaction, WriteError> {
        self.send(pool.address, Erc20::encode_approve(spender, U256::MAX))
            .await
    }

    async fn deposit(
        &self,
        pool: &PoolAsset,
        amount: U256,
    ) -> Result<PendingTransaction, WriteError> {
        self.send(self.master_chef, MasterChef::encode_deposit(pool.pid, amount))
            .await
    }

    async fn withdraw(
        &self,
        pool: &PoolAsset,
        amount: U256,
    ) -> Result<PendingTransaction, WriteError> {
        self.send(self.master_chef, MasterChef::encode_withdraw(pool.pid, amount))
            .await
    }
}
