/// State-changing chain calls consumed by the orchestrator
use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;

use crate::error::WriteError;
use crate::farming::types::{Confirmation, PoolAsset};

/// A submitted transaction awaiting confirmation
///
/// Submitted transactions cannot be cancelled; the only way out is the
/// confirmation resolving to success or failure.
pub struct PendingTransaction {
    tx_hash: B256,
    confirmation: BoxFuture<'static, Result<Confirmation, WriteError>>,
}

impl PendingTransaction {
    /// Wrap a future that resolves once the transaction is mined
    pub fn new<F>(tx_hash: B256, confirmation: F) -> Self
    where
        F: Future<Output = Result<Confirmation, WriteError>> + Send + 'static,
    {
        Self {
            tx_hash,
            confirmation: confirmation.boxed(),
        }
    }

    /// A transaction that is already known to be mined
    pub fn confirmed(tx_hash: B256, block_number: Option<u64>) -> Self {
        Self::new(
            tx_hash,
            futures::future::ready(Ok(Confirmation {
                tx_hash,
                block_number,
            })),
        )
    }

    /// Hash of the submitted transaction
    pub fn tx_hash(&self) -> B256 {
        self.tx_hash
    }

    /// Wait for the transaction to be mined
    pub async fn wait(self) -> Result<Confirmation, WriteError> {
        self.confirmation.await
    }
}

impl std::fmt::Debug for PendingTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTransaction")
            .field("tx_hash", &self.tx_hash)
            .finish()
    }
}

/// Farm transactions signed on behalf of the connected account
#[async_trait]
pub trait ChainWriter: Send + Sync {
    /// Approve `spender` to move the pool's LP tokens without limit
    async fn approve(
        &self,
        pool: &PoolAsset,
        spender: Address,
    ) -> Result<PendingTransaction, WriteError>;

    /// Stake `amount` LP tokens in the farm pool
    async fn deposit(&self, pool: &PoolAsset, amount: U256)
        -> Result<PendingTransaction, WriteError>;

    /// Unstake `amount` LP tokens; the farm pays out pending reward alongside
    async fn withdraw(
        &self,
        pool: &PoolAsset,
        amount: U256,
    ) -> Result<PendingTransaction, WriteError>;
}
