/// Read-only chain queries consumed by the orchestrator
use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use crate::error::ReadError;
use crate::farming::types::PoolAsset;

/// Allowance at or above which the farm is considered approved for a pool
///
/// Approvals are issued for `U256::MAX`, which the token decrements on every
/// transfer; any allowance above `U256::MAX / 100` is still effectively unlimited.
pub fn allowance_threshold() -> U256 {
    U256::MAX / U256::from(100u64)
}

/// Whether an allowance read counts as "approved"
pub fn is_allowed(allowance: U256) -> bool {
    allowance >= allowance_threshold()
}

/// Chain queries for the connected account
///
/// Every call is independently fallible; the orchestrator treats failures as
/// "unknown" rather than errors.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// LP token balance of the account
    async fn get_balance(&self, pool: &PoolAsset) -> Result<U256, ReadError>;

    /// LP token allowance granted by the account to `spender`
    async fn get_allowance(&self, pool: &PoolAsset, spender: Address) -> Result<U256, ReadError>;

    /// LP tokens the account has deposited in the farm pool
    async fn get_deposited(&self, pool: &PoolAsset) -> Result<U256, ReadError>;

    /// Reward accrued by the account and not yet claimed
    async fn get_pending_reward(&self, pool: &PoolAsset) -> Result<U256, ReadError>;

    /// Reward paid per block for one whole LP token (`10^decimals` base units)
    async fn get_reward_rate_per_block(&self, pool: &PoolAsset) -> Result<U256, ReadError>;
}
