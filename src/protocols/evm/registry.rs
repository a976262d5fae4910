/// Pool registry that discovers farm pools from the MasterChef contract
use alloy_primitives::Address;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::Error;
use crate::farming::{PoolAsset, PoolRegistry, TokenDescriptor};
use crate::protocols::evm::client::EvmClient;
use crate::protocols::evm::types::EvmError;

/// Builds [`PoolAsset`]s for a set of farm pool ids
///
/// With no pool ids every pool the farm reports is listed. Pools whose metadata
/// cannot be read are skipped with a warning so that one broken pool does not hide
/// the others.
#[derive(Clone)]
pub struct EvmPoolRegistry {
    client: EvmClient,
    master_chef: Address,
    account: Address,
    pids: Vec<u64>,
}

impl EvmPoolRegistry {
    pub fn new(client: EvmClient, master_chef: Address, account: Address, pids: Vec<u64>) -> Self {
        Self {
            client,
            master_chef,
            account,
            pids,
        }
    }

    /// Configured pool ids, or all farm pools when none are configured
    async fn pool_ids(&self) -> Result<Vec<u64>, EvmError> {
        if !self.pids.is_empty() {
            return Ok(self.pids.clone());
        }
        let count = self.client.master_chef(self.master_chef).pool_length().await?;
        debug!("Farm {} lists {} pools", self.master_chef, count);
        Ok((0..count).collect())
    }

    async fn token(&self, address: Address) -> Result<TokenDescriptor, EvmError> {
        let erc20 = self.client.erc20(address);
        let (symbol, decimals) = futures::try_join!(erc20.symbol(), erc20.decimals())?;
        Ok(TokenDescriptor {
            symbol,
            address,
            decimals,
            logo_uri: None,
        })
    }

    async fn pool(&self, pid: u64) -> Result<PoolAsset, EvmError> {
        let info = self.client.master_chef(self.master_chef).pool_info(pid).await?;
        let lp = self.client.erc20(info.lp_token);

        let ((token_a, token_b), decimals, balance, total_deposited) = futures::try_join!(
            async {
                let (token0, token1) = self.client.lp_pair(info.lp_token).tokens().await?;
                futures::try_join!(self.token(token0), self.token(token1))
            },
            lp.decimals(),
            lp.balance_of(self.account),
            lp.balance_of(self.master_chef),
        )?;

        Ok(PoolAsset {
            pid,
            address: info.lp_token,
            symbol: format!("{}-{}", token_a.symbol, token_b.symbol),
            decimals,
            token_a,
            token_b,
            balance,
            total_deposited: Some(total_deposited),
        })
    }
}

#[async_trait]
impl PoolRegistry for EvmPoolRegistry {
    async fn pools(&self) -> Result<Vec<PoolAsset>, Error> {
        let pids = self.pool_ids().await?;
        let results = futures::future::join_all(pids.iter().map(|pid| self.pool(*pid))).await;

        let mut pools = Vec::with_capacity(results.len());
        for (pid, result) in pids.iter().zip(results) {
            match result {
                Ok(pool) => pools.push(pool),
                Err(e) => warn!("Skipping farm pool {}: {}", pid, e),
            }
        }

        debug!("Loaded {} of {} farm pools", pools.len(), pids.len());
        Ok(pools)
    }
}
