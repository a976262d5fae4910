/// `ChainReader` backed by an ERC-20 LP token and a MasterChef farm
use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use crate::error::ReadError;
use crate::farming::{ChainReader, PoolAsset};
use crate::protocols::evm::client::EvmClient;
use crate::protocols::evm::contracts::{reward_rate_per_token, MasterChef};
use crate::protocols::evm::types::EvmError;

/// Reads positions of `account` in a MasterChef farm
#[derive(Clone)]
pub struct EvmChainReader {
    client: EvmClient,
    master_chef: MasterChef,
    account: Address,
}

impl EvmChainReader {
    pub fn new(client: EvmClient, master_chef: Address, account: Address) -> Self {
        Self {
            master_chef: client.master_chef(master_chef),
            client,
            account,
        }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    async fn reward_rate(&self, pool: &PoolAsset) -> Result<U256, EvmError> {
        let (info, total_alloc_point, reward_per_block, block) = futures::try_join!(
            self.master_chef.pool_info(pool.pid),
            self.master_chef.total_alloc_point(),
            self.master_chef.reward_per_block(),
            self.client.get_block_number(),
        )?;

        let lp_token = self.client.erc20(info.lp_token);
        let (multiplier, lp_staked) = futures::try_join!(
            self.master_chef.multiplier(block, block + 1),
            lp_token.balance_of(self.master_chef.address()),
        )?;

        reward_rate_per_token(
            reward_per_block,
            multiplier,
            info.alloc_point,
            total_alloc_point,
            lp_staked,
            pool.decimals,
        )
        .ok_or(EvmError::EmptyPool(pool.pid))
    }
}

#[async_trait]
impl ChainReader for EvmChainReader {
    async fn get_balance(&self, pool: &PoolAsset) -> Result<U256, ReadError> {
        Ok(self.client.erc20(pool.address).balance_of(self.account).await?)
    }

    async fn get_allowance(&self, pool: &PoolAsset, spender: Address) -> Result<U256, ReadError> {
        Ok(self
            .client
            .erc20(pool.address)
            .allowance(self.account, spender)
            .await?)
    }

    async fn get_deposited(&self, pool: &PoolAsset) -> Result<U256, ReadError> {
        Ok(self.master_chef.deposited(pool.pid, self.account).await?)
    }

    async fn get_pending_reward(&self, pool: &PoolAsset) -> Result<U256, ReadError> {
        Ok(self.master_chef.pending_reward(pool.pid, self.account).await?)
    }

    async fn get_reward_rate_per_block(&self, pool: &PoolAsset) -> Result<U256, ReadError> {
        Ok(self.reward_rate(pool).await?)
    }
}
