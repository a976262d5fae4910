/// MasterChef farm contract helpers
///
/// Pools are addressed by `pid`. Deposits and withdrawals both settle the caller's
/// pending reward, so a withdrawal always pays out everything accrued so far.
use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall};

use crate::amount::pow10;
use crate::protocols::evm::client::EvmClient;
use crate::protocols::evm::types::EvmError;

sol! {
    #[derive(Debug)]
    interface IMasterChef {
        function poolLength() external view returns (uint256);
        function poolInfo(uint256 pid) external view returns (address lpToken, uint256 allocPoint, uint256 lastRewardBlock, uint256 accSushiPerShare);
        function userInfo(uint256 pid, address user) external view returns (uint256 amount, uint256 rewardDebt);
        function pendingSushi(uint256 pid, address user) external view returns (uint256);
        function totalAllocPoint() external view returns (uint256);
        function sushiPerBlock() external view returns (uint256);
        function getMultiplier(uint256 from, uint256 to) external view returns (uint256);
        function deposit(uint256 pid, uint256 amount) external;
        function withdraw(uint256 pid, uint256 amount) external;
    }
}

/// Farm pool parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolInfo {
    pub lp_token: Address,
    pub alloc_point: U256,
}

/// Reward emitted per block per whole LP token staked
///
/// `reward_per_block * multiplier * alloc_point / total_alloc_point` is the pool's share
/// of each block's emission; it is spread over the LP tokens staked in the farm and
/// scaled to one whole token (`10^lp_decimals` base units). Returns `None` when nothing
/// is staked, no allocation exists or the arithmetic overflows.
pub fn reward_rate_per_token(
    reward_per_block: U256,
    multiplier: U256,
    alloc_point: U256,
    total_alloc_point: U256,
    lp_staked: U256,
    lp_decimals: u8,
) -> Option<U256> {
    if total_alloc_point.is_zero() || lp_staked.is_zero() {
        return None;
    }
    let pool_per_block = reward_per_block
        .checked_mul(multiplier)?
        .checked_mul(alloc_point)?
        / total_alloc_point;
    pool_per_block
        .checked_mul(pow10(lp_decimals)?)?
        .checked_div(lp_staked)
}

/// MasterChef contract helper
#[derive(Clone)]
pub struct MasterChef {
    client: EvmClient,
    address: Address,
}

impl MasterChef {
    pub fn new(client: EvmClient, address: Address) -> Self {
        Self { client, address }
    }

    /// Get the contract address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Number of farm pools; valid pids are `0..pool_length`
    pub async fn pool_length(&self) -> Result<u64, EvmError> {
        let result = self
            .client
            .call_contract(self.address, IMasterChef::poolLengthCall {})
            .await?;
        u64::try_from(result._0)
            .map_err(|_| EvmError::AbiError(format!("pool count {} out of range", result._0)))
    }

    pub async fn pool_info(&self, pid: u64) -> Result<PoolInfo, EvmError> {
        let call = IMasterChef::poolInfoCall { pid: U256::from(pid) };
        let result = self.client.call_contract(self.address, call).await?;
        Ok(PoolInfo {
            lp_token: result.lpToken,
            alloc_point: result.allocPoint,
        })
    }

    /// LP amount `user` has staked in pool `pid`
    pub async fn deposited(&self, pid: u64, user: Address) -> Result<U256, EvmError> {
        let call = IMasterChef::userInfoCall {
            pid: U256::from(pid),
            user,
        };
        let result = self.client.call_contract(self.address, call).await?;
        Ok(result.amount)
    }

    /// Reward accrued by `user` in pool `pid` and not yet paid out
    pub async fn pending_reward(&self, pid: u64, user: Address) -> Result<U256, EvmError> {
        let call = IMasterChef::pendingSushiCall {
            pid: U256::from(pid),
            user,
        };
        let result = self.client.call_contract(self.address, call).await?;
        Ok(result._0)
    }

    pub async fn total_alloc_point(&self) -> Result<U256, EvmError> {
        let result = self
            .client
            .call_contract(self.address, IMasterChef::totalAllocPointCall {})
            .await?;
        Ok(result._0)
    }

    pub async fn reward_per_block(&self) -> Result<U256, EvmError> {
        let result = self
            .client
            .call_contract(self.address, IMasterChef::sushiPerBlockCall {})
            .await?;
        Ok(result._0)
    }

    /// Emission multiplier over the block range `[from, to)`
    pub async fn multiplier(&self, from: u64, to: u64) -> Result<U256, EvmError> {
        let call = IMasterChef::getMultiplierCall {
            from: U256::from(from),
            to: U256::from(to),
        };
        let result = self.client.call_contract(self.address, call).await?;
        Ok(result._0)
    }

    pub fn encode_deposit(pid: u64, amount: U256) -> Vec<u8> {
        IMasterChef::depositCall {
            pid: U256::from(pid),
            amount,
        }
        .abi_encode()
    }

    pub fn encode_withdraw(pid: u64, amount: U256) -> Vec<u8> {
        IMasterChef::withdrawCall {
            pid: U256::from(pid),
            amount,
        }
        .abi_encode()
    }
}
