/// ERC-20 token contract helpers
///
/// LP tokens are plain ERC-20s; the farm needs an allowance before it can pull them.
use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall};

use crate::protocols::evm::client::EvmClient;
use crate::protocols::evm::types::EvmError;

sol! {
    #[derive(Debug)]
    interface IERC20 {
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);

        event Approval(address indexed owner, address indexed spender, uint256 value);
    }
}

/// ERC-20 token helper
#[derive(Clone)]
pub struct Erc20 {
    client: EvmClient,
    address: Address,
}

impl Erc20 {
    /// Create a new ERC-20 helper for the given contract address
    pub fn new(client: EvmClient, address: Address) -> Self {
        Self { client, address }
    }

    /// Get the contract address
    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn symbol(&self) -> Result<String, EvmError> {
        let call = IERC20::symbolCall {};
        let result = self.client.call_contract(self.address, call).await?;
        Ok(result._0)
    }

    pub async fn decimals(&self) -> Result<u8, EvmError> {
        let call = IERC20::decimalsCall {};
        let result = self.client.call_contract(self.address, call).await?;
        Ok(result._0)
    }

    pub async fn total_supply(&self) -> Result<U256, EvmError> {
        let call = IERC20::totalSupplyCall {};
        let result = self.client.call_contract(self.address, call).await?;
        Ok(result._0)
    }

    /// Get balance of an address
    pub async fn balance_of(&self, account: Address) -> Result<U256, EvmError> {
        let call = IERC20::balanceOfCall { account };
        let result = self.client.call_contract(self.address, call).await?;
        Ok(result._0)
    }

    /// Get allowance granted by `owner` to `spender`
    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, EvmError> {
        let call = IERC20::allowanceCall { owner, spender };
        let result = self.client.call_contract(self.address, call).await?;
        Ok(result._0)
    }

    /// Encode approve call data
    pub fn encode_approve(spender: Address, amount: U256) -> Vec<u8> {
        IERC20::approveCall { spender, amount }.abi_encode()
    }
}
