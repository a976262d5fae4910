/// Uniswap V2 style pair contract, the LP token staked in the farm
use alloy_primitives::Address;
use alloy_sol_types::sol;

use crate::protocols::evm::client::EvmClient;
use crate::protocols::evm::types::EvmError;

sol! {
    #[derive(Debug)]
    interface IUniswapV2Pair {
        function token0() external view returns (address);
        function token1() external view returns (address);
    }
}

/// LP pair helper
#[derive(Clone)]
pub struct LpPair {
    client: EvmClient,
    address: Address,
}

impl LpPair {
    pub fn new(client: EvmClient, address: Address) -> Self {
        Self { client, address }
    }

    /// Addresses of the two underlying tokens
    pub async fn tokens(&self) -> Result<(Address, Address), EvmError> {
        let (token0, token1) = futures::try_join!(
            self.client
                .call_contract(self.address, IUniswapV2Pair::token0Call {}),
            self.client
                .call_contract(self.address, IUniswapV2Pair::token1Call {}),
        )?;
        Ok((token0._0, token1._0))
    }
}
