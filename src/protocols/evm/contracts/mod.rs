/// EVM contract interfaces and helpers
///
/// Type-safe bindings generated with the alloy `sol!` macro.
///
/// - **ERC-20**: LP token balance, allowance and approval
/// - **MasterChef**: farm deposits, withdrawals, pending reward and emission schedule
/// - **Pair**: underlying tokens of an LP token
pub mod erc20;
pub mod master_chef;
pub mod pair;

pub use erc20::{Erc20, IERC20};
pub use master_chef::{reward_rate_per_token, IMasterChef, MasterChef, PoolInfo};
pub use pair::{IUniswapV2Pair, LpPair};
