/// EVM farming backend
///
/// Implements the farming interfaces against a MasterChef-style farm contract and
/// ERC-20 LP tokens on any EVM-compatible chain.
///
/// # Features
///
/// - Read-only contract calls via `eth_call`
/// - EIP-1559 transaction building, local signing and submission
/// - Receipt polling with a confirmation timeout
/// - Reward rate per LP token derived from the farm's emission schedule
///
/// # Example
///
/// ```rust,no_run
/// use farm_sdk::protocols::evm::{EvmChainReader, EvmClient};
/// use farm_sdk::farming::ChainReader;
/// use alloy_primitives::address;
///
/// # async fn example(pool: farm_sdk::PoolAsset) -> Result<(), Box<dyn std::error::Error>> {
/// let client = EvmClient::new("https://eth.llamarpc.com", 1)?;
/// let reader = EvmChainReader::new(
///     client,
///     address!("c2EdaD668740f1aA35E4D8f227fB8E17dcA888Cd"),
///     address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
/// );
/// let pending = reader.get_pending_reward(&pool).await?;
/// println!("Pending reward: {}", pending);
/// # Ok(())
/// # }
/// ```
pub mod client;
pub mod contracts;
pub mod reader;
pub mod registry;
pub mod tx;
pub mod types;
pub mod writer;

pub use client::EvmClient;
pub use reader::EvmChainReader;
pub use registry::EvmPoolRegistry;
pub use tx::{Eip1559Transaction, SignedEip1559Transaction};
pub use types::{EvmError, FeeSuggestion};
pub use writer::EvmChainWriter;
