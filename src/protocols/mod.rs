/// Chain backends for the farming core
///
/// Each backend implements the `ChainReader`, `ChainWriter` and `PoolRegistry`
/// interfaces for one family of chains.
#[cfg(feature = "evm")]
pub mod evm;
