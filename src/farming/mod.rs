/// Farming core
///
/// Pool selection, approval, deposit and withdrawal orchestration over abstract chain
/// readers and writers. Backends plug in through [`ChainReader`] and [`ChainWriter`];
/// the list of pools comes from a [`PoolRegistry`].
pub mod orchestrator;
pub mod reader;
pub mod registry;
pub mod state;
pub mod types;
pub mod writer;

pub use orchestrator::{FarmingOrchestrator, RefreshTask, DEFAULT_READ_TIMEOUT};
pub use reader::{allowance_threshold, is_allowed, ChainReader};
pub use registry::{PoolRegistry, StaticPoolRegistry};
pub use state::{
    DepositControl, FarmingSnapshot, Phase, RewardProjection, WithdrawControl,
    WITHDRAW_REWARD_NOTICE,
};
pub use types::{Confirmation, FarmAction, PoolAsset, TokenDescriptor, TxOutcome};
pub use writer::{ChainWriter, PendingTransaction};
