/// Farming domain types
use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// Underlying token of an LP pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDescriptor {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
    pub logo_uri: Option<String>,
}

/// A farmable LP token as handed over by the pool registry
///
/// Snapshots are immutable; the registry replaces them wholesale when it refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolAsset {
    /// Pool index in the farming contract
    pub pid: u64,
    /// LP token contract address
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    pub token_a: TokenDescriptor,
    pub token_b: TokenDescriptor,
    /// LP tokens held by the connected wallet
    pub balance: U256,
    /// LP tokens deposited in the farm across all users
    pub total_deposited: Option<U256>,
}

impl PoolAsset {
    /// Whether two snapshots refer to the same farm pool
    pub fn same_pool(&self, other: &PoolAsset) -> bool {
        self.pid == other.pid
    }
}

/// What the user wants to do with the selected pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FarmAction {
    Deposit,
    Withdraw,
}

impl std::fmt::Display for FarmAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FarmAction::Deposit => write!(f, "deposit"),
            FarmAction::Withdraw => write!(f, "withdraw"),
        }
    }
}

/// A confirmed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
}

/// Result of a write action that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    /// The transaction was mined successfully
    Confirmed(Confirmation),
    /// The user declined to sign; nothing changed and nothing should be reported
    Cancelled,
}

impl TxOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, TxOutcome::Confirmed(_))
    }
}
