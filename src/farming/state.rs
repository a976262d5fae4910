//! Read-only farming state exposed to the presentation layer
//!
//! A [`FarmingSnapshot`] is a consistent copy of the orchestrator state taken under a
//! single lock. The derived views on it decide which controls are shown, enabled or
//! flagged as insufficient, so that every front-end gates actions the same way.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::amount::{is_empty_amount, mul_div, parse_amount};
use crate::farming::types::{FarmAction, PoolAsset};

/// Informational text shown with a withdrawal form
///
/// The farm contract pays out all pending reward on any withdrawal; the SDK does not
/// compute the payout itself.
pub const WITHDRAW_REWARD_NOTICE: &str =
    "All pending reward will be transferred to you if you withdraw.";

/// Coarse position in the selection flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    PoolSelected,
    ActionChosen(FarmAction),
}

/// What the deposit form should present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositControl {
    /// No pool selected or another action chosen
    Hidden,
    /// The wallet holds none of the LP token; offer adding liquidity instead of a form
    NeedsLiquidity,
    /// The entered amount exceeds the wallet balance
    InsufficientBalance,
    /// Position data is still loading
    Fetching,
    Ready {
        /// An amount is entered but the farm is not approved yet
        show_approve: bool,
        approving: bool,
        deposit_enabled: bool,
        depositing: bool,
    },
}

/// What the withdrawal form should present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawControl {
    Hidden,
    Fetching,
    /// The deposited amount could not be read
    Unknown,
    NothingDeposited,
    /// The entered amount exceeds the deposited amount
    InsufficientDeposit,
    Ready {
        withdraw_enabled: bool,
        withdrawing: bool,
    },
}

/// Expected reward per block for the entered amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardProjection {
    /// No amount entered
    Hidden,
    /// Rate or amount unknown; render a placeholder, never zero
    Pending,
    PerBlock(U256),
}

/// Consistent copy of the farming state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmingSnapshot {
    pub pools: Vec<PoolAsset>,
    pub selected_pool: Option<PoolAsset>,
    pub action: Option<FarmAction>,
    pub amount_input: String,
    pub allowed: bool,
    pub amount_deposited: Option<U256>,
    pub pending_reward: Option<U256>,
    pub expected_reward_per_block: Option<U256>,
    pub loading: bool,
    pub approving: bool,
    pub depositing: bool,
    pub withdrawing: bool,
}

impl FarmingSnapshot {
    pub fn phase(&self) -> Phase {
        match (&self.selected_pool, self.action) {
            (None, _) => Phase::Idle,
            (Some(_), None) => Phase::PoolSelected,
            (Some(_), Some(action)) => Phase::ActionChosen(action),
        }
    }

    /// Entered amount parsed against the selected pool, if valid
    pub fn parsed_amount(&self) -> Option<U256> {
        let pool = self.selected_pool.as_ref()?;
        parse_amount(&self.amount_input, pool.decimals).ok()
    }

    /// Entered amount is strictly greater than the wallet balance
    pub fn is_insufficient_balance(&self) -> bool {
        match (&self.selected_pool, self.parsed_amount()) {
            (Some(pool), Some(amount)) => amount > pool.balance,
            _ => false,
        }
    }

    /// Entered amount is strictly greater than the known deposited amount
    pub fn is_insufficient_deposit(&self) -> bool {
        match (self.amount_deposited, self.parsed_amount()) {
            (Some(deposited), Some(amount)) => amount > deposited,
            _ => false,
        }
    }

    fn write_in_flight(&self) -> bool {
        self.depositing || self.withdrawing
    }

    fn amount_usable(&self) -> bool {
        !is_empty_amount(&self.amount_input) && self.parsed_amount().is_some()
    }

    pub fn deposit_control(&self) -> DepositControl {
        let Some(pool) = self.selected_pool.as_ref() else {
            return DepositControl::Hidden;
        };
        if self.action != Some(FarmAction::Deposit) {
            return DepositControl::Hidden;
        }
        if pool.balance.is_zero() {
            return DepositControl::NeedsLiquidity;
        }
        if self.is_insufficient_balance() {
            return DepositControl::InsufficientBalance;
        }
        if self.loading {
            return DepositControl::Fetching;
        }

        let approve_required = !self.allowed;
        DepositControl::Ready {
            show_approve: approve_required && !is_empty_amount(&self.amount_input),
            approving: self.approving,
            deposit_enabled: !approve_required && self.amount_usable() && !self.write_in_flight(),
            depositing: self.depositing,
        }
    }

    pub fn withdraw_control(&self) -> WithdrawControl {
        if self.selected_pool.is_none() || self.action != Some(FarmAction::Withdraw) {
            return WithdrawControl::Hidden;
        }
        if self.loading {
            return WithdrawControl::Fetching;
        }
        match self.amount_deposited {
            None => WithdrawControl::Unknown,
            Some(deposited) if deposited.is_zero() => WithdrawControl::NothingDeposited,
            Some(_) if self.is_insufficient_deposit() => WithdrawControl::InsufficientDeposit,
            Some(_) => WithdrawControl::Ready {
                withdraw_enabled: self.amount_usable() && !self.write_in_flight(),
                withdrawing: self.withdrawing,
            },
        }
    }

    /// Whether the amount input should be offered for the chosen action
    pub fn amount_input_visible(&self) -> bool {
        let Some(pool) = self.selected_pool.as_ref() else {
            return false;
        };
        match self.action {
            Some(FarmAction::Deposit) => !pool.balance.is_zero(),
            Some(FarmAction::Withdraw) => {
                !self.loading && self.amount_deposited.map_or(true, |d| !d.is_zero())
            }
            None => false,
        }
    }

    /// Whether [`WITHDRAW_REWARD_NOTICE`] applies to the current form
    pub fn shows_withdraw_reward_notice(&self) -> bool {
        matches!(
            self.withdraw_control(),
            WithdrawControl::Ready { .. } | WithdrawControl::InsufficientDeposit
        )
    }

    /// Reward per block the entered amount would earn
    ///
    /// Computed as `rate * amount / 10^decimals` in the reward token's base units.
    pub fn projected_reward(&self) -> RewardProjection {
        if is_empty_amount(&self.amount_input) {
            return RewardProjection::Hidden;
        }
        let (Some(pool), Some(rate), Some(amount)) = (
            self.selected_pool.as_ref(),
            self.expected_reward_per_block,
            self.parsed_amount(),
        ) else {
            return RewardProjection::Pending;
        };
        match mul_div(rate, amount, pool.decimals) {
            Some(reward) => RewardProjection::PerBlock(reward),
            None => RewardProjection::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::pow10;
    use crate::farming::types::TokenDescriptor;
    use alloy_primitives::Address;

    fn token(symbol: &str) -> TokenDescriptor {
        TokenDescriptor {
            symbol: symbol.to_string(),
            address: Address::ZERO,
            decimals: 18,
            logo_uri: None,
        }
    }

    fn pool(balance: U256) -> PoolAsset {
        PoolAsset {
            pid: 1,
            address: Address::repeat_byte(0x11),
            symbol: "WETH-USDC".to_string(),
            decimals: 18,
            token_a: token("WETH"),
            token_b: token("USDC"),
            balance,
            total_deposited: None,
        }
    }

    fn ether(n: u64) -> U256 {
        U256::from(n) * pow10(18).unwrap()
    }

    fn deposit_snapshot(balance: U256, amount: &str) -> FarmingSnapshot {
        FarmingSnapshot {
            selected_pool: Some(pool(balance)),
            action: Some(FarmAction::Deposit),
            amount_input: amount.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_phase() {
        let mut snapshot = FarmingSnapshot::default();
        assert_eq!(snapshot.phase(), Phase::Idle);
        snapshot.selected_pool = Some(pool(ether(1)));
        assert_eq!(snapshot.phase(), Phase::PoolSelected);
        snapshot.action = Some(FarmAction::Withdraw);
        assert_eq!(snapshot.phase(), Phase::ActionChosen(FarmAction::Withdraw));
    }

    #[test]
    fn test_zero_balance_needs_liquidity() {
        let snapshot = deposit_snapshot(U256::ZERO, "");
        assert_eq!(snapshot.deposit_control(), DepositControl::NeedsLiquidity);
        assert!(!snapshot.amount_input_visible());
    }

    #[test]
    fn test_insufficient_balance_is_distinct() {
        let mut snapshot = deposit_snapshot(ether(1), "1.5");
        snapshot.allowed = true;
        assert!(snapshot.is_insufficient_balance());
        assert_eq!(snapshot.deposit_control(), DepositControl::InsufficientBalance);

        // equal to the balance is not insufficient
        snapshot.amount_input = "1".to_string();
        assert!(!snapshot.is_insufficient_balance());
        assert!(matches!(
            snapshot.deposit_control(),
            DepositControl::Ready {
                deposit_enabled: true,
                ..
            }
        ));
    }

    #[test]
    fn test_deposit_requires_approval() {
        let snapshot = deposit_snapshot(ether(5), "1");
        assert_eq!(
            snapshot.deposit_control(),
            DepositControl::Ready {
                show_approve: true,
                approving: false,
                deposit_enabled: false,
                depositing: false,
            }
        );

        // approve button stays hidden until an amount is entered
        let empty = deposit_snapshot(ether(5), "0");
        assert!(matches!(
            empty.deposit_control(),
            DepositControl::Ready {
                show_approve: false,
                deposit_enabled: false,
                ..
            }
        ));
    }

    #[test]
    fn test_deposit_fetching_while_loading() {
        let mut snapshot = deposit_snapshot(ether(5), "1");
        snapshot.loading = true;
        assert_eq!(snapshot.deposit_control(), DepositControl::Fetching);
    }

    #[test]
    fn test_withdraw_control() {
        let mut snapshot = FarmingSnapshot {
            selected_pool: Some(pool(U256::ZERO)),
            action: Some(FarmAction::Withdraw),
            amount_input: "2".to_string(),
            ..Default::default()
        };
        assert_eq!(snapshot.withdraw_control(), WithdrawControl::Unknown);

        snapshot.amount_deposited = Some(U256::ZERO);
        assert_eq!(snapshot.withdraw_control(), WithdrawControl::NothingDeposited);
        assert!(!snapshot.amount_input_visible());

        snapshot.amount_deposited = Some(ether(1));
        assert_eq!(snapshot.withdraw_control(), WithdrawControl::InsufficientDeposit);
        assert!(snapshot.shows_withdraw_reward_notice());

        snapshot.amount_input = "0.5".to_string();
        assert_eq!(
            snapshot.withdraw_control(),
            WithdrawControl::Ready {
                withdraw_enabled: true,
                withdrawing: false,
            }
        );

        snapshot.withdrawing = true;
        assert_eq!(
            snapshot.withdraw_control(),
            WithdrawControl::Ready {
                withdraw_enabled: false,
                withdrawing: true,
            }
        );
    }

    #[test]
    fn test_projected_reward_never_zero_when_unknown() {
        let mut snapshot = deposit_snapshot(ether(10), "");
        assert_eq!(snapshot.projected_reward(), RewardProjection::Hidden);

        snapshot.amount_input = "2".to_string();
        assert_eq!(snapshot.projected_reward(), RewardProjection::Pending);

        snapshot.expected_reward_per_block = Some(ether(3));
        assert_eq!(snapshot.projected_reward(), RewardProjection::PerBlock(ether(6)));

        snapshot.amount_input = "2.0000000000000000001".to_string();
        assert_eq!(snapshot.projected_reward(), RewardProjection::Pending);
    }
}
