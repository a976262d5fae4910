//! Integration tests for the farming orchestrator against an in-memory chain
mod common;

use alloy_primitives::U256;
use common::{ether, pool, MockChain, Position, FARM};
use farm_sdk::error::{ActionError, Unavailable, WriteError};
use farm_sdk::farming::{
    ChainReader, ChainWriter, DepositControl, FarmAction, FarmingOrchestrator, Phase,
    RewardProjection, StaticPoolRegistry, TxOutcome, WithdrawControl,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn orchestrator(chain: &Arc<MockChain>) -> FarmingOrchestrator {
    let reader: Arc<dyn ChainReader> = chain.clone();
    let writer: Arc<dyn ChainWriter> = chain.clone();
    FarmingOrchestrator::new(reader, writer, FARM)
}

fn position(balance: U256, allowance: U256, deposited: U256, pending: U256) -> Position {
    Position {
        balance,
        allowance,
        deposited,
        pending,
        rate: Some(ether(2)),
    }
}

#[tokio::test]
async fn test_select_loads_position() {
    let chain = MockChain::new();
    chain.set_position(1, position(ether(10), U256::ZERO, ether(3), ether(1)));
    let farm = orchestrator(&chain);

    let task = farm.select_pool(&pool(1, ether(10))).unwrap();
    assert!(farm.snapshot().loading);
    task.wait().await;

    let snapshot = farm.snapshot();
    assert_eq!(snapshot.phase(), Phase::PoolSelected);
    assert!(!snapshot.loading);
    assert!(!snapshot.allowed);
    assert_eq!(snapshot.amount_deposited, Some(ether(3)));
    assert_eq!(snapshot.pending_reward, Some(ether(1)));
    assert_eq!(snapshot.expected_reward_per_block, Some(ether(2)));
}

#[tokio::test]
async fn test_reselect_returns_to_idle() {
    let chain = MockChain::new();
    chain.set_position(1, position(ether(10), U256::MAX, ether(3), ether(1)));
    let farm = orchestrator(&chain);
    let lp = pool(1, ether(10));

    farm.select_pool(&lp).unwrap().wait().await;
    farm.set_action(FarmAction::Deposit).unwrap();
    farm.set_amount("1");

    assert!(farm.select_pool(&lp).is_none());

    let snapshot = farm.snapshot();
    assert_eq!(snapshot.phase(), Phase::Idle);
    assert!(snapshot.action.is_none());
    assert!(snapshot.amount_input.is_empty());
    assert!(!snapshot.allowed);
    assert!(snapshot.amount_deposited.is_none());
    assert!(snapshot.pending_reward.is_none());
    assert!(snapshot.expected_reward_per_block.is_none());
}

#[tokio::test]
async fn test_set_action_requires_pool() {
    let chain = MockChain::new();
    let farm = orchestrator(&chain);

    assert_eq!(
        farm.set_action(FarmAction::Deposit),
        Err(ActionError::Unavailable(Unavailable::NoPoolSelected))
    );
}

#[tokio::test]
async fn test_set_action_clears_amount() {
    let chain = MockChain::new();
    chain.set_position(1, position(ether(10), U256::MAX, ether(3), U256::ZERO));
    let farm = orchestrator(&chain);

    farm.select_pool(&pool(1, ether(10))).unwrap().wait().await;
    farm.set_action(FarmAction::Deposit).unwrap();
    farm.set_amount("4");
    farm.set_action(FarmAction::Withdraw).unwrap();

    let snapshot = farm.snapshot();
    assert_eq!(snapshot.phase(), Phase::ActionChosen(FarmAction::Withdraw));
    assert!(snapshot.amount_input.is_empty());
}

#[tokio::test]
async fn test_deposit_without_allowance_sends_nothing() {
    let chain = MockChain::new();
    chain.set_position(1, position(ether(10), U256::ZERO, U256::ZERO, U256::ZERO));
    let farm = orchestrator(&chain);

    farm.select_pool(&pool(1, ether(10))).unwrap().wait().await;
    farm.set_action(FarmAction::Deposit).unwrap();
    farm.set_amount("1");

    assert!(matches!(
        farm.snapshot().deposit_control(),
        DepositControl::Ready {
            show_approve: true,
            deposit_enabled: false,
            ..
        }
    ));
    assert_eq!(
        farm.on_deposit().await,
        Err(ActionError::Unavailable(Unavailable::ApprovalRequired))
    );
    assert_eq!(chain.writes(), 0);
    assert!(!farm.snapshot().depositing);
}

#[tokio::test]
async fn test_stale_reads_are_discarded() {
    let chain = MockChain::new();
    chain.set_position(1, position(ether(10), U256::MAX, ether(7), ether(7)));
    chain.set_position(2, position(ether(5), U256::ZERO, ether(2), ether(1)));
    chain.close_reads(1);
    let farm = orchestrator(&chain);

    let task_a = farm.select_pool(&pool(1, ether(10))).unwrap();
    let task_b = farm.select_pool(&pool(2, ether(5))).unwrap();
    task_b.wait().await;

    // pool 1 results arrive after pool 2 is selected
    chain.open_reads(1);
    task_a.wait().await;

    let snapshot = farm.snapshot();
    assert_eq!(snapshot.selected_pool.as_ref().map(|p| p.pid), Some(2));
    assert!(!snapshot.allowed);
    assert_eq!(snapshot.amount_deposited, Some(ether(2)));
    assert_eq!(snapshot.pending_reward, Some(ether(1)));
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn test_slow_reads_do_not_clear_loading_of_new_selection() {
    let chain = MockChain::new();
    chain.set_position(1, position(ether(10), U256::MAX, ether(7), ether(7)));
    chain.set_position(2, position(ether(5), U256::ZERO, ether(2), ether(1)));
    chain.close_reads(2);
    let farm = orchestrator(&chain);

    let task_a = farm.select_pool(&pool(1, ether(10))).unwrap();
    let task_b = farm.select_pool(&pool(2, ether(5))).unwrap();
    task_a.wait().await;

    // pool 1 finished but pool 2 is still loading
    let snapshot = farm.snapshot();
    assert!(snapshot.loading);
    assert!(snapshot.amount_deposited.is_none());
    assert!(!snapshot.allowed);

    chain.open_reads(2);
    task_b.wait().await;
    assert!(!farm.snapshot().loading);
}

#[tokio::test]
async fn test_zero_balance_needs_liquidity() {
    let chain = MockChain::new();
    chain.set_position(1, position(U256::ZERO, U256::ZERO, U256::ZERO, U256::ZERO));
    let farm = orchestrator(&chain);

    farm.select_pool(&pool(1, U256::ZERO)).unwrap().wait().await;
    farm.set_action(FarmAction::Deposit).unwrap();

    let snapshot = farm.snapshot();
    assert_eq!(snapshot.deposit_control(), DepositControl::NeedsLiquidity);
    assert!(!snapshot.amount_input_visible());
}

#[tokio::test]
async fn test_insufficient_balance_blocks_deposit() {
    let chain = MockChain::new();
    chain.set_position(1, position(ether(1), U256::MAX, U256::ZERO, U256::ZERO));
    let farm = orchestrator(&chain);

    farm.select_pool(&pool(1, ether(1))).unwrap().wait().await;
    farm.set_action(FarmAction::Deposit).unwrap();
    farm.set_amount("1.5");

    let snapshot = farm.snapshot();
    assert!(snapshot.allowed);
    assert!(snapshot.is_insufficient_balance());
    assert_eq!(snapshot.deposit_control(), DepositControl::InsufficientBalance);
    assert_eq!(
        farm.on_deposit().await,
        Err(ActionError::Unavailable(Unavailable::InsufficientBalance))
    );
    assert_eq!(chain.deposits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_amount_blocks_deposit() {
    let chain = MockChain::new();
    chain.set_position(1, position(ether(5), U256::MAX, U256::ZERO, U256::ZERO));
    let farm = orchestrator(&chain);

    farm.select_pool(&pool(1, ether(5))).unwrap().wait().await;
    farm.set_action(FarmAction::Deposit).unwrap();

    for input in ["", "0", "abc", "1.2.3", "0.0000000000000000001"] {
        farm.set_amount(input);
        assert_eq!(
            farm.on_deposit().await,
            Err(ActionError::Unavailable(Unavailable::InvalidAmount)),
            "input {:?}",
            input
        );
    }
    assert_eq!(chain.writes(), 0);
}

#[tokio::test]
async fn test_approve_rejected_by_user() {
    let chain = MockChain::new();
    chain.set_position(1, position(ether(5), U256::ZERO, U256::ZERO, U256::ZERO));
    let farm = orchestrator(&chain);

    farm.select_pool(&pool(1, ether(5))).unwrap().wait().await;
    farm.set_action(FarmAction::Deposit).unwrap();
    farm.set_amount("1");

    chain.fail_next_write(WriteError::from_wallet_code(4001, "User denied"));
    assert_eq!(farm.on_approve().await, Ok(TxOutcome::Cancelled));

    let snapshot = farm.snapshot();
    assert!(!snapshot.allowed);
    assert!(!snapshot.approving);
    assert!(matches!(
        snapshot.deposit_control(),
        DepositControl::Ready {
            show_approve: true,
            approving: false,
            ..
        }
    ));

    // approve can be retried
    let outcome = farm.on_approve().await.unwrap();
    assert!(outcome.is_confirmed());
    assert!(farm.snapshot().allowed);
    assert_eq!(chain.approvals.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_approve_when_already_allowed() {
    let chain = MockChain::new();
    chain.set_position(1, position(ether(5), U256::MAX, U256::ZERO, U256::ZERO));
    let farm = orchestrator(&chain);

    farm.select_pool(&pool(1, ether(5))).unwrap().wait().await;
    farm.set_action(FarmAction::Deposit).unwrap();

    assert_eq!(
        farm.on_approve().await,
        Err(ActionError::Unavailable(Unavailable::AlreadyApproved))
    );
    assert_eq!(chain.writes(), 0);
}

#[tokio::test]
async fn test_approve_then_deposit() {
    let chain = MockChain::new();
    chain.set_position(1, position(ether(5), U256::ZERO, U256::ZERO, ether(1)));
    let farm = orchestrator(&chain);
    let lp = pool(1, ether(5));
    farm.update_pools(vec![lp.clone()]);

    farm.select_pool(&lp).unwrap().wait().await;
    farm.set_action(FarmAction::Deposit).unwrap();
    farm.set_amount("2");

    assert!(farm.on_approve().await.unwrap().is_confirmed());
    assert!(farm.snapshot().allowed);

    let outcome = farm.on_deposit().await.unwrap();
    assert!(outcome.is_confirmed());

    let snapshot = farm.snapshot();
    assert!(snapshot.amount_input.is_empty());
    assert!(!snapshot.depositing);
    assert_eq!(snapshot.amount_deposited, Some(ether(2)));
    assert_eq!(snapshot.pending_reward, Some(U256::ZERO));
    assert_eq!(
        snapshot.selected_pool.as_ref().map(|p| p.balance),
        Some(ether(3))
    );
    assert_eq!(snapshot.pools[0].balance, ether(3));
}

#[tokio::test]
async fn test_full_withdraw_converges_to_zero() {
    let chain = MockChain::new();
    chain.set_position(1, position(U256::ZERO, U256::MAX, ether(100), ether(5)));
    let farm = orchestrator(&chain);

    farm.select_pool(&pool(1, U256::ZERO)).unwrap().wait().await;
    farm.set_action(FarmAction::Withdraw).unwrap();
    farm.set_amount("100");

    let snapshot = farm.snapshot();
    assert!(snapshot.shows_withdraw_reward_notice());
    assert_eq!(
        snapshot.withdraw_control(),
        WithdrawControl::Ready {
            withdraw_enabled: true,
            withdrawing: false,
        }
    );

    assert!(farm.on_withdraw().await.unwrap().is_confirmed());

    let snapshot = farm.snapshot();
    assert_eq!(snapshot.amount_deposited, Some(U256::ZERO));
    assert_eq!(snapshot.pending_reward, Some(U256::ZERO));
    assert_eq!(
        snapshot.selected_pool.as_ref().map(|p| p.balance),
        Some(ether(100))
    );
    assert!(!snapshot.withdrawing);
    assert_eq!(snapshot.withdraw_control(), WithdrawControl::NothingDeposited);
}

#[tokio::test]
async fn test_withdraw_more_than_deposited() {
    let chain = MockChain::new();
    chain.set_position(1, position(U256::ZERO, U256::MAX, ether(1), U256::ZERO));
    let farm = orchestrator(&chain);

    farm.select_pool(&pool(1, U256::ZERO)).unwrap().wait().await;
    farm.set_action(FarmAction::Withdraw).unwrap();
    farm.set_amount("1.000000000000000001");

    assert_eq!(
        farm.snapshot().withdraw_control(),
        WithdrawControl::InsufficientDeposit
    );
    assert_eq!(
        farm.on_withdraw().await,
        Err(ActionError::Unavailable(Unavailable::InsufficientDeposit))
    );
    assert_eq!(chain.withdrawals.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_withdraw_with_unknown_deposit() {
    let chain = MockChain::new();
    chain.set_position(1, position(U256::ZERO, U256::MAX, ether(1), U256::ZERO));
    chain.set_fail_reads(true);
    let farm = orchestrator(&chain);

    farm.select_pool(&pool(1, U256::ZERO)).unwrap().wait().await;
    farm.set_action(FarmAction::Withdraw).unwrap();
    farm.set_amount("1");

    assert_eq!(farm.snapshot().withdraw_control(), WithdrawControl::Unknown);
    assert_eq!(
        farm.on_withdraw().await,
        Err(ActionError::Unavailable(Unavailable::DepositUnknown))
    );
}

#[tokio::test]
async fn test_reverted_deposit_is_reported() {
    let chain = MockChain::new();
    chain.set_position(1, position(ether(5), U256::MAX, U256::ZERO, U256::ZERO));
    let farm = orchestrator(&chain);

    farm.select_pool(&pool(1, ether(5))).unwrap().wait().await;
    farm.set_action(FarmAction::Deposit).unwrap();
    farm.set_amount("1");

    chain.fail_next_write(WriteError::Reverted("execution reverted".to_string()));
    let error = farm.on_deposit().await.unwrap_err();
    assert!(error.is_user_visible());
    assert_eq!(
        error,
        ActionError::Transaction(WriteError::Reverted("execution reverted".to_string()))
    );

    let snapshot = farm.snapshot();
    assert!(!snapshot.depositing);
    // amount kept so the user can retry
    assert_eq!(snapshot.amount_input, "1");
}

#[tokio::test]
async fn test_one_write_in_flight() {
    let chain = MockChain::new();
    chain.set_position(1, position(ether(5), U256::MAX, ether(5), U256::ZERO));
    let farm = orchestrator(&chain);

    farm.select_pool(&pool(1, ether(5))).unwrap().wait().await;
    farm.set_action(FarmAction::Deposit).unwrap();
    farm.set_amount("1");

    let gate = chain.hold_confirmations();
    let pending = tokio::spawn({
        let farm = farm.clone();
        async move { farm.on_deposit().await }
    });

    while chain.deposits.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    assert!(farm.snapshot().depositing);
    assert_eq!(
        farm.on_deposit().await,
        Err(ActionError::Unavailable(Unavailable::InFlight))
    );

    farm.set_action(FarmAction::Withdraw).unwrap();
    farm.set_amount("1");
    assert_eq!(
        farm.on_withdraw().await,
        Err(ActionError::Unavailable(Unavailable::InFlight))
    );

    gate.add_permits(1);
    assert!(pending.await.unwrap().unwrap().is_confirmed());
    assert!(!farm.snapshot().depositing);
    assert_eq!(chain.writes(), 1);
}

#[tokio::test]
async fn test_overlapping_refreshes_keep_loading() {
    let chain = MockChain::new();
    chain.set_position(1, position(ether(5), U256::MAX, ether(1), U256::ZERO));
    chain.close_reads(1);
    let farm = orchestrator(&chain);

    let first = farm.select_pool(&pool(1, ether(5))).unwrap();
    farm.set_action(FarmAction::Deposit).unwrap();
    farm.set_amount("1");
    while chain.reads.load(Ordering::SeqCst) < 4 {
        tokio::task::yield_now().await;
    }

    // release the first refresh and hold the second
    chain.open_reads(1);
    chain.close_reads(1);
    let second = farm.refresh().unwrap();
    first.wait().await;

    let snapshot = farm.snapshot();
    assert!(snapshot.loading);
    assert_eq!(snapshot.deposit_control(), DepositControl::Fetching);
    assert!(!second.is_finished());

    chain.open_reads(1);
    second.wait().await;

    let snapshot = farm.snapshot();
    assert!(!snapshot.loading);
    assert!(matches!(
        snapshot.deposit_control(),
        DepositControl::Ready {
            deposit_enabled: true,
            ..
        }
    ));
}

#[test]
fn test_select_outside_runtime_skips_reads() {
    let chain = MockChain::new();
    chain.set_position(1, position(ether(5), U256::MAX, ether(1), U256::ZERO));
    let farm = orchestrator(&chain);

    assert!(farm.select_pool(&pool(1, ether(5))).is_none());
    assert!(farm.refresh().is_none());

    let snapshot = farm.snapshot();
    assert_eq!(snapshot.phase(), Phase::PoolSelected);
    assert!(!snapshot.loading);
    assert!(!snapshot.allowed);
    assert!(snapshot.amount_deposited.is_none());
    assert_eq!(chain.reads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_read_timeout_leaves_value_unknown() {
    let chain = MockChain::new();
    chain.set_position(1, position(ether(5), U256::MAX, ether(1), U256::ZERO));
    chain.close_reads(1);
    let farm = orchestrator(&chain).with_read_timeout(Some(Duration::from_millis(50)));

    farm.select_pool(&pool(1, ether(5))).unwrap().wait().await;

    let snapshot = farm.snapshot();
    assert!(!snapshot.loading);
    assert!(!snapshot.allowed);
    assert!(snapshot.amount_deposited.is_none());
    assert!(snapshot.pending_reward.is_none());
    assert!(snapshot.expected_reward_per_block.is_none());
}

#[tokio::test]
async fn test_failed_refresh_keeps_last_good_values() {
    let chain = MockChain::new();
    chain.set_position(1, position(ether(5), U256::MAX, ether(1), ether(2)));
    let farm = orchestrator(&chain);

    farm.select_pool(&pool(1, ether(5))).unwrap().wait().await;

    chain.set_fail_reads(true);
    farm.refresh().unwrap().wait().await;

    let snapshot = farm.snapshot();
    assert!(!snapshot.loading);
    assert!(snapshot.allowed);
    assert_eq!(snapshot.amount_deposited, Some(ether(1)));
    assert_eq!(snapshot.pending_reward, Some(ether(2)));
}

#[tokio::test]
async fn test_allowance_read_never_revokes() {
    let chain = MockChain::new();
    chain.set_position(1, position(ether(5), U256::ZERO, U256::ZERO, U256::ZERO));
    let farm = orchestrator(&chain);

    farm.select_pool(&pool(1, ether(5))).unwrap().wait().await;
    farm.set_action(FarmAction::Deposit).unwrap();
    farm.on_approve().await.unwrap();

    // a lagging node still reports the old allowance
    chain.update_position(1, |p| p.allowance = U256::ZERO);
    farm.refresh().unwrap().wait().await;

    assert!(farm.snapshot().allowed);
}

#[tokio::test]
async fn test_unknown_rate_never_projects_zero() {
    let chain = MockChain::new();
    chain.set_position(
        1,
        Position {
            balance: ether(5),
            rate: None,
            ..Default::default()
        },
    );
    let farm = orchestrator(&chain);

    farm.select_pool(&pool(1, ether(5))).unwrap().wait().await;
    farm.set_action(FarmAction::Deposit).unwrap();
    farm.set_amount("2");

    assert_eq!(farm.snapshot().projected_reward(), RewardProjection::Pending);

    chain.update_position(1, |p| p.rate = Some(ether(3)));
    farm.refresh().unwrap().wait().await;
    assert_eq!(
        farm.snapshot().projected_reward(),
        RewardProjection::PerBlock(ether(6))
    );
}

#[tokio::test]
async fn test_registry_update_keeps_or_drops_selection() {
    let chain = MockChain::new();
    chain.set_position(1, position(ether(5), U256::MAX, ether(1), U256::ZERO));
    let farm = orchestrator(&chain);

    let registry = StaticPoolRegistry::new(vec![pool(1, ether(5)), pool(2, ether(1))]);
    assert_eq!(farm.load_pools(&registry).await.unwrap(), 2);

    farm.select_pool(&pool(1, ether(5))).unwrap().wait().await;
    farm.set_action(FarmAction::Deposit).unwrap();

    // selected pool still listed with a new balance
    farm.update_pools(vec![pool(1, ether(9))]);
    let snapshot = farm.snapshot();
    assert_eq!(snapshot.pools.len(), 1);
    assert_eq!(
        snapshot.selected_pool.as_ref().map(|p| p.balance),
        Some(ether(9))
    );
    assert_eq!(snapshot.action, Some(FarmAction::Deposit));
    assert_eq!(snapshot.amount_deposited, Some(ether(1)));

    // selected pool removed
    farm.update_pools(vec![pool(2, ether(1))]);
    let snapshot = farm.snapshot();
    assert_eq!(snapshot.phase(), Phase::Idle);
    assert!(snapshot.amount_deposited.is_none());
}

#[tokio::test]
async fn test_selection_change_during_deposit() {
    let chain = MockChain::new();
    chain.set_position(1, position(ether(5), U256::MAX, U256::ZERO, U256::ZERO));
    chain.set_position(2, position(ether(1), U256::ZERO, ether(4), U256::ZERO));
    let farm = orchestrator(&chain);

    farm.select_pool(&pool(1, ether(5))).unwrap().wait().await;
    farm.set_action(FarmAction::Deposit).unwrap();
    farm.set_amount("1");

    let gate = chain.hold_confirmations();
    let pending = tokio::spawn({
        let farm = farm.clone();
        async move { farm.on_deposit().await }
    });
    while chain.deposits.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    farm.select_pool(&pool(2, ether(1))).unwrap().wait().await;
    // the flag brackets the write, not the selection
    assert!(farm.snapshot().depositing);

    gate.add_permits(1);
    assert!(pending.await.unwrap().unwrap().is_confirmed());

    let snapshot = farm.snapshot();
    assert!(!snapshot.depositing);
    assert_eq!(snapshot.selected_pool.as_ref().map(|p| p.pid), Some(2));
    assert_eq!(snapshot.amount_deposited, Some(ether(4)));
}
