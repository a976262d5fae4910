//! Farming interaction state machine
//!
//! [`FarmingOrchestrator`] owns the selection and every field derived from it. Reads
//! for the selected pool run concurrently on the tokio runtime; each is tagged with a
//! [`SelectionTicket`] and its result is dropped if the selection moved on while it
//! was in flight. Writes are exclusive per action and bracketed by the
//! `approving`/`depositing`/`withdrawing` flags.

use alloy_primitives::{Address, U256};
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{ActionError, Error, ReadError, Unavailable, WriteError};
use crate::farming::reader::{is_allowed, ChainReader};
use crate::farming::registry::PoolRegistry;
use crate::farming::state::FarmingSnapshot;
use crate::farming::types::{Confirmation, FarmAction, PoolAsset, TxOutcome};
use crate::farming::writer::{ChainWriter, PendingTransaction};

/// Default upper bound for a single chain read
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Identity of the selection a read was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SelectionTicket {
    generation: u64,
    pid: u64,
}

#[derive(Debug, Default)]
struct FarmingState {
    snapshot: FarmingSnapshot,
    /// Bumped on every selection change
    generation: u64,
    /// Position refreshes running for the current selection
    refreshes: usize,
}

impl FarmingState {
    fn ticket(&self) -> Option<SelectionTicket> {
        self.snapshot
            .selected_pool
            .as_ref()
            .map(|pool| SelectionTicket {
                generation: self.generation,
                pid: pool.pid,
            })
    }

    fn is_current(&self, ticket: &SelectionTicket) -> bool {
        self.ticket().as_ref() == Some(ticket)
    }

    fn clear_derived(&mut self) {
        let snapshot = &mut self.snapshot;
        snapshot.action = None;
        snapshot.amount_input.clear();
        snapshot.allowed = false;
        snapshot.amount_deposited = None;
        snapshot.pending_reward = None;
        snapshot.expected_reward_per_block = None;
    }

    fn select(&mut self, pool: PoolAsset) -> SelectionTicket {
        self.generation += 1;
        self.refreshes = 0;
        self.clear_derived();
        let ticket = SelectionTicket {
            generation: self.generation,
            pid: pool.pid,
        };
        self.snapshot.selected_pool = Some(pool);
        self.begin_refresh();
        ticket
    }

    fn deselect(&mut self) {
        self.generation += 1;
        self.clear_derived();
        self.snapshot.selected_pool = None;
        self.refreshes = 0;
        self.snapshot.loading = false;
    }

    fn begin_refresh(&mut self) {
        self.refreshes += 1;
        self.snapshot.loading = true;
    }

    /// `loading` stays set until the last overlapping refresh settles
    fn end_refresh(&mut self) {
        self.refreshes = self.refreshes.saturating_sub(1);
        self.snapshot.loading = self.refreshes > 0;
    }

    fn set_write_flag(&mut self, action: FarmAction, value: bool) {
        match action {
            FarmAction::Deposit => self.snapshot.depositing = value,
            FarmAction::Withdraw => self.snapshot.withdrawing = value,
        }
    }

    fn set_balance(&mut self, balance: U256) {
        let Some(pid) = self.snapshot.selected_pool.as_ref().map(|pool| pool.pid) else {
            return;
        };
        for pool in self
            .snapshot
            .selected_pool
            .iter_mut()
            .chain(self.snapshot.pools.iter_mut())
            .filter(|pool| pool.pid == pid)
        {
            pool.balance = balance;
        }
    }
}

/// Handle to a background position refresh
#[derive(Debug)]
pub struct RefreshTask {
    handle: JoinHandle<()>,
}

impl RefreshTask {
    /// Wait for every read of the refresh to settle
    pub async fn wait(self) {
        if let Err(e) = self.handle.await {
            warn!("Farm refresh task did not complete: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Owner of the farming state and its action API
///
/// Cloning yields another handle to the same state. Methods that start reads spawn
/// onto the current tokio runtime; called outside one they skip the reads and leave
/// the values unknown.
#[derive(Clone)]
pub struct FarmingOrchestrator {
    reader: Arc<dyn ChainReader>,
    writer: Arc<dyn ChainWriter>,
    /// Farm contract that receives the LP token allowance
    spender: Address,
    read_timeout: Option<Duration>,
    state: Arc<RwLock<FarmingState>>,
}

impl FarmingOrchestrator {
    pub fn new(reader: Arc<dyn ChainReader>, writer: Arc<dyn ChainWriter>, spender: Address) -> Self {
        Self {
            reader,
            writer,
            spender,
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
            state: Arc::new(RwLock::new(FarmingState::default())),
        }
    }

    /// Bound each chain read; `None` lets a stalled read keep `loading` set
    pub fn with_read_timeout(mut self, read_timeout: Option<Duration>) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn spender(&self) -> Address {
        self.spender
    }

    /// Consistent copy of the current state
    pub fn snapshot(&self) -> FarmingSnapshot {
        self.read_state().snapshot.clone()
    }

    /// Replace the list of farmable pools
    ///
    /// A selected pool that is still listed keeps its selection and derived state;
    /// one that disappeared is deselected.
    pub fn update_pools(&self, pools: Vec<PoolAsset>) {
        let mut state = self.write_state();
        if let Some(selected) = state.snapshot.selected_pool.clone() {
            match pools.iter().find(|pool| pool.same_pool(&selected)) {
                Some(pool) => state.snapshot.selected_pool = Some(pool.clone()),
                None => {
                    debug!("Selected pool {} no longer listed, deselecting", selected.pid);
                    state.deselect();
                }
            }
        }
        state.snapshot.pools = pools;
    }

    /// Fetch pools from a registry and install them
    ///
    /// On failure the previous list is kept.
    pub async fn load_pools(&self, registry: &dyn PoolRegistry) -> Result<usize, Error> {
        match registry.pools().await {
            Ok(pools) => {
                let count = pools.len();
                debug!("Loaded {} farm pools", count);
                self.update_pools(pools);
                Ok(count)
            }
            Err(e) => {
                warn!("Failed to load farm pools ({}), keeping previous list", e);
                Err(e)
            }
        }
    }

    /// Select a pool, or deselect it if it is already selected
    ///
    /// Selecting clears the action, amount, allowance and position, then starts
    /// reading them for the new pool. Returns the refresh handle when a pool ends up
    /// selected and the reads could be started.
    pub fn select_pool(&self, pool: &PoolAsset) -> Option<RefreshTask> {
        let ticket = {
            let mut state = self.write_state();
            let reselected = state
                .snapshot
                .selected_pool
                .as_ref()
                .is_some_and(|selected| selected.same_pool(pool));
            if reselected {
                state.deselect();
                debug!("Deselected pool {}", pool.pid);
                return None;
            }
            state.select(pool.clone())
        };

        debug!("Selected pool {} ({})", pool.pid, pool.symbol);
        self.spawn_refresh(ticket, pool.clone())
    }

    /// Choose what to do with the selected pool; clears the entered amount
    pub fn set_action(&self, action: FarmAction) -> Result<(), ActionError> {
        let mut state = self.write_state();
        if state.snapshot.selected_pool.is_none() {
            return Err(Unavailable::NoPoolSelected.into());
        }
        state.snapshot.action = Some(action);
        state.snapshot.amount_input.clear();
        Ok(())
    }

    /// Store the raw amount input; validity only affects control gating
    pub fn set_amount(&self, input: impl Into<String>) {
        self.write_state().snapshot.amount_input = input.into();
    }

    /// Re-read position and allowance for the current selection
    pub fn refresh(&self) -> Option<RefreshTask> {
        let (ticket, pool) = {
            let mut state = self.write_state();
            let ticket = state.ticket()?;
            let pool = state.snapshot.selected_pool.clone()?;
            state.begin_refresh();
            (ticket, pool)
        };
        self.spawn_refresh(ticket, pool)
    }

    /// Approve the farm to move the selected LP token
    pub async fn on_approve(&self) -> Result<TxOutcome, ActionError> {
        let (ticket, pool) = {
            let mut state = self.write_state();
            let ticket = state.ticket().ok_or(Unavailable::NoPoolSelected)?;
            let snapshot = &state.snapshot;
            let pool = snapshot
                .selected_pool
                .clone()
                .ok_or(Unavailable::NoPoolSelected)?;
            if snapshot.action != Some(FarmAction::Deposit) {
                return Err(Unavailable::WrongAction.into());
            }
            if snapshot.allowed {
                return Err(Unavailable::AlreadyApproved.into());
            }
            if snapshot.approving {
                return Err(Unavailable::InFlight.into());
            }
            state.snapshot.approving = true;
            (ticket, pool)
        };

        info!("Approving {} for pool {}", self.spender, pool.pid);
        let result = self.submit(self.writer.approve(&pool, self.spender)).await;

        let mut state = self.write_state();
        state.snapshot.approving = false;
        match result {
            Ok(confirmation) => {
                if state.is_current(&ticket) {
                    state.snapshot.allowed = true;
                }
                info!("Approval confirmed in {}", confirmation.tx_hash);
                Ok(TxOutcome::Confirmed(confirmation))
            }
            Err(e) => Self::write_failed("approve", e),
        }
    }

    /// Stake the entered amount in the selected pool
    pub async fn on_deposit(&self) -> Result<TxOutcome, ActionError> {
        self.execute_write(FarmAction::Deposit).await
    }

    /// Unstake the entered amount from the selected pool
    ///
    /// The farm also pays out all pending reward; see
    /// [`WITHDRAW_REWARD_NOTICE`](crate::farming::state::WITHDRAW_REWARD_NOTICE).
    pub async fn on_withdraw(&self) -> Result<TxOutcome, ActionError> {
        self.execute_write(FarmAction::Withdraw).await
    }

    async fn execute_write(&self, action: FarmAction) -> Result<TxOutcome, ActionError> {
        let (ticket, pool, amount) = self.begin_write(action)?;

        info!("Submitting {} of {} in pool {}", action, amount, pool.pid);
        let result = match action {
            FarmAction::Deposit => self.submit(self.writer.deposit(&pool, amount)).await,
            FarmAction::Withdraw => self.submit(self.writer.withdraw(&pool, amount)).await,
        };

        let outcome = match result {
            Ok(confirmation) => {
                info!("{} confirmed in {}", action, confirmation.tx_hash);
                self.apply(&ticket, |snapshot| snapshot.amount_input.clear());
                self.refresh_after_write(&ticket, &pool).await;
                Ok(TxOutcome::Confirmed(confirmation))
            }
            Err(e) => Self::write_failed(&action.to_string(), e),
        };

        self.write_state().set_write_flag(action, false);
        outcome
    }

    /// Check preconditions and raise the action flag under one lock
    fn begin_write(
        &self,
        action: FarmAction,
    ) -> Result<(SelectionTicket, PoolAsset, U256), ActionError> {
        let mut state = self.write_state();
        let ticket = state.ticket().ok_or(Unavailable::NoPoolSelected)?;
        let snapshot = &state.snapshot;
        let pool = snapshot
            .selected_pool
            .clone()
            .ok_or(Unavailable::NoPoolSelected)?;

        if snapshot.action != Some(action) {
            return Err(Unavailable::WrongAction.into());
        }
        if snapshot.depositing || snapshot.withdrawing {
            return Err(Unavailable::InFlight.into());
        }
        if action == FarmAction::Deposit && !snapshot.allowed {
            return Err(Unavailable::ApprovalRequired.into());
        }

        let amount = snapshot
            .parsed_amount()
            .filter(|amount| !amount.is_zero())
            .ok_or(Unavailable::InvalidAmount)?;

        match action {
            FarmAction::Deposit => {
                if amount > pool.balance {
                    return Err(Unavailable::InsufficientBalance.into());
                }
            }
            FarmAction::Withdraw => {
                let deposited = snapshot
                    .amount_deposited
                    .ok_or(Unavailable::DepositUnknown)?;
                if amount > deposited {
                    return Err(Unavailable::InsufficientDeposit.into());
                }
            }
        }

        state.set_write_flag(action, true);
        Ok((ticket, pool, amount))
    }

    async fn submit<F>(&self, submission: F) -> Result<Confirmation, WriteError>
    where
        F: Future<Output = Result<PendingTransaction, WriteError>>,
    {
        let pending = submission.await?;
        debug!("Transaction {} submitted, waiting for confirmation", pending.tx_hash());
        pending.wait().await
    }

    fn write_failed(action: &str, error: WriteError) -> Result<TxOutcome, ActionError> {
        if error.is_user_rejection() {
            debug!("{} cancelled by the user", action);
            Ok(TxOutcome::Cancelled)
        } else {
            warn!("{} failed: {}", action, error);
            Err(ActionError::Transaction(error))
        }
    }

    /// Start a position refresh on the current runtime
    ///
    /// Without a runtime the refresh is abandoned and the values stay unknown.
    fn spawn_refresh(&self, ticket: SelectionTicket, pool: PoolAsset) -> Option<RefreshTask> {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Cannot refresh pool {} outside a tokio runtime: {}", pool.pid, e);
                self.apply_state(&ticket, FarmingState::end_refresh);
                return None;
            }
        };

        let orchestrator = self.clone();
        let handle = runtime.spawn(async move {
            orchestrator.refresh_position(&ticket, &pool).await;
        });
        Some(RefreshTask { handle })
    }

    async fn refresh_position(&self, ticket: &SelectionTicket, pool: &PoolAsset) {
        let rate = async {
            let value = self
                .read("reward rate", pool, self.reader.get_reward_rate_per_block(pool))
                .await;
            self.apply(ticket, |snapshot| {
                if value.is_some() {
                    snapshot.expected_reward_per_block = value;
                }
            });
        };
        let allowance = async {
            let value = self
                .read("allowance", pool, self.reader.get_allowance(pool, self.spender))
                .await;
            // reads only ever grant; a confirmed approval is never revoked by a slow read
            if value.is_some_and(is_allowed) {
                self.apply(ticket, |snapshot| snapshot.allowed = true);
            }
        };

        futures::join!(
            self.refresh_deposited(ticket, pool),
            self.refresh_pending_reward(ticket, pool),
            rate,
            allowance
        );

        if self.apply_state(ticket, FarmingState::end_refresh) {
            debug!("Refreshed pool {}", pool.pid);
        }
    }

    async fn refresh_after_write(&self, ticket: &SelectionTicket, pool: &PoolAsset) {
        let balance = async {
            if let Some(value) = self.read("balance", pool, self.reader.get_balance(pool)).await {
                self.apply_state(ticket, |state| state.set_balance(value));
            }
        };

        futures::join!(
            self.refresh_deposited(ticket, pool),
            self.refresh_pending_reward(ticket, pool),
            balance
        );
    }

    async fn refresh_deposited(&self, ticket: &SelectionTicket, pool: &PoolAsset) {
        let value = self
            .read("deposited amount", pool, self.reader.get_deposited(pool))
            .await;
        self.apply(ticket, |snapshot| {
            if value.is_some() {
                snapshot.amount_deposited = value;
            }
        });
    }

    async fn refresh_pending_reward(&self, ticket: &SelectionTicket, pool: &PoolAsset) {
        let value = self
            .read("pending reward", pool, self.reader.get_pending_reward(pool))
            .await;
        self.apply(ticket, |snapshot| {
            if value.is_some() {
                snapshot.pending_reward = value;
            }
        });
    }

    /// Run a read under the configured timeout; failures become `None`
    async fn read<F>(&self, what: &str, pool: &PoolAsset, read: F) -> Option<U256>
    where
        F: Future<Output = Result<U256, ReadError>>,
    {
        let result = match self.read_timeout {
            Some(limit) => tokio::time::timeout(limit, read)
                .await
                .unwrap_or(Err(ReadError::Timeout)),
            None => read.await,
        };

        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(
                    "Failed to read {} for pool {} ({}), leaving it unknown",
                    what, pool.pid, e
                );
                None
            }
        }
    }

    /// Apply an update if the ticket still matches the selection
    fn apply(&self, ticket: &SelectionTicket, update: impl FnOnce(&mut FarmingSnapshot)) -> bool {
        self.apply_state(ticket, |state| update(&mut state.snapshot))
    }

    fn apply_state(&self, ticket: &SelectionTicket, update: impl FnOnce(&mut FarmingState)) -> bool {
        let mut state = self.write_state();
        if !state.is_current(ticket) {
            debug!(
                "Discarding stale result for pool {} (generation {})",
                ticket.pid, ticket.generation
            );
            return false;
        }
        update(&mut state);
        true
    }

    fn read_state(&self) -> RwLockReadGuard<'_, FarmingState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, FarmingState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
