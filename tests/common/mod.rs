//! In-memory chain used by the integration tests
//!
//! Positions live in a map keyed by pool id. Reads for a pool can be held behind a
//! gate to control the order in which results arrive, and confirmations can be held
//! to keep a write in flight.
#![allow(dead_code)]

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use farm_sdk::amount::pow10;
use farm_sdk::error::{ReadError, WriteError};
use farm_sdk::farming::{
    ChainReader, ChainWriter, Confirmation, PendingTransaction, PoolAsset, TokenDescriptor,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

pub const FARM: Address = Address::new([0xfa; 20]);

#[derive(Debug, Clone, Default)]
pub struct Position {
    pub balance: U256,
    pub allowance: U256,
    pub deposited: U256,
    pub pending: U256,
    /// `None` makes the rate read fail
    pub rate: Option<U256>,
}

#[derive(Default)]
pub struct MockChain {
    positions: Mutex<HashMap<u64, Position>>,
    read_gates: Mutex<HashMap<u64, Arc<Semaphore>>>,
    confirmation_gate: Mutex<Option<Arc<Semaphore>>>,
    fail_reads: AtomicBool,
    next_write_error: Mutex<Option<WriteError>>,
    next_hash: AtomicU64,
    pub approvals: AtomicUsize,
    pub deposits: AtomicUsize,
    pub withdrawals: AtomicUsize,
    pub reads: AtomicUsize,
}

impl MockChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_position(&self, pid: u64, position: Position) {
        self.positions.lock().unwrap().insert(pid, position);
    }

    pub fn position(&self, pid: u64) -> Position {
        self.positions
            .lock()
            .unwrap()
            .get(&pid)
            .cloned()
            .unwrap_or_default()
    }

    pub fn update_position(&self, pid: u64, update: impl FnOnce(&mut Position)) {
        update(self.positions.lock().unwrap().entry(pid).or_default());
    }

    /// Hold every read for `pid` until [`MockChain::open_reads`] is called
    pub fn close_reads(&self, pid: u64) {
        self.read_gates
            .lock()
            .unwrap()
            .insert(pid, Arc::new(Semaphore::new(0)));
    }

    pub fn open_reads(&self, pid: u64) {
        if let Some(gate) = self.read_gates.lock().unwrap().remove(&pid) {
            gate.add_permits(Semaphore::MAX_PERMITS);
        }
    }

    /// Hold confirmations of submitted transactions; returns the gate to release them
    pub fn hold_confirmations(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.confirmation_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make the next write fail with `error`
    pub fn fail_next_write(&self, error: WriteError) {
        *self.next_write_error.lock().unwrap() = Some(error);
    }

    pub fn writes(&self) -> usize {
        self.approvals.load(Ordering::SeqCst)
            + self.deposits.load(Ordering::SeqCst)
            + self.withdrawals.load(Ordering::SeqCst)
    }

    async fn read(
        &self,
        pool: &PoolAsset,
        field: impl FnOnce(&Position) -> Option<U256>,
    ) -> Result<U256, ReadError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let gate = self.read_gates.lock().unwrap().get(&pool.pid).cloned();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await.map_err(|_| ReadError::Timeout)?;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ReadError::Network("connection reset".to_string()));
        }
        field(&self.position(pool.pid))
            .ok_or_else(|| ReadError::Chain("execution reverted".to_string()))
    }

    fn submit(
        &self,
        apply: impl FnOnce(&mut Position),
        pid: u64,
    ) -> Result<PendingTransaction, WriteError> {
        if let Some(error) = self.next_write_error.lock().unwrap().take() {
            return Err(error);
        }
        self.update_position(pid, apply);

        let nonce = self.next_hash.fetch_add(1, Ordering::SeqCst);
        let tx_hash = B256::with_last_byte(nonce as u8 + 1);
        let gate = self.confirmation_gate.lock().unwrap().clone();
        Ok(PendingTransaction::new(tx_hash, async move {
            if let Some(gate) = gate {
                let _permit = gate.acquire().await.map_err(|_| {
                    WriteError::Network("confirmation gate closed".to_string())
                })?;
            }
            Ok(Confirmation {
                tx_hash,
                block_number: Some(100),
            })
        }))
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn get_balance(&self, pool: &PoolAsset) -> Result<U256, ReadError> {
        self.read(pool, |p| Some(p.balance)).await
    }

    async fn get_allowance(&self, pool: &PoolAsset, spender: Address) -> Result<U256, ReadError> {
        if spender != FARM {
            return Ok(U256::ZERO);
        }
        self.read(pool, |p| Some(p.allowance)).await
    }

    async fn get_deposited(&self, pool: &PoolAsset) -> Result<U256, ReadError> {
        self.read(pool, |p| Some(p.deposited)).await
    }

    async fn get_pending_reward(&self, pool: &PoolAsset) -> Result<U256, ReadError> {
        self.read(pool, |p| Some(p.pending)).await
    }

    async fn get_reward_rate_per_block(&self, pool: &PoolAsset) -> Result<U256, ReadError> {
        self.read(pool, |p| p.rate).await
    }
}

#[async_trait]
impl ChainWriter for MockChain {
    async fn approve(
        &self,
        pool: &PoolAsset,
        _spender: Address,
    ) -> Result<PendingTransaction, WriteError> {
        self.approvals.fetch_add(1, Ordering::SeqCst);
        self.submit(|p| p.allowance = U256::MAX, pool.pid)
    }

    async fn deposit(
        &self,
        pool: &PoolAsset,
        amount: U256,
    ) -> Result<PendingTransaction, WriteError> {
        self.deposits.fetch_add(1, Ordering::SeqCst);
        self.submit(
            |p| {
                p.balance -= amount;
                p.deposited += amount;
                p.pending = U256::ZERO;
            },
            pool.pid,
        )
    }

    async fn withdraw(
        &self,
        pool: &PoolAsset,
        amount: U256,
    ) -> Result<PendingTransaction, WriteError> {
        self.withdrawals.fetch_add(1, Ordering::SeqCst);
        self.submit(
            |p| {
                p.deposited -= amount;
                p.balance += amount;
                p.pending = U256::ZERO;
            },
            pool.pid,
        )
    }
}

pub fn ether(n: u64) -> U256 {
    U256::from(n) * pow10(18).unwrap()
}

fn token(symbol: &str, byte: u8) -> TokenDescriptor {
    TokenDescriptor {
        symbol: symbol.to_string(),
        address: Address::repeat_byte(byte),
        decimals: 18,
        logo_uri: None,
    }
}

/// LP pool snapshot with 18 decimals
pub fn pool(pid: u64, balance: U256) -> PoolAsset {
    PoolAsset {
        pid,
        address: Address::repeat_byte(pid as u8 + 1),
        symbol: format!("LP-{}", pid),
        decimals: 18,
        token_a: token("WETH", 0xa0),
        token_b: token("USDC", 0xb0),
        balance,
        total_deposited: None,
    }
}
