//! Main ledger
//!
//! Balances and histories are sharded per account: a concurrent map holds
//! one `RwLock<Account>` per account, and every operation takes only that
//! account's lock. Writes to the same account are totally ordered by the
//! lock; reads share it; different accounts never wait on each other.
//!
//! The map's own shard guard is held only long enough to find or insert an
//! account slot. It is never held across an `.await`.
//!
//! # Example
//!
//! ```no_run
//! use tracker_core::{Config, Context, Ledger};
//!
//! #[tokio::main]
//! async fn main() -> tracker_core::Result<()> {
//!     let ledger = Ledger::open(Config::default())?;
//!     let ctx = Context::background();
//!
//!     ledger.deposit(&ctx, "alice", 100).await?;
//!     ledger.withdraw(&ctx, "alice", 40).await?;
//!     assert_eq!(ledger.get_balance(&ctx, "alice").await?, 60);
//!
//!     Ok(())
//! }
//! ```

use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::{
    account::Account,
    context::Context,
    metrics::Metrics,
    types::{AccountId, AccountSnapshot, Transaction},
    Config, Error, Result,
};

type Slot = Arc<RwLock<Account>>;

/// In-memory token ledger
pub struct Ledger {
    /// One lock per account
    accounts: DashMap<AccountId, Slot>,

    /// Configuration (network values are carried, not used)
    config: Config,

    /// Operation metrics
    metrics: Metrics,
}

impl Ledger {
    /// Validate `config` and create an empty ledger
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let metrics = Metrics::new()
            .map_err(|e| Error::Config(format!("Failed to create metrics: {}", e)))?;

        Ok(Self {
            accounts: DashMap::new(),
            config,
            metrics,
        })
    }

    /// Configuration the ledger was opened with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Operation metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Number of accounts that have an entry
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Credit `amount` tokens to `account`.
    ///
    /// A zero amount is a no-op unless the strict amount policy is on.
    pub async fn deposit(&self, ctx: &Context, account: &str, amount: u64) -> Result<()> {
        let started = Instant::now();
        let result = self.apply_deposit(ctx, account, amount).await;
        self.finish("deposit", started, &result);
        result
    }

    /// Debit `amount` tokens from `account`.
    ///
    /// Fails with [`Error::InsufficientBalance`] and changes nothing when the
    /// balance is smaller than `amount`.
    pub async fn withdraw(&self, ctx: &Context, account: &str, amount: u64) -> Result<()> {
        let started = Instant::now();
        let result = self.apply_withdraw(ctx, account, amount).await;
        self.finish("withdraw", started, &result);
        result
    }

    /// Current balance, 0 for an untouched account
    pub async fn get_balance(&self, ctx: &Context, account: &str) -> Result<u64> {
        let started = Instant::now();
        let result = self.read(ctx, account, Account::balance).await;
        self.finish("get_balance", started, &result);
        result
    }

    /// Copy of the account's history, oldest first
    pub async fn get_transaction_history(
        &self,
        ctx: &Context,
        account: &str,
    ) -> Result<Vec<Transaction>> {
        let started = Instant::now();
        let result = self.read(ctx, account, Account::history).await;
        self.finish("get_transaction_history", started, &result);
        result
    }

    /// Balance and history taken under one lock acquisition
    pub async fn account_snapshot(&self, ctx: &Context, account: &str) -> Result<AccountSnapshot> {
        let started = Instant::now();
        let result = self.read(ctx, account, Account::snapshot).await;
        self.finish("account_snapshot", started, &result);
        result
    }

    async fn apply_deposit(&self, ctx: &Context, account: &str, amount: u64) -> Result<()> {
        let account = AccountId::parse(account)?;
        ensure_live(ctx)?;
        if !self.accept_amount(amount)? {
            return Ok(());
        }

        let slot = self.slot_or_insert(&account);
        let mut state = ctx.run(slot.write()).await?;
        // No await point from here on: the update cannot be interrupted.
        let balance = state.deposit(&account, amount, Utc::now())?;
        drop(state);

        self.metrics.record_deposit();
        tracing::debug!(account = %account, amount, balance, "deposit accepted");
        Ok(())
    }

    async fn apply_withdraw(&self, ctx: &Context, account: &str, amount: u64) -> Result<()> {
        let account = AccountId::parse(account)?;
        ensure_live(ctx)?;
        if !self.accept_amount(amount)? {
            return Ok(());
        }

        // An untouched account has nothing to withdraw; don't create an entry.
        let Some(slot) = self.slot(&account) else {
            self.metrics.record_rejected_withdrawal();
            return Err(Error::InsufficientBalance {
                requested: amount,
                available: 0,
            });
        };

        let mut state = ctx.run(slot.write()).await?;
        let balance = match state.withdraw(amount, Utc::now()) {
            Ok(balance) => balance,
            Err(e) => {
                if matches!(e, Error::InsufficientBalance { .. }) {
                    self.metrics.record_rejected_withdrawal();
                }
                return Err(e);
            }
        };
        drop(state);

        self.metrics.record_withdrawal();
        tracing::debug!(account = %account, amount, balance, "withdrawal accepted");
        Ok(())
    }

    /// Run `f` under the account's read lock; untouched accounts read as empty
    async fn read<T>(
        &self,
        ctx: &Context,
        account: &str,
        f: impl FnOnce(&Account) -> T,
    ) -> Result<T> {
        let account = AccountId::parse(account)?;
        ensure_live(ctx)?;

        match self.slot(&account) {
            Some(slot) => {
                let state = ctx.run(slot.read()).await?;
                Ok(f(&*state))
            }
            None => Ok(f(&Account::default())),
        }
    }

    /// Whether `amount` should be applied at all
    fn accept_amount(&self, amount: u64) -> Result<bool> {
        if amount > 0 {
            return Ok(true);
        }
        if self.config.ledger.reject_zero_amount {
            return Err(Error::InvalidAmount(amount));
        }
        Ok(false)
    }

    fn slot(&self, account: &AccountId) -> Option<Slot> {
        self.accounts.get(account).map(|entry| Arc::clone(entry.value()))
    }

    fn slot_or_insert(&self, account: &AccountId) -> Slot {
        if let Some(slot) = self.slot(account) {
            return slot;
        }

        let (slot, created) = match self.accounts.entry(account.clone()) {
            Entry::Occupied(entry) => (Arc::clone(entry.get()), false),
            Entry::Vacant(entry) => (Arc::clone(entry.insert(Slot::default()).value()), true),
        };

        if created {
            self.metrics.record_account_created();
        }
        slot
    }

    fn finish<T>(&self, operation: &str, started: Instant, result: &Result<T>) {
        self.metrics
            .record_duration(operation, started.elapsed().as_secs_f64());
        if matches!(result, Err(Error::OperationCancelled)) {
            self.metrics.record_cancelled();
        }
    }
}

fn ensure_live(ctx: &Context) -> Result<()> {
    if ctx.is_done() {
        return Err(Error::OperationCancelled);
    }
    Ok(())
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("accounts", &self.accounts.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
