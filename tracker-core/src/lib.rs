//! Token Tracker Core
//!
//! In-memory ledger of token balances and per-account transaction history.
//!
//! # Architecture
//!
//! - **Per-account locking**: each account's balance and history sit behind
//!   one `RwLock`; accounts never contend with each other
//! - **Atomic updates**: a balance change and its history record are applied
//!   together or not at all
//! - **Cancellable waits**: every operation takes a [`Context`]; it can abort
//!   a caller queued on a lock, never an update in progress
//!
//! # Invariants
//!
//! - Conservation: balance == Σ(deposits) − Σ(withdrawals) in the history
//! - Non-negativity: a withdrawal larger than the balance is rejected
//! - Ordering: history order is the order updates were applied
//! - Snapshots: returned histories are copies and never change afterwards

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod ledger;
pub mod context;
pub mod error;
pub mod config;
pub mod metrics;
pub mod console;

mod account;

// Re-exports
pub use error::{Error, Result};
pub use types::{AccountId, AccountSnapshot, Transaction, TransactionKind};
pub use ledger::Ledger;
pub use context::Context;
pub use config::{Config, LedgerConfig};
pub use metrics::Metrics;
pub use console::Console;
