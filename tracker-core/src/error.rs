//! Error types for the tracker

use thiserror::Error;

/// Result type for tracker operations
pub type Result<T> = std::result::Result<T, Error>;

/// Tracker errors
#[derive(Error, Debug)]
pub enum Error {
    /// Withdrawal exceeds the current balance. State is unchanged.
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        /// Amount the caller tried to withdraw
        requested: u64,
        /// Balance at the time the withdrawal was evaluated
        available: u64,
    },

    /// Empty account identifier
    #[error("invalid account: {0}")]
    InvalidAccount(String),

    /// Zero amount rejected by the strict amount policy
    #[error("invalid amount: {0}")]
    InvalidAmount(u64),

    /// Deposit would push the balance past `u64::MAX`
    #[error("balance overflow on {account}: balance {balance}, deposit {amount}")]
    BalanceOverflow {
        /// Account being credited
        account: String,
        /// Balance before the deposit
        balance: u64,
        /// Deposit amount
        amount: u64,
    },

    /// The caller's context fired while waiting for access
    #[error("operation cancelled")]
    OperationCancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether repeating the same call unchanged may succeed.
    ///
    /// Domain errors need the caller to change something first (smaller
    /// amount, prior deposit, valid account). Only a cancelled wait can be
    /// retried as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::OperationCancelled)
    }
}
