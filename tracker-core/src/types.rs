//! Core types for the tracker
//!
//! Transaction records are plain values: once appended to an account's
//! history they are never mutated, and callers only ever receive copies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use crate::{Error, Result};

/// Account identifier (wallet address or any other opaque key)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create an account ID, rejecting the empty string
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::InvalidAccount(
                "account identifier must not be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for AccountId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of an accepted balance change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Tokens credited to the account
    Deposit,
    /// Tokens debited from the account
    Withdraw,
}

impl TransactionKind {
    /// Wire name (`deposit` / `withdraw`)
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdraw => "withdraw",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One accepted deposit or withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Deposit or withdraw
    pub kind: TransactionKind,

    /// Amount moved, always non-zero
    pub amount: u64,

    /// Acceptance time, taken while the account lock was held
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Signed effect of this record on the balance
    pub fn delta(&self) -> i128 {
        match self.kind {
            TransactionKind::Deposit => i128::from(self.amount),
            TransactionKind::Withdraw => -i128::from(self.amount),
        }
    }
}

/// Balance and history of one account, read under a single lock
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Balance at the time of the read
    pub balance: u64,

    /// History at the time of the read, oldest first
    pub history: Vec<Transaction>,
}

impl AccountSnapshot {
    /// Whether the balance equals the replayed history
    pub fn is_consistent(&self) -> bool {
        let replayed: i128 = self.history.iter().map(Transaction::delta).sum();
        replayed == i128::from(self.balance)
    }
}
