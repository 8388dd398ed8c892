//! Per-account state and its transition rules
//!
//! `Account` is the unit guarded by one lock in the ledger. Every method
//! either applies the whole change (balance and history together) or
//! returns an error having touched nothing.

use chrono::{DateTime, Utc};

use crate::types::{AccountId, AccountSnapshot, Transaction, TransactionKind};
use crate::{Error, Result};

/// Balance plus append-only history of one account
#[derive(Debug, Default)]
pub(crate) struct Account {
    balance: u64,
    history: Vec<Transaction>,
}

impl Account {
    /// Credit `amount`, returning the new balance
    pub(crate) fn deposit(
        &mut self,
        account: &AccountId,
        amount: u64,
        at: DateTime<Utc>,
    ) -> Result<u64> {
        debug_assert!(amount > 0);

        let balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| Error::BalanceOverflow {
                account: account.to_string(),
                balance: self.balance,
                amount,
            })?;

        self.append(TransactionKind::Deposit, amount, at);
        self.balance = balance;
        Ok(balance)
    }

    /// Debit `amount`, returning the new balance
    pub(crate) fn withdraw(&mut self, amount: u64, at: DateTime<Utc>) -> Result<u64> {
        debug_assert!(amount > 0);

        if self.balance < amount {
            return Err(Error::InsufficientBalance {
                requested: amount,
                available: self.balance,
            });
        }

        self.append(TransactionKind::Withdraw, amount, at);
        self.balance -= amount;
        Ok(self.balance)
    }

    pub(crate) fn balance(&self) -> u64 {
        self.balance
    }

    /// Owned copy of the history
    pub(crate) fn history(&self) -> Vec<Transaction> {
        self.history.clone()
    }

    pub(crate) fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            balance: self.balance,
            history: self.history(),
        }
    }

    fn append(&mut self, kind: TransactionKind, amount: u64, timestamp: DateTime<Utc>) {
        self.history.push(Transaction {
            kind,
            amount,
            timestamp,
        });
    }
}
