//! Interactive text menu over the ledger
//!
//! Input is read as whitespace-separated tokens, so an answer may sit on
//! the same line as the menu choice (`2 alice 100`). The loop ends on the
//! exit option, at end of input, or when the context fires.

use chrono::Local;
use std::collections::VecDeque;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::{Context, Ledger, Result};

const MENU: &str = "\nToken Tracker CLI\n\
1. Check Balance\n\
2. Deposit Tokens\n\
3. Withdraw Tokens\n\
4. View Transaction History\n\
5. Exit\n";

/// Menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// Show an account's balance
    CheckBalance,
    /// Credit an account
    Deposit,
    /// Debit an account
    Withdraw,
    /// List an account's transactions
    History,
    /// Leave the loop
    Exit,
}

impl FromStr for MenuChoice {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.parse::<u32>() {
            Ok(1) => Ok(MenuChoice::CheckBalance),
            Ok(2) => Ok(MenuChoice::Deposit),
            Ok(3) => Ok(MenuChoice::Withdraw),
            Ok(4) => Ok(MenuChoice::History),
            Ok(5) => Ok(MenuChoice::Exit),
            _ => Err(()),
        }
    }
}

/// Menu loop reading from `R` and writing to `W`
#[derive(Debug)]
pub struct Console<R, W> {
    input: R,
    output: W,
    pending: VecDeque<String>,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Create a console over the given streams
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            pending: VecDeque::new(),
        }
    }

    /// Give back the output stream
    pub fn into_output(self) -> W {
        self.output
    }

    /// Run the menu until exit, end of input, or cancellation
    pub async fn run(&mut self, ctx: &Context, ledger: &Ledger) -> Result<()> {
        loop {
            self.write(MENU).await?;
            let Some(token) = self.prompt(ctx, "Select an option: ").await? else {
                return Ok(());
            };

            let choice = match token.parse::<MenuChoice>() {
                Ok(choice) => choice,
                Err(()) => {
                    self.write("Invalid option\n").await?;
                    continue;
                }
            };

            let keep_going = match choice {
                MenuChoice::CheckBalance => self.check_balance(ctx, ledger).await?,
                MenuChoice::Deposit => self.deposit(ctx, ledger).await?,
                MenuChoice::Withdraw => self.withdraw(ctx, ledger).await?,
                MenuChoice::History => self.history(ctx, ledger).await?,
                MenuChoice::Exit => false,
            };
            if !keep_going {
                return Ok(());
            }
        }
    }

    async fn check_balance(&mut self, ctx: &Context, ledger: &Ledger) -> Result<bool> {
        let Some(address) = self.prompt(ctx, "Enter wallet address: ").await? else {
            return Ok(false);
        };

        match ledger.get_balance(ctx, &address).await {
            Ok(balance) => self.write(&format!("Balance: {} tokens\n", balance)).await?,
            Err(e) => self.write(&format!("Error: {}\n", e)).await?,
        }
        Ok(true)
    }

    async fn deposit(&mut self, ctx: &Context, ledger: &Ledger) -> Result<bool> {
        let Some((address, amount)) = self.prompt_transfer(ctx, "deposit").await? else {
            return Ok(false);
        };
        let Some(amount) = amount else {
            self.write("Invalid amount\n").await?;
            return Ok(true);
        };

        match ledger.deposit(ctx, &address, amount).await {
            Ok(()) => self.write("Deposit successful\n").await?,
            Err(e) => self.write(&format!("Error: {}\n", e)).await?,
        }
        Ok(true)
    }

    async fn withdraw(&mut self, ctx: &Context, ledger: &Ledger) -> Result<bool> {
        let Some((address, amount)) = self.prompt_transfer(ctx, "withdraw").await? else {
            return Ok(false);
        };
        let Some(amount) = amount else {
            self.write("Invalid amount\n").await?;
            return Ok(true);
        };

        match ledger.withdraw(ctx, &address, amount).await {
            Ok(()) => self.write("Withdrawal successful\n").await?,
            Err(e) => self.write(&format!("Error: {}\n", e)).await?,
        }
        Ok(true)
    }

    async fn history(&mut self, ctx: &Context, ledger: &Ledger) -> Result<bool> {
        let Some(address) = self.prompt(ctx, "Enter wallet address: ").await? else {
            return Ok(false);
        };

        let history = match ledger.get_transaction_history(ctx, &address).await {
            Ok(history) => history,
            Err(e) => {
                self.write(&format!("Error: {}\n", e)).await?;
                return Ok(true);
            }
        };

        if history.is_empty() {
            self.write("No transactions\n").await?;
        }
        for tx in history {
            let line = format!(
                "Type: {}, Amount: {}, Timestamp: {}\n",
                tx.kind,
                tx.amount,
                tx.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
            );
            self.write(&line).await?;
        }
        Ok(true)
    }

    /// Address then amount; `Some((address, None))` when the amount doesn't parse
    async fn prompt_transfer(
        &mut self,
        ctx: &Context,
        verb: &str,
    ) -> Result<Option<(String, Option<u64>)>> {
        let Some(address) = self.prompt(ctx, "Enter wallet address: ").await? else {
            return Ok(None);
        };
        let Some(amount) = self
            .prompt(ctx, &format!("Enter amount to {}: ", verb))
            .await?
        else {
            return Ok(None);
        };
        Ok(Some((address, amount.parse().ok())))
    }

    async fn prompt(&mut self, ctx: &Context, text: &str) -> Result<Option<String>> {
        self.write(text).await?;
        self.next_token(ctx).await
    }

    async fn next_token(&mut self, ctx: &Context) -> Result<Option<String>> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(Some(token));
            }

            let mut line = String::new();
            let read = tokio::select! {
                _ = ctx.done() => return Ok(None),
                read = self.input.read_line(&mut line) => read?,
            };
            if read == 0 {
                return Ok(None);
            }
            self.pending
                .extend(line.split_whitespace().map(str::to_owned));
        }
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }
}
