use crate::domain::account::{Account, AccountId, Balance};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct BalanceRow {
    wallet_id: AccountId,
    balance: Balance,
}

/// Writes final wallet balances as `wallet_id,balance`, sorted by wallet id.
pub struct BalanceWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> BalanceWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_accounts(&mut self, mut accounts: Vec<Account>) -> Result<()> {
        accounts.sort_by_key(|account| account.id);
        for account in accounts {
            self.writer.serialize(BalanceRow {
                wallet_id: account.id,
                balance: account.balance,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
