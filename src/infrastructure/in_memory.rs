use crate::domain::account::{Account, AccountId, Balance};
use crate::domain::ports::{LedgerStore, LockToken, LockedBalance, WriteOutcome};
use crate::error::{Result, WalletError};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// A thread-safe in-memory ledger.
///
/// Backed by a sharded `DashMap`, so a write to one wallet only ever holds the
/// lock of the shard that wallet lives in, and only for the duration of the
/// version compare-and-bump. Cloning shares the same underlying map.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    accounts: Arc<DashMap<AccountId, Account>>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn open_account(&self, account: Account) -> Result<()> {
        match self.accounts.entry(account.id) {
            Entry::Occupied(_) => Err(WalletError::AccountExists(account.id)),
            Entry::Vacant(slot) => {
                slot.insert(account);
                Ok(())
            }
        }
    }

    async fn locked_read(&self, id: AccountId) -> Result<Option<LockedBalance>> {
        Ok(self.accounts.get(&id).map(|account| LockedBalance {
            balance: account.balance,
            token: LockToken(account.version),
        }))
    }

    async fn conditional_write(
        &self,
        id: AccountId,
        token: LockToken,
        new_balance: Balance,
    ) -> Result<WriteOutcome> {
        let mut account = self
            .accounts
            .get_mut(&id)
            .ok_or(WalletError::AccountNotFound(id))?;

        if account.version != token.0 {
            return Ok(WriteOutcome::Conflict);
        }
        account.balance = new_balance;
        account.version += 1;
        Ok(WriteOutcome::Committed)
    }

    async fn read_balance(&self, id: AccountId) -> Result<Option<Balance>> {
        Ok(self.accounts.get(&id).map(|account| account.balance))
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        Ok(self
            .accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }
}
