use super::account::{Account, AccountId, Balance};
use crate::error::Result;
use async_trait::async_trait;

/// Proof of what a [`LedgerStore::locked_read`] observed.
///
/// Presenting it to [`LedgerStore::conditional_write`] commits only if the
/// account has not changed since the token was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockToken(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockedBalance {
    pub balance: Balance,
    pub token: LockToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Committed,
    Conflict,
}

/// Durable `AccountId -> Balance` mapping backing the balance guard.
///
/// Storage failures are reported as `WalletError::StoreUnavailable`; a lost
/// race is not a failure and comes back as [`WriteOutcome::Conflict`].
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Creates an account. Fails with `AccountExists` rather than overwrite.
    async fn open_account(&self, account: Account) -> Result<()>;

    /// Current balance plus the token needed to replace it.
    async fn locked_read(&self, id: AccountId) -> Result<Option<LockedBalance>>;

    async fn conditional_write(
        &self,
        id: AccountId,
        token: LockToken,
        new_balance: Balance,
    ) -> Result<WriteOutcome>;

    /// Plain read; may trail a write that is still in flight.
    async fn read_balance(&self, id: AccountId) -> Result<Option<Balance>>;

    async fn all_accounts(&self) -> Result<Vec<Account>>;
}

pub type LedgerStoreBox = Box<dyn LedgerStore>;
