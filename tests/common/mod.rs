#![allow(dead_code)]

use async_trait::async_trait;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use wallet_guard::domain::account::{Account, AccountId, Balance};
use wallet_guard::domain::ports::{LedgerStore, LockToken, LockedBalance, WriteOutcome};
use wallet_guard::error::{Result, WalletError};
use wallet_guard::infrastructure::in_memory::InMemoryLedgerStore;

pub const ALWAYS: u32 = u32::MAX;

/// In-memory ledger that counts calls and can be told to misbehave.
///
/// Clones share counters and data, so a test can keep one handle while the
/// guard owns another.
#[derive(Clone, Default)]
pub struct InstrumentedStore {
    inner: InMemoryLedgerStore,
    reads: Arc<AtomicU32>,
    commits: Arc<AtomicU32>,
    forced_conflicts: Arc<AtomicU32>,
    contended: Option<AccountId>,
    unavailable: Arc<AtomicBool>,
}

impl InstrumentedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports `count` conflicts before letting writes through (`ALWAYS` never does).
    pub fn with_conflicts(self, count: u32) -> Self {
        self.forced_conflicts.store(count, Ordering::SeqCst);
        self
    }

    /// Restricts forced conflicts to a single wallet.
    pub fn contended_on(mut self, id: AccountId) -> Self {
        self.contended = Some(id);
        self
    }

    pub fn failing_writes(self) -> Self {
        self.unavailable.store(true, Ordering::SeqCst);
        self
    }

    pub fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> u32 {
        self.commits.load(Ordering::SeqCst)
    }

    fn take_conflict(&self, id: AccountId) -> bool {
        if self.contended.is_some_and(|contended| contended != id) {
            return false;
        }
        self.forced_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                0 => None,
                ALWAYS => Some(ALWAYS),
                n => Some(n - 1),
            })
            .is_ok()
    }
}

#[async_trait]
impl LedgerStore for InstrumentedStore {
    async fn open_account(&self, account: Account) -> Result<()> {
        self.inner.open_account(account).await
    }

    async fn locked_read(&self, id: AccountId) -> Result<Option<LockedBalance>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.locked_read(id).await
    }

    async fn conditional_write(
        &self,
        id: AccountId,
        token: LockToken,
        new_balance: Balance,
    ) -> Result<WriteOutcome> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(WalletError::store_unavailable("injected storage failure"));
        }
        if self.take_conflict(id) {
            return Ok(WriteOutcome::Conflict);
        }
        let outcome = self.inner.conditional_write(id, token, new_balance).await?;
        if outcome == WriteOutcome::Committed {
            self.commits.fetch_add(1, Ordering::SeqCst);
        }
        Ok(outcome)
    }

    async fn read_balance(&self, id: AccountId) -> Result<Option<Balance>> {
        self.inner.read_balance(id).await
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        self.inner.all_accounts().await
    }
}

/// Writes an operations file of `rows` deposits of 1.00 spread over `wallets`.
pub fn generate_operations_csv(path: &Path, wallets: &[AccountId], rows: usize) -> Result<()> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record(["wallet_id", "operation_type", "amount"])?;

    for i in 0..rows {
        let wallet = wallets[i % wallets.len()].to_string();
        wtr.write_record([wallet.as_str(), "DEPOSIT", "1.00"])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn generate_accounts_csv(path: &Path, wallets: &[AccountId]) -> Result<()> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record(["wallet_id", "balance"])?;
    for wallet in wallets {
        wtr.write_record([wallet.to_string().as_str(), "0.00"])?;
    }
    wtr.flush()?;
    Ok(())
}
