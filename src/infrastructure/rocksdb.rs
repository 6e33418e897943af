use crate::domain::account::{Account, AccountId, Balance};
use crate::domain::ports::{LedgerStore, LockToken, LockedBalance, WriteOutcome};
use crate::error::{Result, WalletError};
use async_trait::async_trait;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, ErrorKind, IteratorMode, OptimisticTransactionDB,
    Options,
};
use std::path::Path;
use std::sync::Arc;

/// Column Family for storing wallet records.
pub const CF_ACCOUNTS: &str = "accounts";

/// A persistent ledger backed by a RocksDB optimistic-transaction database.
///
/// Wallets live in their own Column Family, keyed by the 16 raw UUID bytes and
/// encoded as JSON. Conditional writes run inside an optimistic transaction so
/// the version check and the put are atomic even across processes sharing the
/// same database handle.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<OptimisticTransactionDB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "accounts" column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_accounts = ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default());
        let db = OptimisticTransactionDB::open_cf_descriptors(&opts, path, vec![cf_accounts])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn accounts_cf(&self) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(CF_ACCOUNTS)
            .ok_or_else(|| WalletError::store_unavailable("Accounts column family not found"))
    }

    fn fetch(&self, id: AccountId) -> Result<Option<Account>> {
        let cf = self.accounts_cf()?;
        match self.db.get_cf(cf, id.as_uuid().as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn insert_new(&self, account: &Account) -> Result<()> {
        let cf = self.accounts_cf()?;
        let key = account.id.as_uuid().as_bytes();
        let txn = self.db.transaction();
        if txn.get_for_update_cf(cf, key, true)?.is_some() {
            return Err(WalletError::AccountExists(account.id));
        }
        txn.put_cf(cf, key, serde_json::to_vec(account)?)?;
        match txn.commit() {
            Ok(()) => Ok(()),
            // Another writer created the same key concurrently.
            Err(e) if is_conflict(&e) => Err(WalletError::AccountExists(account.id)),
            Err(e) => Err(e.into()),
        }
    }

    fn compare_and_put(
        &self,
        id: AccountId,
        token: LockToken,
        new_balance: Balance,
    ) -> Result<WriteOutcome> {
        let cf = self.accounts_cf()?;
        let key = id.as_uuid().as_bytes();
        let txn = self.db.transaction();

        let bytes = txn
            .get_for_update_cf(cf, key, true)?
            .ok_or(WalletError::AccountNotFound(id))?;
        let mut account: Account = serde_json::from_slice(&bytes)?;
        if account.version != token.0 {
            return Ok(WriteOutcome::Conflict);
        }

        account.balance = new_balance;
        account.version += 1;
        txn.put_cf(cf, key, serde_json::to_vec(&account)?)?;

        match txn.commit() {
            Ok(()) => Ok(WriteOutcome::Committed),
            Err(e) if is_conflict(&e) => Ok(WriteOutcome::Conflict),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_conflict(err: &rocksdb::Error) -> bool {
    matches!(err.kind(), ErrorKind::Busy | ErrorKind::TryAgain)
}

#[async_trait]
impl LedgerStore for RocksDBStore {
    async fn open_account(&self, account: Account) -> Result<()> {
        self.insert_new(&account)
    }

    async fn locked_read(&self, id: AccountId) -> Result<Option<LockedBalance>> {
        Ok(self.fetch(id)?.map(|account| LockedBalance {
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
        self.compare_and_put(id, token, new_balance)
    }

    async fn read_balance(&self, id: AccountId) -> Result<Option<Balance>> {
        Ok(self.fetch(id)?.map(|account| account.balance))
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        let cf = self.accounts_cf()?;
        let mut accounts = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            accounts.push(serde_json::from_slice(&value)?);
        }
        Ok(accounts)
    }
}
