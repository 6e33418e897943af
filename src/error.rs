use crate::domain::account::AccountId;
use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WalletError>;

/// Every outcome other than a committed balance.
///
/// The first four variants are the balance guard's own taxonomy; the rest come
/// from the edges (gateway parsing, account creation, I/O).
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Wallet {0} not found")]
    AccountNotFound(AccountId),
    #[error("Insufficient funds in wallet {account_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account_id: AccountId,
        balance: Decimal,
        requested: Decimal,
    },
    #[error("Wallet {account_id} is busy: gave up after {attempts} attempt(s)")]
    ContentionExhausted { account_id: AccountId, attempts: u32 },
    #[error("Ledger store unavailable: {0}")]
    StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Wallet {0} already exists")]
    AccountExists(AccountId),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WalletError {
    pub fn store_unavailable<E>(source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::StoreUnavailable(source.into())
    }

    /// Stable identifier for the outcome, independent of the message text.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::ContentionExhausted { .. } => "CONTENTION_EXHAUSTED",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::AccountExists(_) => "ACCOUNT_EXISTS",
            Self::Csv(_) => "MALFORMED_INPUT",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Whether resubmitting the same request later may succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ContentionExhausted { .. })
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for WalletError {
    fn from(err: rocksdb::Error) -> Self {
        Self::store_unavailable(err)
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        Self::store_unavailable(err)
    }
}
