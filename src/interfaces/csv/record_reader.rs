use crate::domain::account::{AccountId, Balance};
use crate::domain::operation::OperationRequest;
use crate::error::{Result, WalletError};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::io::Read;

/// One row of an account seed file: `wallet_id,balance`.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
pub struct AccountSeed {
    pub wallet_id: AccountId,
    pub balance: Balance,
}

/// Headed CSV input for wallet seeds and operations.
///
/// Fields are trimmed and rows may carry extra columns; every row is decoded
/// independently into whatever record type [`RecordReader::records`] asks for.
pub struct RecordReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RecordReader<R> {
    /// Wraps `source`, expecting a header row naming the record's fields.
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and deserializes records, one `Result` per row, so a
    /// malformed row does not end the stream.
    pub fn records<T: DeserializeOwned>(self) -> impl Iterator<Item = Result<T>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(WalletError::from))
    }

    pub fn operations(self) -> impl Iterator<Item = Result<OperationRequest>> {
        self.records()
    }

    pub fn account_seeds(self) -> impl Iterator<Item = Result<AccountSeed>> {
        self.records()
    }
}
