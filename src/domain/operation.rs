use super::account::{AccountId, Amount};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationKind {
    #[serde(alias = "deposit", alias = "Deposit")]
    Deposit,
    #[serde(alias = "withdraw", alias = "Withdraw")]
    Withdraw,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deposit => f.write_str("deposit"),
            Self::Withdraw => f.write_str("withdraw"),
        }
    }
}

/// A decoded request to change one wallet's balance.
///
/// Field names follow the gateway's wire format; `amount` is validated while
/// deserializing, so a request that exists always carries a positive amount.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct OperationRequest {
    pub wallet_id: AccountId,
    pub operation_type: OperationKind,
    pub amount: Amount,
}
