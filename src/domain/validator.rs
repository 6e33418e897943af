use super::account::{AccountId, Amount, Balance};
use super::operation::OperationKind;
use crate::error::{Result, WalletError};
use rust_decimal::Decimal;

/// Computes the balance that results from applying `kind`/`amount` to
/// `current`, or the reason it may not be applied.
///
/// Pure and deterministic; `account_id` is only used to label rejections.
pub fn validate(
    account_id: AccountId,
    current: Balance,
    kind: OperationKind,
    amount: Amount,
) -> Result<Balance> {
    if amount.value() <= Decimal::ZERO {
        return Err(WalletError::InvalidAmount(format!(
            "amount must be positive: {amount}"
        )));
    }

    match kind {
        OperationKind::Deposit => current.checked_add(amount).ok_or_else(|| {
            WalletError::InvalidAmount(format!("deposit of {amount} overflows balance {current}"))
        }),
        OperationKind::Withdraw => {
            current
                .checked_sub(amount)
                .ok_or(WalletError::InsufficientFunds {
                    account_id,
                    balance: current.value(),
                    requested: amount.value(),
                })
        }
    }
}
