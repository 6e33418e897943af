use crate::error::{Result, WalletError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Number of fractional digits every monetary value is kept at.
pub const SCALE: u32 = 2;

/// Brings `value` to exactly [`SCALE`] fractional digits without rounding.
///
/// Returns `None` when that would drop a significant digit (`1.005`) or when
/// the value is too large to carry two fractional digits, while trailing
/// zeros beyond the scale (`1.000`) are accepted.
fn fixed_point(value: Decimal) -> Option<Decimal> {
    let mut normalized = value.normalize();
    if normalized.scale() > SCALE {
        return None;
    }
    // `rescale` settles for a smaller scale when the mantissa would overflow.
    normalized.rescale(SCALE);
    exact(normalized)
}

/// `Decimal` arithmetic silently rounds to a smaller scale near its upper
/// bound; any result that lost the fixed scale is treated as overflow.
fn exact(value: Decimal) -> Option<Decimal> {
    (value.scale() == SCALE).then_some(value)
}

/// Opaque identifier of a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Creates a new random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for AccountId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A wallet balance: never negative, always at two fractional digits.
///
/// There is deliberately no `Sub` impl; the only ways to derive a new balance
/// are [`Balance::checked_add`] and [`Balance::checked_sub`], which refuse to
/// produce a negative value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Balance(Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::from_parts(0, 0, 0, false, SCALE));

    pub fn new(value: Decimal) -> Result<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(WalletError::InvalidAmount(format!(
                "balance cannot be negative: {value}"
            )));
        }
        fixed_point(value.abs()).map(Self).ok_or_else(|| {
            WalletError::InvalidAmount(format!(
                "balance {value} cannot be held at exactly {SCALE} fractional digits"
            ))
        })
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// `None` when the sum cannot be represented exactly at two digits.
    pub fn checked_add(self, amount: Amount) -> Option<Self> {
        self.0.checked_add(amount.0).and_then(exact).map(Self)
    }

    /// `None` when `amount` exceeds the balance.
    pub fn checked_sub(self, amount: Amount) -> Option<Self> {
        if self.0 < amount.0 {
            return None;
        }
        self.0.checked_sub(amount.0).and_then(exact).map(Self)
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TryFrom<Decimal> for Balance {
    type Error = WalletError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Balance> for Decimal {
    fn from(balance: Balance) -> Self {
        balance.0
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A strictly positive monetary amount carried by a deposit or withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value <= Decimal::ZERO {
            return Err(WalletError::InvalidAmount(format!(
                "amount must be positive: {value}"
            )));
        }
        fixed_point(value).map(Self).ok_or_else(|| {
            WalletError::InvalidAmount(format!(
                "amount {value} cannot be held at exactly {SCALE} fractional digits"
            ))
        })
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = WalletError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The persisted state of one wallet.
///
/// `version` is bumped by exactly one on every committed write and doubles as
/// the lock token handed out by [`crate::domain::ports::LedgerStore::locked_read`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub balance: Balance,
    pub version: u64,
}

impl Account {
    pub fn new(id: AccountId, balance: Balance) -> Self {
        Self {
            id,
            balance,
            version: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_balance_is_kept_at_two_digits() {
        assert_eq!(Balance::new(dec!(1000)).unwrap().to_string(), "1000.00");
        assert_eq!(Balance::new(dec!(1.000)).unwrap().to_string(), "1.00");
        assert_eq!(Balance::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_balance_validation() {
        assert!(Balance::new(dec!(0)).is_ok());
        assert!(matches!(
            Balance::new(dec!(-0.01)),
            Err(WalletError::InvalidAmount(_))
        ));
        assert!(matches!(
            Balance::new(dec!(1.005)),
            Err(WalletError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(0.01)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0.0)),
            Err(WalletError::InvalidAmount(_))
        ));
        assert!(matches!(
            Amount::new(dec!(-1.0)),
            Err(WalletError::InvalidAmount(_))
        ));
        assert!(matches!(
            Amount::new(dec!(0.001)),
            Err(WalletError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_balance_arithmetic_preserves_scale() {
        let balance = Balance::new(dec!(100.00)).unwrap();
        let amount = Amount::new(dec!(40)).unwrap();
        assert_eq!(balance.checked_add(amount).unwrap().to_string(), "140.00");
        assert_eq!(balance.checked_sub(amount).unwrap().to_string(), "60.00");
    }

    #[test]
    fn test_checked_sub_refuses_negative() {
        let balance = Balance::new(dec!(10.00)).unwrap();
        let amount = Amount::new(dec!(10.01)).unwrap();
        assert_eq!(balance.checked_sub(amount), None);
        assert_eq!(
            balance.checked_sub(Amount::new(dec!(10)).unwrap()),
            Some(Balance::ZERO)
        );
    }

    #[test]
    fn test_values_too_large_for_two_digits_are_rejected() {
        assert!(matches!(
            Balance::new(Decimal::MAX),
            Err(WalletError::InvalidAmount(_))
        ));
        assert!(matches!(
            Amount::new(Decimal::MAX),
            Err(WalletError::InvalidAmount(_))
        ));

        // Largest mantissa at scale 2 still fits.
        let top = Decimal::from_parts(u32::MAX, u32::MAX, u32::MAX, false, SCALE);
        assert_eq!(Balance::new(top).unwrap().value().scale(), SCALE);
    }

    #[test]
    fn test_checked_add_refuses_to_round_at_the_top_of_the_range() {
        let top = Decimal::from_parts(u32::MAX, u32::MAX, u32::MAX, false, SCALE);
        let balance = Balance::new(top).unwrap();
        assert_eq!(balance.checked_add(Amount::new(dec!(0.01)).unwrap()), None);

        let below = Balance::new(top - dec!(0.01)).unwrap();
        let sum = below.checked_add(Amount::new(dec!(0.01)).unwrap()).unwrap();
        assert_eq!(sum.value(), top);
        assert_eq!(sum.value().scale(), SCALE);
    }

    #[test]
    fn test_amount_deserialization_is_validated() {
        let ok: Amount = serde_json::from_str("\"12.5\"").unwrap();
        assert_eq!(ok.to_string(), "12.50");
        assert!(serde_json::from_str::<Amount>("\"-3\"").is_err());
    }

    #[test]
    fn test_account_id_round_trips_through_strings() {
        let id = AccountId::new();
        let parsed: AccountId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<AccountId>().is_err());
    }
}
