use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Currencies the product operates in. No conversion happens anywhere:
/// mixing currencies in arithmetic is an error, not an FX lookup.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Xaf,
    Xof,
    Eur,
    Usd,
    Gbp,
    Chf,
    Cad,
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Xaf
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Currency::Xaf => "XAF",
            Currency::Xof => "XOF",
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
            Currency::Chf => "CHF",
            Currency::Cad => "CAD",
        };
        write!(f, "{}", s)
    }
}

/// Fixed-point monetary value: an exact decimal with two fractional digits
/// plus a currency tag. All arithmetic stays in decimal; binary floats never
/// enter the picture. Serializes the amount as a decimal string.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Builds a money value from a decimal already expressed at minor-unit
    /// precision. More than two fractional digits is rejected rather than
    /// silently rounded.
    pub fn new(amount: Decimal, currency: Currency) -> Result<Self, LedgerError> {
        let mut rescaled = amount;
        rescaled.rescale(2);
        if rescaled != amount {
            return Err(LedgerError::validation(
                "amount",
                "amount cannot have more than 2 decimal places",
            ));
        }
        Ok(Money {
            amount: rescaled,
            currency,
        })
    }

    /// Rounds an unconstrained decimal (e.g. a fee product) half-up to the
    /// currency's minor unit.
    pub fn from_decimal_half_up(amount: Decimal, currency: Currency) -> Self {
        let mut rounded =
            amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        Money {
            amount: rounded,
            currency,
        }
    }

    pub fn zero(currency: Currency) -> Self {
        let mut zero = Decimal::ZERO;
        zero.rescale(2);
        Money {
            amount: zero,
            currency,
        }
    }

    pub fn from_minor_units(minor: i64, currency: Currency) -> Self {
        Money {
            amount: Decimal::new(minor, 2),
            currency,
        }
    }

    /// Exact minor-unit (cent) representation; the basis for remainder-free
    /// integer division in equal splits.
    pub fn to_minor_units(&self) -> i64 {
        (self.amount * Decimal::from(100))
            .to_i64()
            .unwrap_or_default()
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    fn require_same_currency(&self, other: &Money) -> Result<(), LedgerError> {
        if self.currency != other.currency {
            return Err(LedgerError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            });
        }
        Ok(())
    }

    pub fn try_add(&self, other: &Money) -> Result<Money, LedgerError> {
        self.require_same_currency(other)?;
        let mut sum = self.amount + other.amount;
        sum.rescale(2);
        Ok(Money {
            amount: sum,
            currency: self.currency,
        })
    }

    pub fn try_sub(&self, other: &Money) -> Result<Money, LedgerError> {
        self.require_same_currency(other)?;
        let mut diff = self.amount - other.amount;
        diff.rescale(2);
        Ok(Money {
            amount: diff,
            currency: self.currency,
        })
    }

    /// Ordering comparison; currencies must match.
    pub fn try_cmp(&self, other: &Money) -> Result<std::cmp::Ordering, LedgerError> {
        self.require_same_currency(other)?;
        Ok(self.amount.cmp(&other.amount))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}
