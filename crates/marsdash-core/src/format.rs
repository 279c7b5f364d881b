//! Display encoding of balances, daily movements and descriptions

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;

/// Fixed-point amount always carrying exactly two fractional digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Quantize to cents, rounding half away from zero
    pub fn new(value: Decimal) -> Self {
        let mut cents = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        cents.rescale(2);
        if cents.is_zero() {
            cents.set_sign_positive(true);
        }
        Money(cents)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::new(value)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.trim()
            .parse::<Decimal>()
            .map(Money::new)
            .map_err(serde::de::Error::custom)
    }
}

pub fn format_balance(value: Decimal) -> Money {
    Money::new(value)
}

/// Render a day's postings for one account.
///
/// Several postings become a sign-preserving sum (`-20.00+5.00`) so every
/// posting stays visible.
pub fn format_transaction(amounts: &[Decimal], hide_zero: bool) -> String {
    match amounts {
        [] => String::new(),
        [single] => {
            let money = Money::new(*single);
            if hide_zero && money.is_zero() {
                String::new()
            } else {
                money.to_string()
            }
        }
        [first, rest @ ..] => {
            let mut expression = Money::new(*first).to_string();
            for amount in rest {
                let money = Money::new(*amount);
                if !money.value().is_sign_negative() {
                    expression.push('+');
                }
                expression.push_str(&money.to_string());
            }
            expression
        }
    }
}

pub fn format_description(parts: &BTreeSet<String>) -> String {
    parts.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
