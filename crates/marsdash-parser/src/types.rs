//! Common types for the Beancount reader

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Amount with currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    pub amount: Decimal,
    pub currency: String,
}

impl Amount {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}

/// Price specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Price {
    /// `@ price` per unit
    Single(Amount),
    /// `@@ price` for the whole posting
    Total(Amount),
}

impl Price {
    /// Convert a posting's units into the price currency
    pub fn convert(&self, units: Decimal) -> Amount {
        match self {
            Price::Single(per_unit) => Amount::new(units * per_unit.amount, per_unit.currency.clone()),
            // A total price carries no sign of its own
            Price::Total(total) => {
                let value = if units.is_sign_negative() { -total.amount } else { total.amount };
                Amount::new(value, total.currency.clone())
            }
        }
    }
}
