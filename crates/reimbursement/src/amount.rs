use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ers_core::{DomainError, DomainResult};

/// Largest representable amount in a `NUMERIC(19, 2)` column.
const MAX_INTEGER_DIGITS: u32 = 17;

/// Positive monetary amount with at most two decimal places.
///
/// Serialized as a decimal string (`"1000.00"`); accepts strings or JSON
/// numbers on input.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> DomainResult<Self> {
        if value <= Decimal::ZERO {
            return Err(DomainError::validation("amount", "Amount must be positive"));
        }
        if value.normalize().scale() > 2 {
            return Err(DomainError::validation(
                "amount",
                "Amount must have at most 2 decimal places",
            ));
        }
        if value.trunc() >= Decimal::from(10_i64.pow(MAX_INTEGER_DIGITS)) {
            return Err(DomainError::validation("amount", "Amount is too large"));
        }

        let mut value = value;
        value.rescale(2);
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl FromStr for Amount {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|e| DomainError::validation("amount", e.to_string()))?;
        Self::new(value)
    }
}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}
