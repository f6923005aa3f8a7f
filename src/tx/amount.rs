//! Decimal ledger amounts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{OrchestratorError, OrchestratorResult};

/// Fractional digits carried by a ledger amount
pub const AMOUNT_DECIMALS: u32 = 7;

const STROOPS_PER_UNIT: i64 = 10_000_000;

/// A positive amount of an asset, stored as whole stroops (10^-7 units).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(i64);

impl Amount {
    /// Build from a count of stroops
    pub fn from_stroops(stroops: i64) -> OrchestratorResult<Self> {
        if stroops <= 0 {
            return Err(OrchestratorError::Validation(format!(
                "Amount must be positive, got {} stroops",
                stroops
            )));
        }
        Ok(Self(stroops))
    }

    /// Build from a whole number of units
    pub fn from_units(units: u64) -> OrchestratorResult<Self> {
        let stroops = i64::try_from(units)
            .ok()
            .and_then(|u| u.checked_mul(STROOPS_PER_UNIT))
            .ok_or_else(|| {
                OrchestratorError::Validation(format!("Amount {} is too large", units))
            })?;
        Self::from_stroops(stroops)
    }

    pub fn stroops(&self) -> i64 {
        self.0
    }
}

impl FromStr for Amount {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || OrchestratorError::Validation(format!("Invalid amount: {:?}", s));

        let (whole, frac) = match s.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (s, ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if !frac.bytes().all(|b| b.is_ascii_digit()) || (s.contains('.') && frac.is_empty()) {
            return Err(invalid());
        }
        if frac.len() > AMOUNT_DECIMALS as usize {
            return Err(OrchestratorError::Validation(format!(
                "Amount {:?} has more than {} decimal places",
                s, AMOUNT_DECIMALS
            )));
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let mut frac_stroops: i64 = if frac.is_empty() {
            0
        } else {
            frac.parse().map_err(|_| invalid())?
        };
        for _ in frac.len()..AMOUNT_DECIMALS as usize {
            frac_stroops *= 10;
        }

        let stroops = whole
            .checked_mul(STROOPS_PER_UNIT)
            .and_then(|w| w.checked_add(frac_stroops))
            .ok_or_else(|| OrchestratorError::Validation(format!("Amount {:?} is too large", s)))?;

        Self::from_stroops(stroops)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / STROOPS_PER_UNIT;
        let frac = self.0 % STROOPS_PER_UNIT;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:07}", frac);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

impl TryFrom<String> for Amount {
    type Error = OrchestratorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.to_string()
    }
}
