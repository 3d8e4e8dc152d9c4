//! What happens to a proposal between the formula and the commit.
//!
//! `nearest` rounds every transfer term on its own (`RoundingPolicy::flow`,
//! reached through `BoundRates::flow`), the way `round()` is applied per
//! term. `truncate` drops the fraction of the whole proposal, like assigning
//! it to an integer. Every proposal then goes through `settle`: rounding
//! step, then the clamp to zero. Underflow is never reported as an error.

use crate::types::Quantity;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    /// Keep fractional quantities.
    #[default]
    Exact,
    /// Round each transfer term half away from zero.
    Nearest,
    /// Drop the fractional part of the proposal, toward zero.
    Truncate,
}

impl RoundingPolicy {
    pub fn apply(self, value: Quantity) -> Quantity {
        match self {
            Self::Exact    => value,
            Self::Nearest  => value.round(),
            Self::Truncate => value.trunc(),
        }
    }

    /// Applied to a single transfer term.
    pub fn flow(self, amount: Quantity) -> Quantity {
        match self {
            Self::Nearest => amount.round(),
            Self::Exact | Self::Truncate => amount,
        }
    }

    /// Round, then clamp to `>= 0`. NaN becomes 0.
    pub fn settle(self, proposal: Quantity) -> Quantity {
        clamp_non_negative(self.apply(proposal))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Exact    => "exact",
            Self::Nearest  => "nearest",
            Self::Truncate => "truncate",
        }
    }
}

pub fn clamp_non_negative(value: Quantity) -> Quantity {
    if value > 0.0 { value } else { 0.0 }
}

impl fmt::Display for RoundingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RoundingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact"    => Ok(Self::Exact),
            "nearest"  => Ok(Self::Nearest),
            "truncate" => Ok(Self::Truncate),
            other => Err(format!("unknown rounding policy '{other}' (expected exact, nearest or truncate)")),
        }
    }
}
