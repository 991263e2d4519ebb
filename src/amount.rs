//! FAT-0 amounts.
//!
//! The source protocol uses ambient integer arithmetic; this rewrite picks
//! an explicit 64-bit unsigned width and rejects overflow on summation
//! instead of wrapping.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;

/// A positive quantity of a fungible token.
#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(u64);

impl Amount {
    /// Builds an `Amount`, rejecting zero (amounts in `inputs`/`outputs`
    /// must be strictly positive).
    pub fn new(value: u64) -> Result<Amount, Error> {
        if value == 0 {
            return Err(Error::InvalidAmount);
        }
        Ok(Amount(value))
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Sums an iterator of amounts, rejecting overflow rather than wrapping.
    pub fn checked_sum<'a>(amounts: impl Iterator<Item = &'a Amount>) -> Result<u64, Error> {
        let mut total: u64 = 0;
        for amount in amounts {
            total = total.checked_add(amount.0).ok_or(Error::BalanceOverflow)?;
        }
        Ok(total)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
