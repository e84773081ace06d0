use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A donation amount, held in minor currency units (1/100 of the major unit).
///
/// Amounts travel as JSON numbers in major units (`501`, `1100.5`) but are
/// stored internally as an integer so the canonical string used for hashing
/// never depends on float formatting: `501`, `501.0` and `501.00` all
/// canonicalize to `"501.00"`.
///
/// Submissions are rounded to the cent by [`Amount::from_major`].
/// Deserialization is strict: a number that does not sit exactly on a cent
/// (`501.004`) is an error, so a stored amount can never be edited by less
/// than a cent and still hash like the original.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Amount {
    minor: u64,
}

impl Amount {
    /// Upper bound for a single donation: 1,000,000.00.
    pub const MAX: Self = Self {
        minor: 100_000_000,
    };

    /// Create an amount from minor units, enforcing `0 < minor <= MAX`.
    pub fn from_minor(minor: u64) -> Result<Self, TypeError> {
        if minor == 0 {
            return Err(TypeError::NonPositiveAmount);
        }
        if minor > Self::MAX.minor {
            return Err(TypeError::AmountTooLarge {
                max: Self::MAX.canonical(),
            });
        }
        Ok(Self { minor })
    }

    /// Create an amount from a major-unit number, rounding to two decimals.
    pub fn from_major(value: f64) -> Result<Self, TypeError> {
        if !value.is_finite() {
            return Err(TypeError::InvalidAmount);
        }
        if value <= 0.0 {
            return Err(TypeError::NonPositiveAmount);
        }
        let minor = (value * 100.0).round();
        if minor > Self::MAX.minor as f64 {
            return Err(TypeError::AmountTooLarge {
                max: Self::MAX.canonical(),
            });
        }
        Self::from_minor(minor as u64)
    }

    /// Like [`Amount::from_major`], but fails instead of rounding.
    pub fn from_major_exact(value: f64) -> Result<Self, TypeError> {
        let amount = Self::from_major(value)?;
        if amount.to_major() != value {
            return Err(TypeError::InexactAmount(value.to_string()));
        }
        Ok(amount)
    }

    /// Amount in minor units.
    pub fn minor_units(&self) -> u64 {
        self.minor
    }

    /// Amount in major units.
    pub fn to_major(&self) -> f64 {
        self.minor as f64 / 100.0
    }

    /// Fixed two-decimal rendering, e.g. `"501.00"`.
    pub fn canonical(&self) -> String {
        format!("{}.{:02}", self.minor / 100, self.minor % 100)
    }

    /// Sum amounts in minor units without overflow.
    pub fn total<'a>(amounts: impl IntoIterator<Item = &'a Amount>) -> u64 {
        amounts
            .into_iter()
            .fold(0u64, |acc, a| acc.saturating_add(a.minor))
    }
}

impl TryFrom<f64> for Amount {
    type Error = TypeError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::from_major_exact(value)
    }
}

impl From<Amount> for f64 {
    fn from(amount: Amount) -> Self {
        amount.to_major()
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.canonical())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}
