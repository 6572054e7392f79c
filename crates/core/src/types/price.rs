//! Product prices in Indonesian Rupiah.
//!
//! Prices are stored as `NUMERIC(14,2)` and carried as [`Decimal`] so that
//! admin input like `2500000` or `1250000.50` round-trips exactly. The JSON API
//! emits prices as plain numbers to stay compatible with existing clients.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Largest value a `NUMERIC(14,2)` column can hold.
const MAX_PRICE: Decimal = Decimal::from_parts(0x107A_3FFF, 0x5AF3, 0, false, 2);

/// Errors from parsing admin price input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("Harga harus berupa angka")]
    NotANumber,
    #[error("Harga tidak boleh negatif")]
    Negative,
    #[error("Harga terlalu besar")]
    TooLarge,
}

/// A non-negative product price in Rupiah.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Zero rupiah, used when the admin leaves the price blank.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap an amount already known to be valid (e.g. read from the database).
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Parse a price from form input.
    ///
    /// Blank input is zero. The amount is rounded to two decimal places.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] if the input is not a decimal number, is
    /// negative, or does not fit the database column.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Self::ZERO);
        }

        let amount = Decimal::from_str(trimmed).map_err(|_| PriceError::NotANumber)?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }

        let amount = amount.round_dp(2);
        if amount > MAX_PRICE {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(amount))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format for display, e.g. `Rp 2.500.000` or `Rp 1.250.000,50`.
    #[must_use]
    pub fn display_idr(&self) -> String {
        let rounded = self.0.round_dp(2);
        let whole = rounded.trunc().abs().normalize().to_string();
        let cents = (rounded.fract().abs() * Decimal::ONE_HUNDRED)
            .to_u32()
            .unwrap_or(0);

        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };

        if cents == 0 {
            format!("Rp {sign}{}", group_thousands(&whole))
        } else {
            format!("Rp {sign}{},{cents:02}", group_thousands(&whole))
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_idr())
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.to_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer).map(Self)
    }
}

/// Insert `.` every three digits from the right.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}
