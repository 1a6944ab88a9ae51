//! Fixed-precision price keys.
//!
//! Every price level of an instrument is keyed by its price rounded to the
//! instrument's number of decimal places. Inputs are converted through their
//! decimal text so that two prices which print identically at the
//! instrument precision always land on the same key, whatever binary
//! floating-point noise they carried.

use crate::error::{Error, Result};
use crate::types::Quantity;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Raw numeric input from a feed message, before conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecimalInput<'a> {
    /// Decimal text, e.g. `"10.05"`.
    Text(&'a str),
    /// Binary floating-point number.
    Float(f64),
    /// Already-exact decimal.
    Exact(Decimal),
}

impl DecimalInput<'_> {
    /// Converts the input to an exact decimal without rounding.
    ///
    /// Floats are converted through their shortest round-trip text, so
    /// `1.23_f64` becomes exactly `1.23` rather than its binary expansion.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDecimal`] if the input is not a finite decimal
    /// number in the representable range.
    pub fn to_decimal(self) -> Result<Decimal> {
        match self {
            Self::Text(text) => parse_text(text),
            Self::Float(value) => parse_text(&float_text(value)?),
            Self::Exact(value) => Ok(value),
        }
    }

    /// Converts the input keeping only the digits that can affect rounding
    /// at `decimal_places`, so the decimal parser never rounds first.
    fn to_decimal_for_rounding(self, decimal_places: u32) -> Result<Decimal> {
        match self {
            Self::Text(text) => parse_text(&guard_fraction(text, decimal_places)),
            Self::Float(value) => parse_text(&guard_fraction(&float_text(value)?, decimal_places)),
            Self::Exact(value) => Ok(value),
        }
    }
}

fn float_text(value: f64) -> Result<String> {
    if !value.is_finite() {
        return Err(Error::InvalidDecimal {
            input: value.to_string(),
        });
    }
    Ok(value.to_string())
}

/// Shortens a long plain fraction to `decimal_places + 1` digits followed by
/// a sticky `1` when any dropped digit was non-zero. Half-to-even rounding
/// of the result equals rounding of the full text.
fn guard_fraction(text: &str, decimal_places: u32) -> Cow<'_, str> {
    let trimmed = text.trim();
    let Some((whole, fraction)) = trimmed.split_once('.') else {
        return Cow::Borrowed(text);
    };
    let keep = decimal_places as usize + 1;
    if fraction.len() <= keep + 1 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Cow::Borrowed(text);
    }
    let (kept, dropped) = fraction.split_at(keep);
    let sticky = if dropped.bytes().any(|b| b != b'0') {
        "1"
    } else {
        ""
    };
    Cow::Owned(format!("{whole}.{kept}{sticky}"))
}

impl<'a> From<&'a str> for DecimalInput<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a String> for DecimalInput<'a> {
    fn from(text: &'a String) -> Self {
        Self::Text(text.as_str())
    }
}

impl From<f64> for DecimalInput<'_> {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Decimal> for DecimalInput<'_> {
    fn from(value: Decimal) -> Self {
        Self::Exact(value)
    }
}

/// Owned numeric value as carried by a parsed feed message.
///
/// Deserializes from either a JSON string or a JSON number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawDecimal {
    /// Decimal text.
    Text(String),
    /// Binary floating-point number.
    Float(f64),
    /// Exact decimal supplied programmatically.
    #[serde(skip_deserializing)]
    Exact(Decimal),
}

impl RawDecimal {
    /// Borrows the value as a conversion input.
    #[must_use]
    pub fn as_input(&self) -> DecimalInput<'_> {
        match self {
            Self::Text(text) => DecimalInput::Text(text),
            Self::Float(value) => DecimalInput::Float(*value),
            Self::Exact(value) => DecimalInput::Exact(*value),
        }
    }
}

impl<'a> From<&'a RawDecimal> for DecimalInput<'a> {
    fn from(raw: &'a RawDecimal) -> Self {
        raw.as_input()
    }
}

impl From<&str> for RawDecimal {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for RawDecimal {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<f64> for RawDecimal {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Decimal> for RawDecimal {
    fn from(value: Decimal) -> Self {
        Self::Exact(value)
    }
}

fn parse_text(text: &str) -> Result<Decimal> {
    let trimmed = text.trim();
    let parsed = if trimmed.contains(['e', 'E']) {
        Decimal::from_scientific(trimmed)
    } else {
        Decimal::from_str(trimmed)
    };
    parsed.map_err(|_| Error::InvalidDecimal {
        input: text.to_string(),
    })
}

/// Parses a resting quantity exactly as received.
///
/// # Errors
/// Returns [`Error::InvalidDecimal`] for unparseable input and
/// [`Error::NegativeQuantity`] for quantities below zero.
pub fn parse_quantity<'a>(input: impl Into<DecimalInput<'a>>) -> Result<Quantity> {
    let quantity = input.into().to_decimal()?;
    if quantity.is_sign_negative() && !quantity.is_zero() {
        return Err(Error::NegativeQuantity { quantity });
    }
    Ok(quantity)
}

/// Number of fractional digits used for an instrument's price keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Precision {
    decimal_places: u32,
}

impl Precision {
    /// Largest number of decimal places a price key can carry.
    pub const MAX_DECIMAL_PLACES: u32 = 28;

    /// Creates a precision with the given number of decimal places.
    ///
    /// # Errors
    /// Returns [`Error::PrecisionOutOfRange`] above [`Self::MAX_DECIMAL_PLACES`].
    pub fn new(decimal_places: u32) -> Result<Self> {
        if decimal_places > Self::MAX_DECIMAL_PLACES {
            return Err(Error::PrecisionOutOfRange {
                decimal_places,
                max: Self::MAX_DECIMAL_PLACES,
            });
        }
        Ok(Self { decimal_places })
    }

    /// Derives the precision from a quote increment given as text.
    ///
    /// The number of decimal places is the count of significant fractional
    /// digits of the increment: `"0.01000000"` gives 2, `"0.25"` gives 2,
    /// `"0.5"` gives 1 and `"1"` gives 0.
    ///
    /// # Errors
    /// Returns [`Error::InvalidIncrement`] if the text is not a positive
    /// decimal number.
    pub fn from_increment(increment: &str) -> Result<Self> {
        let invalid = || Error::InvalidIncrement {
            increment: increment.to_string(),
        };
        let value = parse_text(increment).map_err(|_| invalid())?;
        if value.is_zero() || value.is_sign_negative() {
            return Err(invalid());
        }
        Self::new(value.normalize().scale())
    }

    /// Returns the number of decimal places.
    #[inline]
    #[must_use]
    pub const fn decimal_places(self) -> u32 {
        self.decimal_places
    }

    /// Converts a raw price into this precision's key.
    ///
    /// The price is rounded half-to-even at `decimal_places` and carried with
    /// exactly that many fractional digits.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDecimal`] for unparseable input and
    /// [`Error::PriceOutOfRange`] when the rounded price cannot be held at
    /// this scale.
    pub fn key<'a>(self, input: impl Into<DecimalInput<'a>>) -> Result<PriceKey> {
        let price = input
            .into()
            .to_decimal_for_rounding(self.decimal_places)?;
        let mut key = price.round_dp_with_strategy(
            self.decimal_places,
            RoundingStrategy::MidpointNearestEven,
        );
        key.rescale(self.decimal_places);
        if key.scale() != self.decimal_places {
            return Err(Error::PriceOutOfRange {
                price,
                decimal_places: self.decimal_places,
            });
        }
        Ok(PriceKey(key))
    }
}

/// Price canonicalized to an instrument's precision.
///
/// Ordering and equality are numeric. Display always prints exactly the
/// instrument's number of decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PriceKey(Decimal);

impl PriceKey {
    /// Returns the key as a decimal.
    #[inline]
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Returns the number of fractional digits carried by the key.
    #[inline]
    #[must_use]
    pub fn decimal_places(&self) -> u32 {
        self.0.scale()
    }
}

impl fmt::Display for PriceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Serialize for PriceKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<PriceKey> for Decimal {
    fn from(key: PriceKey) -> Self {
        key.0
    }
}
