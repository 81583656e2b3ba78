//! # Money Module
//!
//! Provides the `Money` type for rupee amounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Spreadsheet exports store prices as floats:                            │
//! │    80 + 0.40 × 20 = 88.00000000000001  → ceil → 89  ❌ WRONG!          │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    8000 + 4000 × 2000 / 10000 = 8800 paise → ceil → ₹88                │
//! │    Floats are converted ONCE, when a sheet is loaded                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kirana_core::money::Money;
//!
//! let price = Money::from_paise(8850); // ₹88.50
//! let line = price * 3;                // ₹265.50
//! assert_eq!(line.to_string(), "₹265.50");
//!
//! let parsed: Money = "88.5".parse().unwrap();
//! assert_eq!(parsed, price);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;
use thiserror::Error;

/// Paise in one rupee.
pub const PAISE_PER_RUPEE: i64 = 100;

/// Largest magnitude accepted from float input (₹10^13).
const MAX_FLOAT_RUPEES: f64 = 1e13;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (1/100 rupee).
///
/// ## Design Decisions
/// - **i64 (signed)**: margins can be negative when MRP is below cost
/// - **Single field tuple struct**: serializes as a bare integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    ///
    /// ```rust
    /// use kirana_core::money::Money;
    /// assert_eq!(Money::from_rupees(88).paise(), 8800);
    /// ```
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * PAISE_PER_RUPEE)
    }

    /// Converts a floating-point rupee amount, rounding to the nearest paisa.
    ///
    /// Returns `None` for NaN, infinities and absurdly large values. This is
    /// the only place a float enters the system.
    pub fn from_f64_rupees(value: f64) -> Option<Self> {
        if !value.is_finite() || value.abs() > MAX_FLOAT_RUPEES {
            return None;
        }
        Some(Money((value * PAISE_PER_RUPEE as f64).round() as i64))
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion (truncated toward zero).
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / PAISE_PER_RUPEE
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % PAISE_PER_RUPEE).abs()
    }

    /// Returns the value as floating-point rupees, for JSON files only.
    pub fn to_f64_rupees(&self) -> f64 {
        self.0 as f64 / PAISE_PER_RUPEE as f64
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use kirana_core::money::Money;
    /// let line_total = Money::from_paise(2999).multiply_quantity(3);
    /// assert_eq!(line_total.paise(), 8997);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Like [`Money::multiply_quantity`], clamped to the representable range.
    #[inline]
    pub const fn saturating_multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    #[inline]
    pub const fn saturating_add(&self, other: Money) -> Self {
        Money(self.0.saturating_add(other.0))
    }

    #[inline]
    pub const fn saturating_sub(&self, other: Money) -> Self {
        Money(self.0.saturating_sub(other.0))
    }

    /// Returns `bps` basis points of this amount, rounded half up.
    ///
    /// ```rust
    /// use kirana_core::money::Money;
    /// // 5% of ₹110 = ₹5.50
    /// assert_eq!(Money::from_rupees(110).percentage(500).paise(), 550);
    /// ```
    pub fn percentage(&self, bps: u32) -> Money {
        // i128 so large sheets never overflow
        let amount = (self.0 as i128 * bps as i128 + 5000).div_euclid(10000);
        Money(amount as i64)
    }

    /// Raises (or with negative `bps`, lowers) the amount by `bps` basis
    /// points, rounded half up and clamped to the representable range.
    ///
    /// ```rust
    /// use kirana_core::money::Money;
    /// assert_eq!(Money::from_rupees(100).scale_bps(750), Money::from_paise(10750));
    /// assert_eq!(Money::from_rupees(99).scale_bps(-1000), Money::from_paise(8910));
    /// ```
    pub fn scale_bps(&self, bps: i64) -> Money {
        let scaled = (self.0 as i128 * (10_000 + bps as i128) + 5000).div_euclid(10_000);
        Money(scaled.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ```rust
    /// use kirana_core::money::Money;
    /// let discounted = Money::from_rupees(100).apply_percentage_discount(1000);
    /// assert_eq!(discounted, Money::from_rupees(90));
    /// ```
    pub fn apply_percentage_discount(&self, discount_bps: u32) -> Money {
        *self - self.percentage(discount_bps)
    }

    /// Rounds up to the next whole rupee (toward positive infinity).
    ///
    /// ```rust
    /// use kirana_core::money::Money;
    /// assert_eq!(Money::from_paise(6960).ceil_to_rupee(), Money::from_rupees(70));
    /// assert_eq!(Money::from_paise(-250).ceil_to_rupee(), Money::from_rupees(-2));
    /// ```
    pub fn ceil_to_rupee(&self) -> Money {
        Money(ceil_div(self.0 as i128, PAISE_PER_RUPEE as i128) as i64 * PAISE_PER_RUPEE)
    }

    /// Plain decimal rendering with two places and no currency sign ("88.50").
    ///
    /// Used for CSV cells.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

/// Integer division rounding toward positive infinity.
pub(crate) fn ceil_div(numerator: i128, denominator: i128) -> i128 {
    let q = numerator.div_euclid(denominator);
    if numerator.rem_euclid(denominator) == 0 {
        q
    } else {
        q + 1
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Error returned when a cell cannot be read as a rupee amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{input}' is not a valid amount")]
pub struct ParseMoneyError {
    pub input: String,
}

impl FromStr for Money {
    type Err = ParseMoneyError;

    /// Parses "88", "88.5", "88.50", "-3.25", "₹88", "Rs.88" exactly, and
    /// falls back to float parsing for forms like "1e3".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMoneyError {
            input: s.to_string(),
        };
        let trimmed = s.trim();
        let trimmed = trimmed
            .strip_prefix('₹')
            .or_else(|| trimmed.strip_prefix("Rs."))
            .unwrap_or(trimmed)
            .trim();
        if trimmed.is_empty() {
            return Err(err());
        }

        if let Some(m) = parse_decimal(trimmed) {
            return Ok(m);
        }

        let value: f64 = trimmed.parse().map_err(|_| err())?;
        Money::from_f64_rupees(value).ok_or_else(err)
    }
}

/// Exact decimal parsing with half-up rounding past the second place.
fn parse_decimal(s: &str) -> Option<Money> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if whole.len() > 15 {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut frac_digits = frac.bytes().map(|b| (b - b'0') as i64);
    let tens = frac_digits.next().unwrap_or(0);
    let ones = frac_digits.next().unwrap_or(0);
    let round_up = frac_digits.next().map_or(false, |d| d >= 5);

    let mut paise = whole * PAISE_PER_RUPEE + tens * 10 + ones;
    if round_up {
        paise += 1;
    }
    Some(Money(if negative { -paise } else { paise }))
}

// =============================================================================
// Serde helper: rupees as JSON numbers
// =============================================================================

/// Serializes `Money` as a floating-point rupee number.
///
/// For files that other tools read (`customers.json`), use
/// `#[serde(with = "kirana_core::money::rupees")]`.
pub mod rupees {
    use super::Money;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.to_f64_rupees())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Money::from_f64_rupees(value)
            .ok_or_else(|| de::Error::custom(format!("invalid rupee amount: {value}")))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paise() {
        let money = Money::from_paise(1099);
        assert_eq!(money.paise(), 1099);
        assert_eq!(money.rupees(), 10);
        assert_eq!(money.paise_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_paise(1099).to_string(), "₹10.99");
        assert_eq!(Money::from_paise(500).to_string(), "₹5.00");
        assert_eq!(Money::from_paise(-550).to_string(), "-₹5.50");
        assert_eq!(Money::zero().to_string(), "₹0.00");
        assert_eq!(Money::from_paise(-50).to_decimal_string(), "-0.50");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_rupees(10);
        let b = Money::from_rupees(5);
        assert_eq!((a + b).paise(), 1500);
        assert_eq!((a - b).paise(), 500);
        assert_eq!((a * 3).paise(), 3000);
        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total, Money::from_rupees(20));
    }

    #[test]
    fn test_parse_exact_decimals() {
        assert_eq!("88".parse::<Money>(), Ok(Money::from_rupees(88)));
        assert_eq!("88.0".parse::<Money>(), Ok(Money::from_rupees(88)));
        assert_eq!("88.5".parse::<Money>(), Ok(Money::from_paise(8850)));
        assert_eq!(" 0.05 ".parse::<Money>(), Ok(Money::from_paise(5)));
        assert_eq!(".5".parse::<Money>(), Ok(Money::from_paise(50)));
        assert_eq!("-3.25".parse::<Money>(), Ok(Money::from_paise(-325)));
        assert_eq!("₹12".parse::<Money>(), Ok(Money::from_rupees(12)));
        assert_eq!("Rs.12.10".parse::<Money>(), Ok(Money::from_paise(1210)));
    }

    #[test]
    fn test_parse_rounds_third_decimal() {
        assert_eq!("10.005".parse::<Money>(), Ok(Money::from_paise(1001)));
        assert_eq!("10.004".parse::<Money>(), Ok(Money::from_paise(1000)));
    }

    #[test]
    fn test_parse_float_fallback() {
        assert_eq!("1e3".parse::<Money>(), Ok(Money::from_rupees(1000)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "  ", "nan", "NaN", "inf", "-inf", "abc", "12.3.4", ".", "-"] {
            assert!(bad.parse::<Money>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_from_f64_rejects_non_finite() {
        assert_eq!(Money::from_f64_rupees(88.0), Some(Money::from_rupees(88)));
        assert_eq!(Money::from_f64_rupees(0.1 + 0.2), Some(Money::from_paise(30)));
        assert_eq!(Money::from_f64_rupees(f64::NAN), None);
        assert_eq!(Money::from_f64_rupees(f64::INFINITY), None);
    }

    #[test]
    fn test_percentage_and_discount() {
        let subtotal = Money::from_rupees(100);
        assert_eq!(subtotal.percentage(1000), Money::from_rupees(10));
        assert_eq!(subtotal.apply_percentage_discount(1000), Money::from_rupees(90));
        // 2.5% of ₹0.99 = 2.475 paise → 2
        assert_eq!(Money::from_paise(99).percentage(250).paise(), 2);
    }

    #[test]
    fn test_scale_bps() {
        assert_eq!(Money::from_paise(999).scale_bps(500), Money::from_paise(1049));
        assert_eq!(Money::from_rupees(50).scale_bps(0), Money::from_rupees(50));
        assert_eq!(Money::from_paise(i64::MAX).scale_bps(10_000), Money::from_paise(i64::MAX));
    }

    #[test]
    fn test_ceil_to_rupee() {
        assert_eq!(Money::from_paise(8800).ceil_to_rupee(), Money::from_rupees(88));
        assert_eq!(Money::from_paise(8801).ceil_to_rupee(), Money::from_rupees(89));
        assert_eq!(Money::from_paise(-199).ceil_to_rupee(), Money::from_rupees(-1));
        assert_eq!(Money::zero().ceil_to_rupee(), Money::zero());
    }

    #[test]
    fn test_rupees_serde_helper() {
        #[derive(Serialize, Deserialize)]
        struct Row {
            #[serde(with = "rupees")]
            total: Money,
        }

        let json = serde_json::to_string(&Row {
            total: Money::from_paise(12350),
        })
        .unwrap();
        assert_eq!(json, r#"{"total":123.5}"#);

        let row: Row = serde_json::from_str(r#"{"total":70}"#).unwrap();
        assert_eq!(row.total, Money::from_rupees(70));
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());
        assert!(Money::from_paise(-1).is_negative());
        assert_eq!(Money::from_paise(-1).abs(), Money::from_paise(1));
    }
}
