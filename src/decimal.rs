//! Exact decimal numbers for evaluation and result formatting.
//!
//! A [`Decimal`] is an arbitrary-precision rational number. Literals, scope
//! values, and the four arithmetic operators stay exact, so `0.1 + 0.2` is
//! `0.3` and `1 / 3 * 3` is `1`. Values that come back from transcendental
//! functions are converted from `f64` through their shortest round-trip
//! decimal, which keeps binary artifacts such as `4.000000000000001` out of
//! the results of simple expressions.
//!
//! Rendering never uses scientific notation. Values with a terminating
//! decimal expansion print every digit; other values are rounded half to even
//! to a number of significant digits.

use core::cmp::Ordering;
use core::fmt;
use core::ops::{Add, Mul, Neg, Sub};
use core::str::FromStr;

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Significant digits used when a value has no terminating expansion.
///
/// Matches the 34 digits of IEEE 754 decimal128.
pub const DEFAULT_PRECISION: usize = 34;

// Bounds the size of literals such as `1e999999999`.
const MAX_EXPONENT: i64 = 10_000;

/// Error returned when text is not a valid decimal number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDecimalError {
    input: String,
}

impl ParseDecimalError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }
}

impl fmt::Display for ParseDecimalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid decimal number '{}'", self.input)
    }
}

impl std::error::Error for ParseDecimalError {}

/// An exact rational number with decimal rendering.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal(BigRational);

fn ten_pow(exp: u32) -> BigInt {
    BigInt::from(10u32).pow(exp)
}

fn digit_count(value: &BigInt) -> usize {
    if value.is_zero() {
        1
    } else {
        value.magnitude().to_string().len()
    }
}

/// Writes `mantissa / 10^scale` in plain notation without trailing zeros.
fn format_scaled(mantissa: &BigInt, scale: u32) -> String {
    let digits = mantissa.magnitude().to_string();
    let mut text = if scale == 0 {
        digits
    } else {
        let scale = scale as usize;
        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.is_empty() {
            int_part.to_string()
        } else {
            format!("{int_part}.{frac_part}")
        }
    };
    if mantissa.is_negative() && text.bytes().any(|b| b != b'0' && b != b'.') {
        text.insert(0, '-');
    }
    text
}

impl Decimal {
    pub fn zero() -> Self {
        Decimal(BigRational::zero())
    }

    pub fn one() -> Self {
        Decimal(BigRational::one())
    }

    /// Builds `mantissa / 10^scale`.
    pub fn from_parts(mantissa: BigInt, scale: u32) -> Self {
        Decimal(BigRational::new(mantissa, ten_pow(scale)))
    }

    pub fn from_ratio(ratio: BigRational) -> Self {
        Decimal(ratio)
    }

    /// Converts a float through its shortest round-trip decimal form.
    ///
    /// Returns `None` for NaN and infinities.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        format!("{value}").parse().ok()
    }

    /// Same as [`Decimal::from_f64`] but uses the shortest `f32` form, so
    /// `0.1f32` becomes exactly `0.1`.
    pub fn from_f32(value: f32) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        format!("{value}").parse().ok()
    }

    pub fn as_ratio(&self) -> &BigRational {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn is_integer(&self) -> bool {
        self.0.is_integer()
    }

    pub fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    pub fn signum(&self) -> Self {
        Decimal(self.0.signum())
    }

    pub fn floor(&self) -> Self {
        Decimal(self.0.floor())
    }

    pub fn ceil(&self) -> Self {
        Decimal(self.0.ceil())
    }

    /// Rounds half away from zero to `digits` places after the point.
    /// Negative `digits` round to tens, hundreds, and so on.
    pub fn round_to(&self, digits: i32) -> Self {
        let factor = BigRational::from_integer(ten_pow(digits.unsigned_abs()));
        if digits >= 0 {
            Decimal((&self.0 * &factor).round() / factor)
        } else {
            Decimal((&self.0 / &factor).round() * factor)
        }
    }

    /// The value as an `i64` when it is an integer in range.
    pub fn to_i64(&self) -> Option<i64> {
        if self.is_integer() {
            self.0.to_integer().to_i64()
        } else {
            None
        }
    }

    /// Nearest `f64`, used to hand values to transcendental functions.
    pub fn to_f64(&self) -> f64 {
        self.to_plain_string_with_precision(20)
            .parse()
            .unwrap_or(f64::NAN)
    }

    /// Exact quotient, or `None` when `divisor` is zero.
    pub fn checked_div(&self, divisor: &Decimal) -> Option<Self> {
        if divisor.is_zero() {
            None
        } else {
            Some(Decimal(&self.0 / &divisor.0))
        }
    }

    /// Floored modulo, `x - y * floor(x / y)`; `None` when `divisor` is zero.
    pub fn checked_mod(&self, divisor: &Decimal) -> Option<Self> {
        let quotient = self.checked_div(divisor)?.floor();
        Some(self - &(divisor * &quotient))
    }

    /// Exact integer power; `None` for zero raised to a negative power.
    pub fn powi(&self, exp: i64) -> Option<Self> {
        if exp == 0 {
            return Some(Decimal::one());
        }
        if self.is_zero() {
            return if exp > 0 { Some(Decimal::zero()) } else { None };
        }
        let magnitude = u32::try_from(exp.unsigned_abs()).ok()?;
        let numer = self.0.numer().pow(magnitude);
        let denom = self.0.denom().pow(magnitude);
        let ratio = if exp > 0 {
            BigRational::new(numer, denom)
        } else {
            BigRational::new(denom, numer)
        };
        Some(Decimal(ratio))
    }

    /// Number of decimal places needed to write the value exactly, or `None`
    /// when the expansion does not terminate.
    fn terminating_scale(&self) -> Option<u32> {
        let five = BigInt::from(5u32);
        let mut denom = self.0.denom().clone();
        let mut twos = 0u32;
        let mut fives = 0u32;
        while denom.is_even() {
            denom >>= 1u32;
            twos += 1;
        }
        loop {
            let (quotient, remainder) = denom.div_rem(&five);
            if !remainder.is_zero() {
                break;
            }
            denom = quotient;
            fives += 1;
        }
        if denom.is_one() {
            Some(twos.max(fives))
        } else {
            None
        }
    }

    /// Canonical plain-text form with [`DEFAULT_PRECISION`] significant
    /// digits for non-terminating values.
    pub fn to_plain_string(&self) -> String {
        self.to_plain_string_with_precision(DEFAULT_PRECISION)
    }

    /// Plain-text form. Terminating values are always written exactly;
    /// `precision` only applies to values such as `1/3`.
    pub fn to_plain_string_with_precision(&self, precision: usize) -> String {
        if let Some(scale) = self.terminating_scale() {
            let mantissa = (&self.0 * BigRational::from_integer(ten_pow(scale))).to_integer();
            return format_scaled(&mantissa, scale);
        }

        let precision = precision.max(1) as i64;
        let magnitude = self.0.abs();
        let int_part = magnitude.to_integer();
        let scale = if int_part.is_zero() {
            // Leading zeros after the point: the first significant digit sits
            // at 10^-k with k derived from the digit counts of the fraction.
            let numer = magnitude.numer();
            let denom = magnitude.denom();
            let mut k = digit_count(denom) as i64 - digit_count(numer) as i64;
            let probe = numer * ten_pow(k as u32);
            if probe < *denom {
                k += 1;
            }
            precision - 1 + k
        } else {
            precision - digit_count(&int_part) as i64
        };
        let scale = scale.max(0) as u32;

        let scaled_numer = magnitude.numer() * ten_pow(scale);
        let (mut quotient, remainder) = scaled_numer.div_rem(magnitude.denom());
        let twice = remainder << 1u32;
        match twice.cmp(magnitude.denom()) {
            Ordering::Greater => quotient += 1u32,
            Ordering::Equal if quotient.is_odd() => quotient += 1u32,
            _ => {}
        }
        if self.is_negative() {
            quotient = -quotient;
        }
        format_scaled(&quotient, scale)
    }

    /// Lossless text form: plain notation when the expansion terminates,
    /// `numerator/denominator` otherwise. Parses back with [`FromStr`].
    pub fn to_exact_string(&self) -> String {
        if self.terminating_scale().is_some() {
            self.to_plain_string()
        } else {
            format!("{}/{}", self.0.numer(), self.0.denom())
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_plain_string())
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    /// Accepts `[+-]digits[.digits][e[+-]digits]`, `.5`-style leading-dot
    /// numbers, and `numerator/denominator`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let err = || ParseDecimalError::new(s);

        if let Some((numer, denom)) = text.split_once('/') {
            let numer: BigInt = numer.trim().parse().map_err(|_| err())?;
            let denom: BigInt = denom.trim().parse().map_err(|_| err())?;
            if denom.is_zero() {
                return Err(err());
            }
            return Ok(Decimal(BigRational::new(numer, denom)));
        }

        let (negative, body) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let (mantissa, exponent) = match body.find(['e', 'E']) {
            Some(idx) => {
                let exponent: i64 = body[idx + 1..].parse().map_err(|_| err())?;
                (&body[..idx], exponent)
            }
            None => (body, 0),
        };
        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        if exponent.abs() > MAX_EXPONENT {
            return Err(err());
        }

        let digits = format!("{int_part}{frac_part}");
        let mut value = BigInt::parse_bytes(digits.as_bytes(), 10).ok_or_else(err)?;
        if negative {
            value = -value;
        }
        let shift = exponent - frac_part.len() as i64;
        let ratio = if shift >= 0 {
            BigRational::from_integer(value * ten_pow(shift as u32))
        } else {
            BigRational::new(value, ten_pow((-shift) as u32))
        };
        Ok(Decimal(ratio))
    }
}

impl From<i32> for Decimal {
    fn from(value: i32) -> Self {
        Decimal(BigRational::from_integer(BigInt::from(value)))
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal(BigRational::from_integer(BigInt::from(value)))
    }
}

impl From<u32> for Decimal {
    fn from(value: u32) -> Self {
        Decimal(BigRational::from_integer(BigInt::from(value)))
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Decimal(BigRational::from_integer(BigInt::from(value)))
    }
}

impl From<BigInt> for Decimal {
    fn from(value: BigInt) -> Self {
        Decimal(BigRational::from_integer(value))
    }
}

impl TryFrom<f64> for Decimal {
    type Error = ParseDecimalError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Decimal::from_f64(value).ok_or_else(|| ParseDecimalError::new(&value.to_string()))
    }
}

impl TryFrom<f32> for Decimal {
    type Error = ParseDecimalError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Decimal::from_f32(value).ok_or_else(|| ParseDecimalError::new(&value.to_string()))
    }
}

macro_rules! forward_binop {
    ($trait:ident, $method:ident) => {
        impl<'a> $trait<&'a Decimal> for &'a Decimal {
            type Output = Decimal;

            fn $method(self, rhs: &'a Decimal) -> Decimal {
                Decimal((&self.0).$method(&rhs.0))
            }
        }

        impl $trait for Decimal {
            type Output = Decimal;

            fn $method(self, rhs: Decimal) -> Decimal {
                Decimal(self.0.$method(rhs.0))
            }
        }
    };
}

forward_binop!(Add, add);
forward_binop!(Sub, sub);
forward_binop!(Mul, mul);

impl Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}

impl Neg for &Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(-&self.0)
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_exact_string())
    }
}

struct DecimalVisitor;

impl Visitor<'_> for DecimalVisitor {
    type Value = Decimal;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal number or a decimal string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
        Decimal::try_from(v).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DecimalVisitor)
    }
}
