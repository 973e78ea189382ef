// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Library-native 22-byte decimal number.
//!
//! Cell layout (compatible with the database's on-wire NUMBER):
//!
//! | byte | content |
//! |------|---------|
//! | 0 | count of bytes that follow (exponent + mantissa) |
//! | 1 | exponent: `193 + e` when positive, `62 - e` when negative |
//! | 2.. | up to 20 base-100 digits: `d + 1` positive, `101 - d` negative |
//!
//! Negative numbers shorter than 20 digits end with a `102` terminator.
//! Zero is the two bytes `[1, 0x80]`. Mantissas longer than 20 digits are
//! truncated.

use super::numeric::NumericValue;
use crate::config::{NUMBER_MAX_MANTISSA, NUMBER_SIZE};
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

const ZERO_EXPONENT: u8 = 0x80;
const POSITIVE_BIAS: i32 = 193;
const NEGATIVE_BIAS: i32 = 62;
const NEGATIVE_TERMINATOR: u8 = 102;
/// Decimal exponents beyond this are rejected while parsing; NUMBER cells
/// span roughly 1e-130 to 1e126.
const MAX_DECIMAL_EXPONENT: u32 = 300;

/// Decimal value `0.d1d2d3... * 10^exp`. Digits carry no leading or
/// trailing zeros; an empty digit list is zero.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Decimal {
    negative: bool,
    digits: Vec<u8>,
    exp: i32,
}

impl Decimal {
    fn zero() -> Self {
        Self {
            negative: false,
            digits: Vec::new(),
            exp: 0,
        }
    }

    fn normalized(negative: bool, mut digits: Vec<u8>, exp: i32) -> Self {
        let leading = digits.iter().take_while(|&&d| d == 0).count();
        digits.drain(..leading);
        let exp = exp.saturating_sub(i32::try_from(leading).unwrap_or(i32::MAX));
        while digits.last() == Some(&0) {
            digits.pop();
        }
        if digits.is_empty() {
            return Self::zero();
        }
        Self {
            negative,
            digits,
            exp,
        }
    }

    fn from_u128(negative: bool, magnitude: u128) -> Self {
        let digits: Vec<u8> = magnitude.to_string().bytes().map(|b| b - b'0').collect();
        let exp = digits.len() as i32;
        Self::normalized(negative, digits, exp)
    }

    fn parse(text: &str) -> Result<Self> {
        let invalid = || Error::Conversion(format!("'{text}' is not a number"));
        let s = text.trim();
        let (negative, s) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (mantissa, exponent) = match s.find(|c: char| c == 'e' || c == 'E') {
            Some(pos) => (&s[..pos], Some(&s[pos + 1..])),
            None => (s, None),
        };
        let (int_part, frac_part) = match mantissa.find('.') {
            Some(pos) => (&mantissa[..pos], &mantissa[pos + 1..]),
            None => (mantissa, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }

        let mut digits = Vec::with_capacity(int_part.len() + frac_part.len());
        for b in int_part.bytes().chain(frac_part.bytes()) {
            if !b.is_ascii_digit() {
                return Err(invalid());
            }
            digits.push(b - b'0');
        }
        let shift = match exponent {
            Some(e) => e.parse::<i32>().map_err(|_| invalid())?,
            None => 0,
        };
        let out_of_range = || Error::Conversion(format!("'{text}' is outside the number range"));
        let exp = i32::try_from(int_part.len())
            .ok()
            .and_then(|len| len.checked_add(shift))
            .ok_or_else(out_of_range)?;
        let nonzero = digits.iter().any(|&d| d != 0);
        if nonzero && exp.unsigned_abs() > MAX_DECIMAL_EXPONENT {
            return Err(out_of_range());
        }
        let decimal = Self::normalized(negative, digits, exp);
        if decimal.exp.unsigned_abs() > MAX_DECIMAL_EXPONENT {
            return Err(out_of_range());
        }
        Ok(decimal)
    }

    fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    fn is_integral(&self) -> bool {
        self.exp >= self.digits.len() as i32
    }

    /// Integer part, truncated toward zero.
    fn to_i128(&self) -> Result<i128> {
        if self.is_zero() || self.exp <= 0 {
            return Ok(0);
        }
        let overflow = || Error::Conversion(format!("{self} overflows a 128-bit integer"));
        if self.exp > 39 {
            return Err(overflow());
        }
        let mut value: i128 = 0;
        for i in 0..self.exp as usize {
            let digit = self.digits.get(i).copied().unwrap_or(0);
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(i128::from(digit)))
                .ok_or_else(overflow)?;
        }
        Ok(if self.negative { -value } else { value })
    }

    fn to_f64(&self) -> Result<f64> {
        if self.is_zero() {
            return Ok(0.0);
        }
        let digits: String = self.digits.iter().map(|d| char::from(b'0' + d)).collect();
        let sign = if self.negative { "-" } else { "" };
        format!("{sign}0.{digits}e{}", self.exp)
            .parse::<f64>()
            .map_err(|e| Error::Conversion(format!("{self}: {e}")))
    }

    fn encode(&self) -> Result<[u8; NUMBER_SIZE]> {
        let mut cell = [0u8; NUMBER_SIZE];
        if self.is_zero() {
            cell[0] = 1;
            cell[1] = ZERO_EXPONENT;
            return Ok(cell);
        }

        let mut digits = self.digits.clone();
        let mut exp = self.exp;
        if exp.rem_euclid(2) != 0 {
            digits.insert(0, 0);
            exp = exp.checked_add(1).ok_or_else(|| {
                Error::Conversion(format!("{self} is outside the number range"))
            })?;
        }
        if digits.len() % 2 != 0 {
            digits.push(0);
        }
        let mut pairs: Vec<u8> = digits.chunks(2).map(|p| p[0] * 10 + p[1]).collect();
        pairs.truncate(NUMBER_MAX_MANTISSA);
        while pairs.last() == Some(&0) {
            pairs.pop();
        }

        let e100 = exp / 2 - 1;
        let exponent = if self.negative {
            NEGATIVE_BIAS - e100
        } else {
            POSITIVE_BIAS + e100
        };
        let range = if self.negative { 0..=127 } else { 128..=255 };
        if !range.contains(&exponent) {
            return Err(Error::Conversion(format!(
                "{self} is outside the number range"
            )));
        }

        cell[1] = exponent as u8;
        let mut len = 1;
        for pair in &pairs {
            len += 1;
            cell[len] = if self.negative { 101 - pair } else { pair + 1 };
        }
        if self.negative && pairs.len() < NUMBER_MAX_MANTISSA {
            len += 1;
            cell[len] = NEGATIVE_TERMINATOR;
        }
        cell[0] = len as u8;
        Ok(cell)
    }

    fn decode(cell: &[u8; NUMBER_SIZE]) -> Result<Self> {
        let invalid = || Error::Conversion(format!("malformed number cell {:02x?}", cell));
        let len = usize::from(cell[0]);
        if len == 0 || len > NUMBER_SIZE - 1 {
            return Err(invalid());
        }
        let exponent = cell[1];
        if len == 1 {
            return if exponent == ZERO_EXPONENT {
                Ok(Self::zero())
            } else {
                Err(invalid())
            };
        }

        let positive = exponent & 0x80 != 0;
        let mut mantissa = &cell[2..=len];
        if !positive && mantissa.last() == Some(&NEGATIVE_TERMINATOR) {
            mantissa = &mantissa[..mantissa.len() - 1];
        }

        let mut digits = Vec::with_capacity(mantissa.len() * 2);
        for &byte in mantissa {
            let pair = if positive {
                i32::from(byte) - 1
            } else {
                101 - i32::from(byte)
            };
            if !(0..=99).contains(&pair) {
                return Err(invalid());
            }
            digits.push((pair / 10) as u8);
            digits.push((pair % 10) as u8);
        }

        let e100 = if positive {
            i32::from(exponent) - POSITIVE_BIAS
        } else {
            NEGATIVE_BIAS - i32::from(exponent)
        };
        Ok(Self::normalized(!positive, digits, 2 * (e100 + 1)))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        if self.negative {
            f.write_str("-")?;
        }
        let digits: String = self.digits.iter().map(|d| char::from(b'0' + d)).collect();
        let n = digits.len() as i32;
        if self.exp <= 0 {
            write!(f, "0.{}{}", "0".repeat((-self.exp) as usize), digits)
        } else if self.exp >= n {
            write!(f, "{}{}", digits, "0".repeat((self.exp - n) as usize))
        } else {
            let (int, frac) = digits.split_at(self.exp as usize);
            write!(f, "{int}.{frac}")
        }
    }
}

/// Library-native number, stored exactly as its 22-byte cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Number([u8; NUMBER_SIZE]);

impl Number {
    pub fn zero() -> Self {
        let mut cell = [0u8; NUMBER_SIZE];
        cell[0] = 1;
        cell[1] = ZERO_EXPONENT;
        Self(cell)
    }

    /// Wrap a cell, validating its encoding.
    pub fn from_bytes(cell: [u8; NUMBER_SIZE]) -> Result<Self> {
        Decimal::decode(&cell)?;
        Ok(Self(cell))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let cell: [u8; NUMBER_SIZE] = bytes.try_into().map_err(|_| {
            Error::Conversion(format!(
                "number cell must be {NUMBER_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Self::from_bytes(cell)
    }

    pub fn as_bytes(&self) -> &[u8; NUMBER_SIZE] {
        &self.0
    }

    pub fn from_i64(value: i64) -> Self {
        Self::from_decimal(&Decimal::from_u128(
            value < 0,
            u128::from(value.unsigned_abs()),
        ))
    }

    pub fn from_u64(value: u64) -> Self {
        Self::from_decimal(&Decimal::from_u128(false, u128::from(value)))
    }

    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(Error::Conversion(format!("{value} has no number form")));
        }
        let decimal = Decimal::parse(&format!("{value:e}"))?;
        Ok(Self(decimal.encode()?))
    }

    pub fn is_zero(&self) -> bool {
        self.0[0] == 1 && self.0[1] == ZERO_EXPONENT
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0[1] & 0x80 == 0
    }

    /// Integer part, truncated toward zero.
    pub fn to_i128(&self) -> Result<i128> {
        self.decimal()?.to_i128()
    }

    pub fn to_f64(&self) -> Result<f64> {
        self.decimal()?.to_f64()
    }

    /// Narrowest exact native form: integral values that fit 64 bits stay
    /// integers, everything else becomes a double.
    pub(crate) fn to_value(&self) -> Result<NumericValue> {
        let decimal = self.decimal()?;
        if decimal.is_integral() && decimal.exp <= 39 {
            let v = decimal.to_i128()?;
            if let Ok(signed) = i64::try_from(v) {
                return Ok(NumericValue::Signed(signed));
            }
            if let Ok(unsigned) = u64::try_from(v) {
                return Ok(NumericValue::Unsigned(unsigned));
            }
        }
        Ok(NumericValue::Real(decimal.to_f64()?))
    }

    pub(crate) fn from_value(value: NumericValue) -> Result<Self> {
        match value {
            NumericValue::Signed(v) => Ok(Self::from_i64(v)),
            NumericValue::Unsigned(v) => Ok(Self::from_u64(v)),
            NumericValue::Real(v) => Self::from_f64(v),
        }
    }

    fn decimal(&self) -> Result<Decimal> {
        Decimal::decode(&self.0)
    }

    fn from_decimal(decimal: &Decimal) -> Self {
        // Integers up to 39 digits always fit the exponent range.
        match decimal.encode() {
            Ok(cell) => Self(cell),
            Err(_) => Self::zero(),
        }
    }
}

impl Default for Number {
    fn default() -> Self {
        Self::zero()
    }
}

impl FromStr for Number {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self(Decimal::parse(s)?.encode()?))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decimal() {
            Ok(decimal) => fmt::Display::fmt(&decimal, f),
            Err(_) => f.write_str("<invalid number>"),
        }
    }
}

impl fmt::Debug for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Number({self})")
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Self::from_i64(value)
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_prefix(n: &Number) -> Vec<u8> {
        let len = usize::from(n.as_bytes()[0]);
        n.as_bytes()[..=len].to_vec()
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(cell_prefix(&Number::zero()), vec![1, 0x80]);
        assert_eq!(cell_prefix(&Number::from_i64(1)), vec![2, 0xC1, 2]);
        assert_eq!(cell_prefix(&Number::from_i64(100)), vec![2, 0xC2, 2]);
        assert_eq!(cell_prefix(&Number::from_i64(123)), vec![3, 0xC2, 2, 24]);
        assert_eq!(cell_prefix(&Number::from_i64(-1)), vec![3, 0x3E, 100, 102]);
        assert_eq!(cell_prefix(&"0.5".parse().unwrap()), vec![2, 0xC0, 51]);
        assert_eq!(
            cell_prefix(&"-12.5".parse().unwrap()),
            vec![4, 0x3E, 89, 51, 102]
        );
    }

    #[test]
    fn test_integer_extremes() {
        for v in [i64::MIN, i64::MAX, 0, -99, 1_000_000, 987_654_321] {
            assert_eq!(Number::from_i64(v).to_i128().unwrap(), i128::from(v));
        }
        assert_eq!(
            Number::from_u64(u64::MAX).to_i128().unwrap(),
            i128::from(u64::MAX)
        );
    }

    #[test]
    fn test_value_classification() {
        assert_eq!(
            Number::from_i64(-42).to_value().unwrap(),
            NumericValue::Signed(-42)
        );
        assert_eq!(
            Number::from_u64(u64::MAX).to_value().unwrap(),
            NumericValue::Unsigned(u64::MAX)
        );
        assert_eq!(
            Number::from_f64(2.25).unwrap().to_value().unwrap(),
            NumericValue::Real(2.25)
        );
    }

    #[test]
    fn test_display_and_parse() {
        for text in ["0", "1", "-1", "123.45", "0.001", "-0.5", "1000", "98765432109876543210"] {
            let n: Number = text.parse().unwrap();
            assert_eq!(n.to_string(), text);
        }
        let n: Number = "1.5E+3".parse().unwrap();
        assert_eq!(n.to_string(), "1500");
        let n: Number = "  +007.50 ".parse().unwrap();
        assert_eq!(n.to_string(), "7.5");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for text in ["", "abc", "1.2.3", "--1", "1e", "."] {
            assert!(text.parse::<Number>().is_err(), "{text}");
        }
    }

    #[test]
    fn test_extreme_exponents_are_conversion_errors() {
        for text in [
            "0.05e-2147483648",
            "5e2147483646",
            "5e2147483647",
            "1e-2147483648",
            "1e400",
            "0.0001e-298",
        ] {
            assert!(
                matches!(text.parse::<Number>(), Err(Error::Conversion(_))),
                "{text}"
            );
        }
        assert!("0e999999".parse::<Number>().unwrap().is_zero());
        assert!("1e300".parse::<Number>().is_err());
        assert_eq!("1e125".parse::<Number>().unwrap().to_f64().unwrap(), 1e125);
    }

    #[test]
    fn test_float_conversions() {
        let n = Number::from_f64(-3.75).unwrap();
        assert!(n.is_negative());
        assert_eq!(n.to_f64().unwrap(), -3.75);
        assert_eq!(n.to_i128().unwrap(), -3);
        assert!(Number::from_f64(f64::NAN).is_err());
        assert!(Number::from_f64(f64::INFINITY).is_err());
        assert!(Number::from_f64(1e300).is_err());
    }

    #[test]
    fn test_malformed_cells() {
        assert!(Number::from_bytes([0u8; NUMBER_SIZE]).is_err());
        let mut cell = [0u8; NUMBER_SIZE];
        cell[0] = 2;
        cell[1] = 0xC1;
        cell[2] = 0; // digit byte below range
        assert!(Number::from_bytes(cell).is_err());
        assert!(Number::from_slice(&[1, 0x80]).is_err());
    }
}
