// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Numeric conversion between stored cells and native Rust numbers.
//!
//! Every typed accessor funnels through [`translate`], keyed by the
//! requested [`NumericRepr`]: integers are range-checked (floating values
//! truncate toward zero first), floats are checked against `f32` range.

use super::number::Number;
use crate::error::{Error, Result};
use crate::types::NumericSubtype;
use std::fmt;

/// Native representation requested by a typed accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericRepr {
    Short,
    UShort,
    Int,
    UInt,
    BigInt,
    BigUInt,
    Float,
    Double,
}

impl NumericRepr {
    fn integer_bounds(self) -> Option<(i128, i128)> {
        let bounds = match self {
            Self::Short => (i128::from(i16::MIN), i128::from(i16::MAX)),
            Self::UShort => (0, i128::from(u16::MAX)),
            Self::Int => (i128::from(i32::MIN), i128::from(i32::MAX)),
            Self::UInt => (0, i128::from(u32::MAX)),
            Self::BigInt => (i128::from(i64::MIN), i128::from(i64::MAX)),
            Self::BigUInt => (0, i128::from(u64::MAX)),
            Self::Float | Self::Double => return None,
        };
        Some(bounds)
    }

    fn is_signed(self) -> bool {
        matches!(self, Self::Short | Self::Int | Self::BigInt)
    }
}

impl fmt::Display for NumericRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Short => "short",
            Self::UShort => "unsigned short",
            Self::Int => "int",
            Self::UInt => "unsigned int",
            Self::BigInt => "big int",
            Self::BigUInt => "unsigned big int",
            Self::Float => "float",
            Self::Double => "double",
        })
    }
}

/// Widened numeric value in flight between a cell and a Rust number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericValue {
    Signed(i64),
    Unsigned(u64),
    Real(f64),
}

impl NumericValue {
    fn as_f64(self) -> f64 {
        match self {
            Self::Signed(v) => v as f64,
            Self::Unsigned(v) => v as f64,
            Self::Real(v) => v,
        }
    }

    fn as_i128(self) -> Result<i128> {
        match self {
            Self::Signed(v) => Ok(i128::from(v)),
            Self::Unsigned(v) => Ok(i128::from(v)),
            Self::Real(v) => {
                let t = v.trunc();
                if !t.is_finite() || t.abs() >= 1e38 {
                    Err(Error::Conversion(format!("{v} has no integer form")))
                } else {
                    Ok(t as i128)
                }
            }
        }
    }
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signed(v) => write!(f, "{v}"),
            Self::Unsigned(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
        }
    }
}

/// Convert `value` into the canonical form of `to`, checking range.
pub fn translate(value: NumericValue, to: NumericRepr) -> Result<NumericValue> {
    let Some((min, max)) = to.integer_bounds() else {
        let v = value.as_f64();
        if to == NumericRepr::Float && v.is_finite() && v.abs() > f64::from(f32::MAX) {
            return Err(Error::Conversion(format!("{value} does not fit in {to}")));
        }
        return Ok(NumericValue::Real(v));
    };

    let v = value.as_i128()?;
    if v < min || v > max {
        return Err(Error::Conversion(format!("{value} does not fit in {to}")));
    }
    Ok(if to.is_signed() {
        NumericValue::Signed(v as i64)
    } else {
        NumericValue::Unsigned(v as u64)
    })
}

/// Parse text into `to` (integers first, then floating point).
pub(crate) fn parse_numeric(text: &str, to: NumericRepr) -> Result<NumericValue> {
    let s = text.trim();
    let value = if let Ok(v) = s.parse::<i64>() {
        NumericValue::Signed(v)
    } else if let Ok(v) = s.parse::<u64>() {
        NumericValue::Unsigned(v)
    } else if let Ok(v) = s.parse::<f64>() {
        NumericValue::Real(v)
    } else {
        return Err(Error::Conversion(format!("'{text}' is not a number")));
    };
    translate(value, to)
}

/// Rust number types readable from and writable to numeric attributes.
pub trait Numeric: Copy + private::Sealed {
    const REPR: NumericRepr;

    /// Build from a value already translated to [`Self::REPR`].
    fn from_value(value: NumericValue) -> Self;
    fn to_value(self) -> NumericValue;
}

mod private {
    pub trait Sealed {}
}

macro_rules! impl_numeric {
    ($type:ty, $repr:ident, $variant:ident) => {
        impl private::Sealed for $type {}

        impl Numeric for $type {
            const REPR: NumericRepr = NumericRepr::$repr;

            fn from_value(value: NumericValue) -> Self {
                match value {
                    NumericValue::Signed(v) => v as $type,
                    NumericValue::Unsigned(v) => v as $type,
                    NumericValue::Real(v) => v as $type,
                }
            }

            fn to_value(self) -> NumericValue {
                NumericValue::$variant(self.into())
            }
        }
    };
}

impl_numeric!(i16, Short, Signed);
impl_numeric!(u16, UShort, Unsigned);
impl_numeric!(i32, Int, Signed);
impl_numeric!(u32, UInt, Unsigned);
impl_numeric!(i64, BigInt, Signed);
impl_numeric!(u64, BigUInt, Unsigned);
impl_numeric!(f32, Float, Real);
impl_numeric!(f64, Double, Real);

/// Encoded content of a numeric cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum NumericCell {
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    F64(f64),
    Number(Number),
}

/// Convert `value` into the cell format of `subtype`.
pub(crate) fn to_cell(subtype: NumericSubtype, value: NumericValue) -> Result<NumericCell> {
    let repr = match subtype {
        NumericSubtype::Short => NumericRepr::Short,
        NumericSubtype::UShort => NumericRepr::UShort,
        NumericSubtype::Int => NumericRepr::Int,
        NumericSubtype::UInt => NumericRepr::UInt,
        NumericSubtype::Float => NumericRepr::Float,
        NumericSubtype::Double => NumericRepr::Double,
        NumericSubtype::Number => return Ok(NumericCell::Number(Number::from_value(value)?)),
    };
    let value = translate(value, repr)?;
    Ok(match subtype {
        NumericSubtype::Short => NumericCell::I16(i16::from_value(value)),
        NumericSubtype::UShort => NumericCell::U16(u16::from_value(value)),
        NumericSubtype::Int => NumericCell::I32(i32::from_value(value)),
        NumericSubtype::UInt => NumericCell::U32(u32::from_value(value)),
        NumericSubtype::Float | NumericSubtype::Double | NumericSubtype::Number => {
            NumericCell::F64(f64::from_value(value))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_ranges() {
        use NumericValue::*;
        assert_eq!(translate(Signed(-5), NumericRepr::Short).unwrap(), Signed(-5));
        assert!(translate(Signed(40_000), NumericRepr::Short).is_err());
        assert!(translate(Signed(-1), NumericRepr::UInt).is_err());
        assert_eq!(
            translate(Unsigned(u64::MAX), NumericRepr::BigUInt).unwrap(),
            Unsigned(u64::MAX)
        );
        assert!(translate(Unsigned(u64::MAX), NumericRepr::BigInt).is_err());
        assert_eq!(translate(Real(-7.9), NumericRepr::Int).unwrap(), Signed(-7));
        assert!(translate(Real(f64::NAN), NumericRepr::Int).is_err());
        assert_eq!(translate(Signed(3), NumericRepr::Double).unwrap(), Real(3.0));
        assert!(translate(Real(1e300), NumericRepr::Float).is_err());
        assert!(translate(Real(1e300), NumericRepr::Double).is_ok());
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!(
            parse_numeric(" 42 ", NumericRepr::Int).unwrap(),
            NumericValue::Signed(42)
        );
        assert_eq!(
            parse_numeric("18446744073709551615", NumericRepr::BigUInt).unwrap(),
            NumericValue::Unsigned(u64::MAX)
        );
        assert_eq!(
            parse_numeric("2.5", NumericRepr::Double).unwrap(),
            NumericValue::Real(2.5)
        );
        assert_eq!(
            parse_numeric("2.5", NumericRepr::Short).unwrap(),
            NumericValue::Signed(2)
        );
        assert!(parse_numeric("twelve", NumericRepr::Int).is_err());
    }

    #[test]
    fn test_to_cell() {
        assert_eq!(
            to_cell(NumericSubtype::UShort, NumericValue::Signed(65535)).unwrap(),
            NumericCell::U16(65535)
        );
        assert!(to_cell(NumericSubtype::UShort, NumericValue::Signed(65536)).is_err());
        assert_eq!(
            to_cell(NumericSubtype::Float, NumericValue::Real(1.5)).unwrap(),
            NumericCell::F64(1.5)
        );
        assert_eq!(
            to_cell(NumericSubtype::Number, NumericValue::Signed(12)).unwrap(),
            NumericCell::Number(Number::from_i64(12))
        );
    }

    #[test]
    fn test_numeric_trait_round() {
        assert_eq!(<u16 as Numeric>::REPR, NumericRepr::UShort);
        assert_eq!(7i16.to_value(), NumericValue::Signed(7));
        assert_eq!(1.5f32.to_value(), NumericValue::Real(1.5));
        assert_eq!(i64::from_value(NumericValue::Unsigned(9)), 9);
    }
}
