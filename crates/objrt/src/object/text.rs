// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Text rendering of instances and attributes.

use super::date;
use super::number::Number;
use super::storage::{HeapCell, ObjectStorage};
use super::Object;
use crate::config::{DATE_SIZE, NUMBER_SIZE};
use crate::error::{Error, Result};
use crate::types::{DataKind, KindTag, NumericSubtype};
use std::borrow::Borrow;
use std::fmt::Write;

impl<S: Borrow<ObjectStorage>> Object<S> {
    /// Render the instance as `TYPE(v1, 'text', NULL, NESTED(..))`.
    ///
    /// Text, date, raw and opaque values are single-quoted; numbers,
    /// booleans and nested instances are not.
    pub fn to_text(&self) -> Result<String> {
        let mut out = String::new();
        self.write_text(&mut out)?;
        Ok(out)
    }

    fn write_text(&self, out: &mut String) -> Result<()> {
        out.push_str(self.desc.name());
        out.push('(');
        for (index, field) in self.desc.fields().iter().enumerate() {
            if index > 0 {
                out.push_str(", ");
            }
            if self.null_at(index)? {
                out.push_str("NULL");
                continue;
            }
            match field.tag() {
                KindTag::Object => self.nested_view(index)?.write_text(out)?,
                KindTag::Boolean | KindTag::Numeric | KindTag::Text | KindTag::DateTime
                | KindTag::Raw => match self.field_text(index)? {
                    None => out.push_str("NULL"),
                    Some(text) if quoted(field.tag()) => quote(out, &text),
                    Some(text) => out.push_str(&text),
                },
                tag => {
                    let offset = self.attribute_address(index)?.offset;
                    let raw = self.storage().cells().read_usize(offset)?;
                    quote(out, &format!("{tag}#{raw}"));
                }
            }
        }
        out.push(')');
        Ok(())
    }

    /// Text form of a non-null attribute; `None` when a text or raw cell
    /// has no payload.
    pub(super) fn field_text(&self, index: usize) -> Result<Option<String>> {
        let field = self.field(index)?;
        let offset = self.attribute_address(index)?.offset;
        let cells = self.storage().cells();
        match field.kind() {
            DataKind::Boolean => {
                let flag = cells.read_i32(offset)? != 0;
                Ok(Some(if flag { "TRUE" } else { "FALSE" }.to_string()))
            }
            DataKind::Numeric(NumericSubtype::Number) => {
                Ok(Some(Number::from_slice(cells.bytes(offset, NUMBER_SIZE)?)?.to_string()))
            }
            DataKind::Numeric(subtype) => Ok(Some(self.read_numeric(index, *subtype)?.to_string())),
            DataKind::DateTime => {
                let when = date::decode(cells.bytes(offset, DATE_SIZE)?)?;
                let mut text = String::new();
                write!(text, "{}", when.format(&self.storage().date_format)).map_err(|_| {
                    Error::Conversion(format!(
                        "invalid date format '{}'",
                        self.storage().date_format
                    ))
                })?;
                Ok(Some(text))
            }
            DataKind::Text => match self.heap_cell(index)? {
                Some(HeapCell::Text(text)) => Ok(Some(text.clone())),
                _ => Ok(None),
            },
            DataKind::Raw => match self.heap_cell(index)? {
                Some(HeapCell::Raw(bytes)) => Ok(Some(hex(bytes))),
                _ => Ok(None),
            },
            DataKind::Object(_) => self.nested_view(index)?.to_text().map(Some),
            _ => Err(Error::mismatch(
                format!("attribute {}", self.qualify(field.name())),
                "text-convertible attribute",
                field.tag(),
            )),
        }
    }
}

fn quoted(tag: KindTag) -> bool {
    matches!(tag, KindTag::Text | KindTag::DateTime | KindTag::Raw)
}

fn quote(out: &mut String, text: &str) {
    out.push('\'');
    out.push_str(&text.replace('\'', "''"));
    out.push('\'');
}

fn hex(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(text, "{byte:02X}");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_doubles_apostrophes() {
        let mut out = String::new();
        quote(&mut out, "O'Brien");
        assert_eq!(out, "'O''Brien'");
    }

    #[test]
    fn test_hex_is_uppercase() {
        assert_eq!(hex(&[0x00, 0xab, 0x10]), "00AB10");
        assert_eq!(hex(&[]), "");
    }
}
