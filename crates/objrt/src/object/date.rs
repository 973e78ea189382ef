// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Date cells: native `i16` year, then month, day, hour, minute and second
//! bytes, then one pad byte.

use crate::config::DATE_SIZE;
use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

pub(crate) fn encode(value: &NaiveDateTime) -> Result<[u8; DATE_SIZE]> {
    let year = i16::try_from(value.year())
        .map_err(|_| Error::Conversion(format!("year {} does not fit a date cell", value.year())))?;

    let mut cell = [0u8; DATE_SIZE];
    cell[..2].copy_from_slice(&year.to_ne_bytes());
    cell[2] = value.month() as u8;
    cell[3] = value.day() as u8;
    cell[4] = value.hour() as u8;
    cell[5] = value.minute() as u8;
    cell[6] = value.second() as u8;
    Ok(cell)
}

pub(crate) fn decode(cell: &[u8]) -> Result<NaiveDateTime> {
    if cell.len() < DATE_SIZE {
        return Err(Error::Conversion(format!(
            "date cell needs {DATE_SIZE} bytes, got {}",
            cell.len()
        )));
    }
    let year = i16::from_ne_bytes([cell[0], cell[1]]);
    NaiveDate::from_ymd_opt(i32::from(year), u32::from(cell[2]), u32::from(cell[3]))
        .and_then(|d| {
            d.and_hms_opt(
                u32::from(cell[4]),
                u32::from(cell[5]),
                u32::from(cell[6]),
            )
        })
        .ok_or_else(|| Error::Conversion(format!("invalid date cell {:02x?}", &cell[..DATE_SIZE])))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_layout() {
        let dt = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(23, 59, 1)
            .unwrap();
        let cell = encode(&dt).unwrap();
        assert_eq!(i16::from_ne_bytes([cell[0], cell[1]]), 2024);
        assert_eq!(&cell[2..], &[2, 29, 23, 59, 1, 0]);
        assert_eq!(decode(&cell).unwrap(), dt);
    }

    #[test]
    fn test_out_of_range_year() {
        let dt = NaiveDate::from_ymd_opt(40_000, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(encode(&dt).is_err());
    }

    #[test]
    fn test_invalid_cell() {
        let mut cell = [0u8; DATE_SIZE];
        cell[..2].copy_from_slice(&2023i16.to_ne_bytes());
        cell[2] = 2;
        cell[3] = 30;
        assert!(decode(&cell).is_err());
        assert!(decode(&cell[..4]).is_err());
    }
}
