//! Workbook reading through calamine.
//!
//! Any container calamine can open (xlsx, xlsm, xlsb, xls, ods) is converted
//! into an in-memory [`Workbook`] once, so detection never touches the file
//! format again.

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{Data, Reader, Sheets, open_workbook_auto, open_workbook_auto_from_rs};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};

use super::{CellValue, Sheet, UnreadableSheet, Workbook};

/// Reads a workbook from raw file bytes.
///
/// The container format is sniffed from the content. A container that cannot
/// be opened at all is the only hard failure; individual sheets that fail to
/// decode are listed in [`Workbook::unreadable`].
pub fn read_workbook_bytes(bytes: &[u8]) -> EngineResult<Workbook> {
    if bytes.is_empty() {
        return Err(EngineError::WorkbookUnreadable {
            message: "empty input".to_string(),
        });
    }
    let sheets = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    Ok(collect_sheets(sheets))
}

/// Reads a workbook from a file path.
pub fn read_workbook_path<P: AsRef<Path>>(path: P) -> EngineResult<Workbook> {
    let path = path.as_ref();
    let sheets = open_workbook_auto(path).map_err(|e| EngineError::WorkbookUnreadable {
        message: format!("{}: {}", path.display(), e),
    })?;
    Ok(collect_sheets(sheets))
}

fn collect_sheets<RS: Read + Seek>(mut workbook: Sheets<RS>) -> Workbook {
    let names = workbook.sheet_names();
    let mut sheets = Vec::with_capacity(names.len());
    let mut unreadable = Vec::new();

    for name in names {
        match workbook.worksheet_range(&name) {
            Ok(range) => {
                let mut sheet = Sheet::new(name.clone());
                let (row0, col0) = range.start().unwrap_or((0, 0));
                for (row, col, data) in range.used_cells() {
                    // calamine positions are 0-based and relative to the range start
                    let row = row0 + row as u32 + 1;
                    let col = col0 + col as u32 + 1;
                    sheet.set(row, col, convert_cell(data));
                }
                debug!(sheet = %name, cells = sheet.len(), "Loaded worksheet");
                sheets.push(sheet);
            }
            Err(e) => {
                warn!(sheet = %name, error = %e, "Skipping unreadable worksheet");
                unreadable.push(UnreadableSheet {
                    name,
                    reason: e.to_string(),
                });
            }
        }
    }

    Workbook::new(sheets).with_unreadable(unreadable)
}

/// Converts a calamine cell into the engine's scalar type.
fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Int(i) => CellValue::Number(Decimal::from(*i)),
        Data::Float(f) => Decimal::from_f64(*f)
            .map(|d| CellValue::Number(d.normalize()))
            .unwrap_or(CellValue::Empty),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            // Durations and bare times of day are hour counts on a payroll sheet
            if dt.is_duration() || (0.0..1.0).contains(&serial) {
                Decimal::from_f64(serial * 24.0)
                    .map(|h| CellValue::Duration(h.round_dp(4).normalize()))
                    .unwrap_or(CellValue::Empty)
            } else {
                dt.as_datetime()
                    .map(|d| CellValue::Date(d.date()))
                    .unwrap_or(CellValue::Empty)
            }
        }
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Empty,
    }
}
