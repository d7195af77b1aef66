//! Typed scalar cell values.
//!
//! Every read in the engine is fail-soft: a cell that cannot be interpreted as
//! the requested type yields `None` and the caller substitutes zero or empty.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::detection::fold_width;

/// A single worksheet cell value.
///
/// # Example
///
/// ```
/// use payroll_extract::grid::CellValue;
/// use rust_decimal::Decimal;
///
/// let cell = CellValue::Text("１，２００円".to_string());
/// assert_eq!(cell.as_decimal(), Some(Decimal::from(1200)));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    /// No value.
    #[default]
    Empty,
    /// A numeric value.
    Number(Decimal),
    /// A text value, kept verbatim.
    Text(String),
    /// A boolean value.
    Bool(bool),
    /// A calendar date.
    Date(NaiveDate),
    /// An elapsed time, expressed in hours.
    Duration(Decimal),
}

impl CellValue {
    /// Returns true for empty cells and whitespace-only text.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Interprets the cell as a number.
    ///
    /// Text is accepted when it is a plain number once thousands separators,
    /// currency marks and full-width digits are cleaned up. Dates and booleans
    /// are never numbers.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Duration(hours) => Some(*hours),
            CellValue::Text(s) => parse_numeric_text(s),
            CellValue::Empty | CellValue::Bool(_) | CellValue::Date(_) => None,
        }
    }

    /// Interprets the cell as an hour count.
    ///
    /// In addition to [`as_decimal`](Self::as_decimal), `H:MM` text such as
    /// `"160:30"` is read as 160.5 hours.
    pub fn as_hours(&self) -> Option<Decimal> {
        if let CellValue::Text(s) = self {
            if let Some(hours) = parse_clock_text(s) {
                return Some(hours);
            }
        }
        self.as_decimal()
    }

    /// Renders the cell as a display string.
    ///
    /// Numbers render without trailing zeros so `100001.0` becomes `"100001"`.
    pub fn display_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) | CellValue::Duration(n) => n.normalize().to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

fn parse_numeric_text(raw: &str) -> Option<Decimal> {
    let folded = fold_width(raw.trim());
    let cleaned: String = folded
        .chars()
        .filter(|c| !matches!(c, ',' | '¥' | '\\' | '円' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    // Accounting style negatives: ▲1,000 or △1,000
    let (negative, digits) = match cleaned.strip_prefix(['▲', '△']) {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };
    let value: Decimal = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}

fn parse_clock_text(raw: &str) -> Option<Decimal> {
    let folded = fold_width(raw.trim());
    let (hours, minutes) = folded.split_once(':')?;
    let hours: u32 = hours.trim().parse().ok()?;
    let minutes: u32 = minutes.trim().parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    Some(Decimal::from(hours) + Decimal::from(minutes) / Decimal::from(60))
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<Decimal> for CellValue {
    fn from(value: Decimal) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(Decimal::from(value))
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(Decimal::from(value))
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        CellValue::Number(Decimal::from(value))
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Decimal::from_f64(value)
            .map(|d| CellValue::Number(d.normalize()))
            .unwrap_or(CellValue::Empty)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::Date(value.date())
    }
}
