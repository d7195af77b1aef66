//! Pay period parsing.
//!
//! Statements print the period in many shapes: a real date cell, `2025年1月`,
//! `2025/1`, `R7年1月`, or a bare `202501`. All of them resolve to `YYYY-MM`.

use std::sync::LazyLock;

use chrono::Datelike;
use regex::Regex;

use crate::detection::fold_width;
use crate::grid::CellValue;

static WESTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})\s*[年/\-.]\s*(\d{1,2})").expect("valid western period pattern")
});

static JAPANESE_ERA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(令和|平成|R|H)\s*(元|\d{1,2})\s*[年/\-.]\s*(\d{1,2})")
        .expect("valid era period pattern")
});

static COMPACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})(\d{2})$").expect("valid compact period pattern"));

/// Offset from an era year to the western year (era year 1 = offset + 1).
fn era_offset(era: &str) -> Option<i32> {
    match era {
        "令和" | "R" => Some(2018),
        "平成" | "H" => Some(1988),
        _ => None,
    }
}

fn format_period(year: i32, month: u32) -> Option<String> {
    if !(1900..=2100).contains(&year) || !(1..=12).contains(&month) {
        return None;
    }
    Some(format!("{:04}-{:02}", year, month))
}

/// Parses a period cell to `YYYY-MM`.
///
/// Returns `None` when the cell does not hold a recognisable period.
///
/// # Example
///
/// ```
/// use payroll_extract::extraction::parse_period;
/// use payroll_extract::grid::CellValue;
///
/// assert_eq!(parse_period(&CellValue::from("2025年1月")), Some("2025-01".to_string()));
/// assert_eq!(parse_period(&CellValue::from("令和7年3月分")), Some("2025-03".to_string()));
/// assert_eq!(parse_period(&CellValue::from(202512)), Some("2025-12".to_string()));
/// assert_eq!(parse_period(&CellValue::from("備考")), None);
/// ```
pub fn parse_period(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Date(date) => format_period(date.year(), date.month()),
        CellValue::Number(n) => {
            if !n.fract().is_zero() {
                return None;
            }
            parse_compact(&n.normalize().to_string())
        }
        CellValue::Text(raw) => parse_period_text(raw),
        CellValue::Empty | CellValue::Bool(_) | CellValue::Duration(_) => None,
    }
}

/// Parses period text to `YYYY-MM`.
pub fn parse_period_text(raw: &str) -> Option<String> {
    let text: String = fold_width(raw)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = JAPANESE_ERA.captures(&text) {
        let offset = era_offset(&caps[1])?;
        let era_year: i32 = if &caps[2] == "元" {
            1
        } else {
            caps[2].parse().ok()?
        };
        let month: u32 = caps[3].parse().ok()?;
        return format_period(offset + era_year, month);
    }

    if let Some(caps) = WESTERN.captures(&text) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        return format_period(year, month);
    }

    parse_compact(&text)
}

fn parse_compact(text: &str) -> Option<String> {
    let caps = COMPACT.captures(text)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    format_period(year, month)
}
