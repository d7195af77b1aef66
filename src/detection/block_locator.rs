//! Employee block location.
//!
//! Employees sit side by side on a statement. Each block is anchored by its
//! 6-digit identifier, so finding every identifier on the identifier row finds
//! every block.

use std::collections::BTreeSet;

use crate::extraction::parse_period_text;
use crate::grid::CellGrid;

use super::normalize_cell;

/// The exact number of digits in an employee identifier.
pub const EMPLOYEE_ID_LENGTH: usize = 6;

/// Returns true if a normalized string is an employee identifier.
///
/// # Example
///
/// ```
/// use payroll_extract::detection::is_employee_id;
///
/// assert!(is_employee_id("100001"));
/// assert!(!is_employee_id("10001"));
/// assert!(!is_employee_id("1000012"));
/// assert!(!is_employee_id("10000A"));
/// ```
pub fn is_employee_id(normalized: &str) -> bool {
    normalized.len() == EMPLOYEE_ID_LENGTH && normalized.bytes().all(|b| b.is_ascii_digit())
}

/// Finds the origin column of every employee block.
///
/// Every column on `id_row` is tested; an identifier at absolute column `C`
/// gives the origin `C - id_offset`. Non-positive origins are discarded and
/// duplicates collapsed. Origins come back in left-to-right order; an empty
/// result means the sheet has no usable blocks on that row.
///
/// # Example
///
/// ```
/// use payroll_extract::detection::locate_employee_blocks;
/// use payroll_extract::grid::Sheet;
///
/// let sheet = Sheet::new("工場A")
///     .with(3, 3, 100001)
///     .with(3, 9, "100002");
///
/// assert_eq!(locate_employee_blocks(&sheet, 3, 2), vec![1, 7]);
/// ```
pub fn locate_employee_blocks(grid: &dyn CellGrid, id_row: u32, id_offset: u32) -> Vec<u32> {
    let mut origins = BTreeSet::new();

    for column in 1..=grid.max_column() {
        let token = normalize_cell(grid.cell(id_row, column));
        if !is_employee_id(&token) {
            continue;
        }
        let origin = i64::from(column) - i64::from(id_offset);
        if origin > 0 {
            origins.insert(origin as u32);
        }
    }

    origins.into_iter().collect()
}

/// Finds the row holding the most distinct employee identifiers among the
/// first `max_rows` rows.
///
/// A compact period such as `202501` is also six digits, so rows whose
/// tokens all read as periods rank below any row that has a real identifier.
/// Remaining ties go to the topmost row.
pub fn find_identifier_row(grid: &dyn CellGrid, max_rows: u32) -> Option<u32> {
    let last_row = max_rows.min(grid.max_row());
    let mut best: Option<(u32, (bool, usize))> = None;

    for row in 1..=last_row {
        let tokens: BTreeSet<String> = (1..=grid.max_column())
            .map(|column| normalize_cell(grid.cell(row, column)))
            .filter(|token| is_employee_id(token))
            .collect();
        if tokens.is_empty() {
            continue;
        }
        let period_like = tokens.iter().all(|t| parse_period_text(t).is_some());
        let score = (!period_like, tokens.len());
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((row, score));
        }
    }

    best.map(|(row, _)| row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Sheet;

    /// BL-001: N evenly spaced identifiers yield N ordered origins
    #[test]
    fn test_bl_001_evenly_spaced_identifiers() {
        let offset = 2;
        let width = 6;
        let mut sheet = Sheet::new("s");
        for i in 0..5u32 {
            let id_col = 1 + i * width + offset;
            sheet.set(3, id_col, format!("10000{}", i + 1));
        }

        let origins = locate_employee_blocks(&sheet, 3, offset);

        assert_eq!(origins.len(), 5);
        for (i, origin) in origins.iter().enumerate() {
            let id_col = 1 + i as u32 * width + offset;
            assert_eq!(*origin, id_col - offset);
        }
        assert!(origins.windows(2).all(|w| w[0] < w[1]));
    }

    /// BL-002: non-positive origins are dropped
    #[test]
    fn test_bl_002_non_positive_origin_discarded() {
        let sheet = Sheet::new("s").with(3, 2, "100001").with(3, 9, "100002");
        assert_eq!(locate_employee_blocks(&sheet, 3, 2), vec![7]);
    }

    /// BL-003: wrong-length and non-digit tokens are ignored
    #[test]
    fn test_bl_003_only_six_digit_tokens_qualify() {
        let sheet = Sheet::new("s")
            .with(3, 3, "12345")
            .with(3, 5, "1234567")
            .with(3, 7, "従業員番号")
            .with(3, 9, "１０００２１");
        assert_eq!(locate_employee_blocks(&sheet, 3, 2), vec![7]);
    }

    /// BL-004: a row without identifiers yields nothing
    #[test]
    fn test_bl_004_no_identifiers_is_empty_not_error() {
        let sheet = Sheet::new("s").with(1, 1, "目次");
        assert!(locate_employee_blocks(&sheet, 3, 2).is_empty());
    }

    /// BL-005: zero offset makes the identifier column the origin
    #[test]
    fn test_bl_005_zero_offset() {
        let sheet = Sheet::new("s").with(5, 4, 200001).with(5, 10, 200002);
        assert_eq!(locate_employee_blocks(&sheet, 5, 0), vec![4, 10]);
    }

    #[test]
    fn test_find_identifier_row_prefers_most_tokens() {
        let sheet = Sheet::new("s")
            .with(2, 3, "202501")
            .with(4, 3, "100001")
            .with(4, 9, "100002");
        assert_eq!(find_identifier_row(&sheet, 50), Some(4));
    }

    #[test]
    fn test_find_identifier_row_skips_compact_period_row() {
        let sheet = Sheet::new("s")
            .with(2, 3, 202501)
            .with(2, 9, 202501)
            .with(2, 15, 202501)
            .with(3, 3, "100001")
            .with(3, 9, "100002")
            .with(3, 15, "100003");
        assert_eq!(find_identifier_row(&sheet, 50), Some(3));

        let single = Sheet::new("s").with(2, 3, "202501").with(3, 3, "100001");
        assert_eq!(find_identifier_row(&single, 50), Some(3));
    }

    #[test]
    fn test_find_identifier_row_respects_scan_limit() {
        let sheet = Sheet::new("s").with(60, 3, "100001");
        assert_eq!(find_identifier_row(&sheet, 50), None);
        assert_eq!(find_identifier_row(&sheet, 60), Some(60));
    }
}
