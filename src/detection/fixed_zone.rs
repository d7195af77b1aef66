//! Fixed-zone field detection.
//!
//! Fixed-zone fields sit on the same row for every employee block of a sheet
//! (and usually for every month from the same factory). Detection reads the
//! label column of each block over the first rows of the sheet and matches
//! normalized labels against the [`FieldDictionary`].

use std::collections::{BTreeMap, BTreeSet};

use crate::grid::CellGrid;
use crate::models::PayrollField;

use super::dictionary::{has_payment_indicator, is_allowance_like};
use super::{FieldDictionary, normalize_cell, normalize_label};

/// Default number of leading rows scanned for labels.
pub const DEFAULT_SCAN_ROWS: u32 = 50;

/// The outcome of a fixed-zone scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixedZoneDetection {
    /// Field -> 1-based row where its label was found.
    pub positions: BTreeMap<PayrollField, u32>,
    /// Allowance-like labels no fixed field claimed, keyed by row.
    pub other_allowances: BTreeMap<u32, String>,
}

impl FixedZoneDetection {
    /// Fraction of `required` fields that were found, in [0, 1].
    ///
    /// An empty requirement list is trivially satisfied.
    pub fn confidence(&self, required: &[PayrollField]) -> f64 {
        if required.is_empty() {
            return 1.0;
        }
        let found = required
            .iter()
            .filter(|f| self.positions.contains_key(f))
            .count();
        found as f64 / required.len() as f64
    }

    /// Required fields that were not found.
    pub fn missing(&self, required: &[PayrollField]) -> Vec<PayrollField> {
        required
            .iter()
            .copied()
            .filter(|f| !self.positions.contains_key(f))
            .collect()
    }
}

/// Options for one fixed-zone scan.
#[derive(Debug, Clone, Copy)]
pub struct FixedZoneOptions<'a> {
    /// Rows 1..=scan_rows are examined.
    pub scan_rows: u32,
    /// Explicit non-billable allowance names (kept out of the other bucket).
    pub non_billable_labels: &'a [String],
}

/// Detects fixed-zone field rows.
///
/// For every row, the label of every column in `label_columns` is normalized
/// and matched against fields that are still unresolved: an exact match on
/// any candidate wins first; otherwise a prefix match is accepted unless the
/// field counts hours or days and the label carries a payment indicator.
/// The first position found for a field is never replaced, and a row claimed
/// by one field is not offered to another.
///
/// # Example
///
/// ```
/// use payroll_extract::detection::{FieldDictionary, FixedZoneOptions, detect_fixed_zone};
/// use payroll_extract::grid::Sheet;
/// use payroll_extract::models::PayrollField;
///
/// let sheet = Sheet::new("工場A")
///     .with(9, 1, "労働時間")
///     .with(10, 1, "残業手当")
///     .with(11, 1, "残業");
///
/// let detection = detect_fixed_zone(
///     &sheet,
///     &[1],
///     &FieldDictionary::builtin(),
///     FixedZoneOptions { scan_rows: 50, non_billable_labels: &[] },
/// );
///
/// assert_eq!(detection.positions[&PayrollField::WorkHours], 9);
/// assert_eq!(detection.positions[&PayrollField::OvertimePay], 10);
/// assert_eq!(detection.positions[&PayrollField::OvertimeHours], 11);
/// ```
pub fn detect_fixed_zone(
    grid: &dyn CellGrid,
    label_columns: &[u32],
    dictionary: &FieldDictionary,
    options: FixedZoneOptions<'_>,
) -> FixedZoneDetection {
    let mut detection = FixedZoneDetection::default();
    let mut claimed_rows: BTreeSet<u32> = BTreeSet::new();
    let non_billable: Vec<String> = options
        .non_billable_labels
        .iter()
        .map(|l| normalize_label(l))
        .collect();

    let last_row = options.scan_rows.min(grid.max_row());

    for row in 1..=last_row {
        for &column in label_columns {
            if claimed_rows.contains(&row) {
                break;
            }
            let label = normalize_cell(grid.cell(row, column));
            if label.is_empty() {
                continue;
            }

            if let Some(field) = match_field(&label, dictionary, &detection.positions) {
                detection.positions.insert(field, row);
                claimed_rows.insert(row);
                detection.other_allowances.remove(&row);
                continue;
            }

            if is_allowance_like(&label)
                && !dictionary.is_exact_label(&label)
                && !non_billable.iter().any(|n| n == &label)
            {
                detection.other_allowances.entry(row).or_insert(label);
            }
        }
    }

    detection
}

fn match_field(
    label: &str,
    dictionary: &FieldDictionary,
    resolved: &BTreeMap<PayrollField, u32>,
) -> Option<PayrollField> {
    // A label that is exactly some field's label belongs to that field, even
    // when it was already resolved on another block.
    if dictionary.is_exact_label(label) {
        return dictionary
            .entries()
            .iter()
            .filter(|(field, _)| !resolved.contains_key(field))
            .find(|(_, labels)| labels.iter().any(|l| l == label))
            .map(|(field, _)| *field);
    }

    dictionary
        .entries()
        .iter()
        .filter(|(field, _)| !resolved.contains_key(field))
        .find(|(field, labels)| {
            labels.iter().any(|candidate| label.starts_with(candidate.as_str()))
                && !(field.kind().is_quantity() && has_payment_indicator(label))
        })
        .map(|(field, _)| *field)
}
