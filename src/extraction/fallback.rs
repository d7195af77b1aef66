//! Field row resolution with the built-in fallback table.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{LayoutSource, PayrollField};

/// Field rows in effect for one sheet.
///
/// The layout source decides which rows a field may come from:
///
/// - `Template` and `Detected` use their own positions; only the identity
///   fields (identifier, period) fall back to the table when missing, since
///   a block cannot be emitted without them.
/// - `Fallback` uses the table for every field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRows {
    positions: BTreeMap<PayrollField, u32>,
    fallback: BTreeMap<PayrollField, u32>,
    source: LayoutSource,
}

impl FieldRows {
    /// Rows taken from a template or a fresh detection.
    pub fn new(
        positions: BTreeMap<PayrollField, u32>,
        fallback: BTreeMap<PayrollField, u32>,
        source: LayoutSource,
    ) -> Self {
        Self {
            positions,
            fallback,
            source,
        }
    }

    /// Rows taken from the fallback table alone.
    pub fn fallback_only(fallback: BTreeMap<PayrollField, u32>) -> Self {
        Self {
            positions: BTreeMap::new(),
            fallback,
            source: LayoutSource::Fallback,
        }
    }

    /// Where the rows came from.
    pub fn source(&self) -> LayoutSource {
        self.source
    }

    /// The row to read a field from, if any.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_extract::extraction::FieldRows;
    /// use payroll_extract::models::{LayoutSource, PayrollField};
    ///
    /// let rows = FieldRows::new(
    ///     [(PayrollField::WorkHours, 12)].into_iter().collect(),
    ///     [(PayrollField::EmployeeId, 3), (PayrollField::BaseSalary, 13)].into_iter().collect(),
    ///     LayoutSource::Detected,
    /// );
    ///
    /// assert_eq!(rows.row(PayrollField::WorkHours), Some(12));
    /// assert_eq!(rows.row(PayrollField::EmployeeId), Some(3));
    /// assert_eq!(rows.row(PayrollField::BaseSalary), None);
    /// ```
    pub fn row(&self, field: PayrollField) -> Option<u32> {
        match self.source {
            LayoutSource::Fallback => self.fallback.get(&field).copied(),
            LayoutSource::Template | LayoutSource::Detected => {
                self.positions.get(&field).copied().or_else(|| {
                    if is_identity_field(field) {
                        self.fallback.get(&field).copied()
                    } else {
                        None
                    }
                })
            }
        }
    }

    /// Every row some field will be read from.
    pub fn claimed_rows(&self) -> BTreeSet<u32> {
        PayrollField::ALL
            .iter()
            .filter_map(|&field| self.row(field))
            .collect()
    }
}

fn is_identity_field(field: PayrollField) -> bool {
    matches!(field, PayrollField::EmployeeId | PayrollField::Period)
}
