//! Dynamic-zone scanning.
//!
//! Optional allowances and deductions appear in a bounded row window whose
//! contents change from one employee to the next. Every block is rescanned
//! on its own; nothing found for one block carries over to another.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::grid::CellGrid;
use crate::models::{ColumnOffsets, ColumnRole, DynamicCategory};

use super::dictionary::is_allowance_like;
use super::{CategoryDictionary, normalize_cell};

/// Labels that mark an intentionally blank row.
const PLACEHOLDER_LABELS: [&str; 6] = ["-", "－", "―", "ー", "*", "0"];

/// One classified row of a block's dynamic zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicZoneEntry {
    /// 1-based row.
    pub row: u32,
    /// The category the label matched.
    pub category: DynamicCategory,
    /// The normalized label.
    pub label: String,
    /// The value read from the block's value column.
    pub amount: Decimal,
}

/// Aggregated dynamic-zone values for one employee block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamicZoneResult {
    /// Running totals per category bucket.
    pub totals: BTreeMap<DynamicCategory, Decimal>,
    /// Paid leave days read beside paid leave amounts.
    pub paid_leave_days: Decimal,
    /// Every classified row, in row order.
    pub entries: Vec<DynamicZoneEntry>,
}

impl DynamicZoneResult {
    /// The total for a category bucket, zero when nothing was found.
    pub fn total(&self, category: DynamicCategory) -> Decimal {
        self.totals
            .get(&category.bucket())
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// `label=amount` breadcrumbs for every non-zero entry.
    pub fn breadcrumbs(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| !e.amount.is_zero())
            .map(|e| format!("{}={}", e.label, e.amount.normalize()))
            .collect()
    }

    fn add(&mut self, entry: DynamicZoneEntry) {
        *self
            .totals
            .entry(entry.category.bucket())
            .or_insert(Decimal::ZERO) += entry.amount;
        self.entries.push(entry);
    }
}

fn is_placeholder(label: &str) -> bool {
    label.is_empty() || PLACEHOLDER_LABELS.contains(&label)
}

/// Scans the dynamic zone of the block at `origin`.
///
/// `rows` is the row window to examine; callers pass the configured window
/// together with any rows the fixed detector set aside as other allowances,
/// minus rows already claimed by fixed fields.
///
/// # Example
///
/// ```
/// use std::collections::BTreeSet;
/// use payroll_extract::detection::{CategoryDictionary, scan_dynamic_zone};
/// use payroll_extract::grid::Sheet;
/// use payroll_extract::models::{ColumnOffsets, DynamicCategory};
/// use rust_decimal::Decimal;
///
/// let sheet = Sheet::new("工場A")
///     .with(20, 1, "寮費")
///     .with(20, 3, 25000);
/// let rows: BTreeSet<u32> = (20..=29).collect();
///
/// let result = scan_dynamic_zone(
///     &sheet,
///     1,
///     &ColumnOffsets::default(),
///     &rows,
///     &CategoryDictionary::builtin(),
/// );
///
/// assert_eq!(result.total(DynamicCategory::RentDeduction), Decimal::from(25000));
/// assert_eq!(result.breadcrumbs(), vec!["寮費=25000".to_string()]);
/// ```
pub fn scan_dynamic_zone(
    grid: &dyn CellGrid,
    origin: u32,
    offsets: &ColumnOffsets,
    rows: &BTreeSet<u32>,
    dictionary: &CategoryDictionary,
) -> DynamicZoneResult {
    let mut result = DynamicZoneResult::default();
    let label_column = origin + offsets.label;
    let value_column = origin + offsets.value;

    for &row in rows {
        let label = normalize_cell(grid.cell(row, label_column));
        if is_placeholder(&label) {
            continue;
        }
        let amount = grid.number(row, value_column);

        match dictionary.classify(&label) {
            Some(category) => {
                if category == DynamicCategory::PaidLeave {
                    if let Some(days_column) = offsets.column(origin, ColumnRole::Days) {
                        result.paid_leave_days += grid.number(row, days_column);
                    }
                }
                result.add(DynamicZoneEntry {
                    row,
                    category,
                    label,
                    amount,
                });
            }
            None if is_allowance_like(&label)
                && !dictionary.is_fixed_label(&label)
                && !amount.is_zero() =>
            {
                result.add(DynamicZoneEntry {
                    row,
                    category: DynamicCategory::GenericAllowance,
                    label,
                    amount,
                });
            }
            None => {}
        }
    }

    result
}

/// Records which category each row of the window holds, reading the label
/// columns of every block. The first block with a classifiable label on a
/// row decides that row.
pub fn discover_categories(
    grid: &dyn CellGrid,
    label_columns: &[u32],
    rows: &BTreeSet<u32>,
    dictionary: &CategoryDictionary,
) -> BTreeMap<u32, DynamicCategory> {
    let mut categories = BTreeMap::new();
    for &row in rows {
        let found = label_columns.iter().find_map(|&column| {
            let label = normalize_cell(grid.cell(row, column));
            if is_placeholder(&label) {
                return None;
            }
            dictionary.classify(&label).or_else(|| {
                (is_allowance_like(&label) && !dictionary.is_fixed_label(&label))
                    .then_some(DynamicCategory::GenericAllowance)
            })
        });
        if let Some(category) = found {
            categories.insert(row, category);
        }
    }
    categories
}
