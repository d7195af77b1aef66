//! Worksheet and workbook containers.

use std::collections::HashMap;

use rust_decimal::Decimal;

use super::CellValue;

static EMPTY_CELL: CellValue = CellValue::Empty;

/// Read-only access to a worksheet addressed by 1-based (row, column).
///
/// The engine never needs to know which file container produced the grid;
/// anything that can answer these four questions can be parsed.
pub trait CellGrid {
    /// The worksheet name.
    fn name(&self) -> &str;

    /// The largest row index holding a value (1-based, 0 for an empty sheet).
    fn max_row(&self) -> u32;

    /// The largest column index holding a value (1-based, 0 for an empty sheet).
    fn max_column(&self) -> u32;

    /// The value at (row, column). Out-of-range positions are empty.
    fn cell(&self, row: u32, column: u32) -> &CellValue;

    /// Reads a number, defaulting to zero.
    fn number(&self, row: u32, column: u32) -> Decimal {
        self.cell(row, column).as_decimal().unwrap_or(Decimal::ZERO)
    }

    /// Reads an hour count, defaulting to zero.
    fn hours(&self, row: u32, column: u32) -> Decimal {
        self.cell(row, column).as_hours().unwrap_or(Decimal::ZERO)
    }

    /// Reads a display string, defaulting to empty.
    fn text(&self, row: u32, column: u32) -> String {
        self.cell(row, column).display_string()
    }
}

/// A sparse in-memory worksheet.
///
/// # Example
///
/// ```
/// use payroll_extract::grid::{CellGrid, Sheet};
/// use rust_decimal::Decimal;
///
/// let sheet = Sheet::new("第一工場")
///     .with(3, 3, "100001")
///     .with(9, 3, 160);
///
/// assert_eq!(sheet.text(3, 3), "100001");
/// assert_eq!(sheet.number(9, 3), Decimal::from(160));
/// assert_eq!(sheet.max_row(), 9);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    name: String,
    cells: HashMap<(u32, u32), CellValue>,
    max_row: u32,
    max_column: u32,
}

impl Sheet {
    /// Creates an empty sheet with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets a cell value. Row and column are 1-based; zero is ignored.
    pub fn set(&mut self, row: u32, column: u32, value: impl Into<CellValue>) {
        if row == 0 || column == 0 {
            return;
        }
        let value = value.into();
        if value.is_empty() {
            self.cells.remove(&(row, column));
            return;
        }
        self.max_row = self.max_row.max(row);
        self.max_column = self.max_column.max(column);
        self.cells.insert((row, column), value);
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, row: u32, column: u32, value: impl Into<CellValue>) -> Self {
        self.set(row, column, value);
        self
    }

    /// Number of non-empty cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if the sheet holds no values.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl CellGrid for Sheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_row(&self) -> u32 {
        self.max_row
    }

    fn max_column(&self) -> u32 {
        self.max_column
    }

    fn cell(&self, row: u32, column: u32) -> &CellValue {
        self.cells.get(&(row, column)).unwrap_or(&EMPTY_CELL)
    }
}

/// A worksheet that the container could not decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableSheet {
    /// The worksheet name.
    pub name: String,
    /// Why it could not be read.
    pub reason: String,
}

/// An ordered collection of worksheets.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    unreadable: Vec<UnreadableSheet>,
}

impl Workbook {
    /// Creates a workbook from sheets in file order.
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self {
            sheets,
            unreadable: Vec::new(),
        }
    }

    pub(crate) fn with_unreadable(mut self, unreadable: Vec<UnreadableSheet>) -> Self {
        self.unreadable = unreadable;
        self
    }

    /// The readable sheets, in file order.
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Sheets the container listed but could not decode.
    pub fn unreadable(&self) -> &[UnreadableSheet] {
        &self.unreadable
    }

    /// The sheet names, in file order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name()).collect()
    }
}
