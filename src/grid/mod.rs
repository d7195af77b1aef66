//! Cell grid access for payroll statement worksheets.
//!
//! The engine works against the [`CellGrid`] trait: a read-only view over a
//! worksheet addressed by 1-based (row, column) that returns typed scalar
//! values. [`read_workbook_bytes`] converts any calamine-supported container
//! into in-memory [`Sheet`]s.
//!
//! # Example
//!
//! ```
//! use payroll_extract::grid::{CellGrid, CellValue, Sheet};
//!
//! let sheet = Sheet::new("第一工場").with(2, 1, "支給年月");
//! assert_eq!(sheet.cell(2, 1), &CellValue::Text("支給年月".to_string()));
//! ```

mod cell;
mod reader;
mod sheet;

pub use cell::CellValue;
pub use reader::{read_workbook_bytes, read_workbook_path};
pub use sheet::{CellGrid, Sheet, UnreadableSheet, Workbook};
