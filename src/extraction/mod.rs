//! Workbook extraction.
//!
//! This module ties detection, templates and the derivation rules together:
//! resolving field rows for a sheet, parsing periods, assembling one record
//! per employee block, and orchestrating a whole workbook parse.

mod assembler;
mod engine;
mod fallback;
mod period;

pub use assembler::{BlockContext, BlockOutcome, assemble_block};
pub use engine::PayrollExtractor;
pub use fallback::FieldRows;
pub use period::{parse_period, parse_period_text};
