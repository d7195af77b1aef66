//! Derivation rules for the extraction engine.
//!
//! This module contains the calculations applied to the raw values read from
//! a statement: splitting overtime at the monthly threshold, deriving the
//! gross salary and the transport-in-gross flag, and computing the amount
//! billed to the client.

mod billing;
mod gross_salary;
mod overtime_split;

pub use billing::{BillableHours, BillingResult, BillingSource, calculate_billing, round_currency};
pub use gross_salary::{GrossSalaryResult, derive_gross_salary};
pub use overtime_split::{DEFAULT_OVERTIME_THRESHOLD, OvertimeSplit, split_overtime};
