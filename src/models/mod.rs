//! Core data models for the Payroll Statement Extraction Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod audit;
mod category;
mod employee;
mod field;
mod layout;
mod payroll_record;
mod report;

pub use audit::AuditStep;
pub use category::DynamicCategory;
pub use employee::{
    EmployeeDirectory, EmployeeMasterEntry, EmployeeRates, InMemoryEmployeeDirectory,
};
pub use field::{FieldKind, PayrollField};
pub use layout::{ColumnOffsets, ColumnRole};
pub use payroll_record::{DayCounts, Deductions, HourBuckets, PayComponents, PayrollRecord};
pub use report::{LayoutSource, ParseReport, ParseWarning, Severity, SheetSummary, WarningKind};
