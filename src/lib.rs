//! Payroll Statement Extraction Engine
//!
//! This crate reads monthly payroll statement workbooks from dispatch-staffing
//! factories, where every sheet holds several employees side by side in
//! fixed-width column blocks, and turns them into one normalized
//! [`PayrollRecord`](models::PayrollRecord) per employee, including the amount
//! billed to the client.
//!
//! Layouts differ per factory. The engine learns each layout by label
//! detection, stores it as a template keyed by the sheet name, and reuses it
//! on later months.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod detection;
pub mod error;
pub mod extraction;
pub mod grid;
pub mod models;
pub mod template;
