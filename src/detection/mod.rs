//! Layout detection.
//!
//! Everything needed to work out where things are on a statement whose
//! layout is unknown:
//!
//! - [`normalize`] - label normalization for fuzzy comparison
//! - [`dictionary`] - field and dynamic-category label dictionaries
//! - [`block_locator`] - employee block origins from identifier tokens
//! - [`fixed_zone`] - rows of the fields shared by every block
//! - [`dynamic_zone`] - per-block allowances and deductions

pub mod block_locator;
pub mod dictionary;
pub mod dynamic_zone;
pub mod fixed_zone;
pub mod normalize;

pub use block_locator::{
    EMPLOYEE_ID_LENGTH, find_identifier_row, is_employee_id, locate_employee_blocks,
};
pub use dictionary::{
    ALLOWANCE_MARKERS, CategoryDictionary, DEFAULT_NON_BILLABLE_LABELS, FieldDictionary,
    PAYMENT_INDICATORS, has_payment_indicator, is_allowance_like,
};
pub use dynamic_zone::{
    DynamicZoneEntry, DynamicZoneResult, discover_categories, scan_dynamic_zone,
};
pub use fixed_zone::{DEFAULT_SCAN_ROWS, FixedZoneDetection, FixedZoneOptions, detect_fixed_zone};
pub use normalize::{fold_width, normalize_cell, normalize_label};
