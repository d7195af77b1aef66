//! Configuration types for the extraction engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from `engine.yaml`. Every section carries serde defaults
//! so a configuration file only needs to name what it changes.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{ColumnOffsets, PayrollField};

/// The gap between the sheet gross and the component sum (without transport)
/// below which the gross is taken to exclude transport.
pub const TRANSPORT_TOLERANCE: Decimal = Decimal::ONE_HUNDRED;

/// Field detection thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Rows 1..=scan_rows are searched for labels and identifiers.
    pub scan_rows: u32,
    /// Detection confidence needed before a template is written back.
    pub min_confidence_to_save: f64,
    /// Stored template confidence needed before it is reused without
    /// re-detection.
    pub trust_threshold: f64,
    /// Fields counted towards detection confidence.
    pub required_fields: Vec<PayrollField>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            scan_rows: 50,
            min_confidence_to_save: 0.5,
            trust_threshold: 0.5,
            required_fields: vec![
                PayrollField::EmployeeId,
                PayrollField::Period,
                PayrollField::WorkDays,
                PayrollField::WorkHours,
                PayrollField::OvertimeHours,
                PayrollField::BaseSalary,
                PayrollField::GrossSalary,
                PayrollField::NetSalary,
            ],
        }
    }
}

/// The layout assumed when nothing better is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Columns between consecutive employee block origins.
    pub employee_block_width: u32,
    /// Column deltas relative to a block origin.
    pub column_offsets: ColumnOffsets,
    /// Field rows used when detection is not trusted.
    pub fallback_rows: BTreeMap<PayrollField, u32>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let fallback_rows = [
            (PayrollField::Period, 2),
            (PayrollField::EmployeeId, 3),
            (PayrollField::EmployeeName, 4),
            (PayrollField::WorkDays, 6),
            (PayrollField::PaidLeaveDays, 7),
            (PayrollField::AbsenceDays, 8),
            (PayrollField::WorkHours, 9),
            (PayrollField::OvertimeHours, 10),
            (PayrollField::NightHours, 11),
            (PayrollField::HolidayHours, 12),
            (PayrollField::BaseSalary, 13),
            (PayrollField::OvertimePay, 14),
            (PayrollField::NightPay, 15),
            (PayrollField::HolidayPay, 16),
            (PayrollField::TransportAllowance, 17),
            (PayrollField::GrossSalary, 30),
            (PayrollField::HealthInsurance, 31),
            (PayrollField::WelfarePension, 32),
            (PayrollField::EmploymentInsurance, 33),
            (PayrollField::IncomeTax, 34),
            (PayrollField::ResidentTax, 35),
            (PayrollField::TotalDeductions, 36),
            (PayrollField::NetSalary, 37),
        ]
        .into_iter()
        .collect();

        Self {
            employee_block_width: 6,
            column_offsets: ColumnOffsets::default(),
            fallback_rows,
        }
    }
}

/// The row window rescanned for every employee block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicZoneConfig {
    /// First row of the window (inclusive).
    pub start_row: u32,
    /// Last row of the window (inclusive).
    pub end_row: u32,
}

impl Default for DynamicZoneConfig {
    fn default() -> Self {
        Self {
            start_row: 20,
            end_row: 29,
        }
    }
}

/// Billing multipliers and the monthly overtime threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Monthly overtime hours billed at the standard overtime multiplier.
    pub overtime_threshold_hours: Decimal,
    /// Multiplier for overtime up to the threshold.
    pub overtime_multiplier: Decimal,
    /// Multiplier for overtime beyond the threshold.
    pub overtime_over_threshold_multiplier: Decimal,
    /// Late-night premium multiplier.
    pub night_multiplier: Decimal,
    /// Holiday multiplier.
    pub holiday_multiplier: Decimal,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            overtime_threshold_hours: Decimal::from(60),
            overtime_multiplier: Decimal::new(125, 2),
            overtime_over_threshold_multiplier: Decimal::new(15, 1),
            night_multiplier: Decimal::new(25, 2),
            holiday_multiplier: Decimal::new(135, 2),
        }
    }
}

/// The complete engine configuration.
///
/// # Example
///
/// ```
/// use payroll_extract::config::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.layout.employee_block_width, 6);
/// assert_eq!(config.dynamic_zone.start_row, 20);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Detection thresholds.
    pub detection: DetectionConfig,
    /// Default layout and fallback rows.
    pub layout: LayoutConfig,
    /// The dynamic-zone window.
    pub dynamic_zone: DynamicZoneConfig,
    /// Billing multipliers.
    pub billing: BillingConfig,
    /// Sheets whose normalized name contains one of these are never parsed.
    pub excluded_sheets: Vec<String>,
    /// Allowances paid to employees but never billed.
    pub non_billable_labels: Vec<String>,
    /// Extra candidate labels per field, tried after the built-in ones.
    pub extra_labels: HashMap<PayrollField, Vec<String>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            detection: DetectionConfig::default(),
            layout: LayoutConfig::default(),
            dynamic_zone: DynamicZoneConfig::default(),
            billing: BillingConfig::default(),
            excluded_sheets: ["目次", "集計", "合計", "一覧", "SUMMARY", "INDEX"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            non_billable_labels: crate::detection::DEFAULT_NON_BILLABLE_LABELS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            extra_labels: HashMap::new(),
        }
    }
}

impl EngineConfig {
    /// Checks the values deserialization cannot check.
    pub fn validate(&self) -> EngineResult<()> {
        let invalid = |message: String| EngineError::ConfigParseError {
            path: "engine.yaml".to_string(),
            message,
        };

        for (name, value) in [
            ("min_confidence_to_save", self.detection.min_confidence_to_save),
            ("trust_threshold", self.detection.trust_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("{} must be within [0, 1], got {}", name, value)));
            }
        }
        if self.detection.scan_rows == 0 {
            return Err(invalid("scan_rows must be positive".to_string()));
        }
        if self.layout.employee_block_width == 0 {
            return Err(invalid("employee_block_width must be positive".to_string()));
        }
        if self.dynamic_zone.start_row == 0 || self.dynamic_zone.start_row > self.dynamic_zone.end_row
        {
            return Err(invalid(format!(
                "dynamic zone rows {}..={} are not a valid window",
                self.dynamic_zone.start_row, self.dynamic_zone.end_row
            )));
        }
        if self.billing.overtime_threshold_hours.is_sign_negative() {
            return Err(invalid("overtime_threshold_hours must not be negative".to_string()));
        }
        Ok(())
    }

    /// The dynamic-zone window as a row range.
    pub fn dynamic_rows(&self) -> std::ops::RangeInclusive<u32> {
        self.dynamic_zone.start_row..=self.dynamic_zone.end_row
    }
}
