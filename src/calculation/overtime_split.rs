//! Monthly overtime threshold split.
//!
//! Overtime beyond the monthly threshold (60 hours by default) is billed at a
//! higher multiplier, so the raw overtime figure read from a statement is
//! split into the part up to the threshold and the part beyond it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::AuditStep;

/// Default monthly overtime threshold in hours.
pub const DEFAULT_OVERTIME_THRESHOLD: Decimal = Decimal::from_parts(60, 0, 0, false, 0);

/// The result of splitting raw overtime hours at the monthly threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeSplit {
    /// Overtime hours up to the threshold.
    pub overtime_hours: Decimal,
    /// Overtime hours beyond the threshold.
    pub over_threshold_hours: Decimal,
    /// The audit step recording this split.
    pub audit_step: AuditStep,
}

/// Splits raw overtime hours at the monthly threshold.
///
/// # Arguments
///
/// * `raw_overtime` - Overtime hours as read from the statement
/// * `threshold` - The monthly threshold (typically 60 hours)
/// * `step_number` - The step number for audit trail sequencing
///
/// # Examples
///
/// ## At the threshold
///
/// ```
/// use payroll_extract::calculation::{split_overtime, DEFAULT_OVERTIME_THRESHOLD};
/// use rust_decimal::Decimal;
///
/// let result = split_overtime(Decimal::from(60), DEFAULT_OVERTIME_THRESHOLD, 1);
/// assert_eq!(result.overtime_hours, Decimal::from(60));
/// assert_eq!(result.over_threshold_hours, Decimal::ZERO);
/// ```
///
/// ## Beyond the threshold
///
/// ```
/// use payroll_extract::calculation::{split_overtime, DEFAULT_OVERTIME_THRESHOLD};
/// use rust_decimal::Decimal;
///
/// let result = split_overtime(Decimal::from(73), DEFAULT_OVERTIME_THRESHOLD, 1);
/// assert_eq!(result.overtime_hours, Decimal::from(60));
/// assert_eq!(result.over_threshold_hours, Decimal::from(13));
/// ```
pub fn split_overtime(raw_overtime: Decimal, threshold: Decimal, step_number: u32) -> OvertimeSplit {
    let overtime_hours = raw_overtime.min(threshold);
    let over_threshold_hours = (raw_overtime - threshold).max(Decimal::ZERO);

    let reasoning = if over_threshold_hours > Decimal::ZERO {
        format!(
            "{} overtime hours exceed the {} hour monthly threshold by {}",
            raw_overtime.normalize(),
            threshold.normalize(),
            over_threshold_hours.normalize()
        )
    } else {
        format!(
            "{} overtime hours are within the {} hour monthly threshold",
            raw_overtime.normalize(),
            threshold.normalize()
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "overtime_split".to_string(),
        rule_name: "Monthly Overtime Threshold Split".to_string(),
        input: serde_json::json!({
            "overtime_hours": raw_overtime.normalize().to_string(),
            "threshold": threshold.normalize().to_string()
        }),
        output: serde_json::json!({
            "overtime_hours": overtime_hours.normalize().to_string(),
            "over_threshold_hours": over_threshold_hours.normalize().to_string()
        }),
        reasoning,
    };

    OvertimeSplit {
        overtime_hours,
        over_threshold_hours,
        audit_step,
    }
}
