//! Gross salary derivation and the transport-in-gross check.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::TRANSPORT_TOLERANCE;
use crate::models::{AuditStep, PayComponents};

/// The result of deriving the gross salary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrossSalaryResult {
    /// The gross salary.
    pub gross_salary: Decimal,
    /// Whether the gross already contains the commuting allowance.
    pub transport_included: bool,
    /// The audit step recording this derivation.
    pub audit_step: AuditStep,
}

/// Derives the gross salary for one block.
///
/// A non-zero `sheet_gross` is used as printed. Otherwise the gross is the
/// sum of every known pay component.
///
/// Some factories print a gross that leaves the commuting allowance out.
/// When the printed gross is within [`TRANSPORT_TOLERANCE`] of the component
/// sum without transport, the gross is flagged as excluding transport.
///
/// # Example
///
/// ```
/// use payroll_extract::calculation::derive_gross_salary;
/// use payroll_extract::models::PayComponents;
/// use rust_decimal::Decimal;
///
/// let pay = PayComponents {
///     base_salary: Decimal::from(250000),
///     transport_allowance: Decimal::from(10000),
///     ..Default::default()
/// };
///
/// let printed = derive_gross_salary(Decimal::from(250050), &pay, 1);
/// assert_eq!(printed.gross_salary, Decimal::from(250050));
/// assert!(!printed.transport_included);
///
/// let summed = derive_gross_salary(Decimal::ZERO, &pay, 1);
/// assert_eq!(summed.gross_salary, Decimal::from(260000));
/// assert!(summed.transport_included);
/// ```
pub fn derive_gross_salary(
    sheet_gross: Decimal,
    pay: &PayComponents,
    step_number: u32,
) -> GrossSalaryResult {
    let component_sum = pay.sum();
    let without_transport = component_sum - pay.transport_allowance;

    let (gross_salary, transport_included, reasoning) = if sheet_gross.is_zero() {
        (
            component_sum,
            true,
            format!(
                "No gross on the statement; summed pay components to {}",
                component_sum.normalize()
            ),
        )
    } else if pay.transport_allowance.is_zero() {
        (
            sheet_gross,
            true,
            format!(
                "Statement gross {} used; no commuting allowance to account for",
                sheet_gross.normalize()
            ),
        )
    } else {
        let gap = (sheet_gross - without_transport).abs();
        let excluded = gap <= TRANSPORT_TOLERANCE;
        let reasoning = if excluded {
            format!(
                "Statement gross {} is within {} of the components without transport ({}); transport is excluded",
                sheet_gross.normalize(),
                TRANSPORT_TOLERANCE,
                without_transport.normalize()
            )
        } else {
            format!(
                "Statement gross {} differs from the components without transport ({}) by {}; transport is included",
                sheet_gross.normalize(),
                without_transport.normalize(),
                gap.normalize()
            )
        };
        (sheet_gross, !excluded, reasoning)
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "gross_salary".to_string(),
        rule_name: "Gross Salary".to_string(),
        input: serde_json::json!({
            "sheet_gross": sheet_gross.normalize().to_string(),
            "component_sum": component_sum.normalize().to_string(),
            "transport_allowance": pay.transport_allowance.normalize().to_string()
        }),
        output: serde_json::json!({
            "gross_salary": gross_salary.normalize().to_string(),
            "transport_included": transport_included
        }),
        reasoning,
    };

    GrossSalaryResult {
        gross_salary,
        transport_included,
        audit_step,
    }
}
