//! Client billing amount.
//!
//! The amount billed to the client for one employee and one period applies a
//! multiplier per hour category to the employee's billing rate, then adds the
//! allowances that are passed through. Commuting allowance, non-billable
//! allowances and paid leave never reach the invoice.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::config::BillingConfig;
use crate::models::AuditStep;

/// Hours by billing category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillableHours {
    /// Regular hours, billed at the rate.
    pub regular: Decimal,
    /// Overtime up to the monthly threshold.
    pub overtime: Decimal,
    /// Overtime beyond the monthly threshold.
    pub over_threshold: Decimal,
    /// Late-night hours, billed at the premium only.
    pub night: Decimal,
    /// Holiday hours.
    pub holiday: Decimal,
}

/// Where the billing amount came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingSource {
    /// Computed from hours and the billing rate.
    Computed,
    /// Printed on the statement.
    Provided,
    /// No billing rate is known; billed at zero.
    NoRate,
}

/// The result of the billing calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingResult {
    /// The amount billed, in whole currency units.
    pub amount: Decimal,
    /// How the amount was obtained.
    pub source: BillingSource,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Rounds to whole currency units, halves away from zero.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Calculates the client billing amount.
///
/// `regular*rate + overtime*rate*1.25 + over_threshold*rate*1.5 +
/// night*rate*0.25 + holiday*rate*1.35 + other_billable_allowances`, with the
/// multipliers taken from `config`. A non-zero `provided_amount` (the sheet's
/// own billing line) wins over the computed figure. Without a rate the amount
/// is zero.
///
/// # Arguments
///
/// * `hours` - Hours by billing category
/// * `rate` - The employee's billing rate (zero when unknown)
/// * `other_billable_allowances` - Allowances passed through to the client
/// * `provided_amount` - The billing amount printed on the sheet, or zero
/// * `config` - Billing multipliers
/// * `step_number` - The step number for audit trail sequencing
///
/// # Example
///
/// ```
/// use payroll_extract::calculation::{BillableHours, calculate_billing};
/// use payroll_extract::config::BillingConfig;
/// use rust_decimal::Decimal;
///
/// let hours = BillableHours {
///     regular: Decimal::from(160),
///     ..Default::default()
/// };
/// let result = calculate_billing(
///     &hours,
///     Decimal::from(1700),
///     Decimal::ZERO,
///     Decimal::ZERO,
///     &BillingConfig::default(),
///     1,
/// );
/// assert_eq!(result.amount, Decimal::from(272000));
/// ```
pub fn calculate_billing(
    hours: &BillableHours,
    rate: Decimal,
    other_billable_allowances: Decimal,
    provided_amount: Decimal,
    config: &BillingConfig,
    step_number: u32,
) -> BillingResult {
    let input = serde_json::json!({
        "regular_hours": hours.regular.normalize().to_string(),
        "overtime_hours": hours.overtime.normalize().to_string(),
        "over_threshold_hours": hours.over_threshold.normalize().to_string(),
        "night_hours": hours.night.normalize().to_string(),
        "holiday_hours": hours.holiday.normalize().to_string(),
        "rate": rate.normalize().to_string(),
        "other_billable_allowances": other_billable_allowances.normalize().to_string(),
        "provided_amount": provided_amount.normalize().to_string()
    });

    let (amount, source, reasoning) = if !provided_amount.is_zero() {
        (
            round_currency(provided_amount),
            BillingSource::Provided,
            format!(
                "Statement states a billing amount of {}, used as is",
                provided_amount.normalize()
            ),
        )
    } else if rate.is_zero() {
        (
            Decimal::ZERO,
            BillingSource::NoRate,
            "No billing rate is known for this employee; billed at zero".to_string(),
        )
    } else {
        let regular = hours.regular * rate;
        let overtime = hours.overtime * rate * config.overtime_multiplier;
        let over_threshold =
            hours.over_threshold * rate * config.overtime_over_threshold_multiplier;
        let night = hours.night * rate * config.night_multiplier;
        let holiday = hours.holiday * rate * config.holiday_multiplier;
        let total =
            round_currency(regular + overtime + over_threshold + night + holiday + other_billable_allowances);
        (
            total,
            BillingSource::Computed,
            format!(
                "{}h x {} + overtime {}h x{} + over threshold {}h x{} + night {}h x{} + holiday {}h x{} + allowances {} = {}",
                hours.regular.normalize(),
                rate.normalize(),
                hours.overtime.normalize(),
                config.overtime_multiplier.normalize(),
                hours.over_threshold.normalize(),
                config.overtime_over_threshold_multiplier.normalize(),
                hours.night.normalize(),
                config.night_multiplier.normalize(),
                hours.holiday.normalize(),
                config.holiday_multiplier.normalize(),
                other_billable_allowances.normalize(),
                total.normalize()
            ),
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "billing_amount".to_string(),
        rule_name: "Client Billing Amount".to_string(),
        input,
        output: serde_json::json!({
            "billing_amount": amount.normalize().to_string(),
            "source": source
        }),
        reasoning,
    };

    BillingResult {
        amount,
        source,
        audit_step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn bill(hours: &BillableHours, rate: &str, allowances: &str) -> BillingResult {
        calculate_billing(
            hours,
            dec(rate),
            dec(allowances),
            Decimal::ZERO,
            &BillingConfig::default(),
            1,
        )
    }

    // ==========================================================================
    // BIL-001: regular hours only
    // ==========================================================================
    #[test]
    fn test_bil_001_regular_hours_only() {
        let hours = BillableHours {
            regular: dec("160"),
            ..Default::default()
        };
        let result = bill(&hours, "1700", "0");
        assert_eq!(result.amount, dec("272000"));
        assert_eq!(result.source, BillingSource::Computed);
    }

    // ==========================================================================
    // BIL-002: every hour category with its multiplier
    // ==========================================================================
    #[test]
    fn test_bil_002_all_categories() {
        let hours = BillableHours {
            regular: dec("160"),
            overtime: dec("60"),
            over_threshold: dec("13"),
            night: dec("10"),
            holiday: dec("8"),
        };
        // 160*1700 = 272000
        // 60*1700*1.25 = 127500
        // 13*1700*1.5 = 33150
        // 10*1700*0.25 = 4250
        // 8*1700*1.35 = 18360
        // + 5000 allowances
        let result = bill(&hours, "1700", "5000");
        assert_eq!(result.amount, dec("460260"));
    }

    // ==========================================================================
    // BIL-003: missing rate bills zero without failing
    // ==========================================================================
    #[test]
    fn test_bil_003_missing_rate() {
        let hours = BillableHours {
            regular: dec("160"),
            ..Default::default()
        };
        let result = bill(&hours, "0", "5000");
        assert_eq!(result.amount, Decimal::ZERO);
        assert_eq!(result.source, BillingSource::NoRate);
    }

    // ==========================================================================
    // BIL-004: a provided amount wins
    // ==========================================================================
    #[test]
    fn test_bil_004_provided_amount_takes_precedence() {
        let hours = BillableHours {
            regular: dec("160"),
            ..Default::default()
        };
        let result = calculate_billing(
            &hours,
            dec("1700"),
            Decimal::ZERO,
            dec("300000"),
            &BillingConfig::default(),
            1,
        );
        assert_eq!(result.amount, dec("300000"));
        assert_eq!(result.source, BillingSource::Provided);
    }

    // ==========================================================================
    // BIL-005: halves round away from zero
    // ==========================================================================
    #[test]
    fn test_bil_005_rounding() {
        let hours = BillableHours {
            regular: dec("0.5"),
            ..Default::default()
        };
        // 0.5 * 1001 = 500.5 -> 501
        assert_eq!(bill(&hours, "1001", "0").amount, dec("501"));
        assert_eq!(round_currency(dec("-500.5")), dec("-501"));
        assert_eq!(round_currency(dec("500.49")), dec("500"));
    }

    #[test]
    fn test_audit_step_names_source() {
        let hours = BillableHours::default();
        let result = bill(&hours, "0", "0");
        assert_eq!(result.audit_step.rule_id, "billing_amount");
        assert_eq!(result.audit_step.output["source"], "no_rate");
    }
}
