//! Audit steps recorded by the derivation rules.

use serde::{Deserialize, Serialize};

/// A single derivation step applied while assembling a record.
///
/// Every derived figure on a [`PayrollRecord`](super::PayrollRecord) (the
/// overtime split, the gross salary, the billing amount) carries the step
/// that produced it, so a reviewer can retrace the numbers without rerunning
/// the parse.
///
/// # Example
///
/// ```
/// use payroll_extract::models::AuditStep;
///
/// let step = AuditStep {
///     step_number: 1,
///     rule_id: "overtime_split".to_string(),
///     rule_name: "Monthly Overtime Threshold Split".to_string(),
///     input: serde_json::json!({"overtime_hours": "73", "threshold": "60"}),
///     output: serde_json::json!({"overtime": "60", "over_threshold": "13"}),
///     reasoning: "73 overtime hours exceed the 60 hour threshold by 13".to_string(),
/// };
/// assert_eq!(step.rule_id, "overtime_split");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number within one record.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_step_serialization() {
        let step = AuditStep {
            step_number: 3,
            rule_id: "billing_amount".to_string(),
            rule_name: "Client Billing Amount".to_string(),
            input: serde_json::json!({"rate": "1700"}),
            output: serde_json::json!({"billing_amount": "272000"}),
            reasoning: "160h x 1700".to_string(),
        };

        let json = serde_json::to_string(&step).unwrap();
        assert!(json.contains("\"step_number\":3"));
        assert!(json.contains("\"rule_id\":\"billing_amount\""));
        assert!(json.contains("\"billing_amount\":\"272000\""));
    }
}
