//! Categories for the rows of a statement's dynamic zone.

use serde::{Deserialize, Serialize};

/// The closed set of categories a dynamic-zone row can belong to.
///
/// Variants are declared in the order the label dictionary is evaluated, so
/// a label that could match two categories always lands in the earlier one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DynamicCategory {
    /// Premium pay for overtime beyond the monthly threshold.
    OvertimeOverThresholdPay,
    /// Paid leave amount (with a parallel day count).
    PaidLeave,
    /// Allowance paid to the employee but not billed to the client.
    NonBillableAllowance,
    /// Named allowance that is passed through to the client.
    OtherBillableAllowance,
    /// Dormitory or rent deduction.
    RentDeduction,
    /// Utilities deduction.
    UtilitiesDeduction,
    /// Advance payment recovered from pay.
    AdvancePayment,
    /// Meal or lunch-box deduction.
    MealDeduction,
    /// Year-end tax adjustment (may be negative).
    YearEndAdjustment,
    /// Unrecognised label that still looks like an allowance.
    ///
    /// Amounts are billed together with [`OtherBillableAllowance`](Self::OtherBillableAllowance).
    GenericAllowance,
}

impl DynamicCategory {
    /// The category whose running total this category contributes to.
    pub fn bucket(self) -> DynamicCategory {
        match self {
            DynamicCategory::GenericAllowance => DynamicCategory::OtherBillableAllowance,
            other => other,
        }
    }
}
