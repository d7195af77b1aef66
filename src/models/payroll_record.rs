//! The normalized payroll record emitted for one employee block.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AuditStep;

/// Hours worked, split by category.
///
/// `overtime` is capped at the monthly threshold; anything above it is in
/// `overtime_over_threshold`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourBuckets {
    /// Regular hours.
    pub regular: Decimal,
    /// Overtime hours up to the threshold.
    pub overtime: Decimal,
    /// Overtime hours beyond the threshold.
    pub overtime_over_threshold: Decimal,
    /// Late-night hours.
    pub night: Decimal,
    /// Holiday hours.
    pub holiday: Decimal,
    /// Paid leave hours.
    pub paid_leave: Decimal,
    /// Late arrival and early departure hours.
    pub late_early: Decimal,
}

/// Day counts for the period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCounts {
    /// Days worked.
    pub work: Decimal,
    /// Paid leave days, from the fixed zone plus the dynamic zone.
    pub paid_leave: Decimal,
    /// Days absent.
    pub absence: Decimal,
}

/// Pay components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayComponents {
    /// Base salary.
    pub base_salary: Decimal,
    /// Hourly wage printed on the sheet (not the billing rate).
    pub hourly_wage: Decimal,
    /// Overtime pay.
    pub overtime_pay: Decimal,
    /// Premium for overtime beyond the threshold.
    pub overtime_over_threshold_pay: Decimal,
    /// Late-night premium.
    pub night_pay: Decimal,
    /// Holiday pay.
    pub holiday_pay: Decimal,
    /// Paid leave amount. Never billed.
    pub paid_leave_amount: Decimal,
    /// Commuting allowance. Never billed.
    pub transport_allowance: Decimal,
    /// Allowances that are a company cost only. Never billed.
    pub non_billable_allowances: Decimal,
    /// Allowances passed through to the client invoice.
    pub other_billable_allowances: Decimal,
}

impl PayComponents {
    /// Sum of every pay component, used when the sheet has no total.
    pub fn sum(&self) -> Decimal {
        self.base_salary
            + self.overtime_pay
            + self.overtime_over_threshold_pay
            + self.night_pay
            + self.holiday_pay
            + self.paid_leave_amount
            + self.transport_allowance
            + self.non_billable_allowances
            + self.other_billable_allowances
    }
}

/// Deductions from pay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deductions {
    /// Health insurance premium.
    pub health_insurance: Decimal,
    /// Welfare pension premium.
    pub welfare_pension: Decimal,
    /// Employment insurance premium.
    pub employment_insurance: Decimal,
    /// Withholding income tax.
    pub income_tax: Decimal,
    /// Resident tax.
    pub resident_tax: Decimal,
    /// Lateness and absence deduction.
    pub late_early: Decimal,
    /// Dormitory or rent.
    pub rent: Decimal,
    /// Utilities.
    pub utilities: Decimal,
    /// Advance payment recovered.
    pub advance_payment: Decimal,
    /// Meals.
    pub meal: Decimal,
    /// Year-end tax adjustment; negative values are refunds.
    pub year_end_adjustment: Decimal,
    /// Deductions not otherwise classified.
    pub other: Decimal,
    /// Total deductions as printed, or the sum of the above when absent.
    pub total: Decimal,
}

impl Deductions {
    /// Sum of the itemised deductions.
    pub fn itemised_sum(&self) -> Decimal {
        self.health_insurance
            + self.welfare_pension
            + self.employment_insurance
            + self.income_tax
            + self.resident_tax
            + self.late_early
            + self.rent
            + self.utilities
            + self.advance_payment
            + self.meal
            + self.year_end_adjustment
            + self.other
    }
}

/// One employee's payroll for one period.
///
/// Records are created fresh for every parse and never mutated after they
/// are emitted. Upserting by (`employee_id`, `period`) is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRecord {
    /// 6-digit employee identifier.
    pub employee_id: String,
    /// Employee name, when the sheet has one.
    pub employee_name: Option<String>,
    /// Pay period as `YYYY-MM`.
    pub period: String,
    /// Factory identifier (the sheet name).
    pub factory_identifier: String,
    /// Column origin of the employee block on the sheet.
    pub source_column: u32,
    /// Hour buckets.
    pub hours: HourBuckets,
    /// Day counts.
    pub days: DayCounts,
    /// Pay components.
    pub pay: PayComponents,
    /// Deductions.
    pub deductions: Deductions,
    /// Gross salary paid to the employee.
    pub gross_salary: Decimal,
    /// Net pay.
    pub net_salary: Decimal,
    /// Client billing rate from the employee master (zero when unknown).
    pub billing_rate: Decimal,
    /// Hourly pay rate from the employee master (zero when unknown).
    pub hourly_rate: Decimal,
    /// Amount billed to the client.
    pub billing_amount: Decimal,
    /// Whether the gross salary already includes the commuting allowance.
    pub transport_included_in_gross: bool,
    /// `label=amount` breadcrumbs from the dynamic zone.
    pub allowance_details: Vec<String>,
    /// The derivation steps behind the computed figures.
    pub audit_trail: Vec<AuditStep>,
}
