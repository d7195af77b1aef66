//! Semantic payroll fields found at fixed rows of a statement.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a field's cell should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// The 6-digit employee identifier.
    Identifier,
    /// The pay period.
    Period,
    /// Free text such as a name.
    Text,
    /// An hour count.
    Hours,
    /// A day count.
    Days,
    /// A money amount.
    Amount,
}

impl FieldKind {
    /// Hours and days fields must never be confused with the pay lines that
    /// share their prefix (`残業時間` vs `残業手当`).
    pub fn is_quantity(self) -> bool {
        matches!(self, FieldKind::Hours | FieldKind::Days)
    }
}

/// A field whose row is the same for every employee block on a sheet.
///
/// Variants are declared in detection priority order.
///
/// # Example
///
/// ```
/// use payroll_extract::models::{FieldKind, PayrollField};
///
/// assert_eq!(PayrollField::WorkHours.as_str(), "work_hours");
/// assert_eq!(PayrollField::WorkHours.kind(), FieldKind::Hours);
/// assert_eq!("gross_salary".parse::<PayrollField>(), Ok(PayrollField::GrossSalary));
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PayrollField {
    /// Employee identifier.
    EmployeeId,
    /// Employee name.
    EmployeeName,
    /// Pay period.
    Period,
    /// Days worked.
    WorkDays,
    /// Paid leave days taken.
    PaidLeaveDays,
    /// Days absent.
    AbsenceDays,
    /// Regular hours worked.
    WorkHours,
    /// Overtime hours, before the monthly threshold split.
    OvertimeHours,
    /// Late-night hours.
    NightHours,
    /// Statutory holiday hours.
    HolidayHours,
    /// Paid leave hours.
    PaidLeaveHours,
    /// Late arrival and early departure hours.
    LateEarlyHours,
    /// Base salary.
    BaseSalary,
    /// Hourly wage printed on the sheet.
    HourlyWage,
    /// Overtime pay.
    OvertimePay,
    /// Late-night premium pay.
    NightPay,
    /// Holiday pay.
    HolidayPay,
    /// Commuting allowance.
    TransportAllowance,
    /// Total pay.
    GrossSalary,
    /// Health insurance premium.
    HealthInsurance,
    /// Welfare pension premium.
    WelfarePension,
    /// Employment insurance premium.
    EmploymentInsurance,
    /// Withholding income tax.
    IncomeTax,
    /// Resident tax.
    ResidentTax,
    /// Deduction for lateness, early leave or absence.
    LateEarlyDeduction,
    /// Deductions not otherwise classified.
    OtherDeductions,
    /// Total deductions.
    TotalDeductions,
    /// Net pay.
    NetSalary,
    /// Amount billed to the client, when the sheet states it.
    BillingAmount,
}

impl PayrollField {
    /// Every field, in detection priority order.
    pub const ALL: [PayrollField; 29] = [
        PayrollField::EmployeeId,
        PayrollField::EmployeeName,
        PayrollField::Period,
        PayrollField::WorkDays,
        PayrollField::PaidLeaveDays,
        PayrollField::AbsenceDays,
        PayrollField::WorkHours,
        PayrollField::OvertimeHours,
        PayrollField::NightHours,
        PayrollField::HolidayHours,
        PayrollField::PaidLeaveHours,
        PayrollField::LateEarlyHours,
        PayrollField::BaseSalary,
        PayrollField::HourlyWage,
        PayrollField::OvertimePay,
        PayrollField::NightPay,
        PayrollField::HolidayPay,
        PayrollField::TransportAllowance,
        PayrollField::GrossSalary,
        PayrollField::HealthInsurance,
        PayrollField::WelfarePension,
        PayrollField::EmploymentInsurance,
        PayrollField::IncomeTax,
        PayrollField::ResidentTax,
        PayrollField::LateEarlyDeduction,
        PayrollField::OtherDeductions,
        PayrollField::TotalDeductions,
        PayrollField::NetSalary,
        PayrollField::BillingAmount,
    ];

    /// The snake_case name used in templates and configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            PayrollField::EmployeeId => "employee_id",
            PayrollField::EmployeeName => "employee_name",
            PayrollField::Period => "period",
            PayrollField::WorkDays => "work_days",
            PayrollField::PaidLeaveDays => "paid_leave_days",
            PayrollField::AbsenceDays => "absence_days",
            PayrollField::WorkHours => "work_hours",
            PayrollField::OvertimeHours => "overtime_hours",
            PayrollField::NightHours => "night_hours",
            PayrollField::HolidayHours => "holiday_hours",
            PayrollField::PaidLeaveHours => "paid_leave_hours",
            PayrollField::LateEarlyHours => "late_early_hours",
            PayrollField::BaseSalary => "base_salary",
            PayrollField::HourlyWage => "hourly_wage",
            PayrollField::OvertimePay => "overtime_pay",
            PayrollField::NightPay => "night_pay",
            PayrollField::HolidayPay => "holiday_pay",
            PayrollField::TransportAllowance => "transport_allowance",
            PayrollField::GrossSalary => "gross_salary",
            PayrollField::HealthInsurance => "health_insurance",
            PayrollField::WelfarePension => "welfare_pension",
            PayrollField::EmploymentInsurance => "employment_insurance",
            PayrollField::IncomeTax => "income_tax",
            PayrollField::ResidentTax => "resident_tax",
            PayrollField::LateEarlyDeduction => "late_early_deduction",
            PayrollField::OtherDeductions => "other_deductions",
            PayrollField::TotalDeductions => "total_deductions",
            PayrollField::NetSalary => "net_salary",
            PayrollField::BillingAmount => "billing_amount",
        }
    }

    /// How the field's value cell is read.
    pub fn kind(self) -> FieldKind {
        match self {
            PayrollField::EmployeeId => FieldKind::Identifier,
            PayrollField::Period => FieldKind::Period,
            PayrollField::EmployeeName => FieldKind::Text,
            PayrollField::WorkDays | PayrollField::PaidLeaveDays | PayrollField::AbsenceDays => {
                FieldKind::Days
            }
            PayrollField::WorkHours
            | PayrollField::OvertimeHours
            | PayrollField::NightHours
            | PayrollField::HolidayHours
            | PayrollField::PaidLeaveHours
            | PayrollField::LateEarlyHours => FieldKind::Hours,
            _ => FieldKind::Amount,
        }
    }
}

impl fmt::Display for PayrollField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayrollField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PayrollField::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown payroll field: {}", s))
    }
}
