//! Record assembly for one employee block.
//!
//! Combines the fixed-zone fields, the block's own dynamic-zone scan and the
//! employee master rates into a [`PayrollRecord`], then applies the
//! derivation rules.

use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::calculation::{BillableHours, calculate_billing, derive_gross_salary, split_overtime};
use crate::config::BillingConfig;
use crate::detection::{CategoryDictionary, is_employee_id, normalize_cell, scan_dynamic_zone};
use crate::grid::CellGrid;
use crate::models::{
    ColumnOffsets, ColumnRole, DayCounts, Deductions, DynamicCategory, EmployeeDirectory,
    FieldKind, HourBuckets, PayComponents, PayrollField, PayrollRecord,
};

use super::FieldRows;
use super::period::parse_period;

/// Everything a block needs that is shared by every block of a sheet.
pub struct BlockContext<'a> {
    /// The worksheet.
    pub grid: &'a dyn CellGrid,
    /// Field rows in effect for the sheet.
    pub rows: &'a FieldRows,
    /// Column deltas relative to a block origin.
    pub offsets: &'a ColumnOffsets,
    /// Rows rescanned for allowances and deductions.
    pub dynamic_rows: &'a BTreeSet<u32>,
    /// Dynamic-zone category dictionary.
    pub categories: &'a CategoryDictionary,
    /// Billing multipliers and overtime threshold.
    pub billing: &'a BillingConfig,
    /// Employee master rates.
    pub directory: &'a dyn EmployeeDirectory,
    /// A period printed once for the whole sheet, used when a block's period
    /// cell is empty.
    pub sheet_period: Option<&'a str>,
}

/// What became of one block.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockOutcome {
    /// A record was assembled.
    Record {
        /// The record.
        record: Box<PayrollRecord>,
        /// True when the employee master had no rates for the identifier.
        rate_missing: bool,
    },
    /// The block has no valid identifier or period.
    Skipped {
        /// Why the block was skipped.
        reason: String,
    },
    /// The block has an identifier but no usable values.
    Empty {
        /// The block's identifier.
        employee_id: String,
    },
}

impl BlockContext<'_> {
    fn column(&self, origin: u32, role: ColumnRole) -> Option<u32> {
        self.offsets.column(origin, role)
    }

    /// Reads a numeric field; the second value tells whether the cell held a
    /// non-zero number.
    fn read_field(&self, origin: u32, field: PayrollField) -> (Decimal, bool) {
        let Some(row) = self.rows.row(field) else {
            return (Decimal::ZERO, false);
        };
        let value_column = origin + self.offsets.value;

        let value = match field.kind() {
            FieldKind::Hours => {
                let mut hours = self.grid.hours(row, value_column);
                if let Some(minutes_column) = self.column(origin, ColumnRole::Minutes) {
                    hours += self.grid.number(row, minutes_column) / Decimal::from(60);
                }
                hours
            }
            FieldKind::Days => {
                let days_column = origin + self.offsets.days;
                match self.grid.cell(row, days_column).as_decimal() {
                    Some(days) if !days.is_zero() => days,
                    _ => self.grid.number(row, value_column),
                }
            }
            FieldKind::Amount => self.grid.number(row, value_column),
            FieldKind::Identifier | FieldKind::Period | FieldKind::Text => Decimal::ZERO,
        };
        (value, !value.is_zero())
    }

    fn read_employee_id(&self, origin: u32) -> Option<String> {
        let row = self.rows.row(PayrollField::EmployeeId)?;
        let token = normalize_cell(self.grid.cell(row, origin + self.offsets.employee_id));
        is_employee_id(&token).then_some(token)
    }

    /// A period cell that is present but unparsable skips the block; only an
    /// empty cell falls back to the sheet-wide period.
    fn read_period(&self, origin: u32) -> Option<String> {
        let cell = self
            .rows
            .row(PayrollField::Period)
            .map(|row| self.grid.cell(row, origin + self.offsets.period));
        match cell {
            Some(cell) if !cell.is_empty() => parse_period(cell),
            _ => self.sheet_period.map(str::to_string),
        }
    }

    fn read_name(&self, origin: u32) -> Option<String> {
        let row = self.rows.row(PayrollField::EmployeeName)?;
        let name = self.grid.text(row, origin + self.offsets.value);
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}

/// Assembles the record for the block at `origin`.
pub fn assemble_block(context: &BlockContext<'_>, origin: u32) -> BlockOutcome {
    let Some(employee_id) = context.read_employee_id(origin) else {
        return BlockOutcome::Skipped {
            reason: format!("no employee identifier for block at column {}", origin),
        };
    };
    let Some(period) = context.read_period(origin) else {
        return BlockOutcome::Skipped {
            reason: format!(
                "no readable period for employee {} at column {}",
                employee_id, origin
            ),
        };
    };

    let mut usable = 0usize;
    let mut read = |field: PayrollField| {
        let (value, present) = context.read_field(origin, field);
        if present {
            usable += 1;
        }
        value
    };

    let work_hours = read(PayrollField::WorkHours);
    let raw_overtime = read(PayrollField::OvertimeHours);
    let night_hours = read(PayrollField::NightHours);
    let holiday_hours = read(PayrollField::HolidayHours);
    let paid_leave_hours = read(PayrollField::PaidLeaveHours);
    let late_early_hours = read(PayrollField::LateEarlyHours);
    let work_days = read(PayrollField::WorkDays);
    let paid_leave_days = read(PayrollField::PaidLeaveDays);
    let absence_days = read(PayrollField::AbsenceDays);
    let base_salary = read(PayrollField::BaseSalary);
    let hourly_wage = read(PayrollField::HourlyWage);
    let overtime_pay = read(PayrollField::OvertimePay);
    let night_pay = read(PayrollField::NightPay);
    let holiday_pay = read(PayrollField::HolidayPay);
    let transport_allowance = read(PayrollField::TransportAllowance);
    let sheet_gross = read(PayrollField::GrossSalary);
    let health_insurance = read(PayrollField::HealthInsurance);
    let welfare_pension = read(PayrollField::WelfarePension);
    let employment_insurance = read(PayrollField::EmploymentInsurance);
    let income_tax = read(PayrollField::IncomeTax);
    let resident_tax = read(PayrollField::ResidentTax);
    let late_early_deduction = read(PayrollField::LateEarlyDeduction);
    let other_deductions = read(PayrollField::OtherDeductions);
    let sheet_total_deductions = read(PayrollField::TotalDeductions);
    let sheet_net = read(PayrollField::NetSalary);
    let provided_billing = read(PayrollField::BillingAmount);

    let dynamic = scan_dynamic_zone(
        context.grid,
        origin,
        context.offsets,
        context.dynamic_rows,
        context.categories,
    );
    usable += dynamic.entries.iter().filter(|e| !e.amount.is_zero()).count();

    if usable == 0 {
        return BlockOutcome::Empty { employee_id };
    }

    let overtime = split_overtime(raw_overtime, context.billing.overtime_threshold_hours, 1);

    let hours = HourBuckets {
        regular: work_hours,
        overtime: overtime.overtime_hours,
        overtime_over_threshold: overtime.over_threshold_hours,
        night: night_hours,
        holiday: holiday_hours,
        paid_leave: paid_leave_hours,
        late_early: late_early_hours,
    };

    let days = DayCounts {
        work: work_days,
        paid_leave: paid_leave_days + dynamic.paid_leave_days,
        absence: absence_days,
    };

    let pay = PayComponents {
        base_salary,
        hourly_wage,
        overtime_pay,
        overtime_over_threshold_pay: dynamic.total(DynamicCategory::OvertimeOverThresholdPay),
        night_pay,
        holiday_pay,
        paid_leave_amount: dynamic.total(DynamicCategory::PaidLeave),
        transport_allowance,
        non_billable_allowances: dynamic.total(DynamicCategory::NonBillableAllowance),
        other_billable_allowances: dynamic.total(DynamicCategory::OtherBillableAllowance),
    };

    let mut deductions = Deductions {
        health_insurance,
        welfare_pension,
        employment_insurance,
        income_tax,
        resident_tax,
        late_early: late_early_deduction,
        rent: dynamic.total(DynamicCategory::RentDeduction),
        utilities: dynamic.total(DynamicCategory::UtilitiesDeduction),
        advance_payment: dynamic.total(DynamicCategory::AdvancePayment),
        meal: dynamic.total(DynamicCategory::MealDeduction),
        year_end_adjustment: dynamic.total(DynamicCategory::YearEndAdjustment),
        other: other_deductions,
        total: Decimal::ZERO,
    };
    deductions.total = if sheet_total_deductions.is_zero() {
        deductions.itemised_sum()
    } else {
        sheet_total_deductions
    };

    let gross = derive_gross_salary(sheet_gross, &pay, 2);
    let net_salary = if sheet_net.is_zero() {
        gross.gross_salary - deductions.total
    } else {
        sheet_net
    };

    let rates = context.directory.rates(&employee_id);
    let rate_missing = rates.is_none();
    let rates = rates.unwrap_or_default();

    let billing = calculate_billing(
        &BillableHours {
            regular: hours.regular,
            overtime: hours.overtime,
            over_threshold: hours.overtime_over_threshold,
            night: hours.night,
            holiday: hours.holiday,
        },
        rates.billing_rate,
        pay.other_billable_allowances,
        provided_billing,
        context.billing,
        3,
    );

    let record = PayrollRecord {
        employee_id,
        employee_name: context.read_name(origin),
        period,
        factory_identifier: context.grid.name().to_string(),
        source_column: origin,
        hours,
        days,
        pay,
        deductions,
        gross_salary: gross.gross_salary,
        net_salary,
        billing_rate: rates.billing_rate,
        hourly_rate: rates.hourly_rate,
        billing_amount: billing.amount,
        transport_included_in_gross: gross.transport_included,
        allowance_details: dynamic.breadcrumbs(),
        audit_trail: vec![overtime.audit_step, gross.audit_step, billing.audit_step],
    };

    BlockOutcome::Record {
        record: Box::new(record),
        rate_missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::grid::Sheet;
    use crate::models::{EmployeeRates, InMemoryEmployeeDirectory, LayoutSource};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn directory() -> InMemoryEmployeeDirectory {
        let mut directory = InMemoryEmployeeDirectory::new();
        directory.insert(
            "100001",
            EmployeeRates {
                billing_rate: dec("1700"),
                hourly_rate: dec("1250"),
            },
        );
        directory
    }

    /// A block at origin 1 using the fallback rows.
    fn block_sheet() -> Sheet {
        Sheet::new("第一工場")
            .with(2, 3, "2025年1月")
            .with(3, 3, "100001")
            .with(4, 3, "山田 太郎")
            .with(6, 2, 20)
            .with(9, 3, 160)
            .with(10, 3, 73)
            .with(11, 3, 10)
            .with(13, 3, 200000)
            .with(14, 3, 100000)
            .with(17, 3, 8000)
            .with(20, 1, "寮費")
            .with(20, 3, 30000)
            .with(21, 1, "皆勤手当")
            .with(21, 3, 5000)
            .with(22, 1, "班長手当")
            .with(22, 3, 3000)
            .with(23, 1, "有給休暇")
            .with(23, 2, 1)
            .with(23, 3, 10000)
    }

    fn assemble(sheet: &Sheet, directory: &InMemoryEmployeeDirectory) -> BlockOutcome {
        let config = EngineConfig::default();
        let rows = FieldRows::fallback_only(config.layout.fallback_rows.clone());
        let dynamic_rows: BTreeSet<u32> = config.dynamic_rows().collect();
        let categories = CategoryDictionary::with_non_billable(&config.non_billable_labels);
        let context = BlockContext {
            grid: sheet,
            rows: &rows,
            offsets: &config.layout.column_offsets,
            dynamic_rows: &dynamic_rows,
            categories: &categories,
            billing: &config.billing,
            directory,
            sheet_period: None,
        };
        assemble_block(&context, 1)
    }

    fn record(outcome: BlockOutcome) -> (PayrollRecord, bool) {
        match outcome {
            BlockOutcome::Record {
                record,
                rate_missing,
            } => (*record, rate_missing),
            other => panic!("Expected a record, got {:?}", other),
        }
    }

    /// RA-001: fixed and dynamic values land in the right buckets
    #[test]
    fn test_ra_001_full_block() {
        let (record, rate_missing) = record(assemble(&block_sheet(), &directory()));

        assert!(!rate_missing);
        assert_eq!(record.employee_id, "100001");
        assert_eq!(record.employee_name.as_deref(), Some("山田 太郎"));
        assert_eq!(record.period, "2025-01");
        assert_eq!(record.factory_identifier, "第一工場");
        assert_eq!(record.source_column, 1);
        assert_eq!(record.days.work, dec("20"));
        assert_eq!(record.days.paid_leave, dec("1"));
        assert_eq!(record.hours.regular, dec("160"));
        assert_eq!(record.hours.overtime, dec("60"));
        assert_eq!(record.hours.overtime_over_threshold, dec("13"));
        assert_eq!(record.deductions.rent, dec("30000"));
        assert_eq!(record.pay.non_billable_allowances, dec("5000"));
        assert_eq!(record.pay.other_billable_allowances, dec("3000"));
        assert_eq!(record.pay.paid_leave_amount, dec("10000"));
        assert_eq!(record.allowance_details.len(), 4);
        assert_eq!(record.audit_trail.len(), 3);
    }

    /// RA-002: billing excludes transport, non-billable and paid leave
    #[test]
    fn test_ra_002_billing_exclusions() {
        let (record, _) = record(assemble(&block_sheet(), &directory()));
        // 160*1700 + 60*1700*1.25 + 13*1700*1.5 + 10*1700*0.25 + 3000
        // = 272000 + 127500 + 33150 + 4250 + 3000
        assert_eq!(record.billing_amount, dec("439900"));
    }

    /// RA-003: gross and net are derived when the sheet omits them
    #[test]
    fn test_ra_003_derived_gross_and_net() {
        let (record, _) = record(assemble(&block_sheet(), &directory()));
        // 200000 + 100000 + 10000 + 8000 + 5000 + 3000
        assert_eq!(record.gross_salary, dec("326000"));
        assert_eq!(record.deductions.total, dec("30000"));
        assert_eq!(record.net_salary, dec("296000"));
        assert!(record.transport_included_in_gross);
    }

    /// RA-004: unknown employees bill at zero and are flagged
    #[test]
    fn test_ra_004_missing_rate() {
        let (record, rate_missing) =
            record(assemble(&block_sheet(), &InMemoryEmployeeDirectory::new()));
        assert!(rate_missing);
        assert_eq!(record.billing_rate, Decimal::ZERO);
        assert_eq!(record.billing_amount, Decimal::ZERO);
    }

    /// RA-005: invalid identifier or period skips the block
    #[test]
    fn test_ra_005_skips_invalid_identity() {
        let bad_id = block_sheet().with(3, 3, "10001");
        assert!(matches!(
            assemble(&bad_id, &directory()),
            BlockOutcome::Skipped { .. }
        ));

        let bad_period = block_sheet().with(2, 3, "未定");
        assert!(matches!(
            assemble(&bad_period, &directory()),
            BlockOutcome::Skipped { .. }
        ));
    }

    /// RA-006: a block with nothing but identity is empty
    #[test]
    fn test_ra_006_empty_block() {
        let sheet = Sheet::new("s").with(2, 3, "2025/01").with(3, 3, 100001);
        assert_eq!(
            assemble(&sheet, &directory()),
            BlockOutcome::Empty {
                employee_id: "100001".to_string()
            }
        );
    }

    /// RA-007: printed totals take precedence over derived ones
    #[test]
    fn test_ra_007_printed_totals() {
        let sheet = block_sheet()
            .with(30, 3, 318000)
            .with(36, 3, 45000)
            .with(37, 3, 273000);
        let (record, _) = record(assemble(&sheet, &directory()));
        assert_eq!(record.gross_salary, dec("318000"));
        // 318000 is exactly the components without transport
        assert!(!record.transport_included_in_gross);
        assert_eq!(record.deductions.total, dec("45000"));
        assert_eq!(record.net_salary, dec("273000"));
    }

    /// RA-008: the minutes column adds to the hour value
    #[test]
    fn test_ra_008_minutes_column() {
        let sheet = Sheet::new("s")
            .with(2, 3, "2025/01")
            .with(3, 3, 100001)
            .with(9, 3, 160)
            .with(9, 4, 30);
        let config = EngineConfig::default();
        let offsets = ColumnOffsets {
            minutes: Some(3),
            ..config.layout.column_offsets
        };
        let rows = FieldRows::new(
            [(PayrollField::WorkHours, 9)].into_iter().collect(),
            config.layout.fallback_rows.clone(),
            LayoutSource::Detected,
        );
        let dynamic_rows = BTreeSet::new();
        let categories = CategoryDictionary::builtin();
        let directory = directory();
        let context = BlockContext {
            grid: &sheet,
            rows: &rows,
            offsets: &offsets,
            dynamic_rows: &dynamic_rows,
            categories: &categories,
            billing: &config.billing,
            directory: &directory,
            sheet_period: None,
        };
        let (record, _) = record(assemble_block(&context, 1));
        assert_eq!(record.hours.regular, dec("160.5"));
    }

    /// RA-009: a sheet-wide period covers blocks without one
    #[test]
    fn test_ra_009_sheet_period() {
        let sheet = block_sheet().with(2, 3, "");
        let config = EngineConfig::default();
        let rows = FieldRows::fallback_only(config.layout.fallback_rows.clone());
        let dynamic_rows: BTreeSet<u32> = config.dynamic_rows().collect();
        let categories = CategoryDictionary::builtin();
        let directory = directory();
        let context = BlockContext {
            grid: &sheet,
            rows: &rows,
            offsets: &config.layout.column_offsets,
            dynamic_rows: &dynamic_rows,
            categories: &categories,
            billing: &config.billing,
            directory: &directory,
            sheet_period: Some("2025-02"),
        };
        let (record, _) = record(assemble_block(&context, 1));
        assert_eq!(record.period, "2025-02");
    }

    /// RA-010: an unparsable period cell skips the block even with a sheet period
    #[test]
    fn test_ra_010_unparsable_period_skips() {
        let sheet = block_sheet().with(2, 3, "未定");
        let config = EngineConfig::default();
        let rows = FieldRows::fallback_only(config.layout.fallback_rows.clone());
        let dynamic_rows: BTreeSet<u32> = config.dynamic_rows().collect();
        let categories = CategoryDictionary::builtin();
        let directory = directory();
        let context = BlockContext {
            grid: &sheet,
            rows: &rows,
            offsets: &config.layout.column_offsets,
            dynamic_rows: &dynamic_rows,
            categories: &categories,
            billing: &config.billing,
            directory: &directory,
            sheet_period: Some("2025-02"),
        };
        assert!(matches!(
            assemble_block(&context, 1),
            BlockOutcome::Skipped { .. }
        ));
    }
}
