//! Label dictionaries for fixed fields and dynamic-zone categories.
//!
//! Both dictionaries are ordered lists evaluated first-match-wins. Keys are
//! stored normalized so lookups compare normalized labels against
//! normalized keys.

use std::collections::HashMap;

use crate::models::{DynamicCategory, PayrollField};

use super::normalize_label;

/// Substrings that mark a label as a payment line rather than a quantity.
pub const PAYMENT_INDICATORS: [&str; 9] = [
    "手当", "単価", "金額", "額", "給", "代", "料", "割増", "賃金",
];

/// Substrings that mark a label as allowance-like.
pub const ALLOWANCE_MARKERS: [&str; 3] = ["手当", "割増", "加算"];

/// Non-billable allowance names used when neither the template nor the
/// configuration supplies its own list.
pub const DEFAULT_NON_BILLABLE_LABELS: [&str; 5] =
    ["皆勤手当", "精勤手当", "住宅手当", "家族手当", "食事手当"];

fn builtin_field_labels(field: PayrollField) -> &'static [&'static str] {
    match field {
        PayrollField::EmployeeId => &[
            "従業員番号",
            "社員番号",
            "社員NO",
            "従業員NO",
            "社員コード",
            "従業員コード",
            "ID",
        ],
        PayrollField::EmployeeName => &["氏名", "従業員名", "社員名", "名前"],
        PayrollField::Period => &["支給年月", "対象年月", "給与年月", "支給月", "対象期間", "年月"],
        PayrollField::WorkDays => &["出勤日数", "労働日数", "就業日数"],
        PayrollField::PaidLeaveDays => &["有給日数", "有休日数", "有給休暇日数", "年休日数"],
        PayrollField::AbsenceDays => &["欠勤日数", "欠勤"],
        PayrollField::WorkHours => &[
            "労働時間",
            "就業時間",
            "実働時間",
            "勤務時間",
            "所定時間",
            "基本時間",
        ],
        PayrollField::OvertimeHours => &[
            "残業時間",
            "時間外時間",
            "普通残業時間",
            "時間外労働",
            "残業",
        ],
        PayrollField::NightHours => &["深夜時間", "深夜残業時間", "深夜労働時間", "深夜"],
        PayrollField::HolidayHours => &["休日出勤時間", "休日時間", "休出時間", "休日労働時間"],
        PayrollField::PaidLeaveHours => &["有給時間", "有休時間"],
        PayrollField::LateEarlyHours => &["遅早時間", "遅刻早退時間"],
        PayrollField::BaseSalary => &["基本給", "基本給与", "基本賃金"],
        PayrollField::HourlyWage => &["時給", "基本時給", "時間給"],
        PayrollField::OvertimePay => &["残業手当", "時間外手当", "普通残業手当", "残業代"],
        PayrollField::NightPay => &["深夜手当", "深夜残業手当", "深夜割増"],
        PayrollField::HolidayPay => &["休日手当", "休日出勤手当", "休出手当"],
        PayrollField::TransportAllowance => &["通勤手当", "交通費", "通勤費"],
        PayrollField::GrossSalary => &["総支給額", "支給合計", "総支給", "支給額合計"],
        PayrollField::HealthInsurance => &["健康保険", "健康保険料", "健保"],
        PayrollField::WelfarePension => &["厚生年金", "厚生年金保険", "厚生年金保険料"],
        PayrollField::EmploymentInsurance => &["雇用保険", "雇用保険料"],
        PayrollField::IncomeTax => &["所得税", "源泉所得税"],
        PayrollField::ResidentTax => &["住民税", "市民税"],
        PayrollField::LateEarlyDeduction => &["遅早控除", "欠勤控除"],
        PayrollField::OtherDeductions => &["その他控除"],
        PayrollField::TotalDeductions => &["控除合計", "控除額合計", "総控除額"],
        PayrollField::NetSalary => &["差引支給額", "差引支給", "手取り", "振込額", "差引額"],
        PayrollField::BillingAmount => &["請求金額", "請求額"],
    }
}

fn builtin_category_keys(category: DynamicCategory) -> &'static [&'static str] {
    match category {
        DynamicCategory::OvertimeOverThresholdPay => {
            &["60H超", "60時間超", "月60時間超", "超過残業"]
        }
        DynamicCategory::PaidLeave => &["有給", "有休", "年休"],
        DynamicCategory::NonBillableAllowance => &DEFAULT_NON_BILLABLE_LABELS,
        DynamicCategory::OtherBillableAllowance => &[
            "資格手当",
            "職務手当",
            "作業手当",
            "生産手当",
            "役職手当",
            "特別手当",
            "調整手当",
            "その他手当",
        ],
        DynamicCategory::RentDeduction => &["寮費", "家賃", "社宅", "住居費"],
        DynamicCategory::UtilitiesDeduction => &["光熱費", "水道", "電気代", "ガス代"],
        DynamicCategory::AdvancePayment => &["前貸", "前払", "仮払", "貸付"],
        DynamicCategory::MealDeduction => &["弁当", "食事", "食費", "給食"],
        DynamicCategory::YearEndAdjustment => &["年末調整", "年調"],
        DynamicCategory::GenericAllowance => &[],
    }
}

/// Returns true if a normalized label contains an allowance marker.
pub fn is_allowance_like(label: &str) -> bool {
    ALLOWANCE_MARKERS.iter().any(|m| label.contains(m))
}

/// Returns true if a normalized label contains a payment indicator.
pub fn has_payment_indicator(label: &str) -> bool {
    PAYMENT_INDICATORS.iter().any(|m| label.contains(m))
}

/// Ordered field -> candidate labels.
///
/// # Example
///
/// ```
/// use payroll_extract::detection::FieldDictionary;
/// use payroll_extract::models::PayrollField;
///
/// let dictionary = FieldDictionary::builtin();
/// assert!(dictionary.labels(PayrollField::BaseSalary).contains(&"基本給".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct FieldDictionary {
    entries: Vec<(PayrollField, Vec<String>)>,
}

impl FieldDictionary {
    /// The built-in dictionary.
    pub fn builtin() -> Self {
        let entries = PayrollField::ALL
            .iter()
            .map(|&field| {
                let labels = builtin_field_labels(field)
                    .iter()
                    .map(|l| normalize_label(l))
                    .collect();
                (field, labels)
            })
            .collect();
        Self { entries }
    }

    /// Appends extra candidate labels per field, after the built-in ones.
    pub fn with_extra_labels(mut self, extra: &HashMap<PayrollField, Vec<String>>) -> Self {
        for (field, labels) in self.entries.iter_mut() {
            if let Some(more) = extra.get(&*field) {
                for label in more {
                    let label = normalize_label(label);
                    if !label.is_empty() && !labels.contains(&label) {
                        labels.push(label);
                    }
                }
            }
        }
        self
    }

    /// The entries in priority order.
    pub fn entries(&self) -> &[(PayrollField, Vec<String>)] {
        &self.entries
    }

    /// The normalized candidate labels for one field.
    pub fn labels(&self, field: PayrollField) -> &[String] {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, labels)| labels.as_slice())
            .unwrap_or(&[])
    }

    /// Returns true if the normalized label exactly equals any candidate.
    pub fn is_exact_label(&self, label: &str) -> bool {
        self.entries
            .iter()
            .any(|(_, labels)| labels.iter().any(|l| l == label))
    }
}

impl Default for FieldDictionary {
    fn default() -> Self {
        Self::builtin()
    }
}

fn fixed_field_labels(fields: &FieldDictionary) -> Vec<String> {
    fields
        .entries()
        .iter()
        .flat_map(|(_, labels)| labels.iter().cloned())
        .collect()
}

/// Labels shorter than this never match by reverse containment.
const MIN_REVERSE_MATCH_CHARS: usize = 2;

/// Ordered (key, category) pairs for the dynamic zone.
///
/// # Example
///
/// ```
/// use payroll_extract::detection::CategoryDictionary;
/// use payroll_extract::models::DynamicCategory;
///
/// let dictionary = CategoryDictionary::builtin();
/// assert_eq!(dictionary.classify("寮費"), Some(DynamicCategory::RentDeduction));
/// assert_eq!(dictionary.classify("有給休暇手当"), Some(DynamicCategory::PaidLeave));
/// assert_eq!(dictionary.classify("備考"), None);
/// ```
#[derive(Debug, Clone)]
pub struct CategoryDictionary {
    entries: Vec<(String, DynamicCategory)>,
    fixed_labels: Vec<String>,
}

impl CategoryDictionary {
    const ORDER: [DynamicCategory; 9] = [
        DynamicCategory::OvertimeOverThresholdPay,
        DynamicCategory::PaidLeave,
        DynamicCategory::NonBillableAllowance,
        DynamicCategory::OtherBillableAllowance,
        DynamicCategory::RentDeduction,
        DynamicCategory::UtilitiesDeduction,
        DynamicCategory::AdvancePayment,
        DynamicCategory::MealDeduction,
        DynamicCategory::YearEndAdjustment,
    ];

    /// The built-in dictionary with the default non-billable names.
    pub fn builtin() -> Self {
        let defaults: Vec<String> = DEFAULT_NON_BILLABLE_LABELS
            .iter()
            .map(|s| s.to_string())
            .collect();
        Self::with_non_billable(&defaults)
    }

    /// Builds the dictionary, using `non_billable` in place of the default
    /// non-billable names.
    pub fn with_non_billable(non_billable: &[String]) -> Self {
        let mut entries = Vec::new();
        for category in Self::ORDER {
            if category == DynamicCategory::NonBillableAllowance {
                for label in non_billable {
                    let key = normalize_label(label);
                    if !key.is_empty() {
                        entries.push((key, category));
                    }
                }
                continue;
            }
            for key in builtin_category_keys(category) {
                entries.push((normalize_label(key), category));
            }
        }
        Self {
            entries,
            fixed_labels: fixed_field_labels(&FieldDictionary::builtin()),
        }
    }

    /// Uses the labels of `fields` as the fixed-field names that never fall
    /// into the generic allowance bucket.
    pub fn with_fixed_fields(mut self, fields: &FieldDictionary) -> Self {
        self.fixed_labels = fixed_field_labels(fields);
        self
    }

    /// Returns true if the normalized label names a fixed field, such as
    /// `通勤手当` or `残業手当`.
    pub fn is_fixed_label(&self, label: &str) -> bool {
        self.fixed_labels.iter().any(|l| l == label)
    }

    /// Classifies a normalized label by bidirectional containment.
    ///
    /// The label matches a key when it contains the key, or when the key
    /// contains the label and the label is not just an allowance suffix.
    pub fn classify(&self, label: &str) -> Option<DynamicCategory> {
        if label.is_empty() {
            return None;
        }
        let reverse_allowed = label.chars().count() >= MIN_REVERSE_MATCH_CHARS
            && !ALLOWANCE_MARKERS.contains(&label)
            && label != "控除";

        self.entries
            .iter()
            .find(|(key, _)| label.contains(key.as_str()) || (reverse_allowed && key.contains(label)))
            .map(|(_, category)| *category)
    }

    /// The entries in evaluation order.
    pub fn entries(&self) -> &[(String, DynamicCategory)] {
        &self.entries
    }
}

impl Default for CategoryDictionary {
    fn default() -> Self {
        Self::builtin()
    }
}
