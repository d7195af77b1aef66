//! The extraction engine.
//!
//! [`PayrollExtractor`] walks a workbook sheet by sheet. For each sheet it
//! resolves a layout (a trusted template, a fresh detection, or the fallback
//! rows), locates every employee block and assembles one record per block.

use std::collections::BTreeSet;
use std::iter;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::detection::{
    CategoryDictionary, FieldDictionary, FixedZoneDetection, FixedZoneOptions,
    detect_fixed_zone, discover_categories, find_identifier_row, locate_employee_blocks,
    normalize_label,
};
use crate::error::EngineResult;
use crate::grid::{CellGrid, Sheet, Workbook, read_workbook_bytes, read_workbook_path};
use crate::models::{
    ColumnOffsets, EmployeeDirectory, LayoutSource, ParseReport, ParseWarning, PayrollField,
    PayrollRecord, Severity, SheetSummary, WarningKind,
};
use crate::template::{NewTemplate, Template, TemplateStore};

use super::FieldRows;
use super::assembler::{BlockContext, BlockOutcome, assemble_block};
use super::period::parse_period;

/// Extracts payroll records from statement workbooks.
///
/// The extractor holds no per-parse state; one instance can serve any number
/// of parses, including concurrent ones.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use payroll_extract::config::EngineConfig;
/// use payroll_extract::extraction::PayrollExtractor;
/// use payroll_extract::grid::{Sheet, Workbook};
/// use payroll_extract::models::InMemoryEmployeeDirectory;
/// use payroll_extract::template::InMemoryTemplateStore;
///
/// let extractor = PayrollExtractor::new(
///     EngineConfig::default(),
///     Arc::new(InMemoryTemplateStore::new()),
///     Arc::new(InMemoryEmployeeDirectory::new()),
/// );
///
/// let sheet = Sheet::new("第一工場")
///     .with(2, 3, "2025年1月")
///     .with(3, 3, "100001")
///     .with(9, 3, 160);
/// let report = extractor.parse_workbook(&Workbook::new(vec![sheet]));
///
/// assert_eq!(report.records.len(), 1);
/// assert_eq!(report.records[0].period, "2025-01");
/// ```
pub struct PayrollExtractor {
    config: EngineConfig,
    fields: FieldDictionary,
    templates: Arc<dyn TemplateStore>,
    directory: Arc<dyn EmployeeDirectory>,
}

/// The layout chosen for one sheet.
struct SheetLayout {
    rows: FieldRows,
    offsets: ColumnOffsets,
    origins: Vec<u32>,
    dynamic_rows: BTreeSet<u32>,
    non_billable_labels: Vec<String>,
    confidence: f64,
    template_identifier: Option<String>,
    /// Set when a fresh detection is good enough to be written back.
    pending_template: Option<NewTemplate>,
}

/// What one sheet contributed to the report.
struct SheetOutcome {
    summary: SheetSummary,
    records: Vec<PayrollRecord>,
    warnings: Vec<ParseWarning>,
}

impl PayrollExtractor {
    /// Creates an extractor.
    ///
    /// # Arguments
    ///
    /// * `config` - Engine configuration
    /// * `templates` - Where learned layouts are read from and written to
    /// * `directory` - Employee master used for billing rates
    pub fn new(
        config: EngineConfig,
        templates: Arc<dyn TemplateStore>,
        directory: Arc<dyn EmployeeDirectory>,
    ) -> Self {
        let fields = FieldDictionary::builtin().with_extra_labels(&config.extra_labels);
        Self {
            config,
            fields,
            templates,
            directory,
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parses a workbook from raw file bytes.
    ///
    /// Fails only when the container itself cannot be opened.
    pub fn parse_bytes(&self, bytes: &[u8]) -> EngineResult<ParseReport> {
        let workbook = read_workbook_bytes(bytes)?;
        Ok(self.parse_workbook(&workbook))
    }

    /// Parses a workbook file.
    pub fn parse_path<P: AsRef<Path>>(&self, path: P) -> EngineResult<ParseReport> {
        let workbook = read_workbook_path(path)?;
        Ok(self.parse_workbook(&workbook))
    }

    /// Parses an in-memory workbook.
    ///
    /// Never fails: every problem with sheet content is reported as a
    /// warning, and records come back in sheet order, then block order.
    pub fn parse_workbook(&self, workbook: &Workbook) -> ParseReport {
        let started = Instant::now();
        let parse_id = Uuid::new_v4();
        let mut records = Vec::new();
        let mut warnings = Vec::new();
        let mut sheets = Vec::new();

        for unreadable in workbook.unreadable() {
            warnings.push(ParseWarning::for_sheet(
                WarningKind::UnreadableSheet,
                &unreadable.name,
                format!("Sheet could not be decoded: {}", unreadable.reason),
                Severity::Medium,
            ));
        }

        for sheet in workbook.sheets() {
            if self.is_excluded(sheet.name()) {
                debug!(sheet = %sheet.name(), "Skipping excluded sheet");
                continue;
            }
            let outcome = self.parse_sheet(sheet);
            records.extend(outcome.records);
            warnings.extend(outcome.warnings);
            sheets.push(outcome.summary);
        }

        let duration_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        info!(
            parse_id = %parse_id,
            sheets = sheets.len(),
            records = records.len(),
            warnings = warnings.len(),
            duration_us,
            "Parsed workbook"
        );

        ParseReport {
            parse_id,
            parsed_at: Utc::now(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            records,
            warnings,
            sheets,
            duration_us,
        }
    }

    fn is_excluded(&self, sheet_name: &str) -> bool {
        let name = normalize_label(sheet_name);
        self.config
            .excluded_sheets
            .iter()
            .map(|excluded| normalize_label(excluded))
            .any(|excluded| !excluded.is_empty() && name.contains(&excluded))
    }

    fn parse_sheet(&self, sheet: &Sheet) -> SheetOutcome {
        let name = sheet.name().to_string();
        let mut warnings = Vec::new();

        let template = match self.templates.find_matching(&name) {
            Ok(template) => template,
            Err(e) => {
                warn!(sheet = %name, error = %e, "Template lookup failed");
                warnings.push(ParseWarning::for_sheet(
                    WarningKind::TemplateStoreFailure,
                    &name,
                    format!("Template lookup failed: {}", e),
                    Severity::Medium,
                ));
                None
            }
        };

        // A re-detected layout replaces the untrusted template it was matched
        // to, even when the match was fuzzy.
        let mut replaces = None;
        let trusted = match template {
            Some(t) if t.is_trusted(self.config.detection.trust_threshold) => Some(t),
            Some(t) => {
                warnings.push(ParseWarning::for_sheet(
                    WarningKind::UntrustedTemplate,
                    &name,
                    format!(
                        "Template '{}' has confidence {:.2}, below {:.2}; re-detecting",
                        t.factory_identifier,
                        t.detection_confidence,
                        self.config.detection.trust_threshold
                    ),
                    Severity::Low,
                ));
                replaces = Some(t.factory_identifier);
                None
            }
            None => None,
        };

        let layout = match trusted {
            Some(template) => self.template_layout(sheet, template),
            None => self.detected_layout(sheet, &mut warnings),
        };

        let Some(mut layout) = layout else {
            warn!(sheet = %name, "No employee identifiers found");
            warnings.push(ParseWarning::for_sheet(
                WarningKind::UnusableSheet,
                &name,
                "No 6-digit employee identifiers were found; sheet skipped",
                Severity::High,
            ));
            return SheetOutcome {
                summary: SheetSummary {
                    sheet: name,
                    layout_source: LayoutSource::Fallback,
                    template_identifier: None,
                    confidence: 0.0,
                    blocks_found: 0,
                    records_emitted: 0,
                    template_saved: false,
                },
                records: Vec::new(),
                warnings,
            };
        };

        let records = self.assemble_sheet(sheet, &layout, &mut warnings);

        let mut template_saved = false;
        if let Some(mut new_template) = layout.pending_template.take() {
            if let Some(identifier) = replaces {
                new_template.factory_identifier = identifier;
            }
            if let Some(first) = records.first() {
                new_template.sample_employee_id = Some(first.employee_id.clone());
                new_template.sample_period = Some(first.period.clone());
            }
            match self.templates.save(new_template) {
                Ok(saved) => {
                    info!(
                        sheet = %name,
                        template = %saved.factory_identifier,
                        confidence = saved.detection_confidence,
                        "Saved template"
                    );
                    layout.template_identifier = Some(saved.factory_identifier);
                    template_saved = true;
                }
                Err(e) => {
                    warn!(sheet = %name, error = %e, "Template save failed");
                    warnings.push(ParseWarning::for_sheet(
                        WarningKind::TemplateStoreFailure,
                        &name,
                        format!("Template could not be saved: {}", e),
                        Severity::Medium,
                    ));
                }
            }
        }

        info!(
            sheet = %name,
            source = ?layout.rows.source(),
            blocks = layout.origins.len(),
            records = records.len(),
            "Parsed sheet"
        );

        SheetOutcome {
            summary: SheetSummary {
                sheet: name,
                layout_source: layout.rows.source(),
                template_identifier: layout.template_identifier,
                confidence: layout.confidence,
                blocks_found: layout.origins.len(),
                records_emitted: records.len(),
                template_saved,
            },
            records,
            warnings,
        }
    }

    /// Finds the identifier row and block origins.
    ///
    /// Candidates are tried in order: the template's row, the fallback row,
    /// then the row with the most identifiers near the top of the sheet. The
    /// first row yielding at least one block wins.
    fn locate_blocks(
        &self,
        sheet: &Sheet,
        template_row: Option<u32>,
        id_offset: u32,
    ) -> Option<(u32, Vec<u32>)> {
        let fallback_row = self
            .config
            .layout
            .fallback_rows
            .get(&PayrollField::EmployeeId)
            .copied();
        let scan_rows = self.config.detection.scan_rows;

        template_row
            .into_iter()
            .chain(fallback_row)
            .chain(iter::once_with(|| find_identifier_row(sheet, scan_rows)).flatten())
            .find_map(|row| {
                let origins = locate_employee_blocks(sheet, row, id_offset);
                (!origins.is_empty()).then_some((row, origins))
            })
    }

    fn template_layout(&self, sheet: &Sheet, template: Template) -> Option<SheetLayout> {
        let offsets = template.column_offsets;
        let template_row = template
            .field_positions
            .get(&PayrollField::EmployeeId)
            .copied();
        let (id_row, origins) = self.locate_blocks(sheet, template_row, offsets.employee_id)?;
        debug!(
            sheet = %sheet.name(),
            template = %template.factory_identifier,
            id_row,
            "Using stored template"
        );

        let mut positions = template.field_positions;
        positions.insert(PayrollField::EmployeeId, id_row);
        let rows = FieldRows::new(
            positions,
            self.config.layout.fallback_rows.clone(),
            LayoutSource::Template,
        );
        let dynamic_rows =
            self.dynamic_rows(&rows, template.dynamic_zone_categories.keys().copied());
        let non_billable_labels = if template.non_billable_labels.is_empty() {
            self.config.non_billable_labels.clone()
        } else {
            template.non_billable_labels
        };

        Some(SheetLayout {
            rows,
            offsets,
            origins,
            dynamic_rows,
            non_billable_labels,
            confidence: template.detection_confidence,
            template_identifier: Some(template.factory_identifier),
            pending_template: None,
        })
    }

    fn detected_layout(
        &self,
        sheet: &Sheet,
        warnings: &mut Vec<ParseWarning>,
    ) -> Option<SheetLayout> {
        let offsets = self.config.layout.column_offsets;
        let (mut id_row, mut origins) = self.locate_blocks(sheet, None, offsets.employee_id)?;
        let mut detection = self.detect(sheet, &origins, &offsets);

        // A labelled identifier row that also holds identifiers beats the
        // provisional one.
        if let Some(&labelled_row) = detection.positions.get(&PayrollField::EmployeeId) {
            if labelled_row != id_row {
                let relocated = locate_employee_blocks(sheet, labelled_row, offsets.employee_id);
                if !relocated.is_empty() {
                    id_row = labelled_row;
                    if relocated != origins {
                        origins = relocated;
                        detection = self.detect(sheet, &origins, &offsets);
                    }
                }
            }
        }

        let required = &self.config.detection.required_fields;
        let confidence = detection.confidence(required);
        let non_billable_labels = self.config.non_billable_labels.clone();

        if confidence < self.config.detection.min_confidence_to_save {
            let missing: Vec<&str> = detection
                .missing(required)
                .into_iter()
                .map(PayrollField::as_str)
                .collect();
            warnings.push(ParseWarning::for_sheet(
                WarningKind::LowConfidence,
                sheet.name(),
                format!(
                    "Detection confidence {:.2} is below {:.2} (missing: {}); using fallback rows",
                    confidence,
                    self.config.detection.min_confidence_to_save,
                    missing.join(", ")
                ),
                Severity::Medium,
            ));

            let mut fallback = self.config.layout.fallback_rows.clone();
            fallback.insert(PayrollField::EmployeeId, id_row);
            let rows = FieldRows::fallback_only(fallback);
            let dynamic_rows =
                self.dynamic_rows(&rows, detection.other_allowances.keys().copied());
            return Some(SheetLayout {
                rows,
                offsets,
                origins,
                dynamic_rows,
                non_billable_labels,
                confidence,
                template_identifier: None,
                pending_template: None,
            });
        }

        let mut positions = detection.positions;
        positions.insert(PayrollField::EmployeeId, id_row);
        let rows = FieldRows::new(
            positions.clone(),
            self.config.layout.fallback_rows.clone(),
            LayoutSource::Detected,
        );
        let dynamic_rows = self.dynamic_rows(&rows, detection.other_allowances.keys().copied());

        let categories = CategoryDictionary::with_non_billable(&non_billable_labels)
            .with_fixed_fields(&self.fields);
        let label_columns = label_columns(&origins, &offsets);
        let mut template = NewTemplate::new(sheet.name(), positions, offsets, confidence);
        template.dynamic_zone_categories =
            discover_categories(sheet, &label_columns, &dynamic_rows, &categories);
        template.non_billable_labels = non_billable_labels.clone();
        template.employee_block_width = block_width(&origins)
            .unwrap_or(self.config.layout.employee_block_width);

        Some(SheetLayout {
            rows,
            offsets,
            origins,
            dynamic_rows,
            non_billable_labels,
            confidence,
            template_identifier: None,
            pending_template: Some(template),
        })
    }

    fn detect(&self, sheet: &Sheet, origins: &[u32], offsets: &ColumnOffsets) -> FixedZoneDetection {
        detect_fixed_zone(
            sheet,
            &label_columns(origins, offsets),
            &self.fields,
            FixedZoneOptions {
                scan_rows: self.config.detection.scan_rows,
                non_billable_labels: &self.config.non_billable_labels,
            },
        )
    }

    /// The configured window plus `extra` rows, minus rows claimed by fixed
    /// fields.
    fn dynamic_rows(&self, rows: &FieldRows, extra: impl Iterator<Item = u32>) -> BTreeSet<u32> {
        let claimed = rows.claimed_rows();
        self.config
            .dynamic_rows()
            .chain(extra)
            .filter(|row| !claimed.contains(row))
            .collect()
    }

    fn assemble_sheet(
        &self,
        sheet: &Sheet,
        layout: &SheetLayout,
        warnings: &mut Vec<ParseWarning>,
    ) -> Vec<PayrollRecord> {
        let sheet_period = sheet_period(sheet, &layout.rows);
        let categories = CategoryDictionary::with_non_billable(&layout.non_billable_labels)
            .with_fixed_fields(&self.fields);
        let context = BlockContext {
            grid: sheet,
            rows: &layout.rows,
            offsets: &layout.offsets,
            dynamic_rows: &layout.dynamic_rows,
            categories: &categories,
            billing: &self.config.billing,
            directory: self.directory.as_ref(),
            sheet_period: sheet_period.as_deref(),
        };

        let mut records = Vec::with_capacity(layout.origins.len());
        for &origin in &layout.origins {
            match assemble_block(&context, origin) {
                BlockOutcome::Record {
                    record,
                    rate_missing,
                } => {
                    if rate_missing {
                        warnings.push(ParseWarning::for_sheet(
                            WarningKind::MissingRate,
                            sheet.name(),
                            format!(
                                "No billing rate for employee {}; billed at zero",
                                record.employee_id
                            ),
                            Severity::Low,
                        ));
                    }
                    records.push(*record);
                }
                BlockOutcome::Skipped { reason } => {
                    debug!(sheet = %sheet.name(), origin, %reason, "Skipped block");
                    warnings.push(ParseWarning::for_sheet(
                        WarningKind::BlockSkipped,
                        sheet.name(),
                        reason,
                        Severity::Low,
                    ));
                }
                BlockOutcome::Empty { employee_id } => {
                    debug!(sheet = %sheet.name(), origin, %employee_id, "Dropped empty block");
                    warnings.push(ParseWarning::for_sheet(
                        WarningKind::EmptyBlock,
                        sheet.name(),
                        format!("Employee {} has no values; dropped", employee_id),
                        Severity::Low,
                    ));
                }
            }
        }
        records
    }
}

fn label_columns(origins: &[u32], offsets: &ColumnOffsets) -> Vec<u32> {
    origins.iter().map(|origin| origin + offsets.label).collect()
}

fn block_width(origins: &[u32]) -> Option<u32> {
    match origins {
        [first, second, ..] => Some(second - first),
        _ => None,
    }
}

/// The first readable period on the period row, left to right.
fn sheet_period(sheet: &Sheet, rows: &FieldRows) -> Option<String> {
    let row = rows.row(PayrollField::Period)?;
    (1..=sheet.max_column()).find_map(|column| parse_period(sheet.cell(row, column)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::grid::UnreadableSheet;
    use crate::models::{EmployeeRates, InMemoryEmployeeDirectory};
    use crate::template::{InMemoryTemplateStore, TemplateStats};
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn directory() -> InMemoryEmployeeDirectory {
        let mut directory = InMemoryEmployeeDirectory::new();
        for id in ["100001", "100002"] {
            directory.insert(
                id,
                EmployeeRates {
                    billing_rate: dec("1700"),
                    hourly_rate: dec("1250"),
                },
            );
        }
        directory
    }

    fn extractor(store: Arc<dyn TemplateStore>) -> PayrollExtractor {
        PayrollExtractor::new(EngineConfig::default(), store, Arc::new(directory()))
    }

    /// Writes one block's values at `origin`.
    fn block_values(sheet: Sheet, origin: u32, id: &str, overtime: i64, rent: i64) -> Sheet {
        let value = origin + 2;
        sheet
            .with(2, value, "2025年1月")
            .with(3, value, id)
            .with(6, origin + 1, 20)
            .with(9, value, 160)
            .with(10, value, overtime)
            .with(13, value, 200000)
            .with(17, value, 8000)
            .with(20, value, rent)
            .with(21, value, 5000)
            .with(30, value, 250000)
            .with(37, value, 200000)
    }

    /// Writes one block's labels at `origin`.
    fn block_labels(sheet: Sheet, origin: u32, rent_label: &str) -> Sheet {
        sheet
            .with(2, origin, "支給年月")
            .with(3, origin, "従業員番号")
            .with(6, origin, "出勤日数")
            .with(9, origin, "労働時間")
            .with(10, origin, "残業時間")
            .with(13, origin, "基本給")
            .with(17, origin, "通勤手当")
            .with(20, origin, rent_label)
            .with(21, origin, "皆勤手当")
            .with(30, origin, "総支給額")
            .with(37, origin, "差引支給額")
    }

    /// Two labelled blocks six columns apart.
    fn labelled_sheet(name: &str) -> Sheet {
        let sheet = block_labels(Sheet::new(name), 1, "寮費");
        let sheet = block_labels(sheet, 7, "寮費");
        let sheet = block_values(sheet, 1, "100001", 0, 30000);
        block_values(sheet, 7, "100002", 0, 30000)
    }

    fn single(sheet: Sheet) -> Workbook {
        Workbook::new(vec![sheet])
    }

    /// A store whose every call fails.
    struct BrokenStore;

    fn broken() -> EngineError {
        EngineError::TemplateStore {
            message: "disk full".to_string(),
        }
    }

    impl TemplateStore for BrokenStore {
        fn save(&self, _template: NewTemplate) -> EngineResult<Template> {
            Err(broken())
        }
        fn load(&self, _identifier: &str) -> EngineResult<Option<Template>> {
            Err(broken())
        }
        fn list(&self, _include_inactive: bool) -> EngineResult<Vec<Template>> {
            Err(broken())
        }
        fn deactivate(&self, _identifier: &str) -> EngineResult<bool> {
            Err(broken())
        }
        fn hard_delete(&self, _identifier: &str) -> EngineResult<bool> {
            Err(broken())
        }
        fn stats(&self) -> EngineResult<TemplateStats> {
            Err(broken())
        }
    }

    // ==========================================================================
    // ENG-001: fresh detection writes a template
    // ==========================================================================
    #[test]
    fn test_eng_001_detection_saves_template() {
        let store = Arc::new(InMemoryTemplateStore::new());
        let report = extractor(store.clone()).parse_workbook(&single(labelled_sheet("第一工場")));

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.sheets.len(), 1);
        let summary = &report.sheets[0];
        assert_eq!(summary.layout_source, LayoutSource::Detected);
        assert_eq!(summary.confidence, 1.0);
        assert_eq!(summary.blocks_found, 2);
        assert!(summary.template_saved);
        assert_eq!(summary.template_identifier.as_deref(), Some("第一工場"));

        let template = store.load("第一工場").unwrap().unwrap();
        assert_eq!(template.field_positions[&PayrollField::WorkHours], 9);
        assert_eq!(template.field_positions[&PayrollField::EmployeeId], 3);
        assert_eq!(template.employee_block_width, 6);
        assert_eq!(template.sample_employee_id.as_deref(), Some("100001"));
        assert_eq!(template.sample_period.as_deref(), Some("2025-01"));
        assert!(!template.dynamic_zone_categories.is_empty());
    }

    // ==========================================================================
    // ENG-002: a saved template is reused on the next parse
    // ==========================================================================
    #[test]
    fn test_eng_002_template_round_trip() {
        let store = Arc::new(InMemoryTemplateStore::new());
        let extractor = extractor(store.clone());
        extractor.parse_workbook(&single(labelled_sheet("第一工場")));
        let learned = store.load("第一工場").unwrap().unwrap();

        // Next month's sheet: the same layout without fixed labels
        let sheet = Sheet::new("第一工場 2025年2月")
            .with(20, 1, "寮費")
            .with(21, 1, "皆勤手当");
        let sheet = block_values(sheet, 1, "100001", 0, 30000);
        let report = extractor.parse_workbook(&single(sheet));

        let summary = &report.sheets[0];
        assert_eq!(summary.layout_source, LayoutSource::Template);
        assert_eq!(summary.template_identifier.as_deref(), Some("第一工場"));
        assert!(!summary.template_saved);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].hours.regular, dec("160"));
        assert_eq!(report.records[0].deductions.rent, dec("30000"));

        let after = store.load("第一工場").unwrap().unwrap();
        assert_eq!(after.field_positions, learned.field_positions);
        assert_eq!(after.column_offsets, learned.column_offsets);
        assert_eq!(after.detection_confidence, learned.detection_confidence);
    }

    // ==========================================================================
    // ENG-003: low confidence falls back and writes nothing
    // ==========================================================================
    #[test]
    fn test_eng_003_low_confidence_uses_fallback() {
        let store = Arc::new(InMemoryTemplateStore::new());
        let sheet = block_values(Sheet::new("第二工場"), 1, "100001", 0, 0);
        let report = extractor(store.clone()).parse_workbook(&single(sheet));

        assert_eq!(report.sheets[0].layout_source, LayoutSource::Fallback);
        assert!(!report.sheets[0].template_saved);
        assert_eq!(report.warnings_of(WarningKind::LowConfidence).count(), 1);
        assert_eq!(store.list(true).unwrap().len(), 0);

        let record = &report.records[0];
        assert_eq!(record.employee_id, "100001");
        assert_eq!(record.hours.regular, dec("160"));
        assert_eq!(record.pay.base_salary, dec("200000"));
        assert_eq!(record.gross_salary, dec("250000"));
    }

    // ==========================================================================
    // ENG-004: dynamic zones differ between neighbouring blocks
    // ==========================================================================
    #[test]
    fn test_eng_004_dynamic_zone_independence() {
        let sheet = block_labels(Sheet::new("第三工場"), 1, "寮費");
        let sheet = block_labels(sheet, 7, "食事代");
        let sheet = block_values(sheet, 1, "100001", 0, 30000);
        let sheet = block_values(sheet, 7, "100002", 0, 6000);
        let report =
            extractor(Arc::new(InMemoryTemplateStore::new())).parse_workbook(&single(sheet));

        let first = &report.records[0];
        let second = &report.records[1];
        assert_eq!(first.deductions.rent, dec("30000"));
        assert_eq!(first.deductions.meal, Decimal::ZERO);
        assert_eq!(second.deductions.rent, Decimal::ZERO);
        assert_eq!(second.deductions.meal, dec("6000"));
    }

    // ==========================================================================
    // ENG-005: two employees, 160 hours at 1700 each
    // ==========================================================================
    #[test]
    fn test_eng_005_end_to_end_billing() {
        let sheet = Sheet::new("工場A")
            .with(2, 3, "2025年1月")
            .with(3, 3, "100001")
            .with(3, 9, "100002")
            .with(9, 3, 160)
            .with(9, 9, 160);
        let report =
            extractor(Arc::new(InMemoryTemplateStore::new())).parse_workbook(&single(sheet));

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].employee_id, "100001");
        assert_eq!(report.records[1].employee_id, "100002");
        for record in &report.records {
            assert_eq!(record.period, "2025-01");
            assert_eq!(record.billing_amount, dec("272000"));
        }
    }

    // ==========================================================================
    // ENG-006: billing leaves transport, non-billable and paid leave out
    // ==========================================================================
    #[test]
    fn test_eng_006_billing_exclusions_and_overtime_split() {
        let sheet = block_labels(Sheet::new("第四工場"), 1, "有給休暇");
        let sheet = block_values(sheet, 1, "100001", 73, 12000);
        let report =
            extractor(Arc::new(InMemoryTemplateStore::new())).parse_workbook(&single(sheet));

        let record = &report.records[0];
        assert_eq!(record.hours.overtime, dec("60"));
        assert_eq!(record.hours.overtime_over_threshold, dec("13"));
        assert_eq!(record.pay.paid_leave_amount, dec("12000"));
        assert_eq!(record.pay.transport_allowance, dec("8000"));
        assert_eq!(record.pay.non_billable_allowances, dec("5000"));
        // 160*1700 + 60*1700*1.25 + 13*1700*1.5
        assert_eq!(record.billing_amount, dec("432650"));
    }

    // ==========================================================================
    // ENG-007: sheets without identifiers are reported and skipped
    // ==========================================================================
    #[test]
    fn test_eng_007_unusable_and_excluded_sheets() {
        let workbook = Workbook::new(vec![
            Sheet::new("目次").with(3, 3, "100001").with(9, 3, 160),
            Sheet::new("メモ").with(1, 1, "備考"),
            labelled_sheet("第一工場"),
        ]);
        let report = extractor(Arc::new(InMemoryTemplateStore::new())).parse_workbook(&workbook);

        assert_eq!(report.sheets.len(), 2);
        assert_eq!(report.sheets[0].sheet, "メモ");
        assert_eq!(report.records.len(), 2);
        let unusable: Vec<_> = report.warnings_of(WarningKind::UnusableSheet).collect();
        assert_eq!(unusable.len(), 1);
        assert_eq!(unusable[0].severity, Severity::High);
    }

    // ==========================================================================
    // ENG-008: a failing store never stops the parse
    // ==========================================================================
    #[test]
    fn test_eng_008_store_failure_is_a_warning() {
        let report = extractor(Arc::new(BrokenStore)).parse_workbook(&single(labelled_sheet("第一工場")));

        assert_eq!(report.records.len(), 2);
        assert!(!report.sheets[0].template_saved);
        assert_eq!(report.warnings_of(WarningKind::TemplateStoreFailure).count(), 2);
    }

    // ==========================================================================
    // ENG-009: an untrusted template is re-detected and replaced
    // ==========================================================================
    #[test]
    fn test_eng_009_untrusted_template_is_replaced() {
        let store = Arc::new(InMemoryTemplateStore::new());
        store
            .save(NewTemplate::new(
                "第一工場",
                BTreeMap::from([(PayrollField::WorkHours, 40)]),
                ColumnOffsets::default(),
                0.2,
            ))
            .unwrap();

        let report = extractor(store.clone()).parse_workbook(&single(labelled_sheet("第一工場")));

        assert_eq!(report.warnings_of(WarningKind::UntrustedTemplate).count(), 1);
        assert_eq!(report.sheets[0].layout_source, LayoutSource::Detected);
        assert_eq!(report.records[0].hours.regular, dec("160"));
        let replaced = store.load("第一工場").unwrap().unwrap();
        assert_eq!(replaced.detection_confidence, 1.0);
        assert_eq!(replaced.field_positions[&PayrollField::WorkHours], 9);
    }

    #[test]
    fn test_untrusted_fuzzy_template_is_replaced_in_place() {
        let store = Arc::new(InMemoryTemplateStore::new());
        store
            .save(NewTemplate::new(
                "第一工場",
                BTreeMap::from([(PayrollField::WorkHours, 40)]),
                ColumnOffsets::default(),
                0.2,
            ))
            .unwrap();

        let report = extractor(store.clone())
            .parse_workbook(&single(labelled_sheet("第一工場 2025年1月")));

        assert_eq!(report.warnings_of(WarningKind::UntrustedTemplate).count(), 1);
        assert!(report.sheets[0].template_saved);
        assert_eq!(
            report.sheets[0].template_identifier.as_deref(),
            Some("第一工場")
        );
        let all = store.list(true).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].factory_identifier, "第一工場");
        assert_eq!(all[0].detection_confidence, 1.0);
    }

    // ==========================================================================
    // ENG-010: skipped blocks and missing rates are diagnosed
    // ==========================================================================
    #[test]
    fn test_eng_010_block_diagnostics() {
        let sheet = labelled_sheet("第一工場")
            .with(3, 15, "999999")
            .with(9, 15, 160)
            .with(2, 21, "未定")
            .with(3, 21, "100003")
            .with(9, 21, 160)
            .with(13, 21, 200000)
            .with(3, 27, "100003");
        let report =
            extractor(Arc::new(InMemoryTemplateStore::new())).parse_workbook(&single(sheet));

        // "未定" is not a period, so 100003 is skipped despite its values
        assert_eq!(report.sheets[0].blocks_found, 5);
        assert_eq!(report.records.len(), 3);
        assert!(report.records.iter().all(|r| r.employee_id != "100003"));
        assert_eq!(report.warnings_of(WarningKind::BlockSkipped).count(), 1);
        assert_eq!(report.warnings_of(WarningKind::EmptyBlock).count(), 1);
        assert_eq!(report.warnings_of(WarningKind::MissingRate).count(), 1);
        assert_eq!(report.records[2].employee_id, "999999");
        assert_eq!(report.records[2].period, "2025-01");
        assert_eq!(report.records[2].billing_amount, Decimal::ZERO);
    }

    #[test]
    fn test_unreadable_sheets_are_reported() {
        let workbook = single(labelled_sheet("第一工場")).with_unreadable(vec![UnreadableSheet {
            name: "壊れた".to_string(),
            reason: "bad xml".to_string(),
        }]);
        let report = extractor(Arc::new(InMemoryTemplateStore::new())).parse_workbook(&workbook);
        assert_eq!(report.warnings_of(WarningKind::UnreadableSheet).count(), 1);
        assert_eq!(report.records.len(), 2);
    }

    #[test]
    fn test_garbage_bytes_fail() {
        let result = extractor(Arc::new(InMemoryTemplateStore::new())).parse_bytes(b"not a workbook");
        assert!(matches!(result, Err(EngineError::WorkbookUnreadable { .. })));
    }
}
