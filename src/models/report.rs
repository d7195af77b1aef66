//! Parse results and diagnostics.
//!
//! A parse never fails on sheet content. Instead every degradation is written
//! down here as a [`ParseWarning`], and each visited sheet gets a
//! [`SheetSummary`] describing how its layout was resolved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PayrollRecord;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// No employee identifiers were found; the sheet was skipped.
    UnusableSheet,
    /// The container listed a sheet that could not be decoded.
    UnreadableSheet,
    /// Too few fixed fields were detected; fallback rows were used.
    LowConfidence,
    /// A stored template was found but its confidence is below the trust bar.
    UntrustedTemplate,
    /// Saving or loading a template failed; parsing continued without it.
    TemplateStoreFailure,
    /// An employee block had no valid identifier or period.
    BlockSkipped,
    /// An employee block yielded no usable values.
    EmptyBlock,
    /// No billing rate was found in the employee master.
    MissingRate,
}

/// How much attention a warning deserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational.
    Low,
    /// Output may be incomplete.
    Medium,
    /// A whole sheet was lost.
    High,
}

/// A diagnostic collected during a parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    /// The kind of problem.
    pub kind: WarningKind,
    /// The sheet it concerns, when it concerns one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    /// A human-readable description.
    pub message: String,
    /// The severity level.
    pub severity: Severity,
}

impl ParseWarning {
    /// Creates a warning about a sheet.
    pub fn for_sheet(
        kind: WarningKind,
        sheet: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            kind,
            sheet: Some(sheet.into()),
            message: message.into(),
            severity,
        }
    }
}

/// Where a sheet's field positions came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutSource {
    /// A trusted stored template.
    Template,
    /// Fresh label detection on this sheet.
    Detected,
    /// The built-in fallback row table.
    Fallback,
}

/// How one sheet was processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetSummary {
    /// The sheet name.
    pub sheet: String,
    /// Where field positions came from.
    pub layout_source: LayoutSource,
    /// The template used or written, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_identifier: Option<String>,
    /// Detection or template confidence in [0, 1].
    pub confidence: f64,
    /// Employee blocks located.
    pub blocks_found: usize,
    /// Records emitted.
    pub records_emitted: usize,
    /// Whether a template was written back to the store.
    pub template_saved: bool,
}

/// The complete result of parsing one workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseReport {
    /// Unique identifier for this parse.
    pub parse_id: Uuid,
    /// When the parse was performed.
    pub parsed_at: DateTime<Utc>,
    /// The version of the engine that performed the parse.
    pub engine_version: String,
    /// Records in sheet order, then left-to-right block order.
    pub records: Vec<PayrollRecord>,
    /// Diagnostics collected along the way.
    pub warnings: Vec<ParseWarning>,
    /// One summary per visited sheet.
    pub sheets: Vec<SheetSummary>,
    /// Total parse duration in microseconds.
    pub duration_us: u64,
}

impl ParseReport {
    /// Returns the warnings of one kind.
    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &ParseWarning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}
