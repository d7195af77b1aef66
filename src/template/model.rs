//! Learned layout templates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{ColumnOffsets, DynamicCategory, PayrollField};

fn default_block_width() -> u32 {
    6
}

fn default_active() -> bool {
    true
}

/// A template as handed to [`TemplateStore::save`](super::TemplateStore::save).
///
/// Identity and timestamps are managed by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTemplate {
    /// The sheet name the layout was learned from.
    pub factory_identifier: String,
    /// Field -> 1-based row.
    pub field_positions: BTreeMap<PayrollField, u32>,
    /// Column deltas relative to a block origin.
    pub column_offsets: ColumnOffsets,
    /// Dynamic-zone row -> category seen when the layout was learned.
    #[serde(default)]
    pub dynamic_zone_categories: BTreeMap<u32, DynamicCategory>,
    /// Allowances that are never billed for this factory.
    #[serde(default)]
    pub non_billable_labels: Vec<String>,
    /// Columns between consecutive block origins.
    #[serde(default = "default_block_width")]
    pub employee_block_width: u32,
    /// Detection confidence in [0, 1].
    pub detection_confidence: f64,
    /// An identifier seen on the sheet, kept for troubleshooting.
    #[serde(default)]
    pub sample_employee_id: Option<String>,
    /// A period seen on the sheet, kept for troubleshooting.
    #[serde(default)]
    pub sample_period: Option<String>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewTemplate {
    /// Creates a template with empty optional metadata.
    pub fn new(
        factory_identifier: impl Into<String>,
        field_positions: BTreeMap<PayrollField, u32>,
        column_offsets: ColumnOffsets,
        detection_confidence: f64,
    ) -> Self {
        Self {
            factory_identifier: factory_identifier.into(),
            field_positions,
            column_offsets,
            dynamic_zone_categories: BTreeMap::new(),
            non_billable_labels: Vec::new(),
            employee_block_width: default_block_width(),
            detection_confidence,
            sample_employee_id: None,
            sample_period: None,
            notes: None,
        }
    }

    /// Rejects templates that could never be applied to a sheet.
    pub fn validate(&self) -> EngineResult<()> {
        let invalid = |message: &str| EngineError::InvalidTemplate {
            identifier: self.factory_identifier.clone(),
            message: message.to_string(),
        };

        if self.factory_identifier.trim().is_empty() {
            return Err(invalid("factory identifier is empty"));
        }
        if !(0.0..=1.0).contains(&self.detection_confidence) {
            return Err(invalid("detection confidence must be within [0, 1]"));
        }
        if self.employee_block_width == 0 {
            return Err(invalid("employee block width must be positive"));
        }
        if self.field_positions.values().any(|&row| row == 0) {
            return Err(invalid("field rows are 1-based"));
        }
        Ok(())
    }
}

/// A stored layout template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// The sheet name the layout was learned from. Unique per store.
    pub factory_identifier: String,
    /// Field -> 1-based row.
    pub field_positions: BTreeMap<PayrollField, u32>,
    /// Column deltas relative to a block origin.
    pub column_offsets: ColumnOffsets,
    /// Dynamic-zone row -> category seen when the layout was learned.
    #[serde(default)]
    pub dynamic_zone_categories: BTreeMap<u32, DynamicCategory>,
    /// Allowances that are never billed for this factory.
    #[serde(default)]
    pub non_billable_labels: Vec<String>,
    /// Columns between consecutive block origins.
    #[serde(default = "default_block_width")]
    pub employee_block_width: u32,
    /// Detection confidence in [0, 1].
    pub detection_confidence: f64,
    /// An identifier seen on the sheet.
    #[serde(default)]
    pub sample_employee_id: Option<String>,
    /// A period seen on the sheet.
    #[serde(default)]
    pub sample_period: Option<String>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Inactive templates are never returned by lookups.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// When the identifier was first saved.
    pub created_at: DateTime<Utc>,
    /// When the template was last saved.
    pub updated_at: DateTime<Utc>,
}

impl Template {
    /// Builds the stored form of a template.
    ///
    /// `created_at` is kept from an existing row when one is being replaced.
    pub fn from_new(
        new: NewTemplate,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            factory_identifier: new.factory_identifier,
            field_positions: new.field_positions,
            column_offsets: new.column_offsets,
            dynamic_zone_categories: new.dynamic_zone_categories,
            non_billable_labels: new.non_billable_labels,
            employee_block_width: new.employee_block_width,
            detection_confidence: new.detection_confidence,
            sample_employee_id: new.sample_employee_id,
            sample_period: new.sample_period,
            notes: new.notes,
            is_active: true,
            created_at,
            updated_at,
        }
    }

    /// Whether the template may be used without re-detecting the layout.
    pub fn is_trusted(&self, threshold: f64) -> bool {
        self.is_active && self.detection_confidence >= threshold
    }
}

/// Aggregate figures over a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateStats {
    /// All stored templates.
    pub total: usize,
    /// Active templates.
    pub active: usize,
    /// Deactivated templates.
    pub inactive: usize,
    /// Mean confidence of active templates (zero when there are none).
    pub average_confidence: f64,
    /// The most recent `updated_at`, if any template exists.
    pub last_updated: Option<DateTime<Utc>>,
}

impl TemplateStats {
    /// Computes the figures from a full listing.
    pub fn from_templates(templates: &[Template]) -> Self {
        let active: Vec<&Template> = templates.iter().filter(|t| t.is_active).collect();
        let average_confidence = if active.is_empty() {
            0.0
        } else {
            active.iter().map(|t| t.detection_confidence).sum::<f64>() / active.len() as f64
        };

        Self {
            total: templates.len(),
            active: active.len(),
            inactive: templates.len() - active.len(),
            average_confidence,
            last_updated: templates.iter().map(|t| t.updated_at).max(),
        }
    }
}
