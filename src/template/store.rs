//! The template store contract and fuzzy identifier matching.

use std::cmp::Ordering;

use crate::detection::normalize_label;
use crate::error::EngineResult;

use super::{NewTemplate, Template, TemplateStats};

/// Persists learned layouts keyed by factory identifier.
///
/// Every mutation is committed before it returns. Implementations serialize
/// writes internally so one store can be shared across threads.
pub trait TemplateStore: Send + Sync {
    /// Inserts or fully replaces the template for its identifier.
    ///
    /// Replacing reactivates the template and refreshes `updated_at`;
    /// `created_at` is kept from the first save.
    fn save(&self, template: NewTemplate) -> EngineResult<Template>;

    /// Exact lookup. Inactive templates are never returned.
    fn load(&self, identifier: &str) -> EngineResult<Option<Template>>;

    /// All templates ordered by identifier.
    fn list(&self, include_inactive: bool) -> EngineResult<Vec<Template>>;

    /// Marks a template inactive. Returns false if it does not exist.
    fn deactivate(&self, identifier: &str) -> EngineResult<bool>;

    /// Removes a template for good. Returns false if it does not exist.
    fn hard_delete(&self, identifier: &str) -> EngineResult<bool>;

    /// Finds the template for a sheet.
    ///
    /// An exact identifier match wins; otherwise active identifiers are
    /// compared to the sheet name by containment in either direction after
    /// normalization, see [`select_best_match`].
    fn find_matching(&self, sheet_name: &str) -> EngineResult<Option<Template>> {
        if let Some(template) = self.load(sheet_name)? {
            return Ok(Some(template));
        }
        Ok(select_best_match(sheet_name, self.list(false)?))
    }

    /// Aggregate figures over every stored template.
    fn stats(&self) -> EngineResult<TemplateStats> {
        Ok(TemplateStats::from_templates(&self.list(true)?))
    }
}

/// Picks the best fuzzy match for a sheet name among active candidates.
///
/// A candidate matches when its normalized identifier contains the
/// normalized sheet name or the other way round. Among several matches the
/// longest identifier wins, then the higher confidence, then the
/// alphabetically first identifier.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use payroll_extract::models::ColumnOffsets;
/// use payroll_extract::template::{NewTemplate, Template, select_best_match};
///
/// let now = Utc::now();
/// let make = |id: &str| {
///     Template::from_new(
///         NewTemplate::new(id, Default::default(), ColumnOffsets::default(), 0.8),
///         now,
///         now,
///     )
/// };
///
/// let best = select_best_match("第一工場 2025年1月", vec![make("工場"), make("第一工場")]);
/// assert_eq!(best.map(|t| t.factory_identifier), Some("第一工場".to_string()));
/// ```
pub fn select_best_match(
    sheet_name: &str,
    candidates: impl IntoIterator<Item = Template>,
) -> Option<Template> {
    let sheet = normalize_label(sheet_name);
    if sheet.is_empty() {
        return None;
    }

    let mut best: Option<(usize, Template)> = None;
    for template in candidates {
        if !template.is_active {
            continue;
        }
        let identifier = normalize_label(&template.factory_identifier);
        if identifier.is_empty() || !(sheet.contains(&identifier) || identifier.contains(&sheet)) {
            continue;
        }
        let length = identifier.chars().count();
        let better = match &best {
            None => true,
            Some((best_length, current)) => {
                compare_candidates(length, &template, *best_length, current) == Ordering::Greater
            }
        };
        if better {
            best = Some((length, template));
        }
    }

    best.map(|(_, template)| template)
}

fn compare_candidates(
    length: usize,
    template: &Template,
    best_length: usize,
    best: &Template,
) -> Ordering {
    length
        .cmp(&best_length)
        .then_with(|| {
            template
                .detection_confidence
                .partial_cmp(&best.detection_confidence)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| best.factory_identifier.cmp(&template.factory_identifier))
}
