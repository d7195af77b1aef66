//! SQLite-backed template store.
//!
//! One row per factory identifier. Maps are stored as JSON text so the
//! column set stays stable as fields are added; columns introduced after the
//! first release are added with `ALTER TABLE` when an older database is
//! opened.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};

use super::{NewTemplate, Template, TemplateStore};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS payroll_templates (
        factory_identifier   TEXT PRIMARY KEY,
        field_positions      TEXT NOT NULL,
        column_offsets       TEXT NOT NULL,
        detection_confidence REAL NOT NULL DEFAULT 0,
        is_active            INTEGER NOT NULL DEFAULT 1,
        created_at           TEXT NOT NULL,
        updated_at           TEXT NOT NULL
    );
";

/// Columns added after the base schema, with their definitions.
const ADDED_COLUMNS: [(&str, &str); 6] = [
    ("dynamic_zone_categories", "TEXT NOT NULL DEFAULT '{}'"),
    ("non_billable_labels", "TEXT NOT NULL DEFAULT '[]'"),
    ("employee_block_width", "INTEGER NOT NULL DEFAULT 6"),
    ("sample_employee_id", "TEXT"),
    ("sample_period", "TEXT"),
    ("notes", "TEXT"),
];

const SELECT_COLUMNS: &str = "factory_identifier, field_positions, column_offsets, \
     dynamic_zone_categories, non_billable_labels, employee_block_width, detection_confidence, \
     sample_employee_id, sample_period, notes, is_active, created_at, updated_at";

/// A template store persisted in a SQLite database file.
///
/// # Example
///
/// ```
/// use payroll_extract::models::ColumnOffsets;
/// use payroll_extract::template::{NewTemplate, SqliteTemplateStore, TemplateStore};
///
/// let store = SqliteTemplateStore::open_in_memory().unwrap();
/// store
///     .save(NewTemplate::new("第一工場", Default::default(), ColumnOffsets::default(), 0.9))
///     .unwrap();
/// assert_eq!(store.stats().unwrap().active, 1);
/// ```
#[derive(Debug)]
pub struct SqliteTemplateStore {
    conn: Mutex<Connection>,
}

impl SqliteTemplateStore {
    /// Opens (creating if needed) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| EngineError::TemplateStore {
            message: format!("failed to open {}: {}", path.display(), e),
        })?;
        info!(path = %path.display(), "Opened template database");
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> EngineResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> EngineResult<Self> {
        conn.execute_batch(SCHEMA)?;
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> EngineResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| EngineError::TemplateStore {
            message: "template database lock poisoned".to_string(),
        })
    }
}

fn migrate(conn: &Connection) -> EngineResult<()> {
    let mut statement = conn.prepare("PRAGMA table_info(payroll_templates)")?;
    let existing: Vec<String> = statement
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<_, _>>()?;

    for (column, definition) in ADDED_COLUMNS {
        if existing.iter().any(|c| c == column) {
            continue;
        }
        conn.execute(
            &format!(
                "ALTER TABLE payroll_templates ADD COLUMN {} {}",
                column, definition
            ),
            [],
        )?;
        debug!(column, "Added template column");
    }
    Ok(())
}

/// The raw column values of one row.
struct TemplateRow {
    factory_identifier: String,
    field_positions: String,
    column_offsets: String,
    dynamic_zone_categories: String,
    non_billable_labels: String,
    employee_block_width: i64,
    detection_confidence: f64,
    sample_employee_id: Option<String>,
    sample_period: Option<String>,
    notes: Option<String>,
    is_active: bool,
    created_at: String,
    updated_at: String,
}

impl TemplateRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            factory_identifier: row.get(0)?,
            field_positions: row.get(1)?,
            column_offsets: row.get(2)?,
            dynamic_zone_categories: row.get(3)?,
            non_billable_labels: row.get(4)?,
            employee_block_width: row.get(5)?,
            detection_confidence: row.get(6)?,
            sample_employee_id: row.get(7)?,
            sample_period: row.get(8)?,
            notes: row.get(9)?,
            is_active: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    fn into_template(self) -> EngineResult<Template> {
        Ok(Template {
            field_positions: serde_json::from_str(&self.field_positions)?,
            column_offsets: serde_json::from_str(&self.column_offsets)?,
            dynamic_zone_categories: serde_json::from_str(&self.dynamic_zone_categories)?,
            non_billable_labels: serde_json::from_str(&self.non_billable_labels)?,
            employee_block_width: u32::try_from(self.employee_block_width).map_err(|_| {
                EngineError::TemplateStore {
                    message: format!(
                        "invalid block width {} for '{}'",
                        self.employee_block_width, self.factory_identifier
                    ),
                }
            })?,
            detection_confidence: self.detection_confidence,
            sample_employee_id: self.sample_employee_id,
            sample_period: self.sample_period,
            notes: self.notes,
            is_active: self.is_active,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            factory_identifier: self.factory_identifier,
        })
    }
}

fn parse_timestamp(raw: &str) -> EngineResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| EngineError::TemplateStore {
            message: format!("invalid timestamp '{}': {}", raw, e),
        })
}

fn select_one(conn: &Connection, identifier: &str) -> EngineResult<Option<Template>> {
    let sql = format!(
        "SELECT {} FROM payroll_templates WHERE factory_identifier = ?1",
        SELECT_COLUMNS
    );
    conn.query_row(&sql, params![identifier], TemplateRow::from_row)
        .optional()?
        .map(TemplateRow::into_template)
        .transpose()
}

impl TemplateStore for SqliteTemplateStore {
    fn save(&self, template: NewTemplate) -> EngineResult<Template> {
        template.validate()?;
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO payroll_templates (
                 factory_identifier, field_positions, column_offsets, dynamic_zone_categories,
                 non_billable_labels, employee_block_width, detection_confidence,
                 sample_employee_id, sample_period, notes, is_active, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1, ?11, ?11)
             ON CONFLICT(factory_identifier) DO UPDATE SET
                 field_positions = excluded.field_positions,
                 column_offsets = excluded.column_offsets,
                 dynamic_zone_categories = excluded.dynamic_zone_categories,
                 non_billable_labels = excluded.non_billable_labels,
                 employee_block_width = excluded.employee_block_width,
                 detection_confidence = excluded.detection_confidence,
                 sample_employee_id = excluded.sample_employee_id,
                 sample_period = excluded.sample_period,
                 notes = excluded.notes,
                 is_active = 1,
                 updated_at = excluded.updated_at",
            params![
                template.factory_identifier,
                serde_json::to_string(&template.field_positions)?,
                serde_json::to_string(&template.column_offsets)?,
                serde_json::to_string(&template.dynamic_zone_categories)?,
                serde_json::to_string(&template.non_billable_labels)?,
                i64::from(template.employee_block_width),
                template.detection_confidence,
                template.sample_employee_id,
                template.sample_period,
                template.notes,
                now,
            ],
        )?;

        select_one(&conn, &template.factory_identifier)?.ok_or_else(|| {
            EngineError::TemplateStore {
                message: format!(
                    "template '{}' missing after save",
                    template.factory_identifier
                ),
            }
        })
    }

    fn load(&self, identifier: &str) -> EngineResult<Option<Template>> {
        let conn = self.lock()?;
        Ok(select_one(&conn, identifier)?.filter(|t| t.is_active))
    }

    fn list(&self, include_inactive: bool) -> EngineResult<Vec<Template>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM payroll_templates WHERE is_active = 1 OR ?1 \
             ORDER BY factory_identifier",
            SELECT_COLUMNS
        );
        let mut statement = conn.prepare(&sql)?;
        let rows = statement
            .query_map(params![include_inactive], TemplateRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(TemplateRow::into_template).collect()
    }

    fn deactivate(&self, identifier: &str) -> EngineResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE payroll_templates SET is_active = 0, updated_at = ?2 \
             WHERE factory_identifier = ?1",
            params![identifier, Utc::now().to_rfc3339()],
        )?;
        Ok(changed > 0)
    }

    fn hard_delete(&self, identifier: &str) -> EngineResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "DELETE FROM payroll_templates WHERE factory_identifier = ?1",
            params![identifier],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnOffsets, DynamicCategory, PayrollField};

    fn sample(identifier: &str, confidence: f64) -> NewTemplate {
        let mut template = NewTemplate::new(
            identifier,
            [
                (PayrollField::Period, 2),
                (PayrollField::EmployeeId, 3),
                (PayrollField::WorkHours, 9),
                (PayrollField::GrossSalary, 30),
            ]
            .into_iter()
            .collect(),
            ColumnOffsets {
                minutes: Some(3),
                ..ColumnOffsets::default()
            },
            confidence,
        );
        template
            .dynamic_zone_categories
            .insert(21, DynamicCategory::MealDeduction);
        template.non_billable_labels = vec!["皆勤手当".to_string()];
        template.sample_employee_id = Some("100001".to_string());
        template.sample_period = Some("2025-01".to_string());
        template
    }

    /// TS-101: positions, offsets and confidence survive a round trip
    #[test]
    fn test_ts_101_round_trip() {
        let store = SqliteTemplateStore::open_in_memory().unwrap();
        let new = sample("第一工場", 0.875);
        store.save(new.clone()).unwrap();

        let loaded = store.load("第一工場").unwrap().unwrap();
        assert_eq!(loaded.field_positions, new.field_positions);
        assert_eq!(loaded.column_offsets, new.column_offsets);
        assert_eq!(loaded.detection_confidence, new.detection_confidence);
        assert_eq!(loaded.dynamic_zone_categories, new.dynamic_zone_categories);
        assert_eq!(loaded.non_billable_labels, new.non_billable_labels);
        assert_eq!(loaded.sample_period.as_deref(), Some("2025-01"));
        assert!(loaded.is_active);
    }

    /// TS-102: the file survives reopening
    #[test]
    fn test_ts_102_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templates.db");

        {
            let store = SqliteTemplateStore::open(&path).unwrap();
            store.save(sample("第一工場", 0.9)).unwrap();
        }

        let store = SqliteTemplateStore::open(&path).unwrap();
        let loaded = store.find_matching("第一工場（1月分）").unwrap().unwrap();
        assert_eq!(loaded.factory_identifier, "第一工場");
    }

    /// TS-103: upsert keeps created_at and reactivates
    #[test]
    fn test_ts_103_upsert() {
        let store = SqliteTemplateStore::open_in_memory().unwrap();
        let first = store.save(sample("第一工場", 0.6)).unwrap();
        assert!(store.deactivate("第一工場").unwrap());
        assert!(store.load("第一工場").unwrap().is_none());

        let second = store.save(sample("第一工場", 0.95)).unwrap();
        assert_eq!(second.created_at, first.created_at);
        assert!(second.is_active);
        assert_eq!(second.detection_confidence, 0.95);
        assert_eq!(store.list(true).unwrap().len(), 1);
    }

    /// TS-104: listing, deletion and stats
    #[test]
    fn test_ts_104_list_delete_stats() {
        let store = SqliteTemplateStore::open_in_memory().unwrap();
        store.save(sample("B工場", 0.5)).unwrap();
        store.save(sample("A工場", 1.0)).unwrap();
        store.save(sample("C工場", 0.1)).unwrap();
        store.deactivate("C工場").unwrap();

        let active: Vec<String> = store
            .list(false)
            .unwrap()
            .into_iter()
            .map(|t| t.factory_identifier)
            .collect();
        assert_eq!(active, vec!["A工場".to_string(), "B工場".to_string()]);

        let stats = store.stats().unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.inactive, 1);
        assert_eq!(stats.average_confidence, 0.75);

        assert!(store.hard_delete("C工場").unwrap());
        assert!(!store.hard_delete("C工場").unwrap());
        assert_eq!(store.list(true).unwrap().len(), 2);
    }

    /// TS-105: databases created before the optional columns still load
    #[test]
    fn test_ts_105_migrates_older_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(SCHEMA).unwrap();
            conn.execute(
                "INSERT INTO payroll_templates (factory_identifier, field_positions, \
                 column_offsets, detection_confidence, is_active, created_at, updated_at) \
                 VALUES ('旧工場', '{\"work_hours\":9}', '{\"value\":2}', 0.7, 1, \
                 '2024-04-01T00:00:00+00:00', '2024-04-01T00:00:00+00:00')",
                [],
            )
            .unwrap();
        }

        let store = SqliteTemplateStore::open(&path).unwrap();
        let loaded = store.load("旧工場").unwrap().unwrap();
        assert_eq!(loaded.field_positions[&PayrollField::WorkHours], 9);
        assert_eq!(loaded.column_offsets, ColumnOffsets::default());
        assert_eq!(loaded.employee_block_width, 6);
        assert!(loaded.dynamic_zone_categories.is_empty());
        assert!(loaded.notes.is_none());
    }

    #[test]
    fn test_invalid_template_never_reaches_database() {
        let store = SqliteTemplateStore::open_in_memory().unwrap();
        let result = store.save(sample("第一工場", 1.5));
        assert!(matches!(result, Err(EngineError::InvalidTemplate { .. })));
        assert!(store.list(true).unwrap().is_empty());
    }
}
