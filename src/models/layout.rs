//! Column layout of an employee block.

use serde::{Deserialize, Serialize};

/// The role a column plays inside an employee block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Row labels.
    Label,
    /// Amounts and hours.
    Value,
    /// Day counts.
    Days,
    /// Minutes accompanying an hour value.
    Minutes,
    /// The pay period.
    Period,
    /// The employee identifier.
    EmployeeId,
}

/// Column deltas relative to an employee block's origin column.
///
/// The absolute column for role `R` in a block whose origin is `O` is
/// `O + offset(R)`. All offsets of one template share the same origin.
/// Fields carry serde defaults so older stored templates keep loading when a
/// role is added.
///
/// # Example
///
/// ```
/// use payroll_extract::models::{ColumnOffsets, ColumnRole};
///
/// let offsets = ColumnOffsets::default();
/// assert_eq!(offsets.column(7, ColumnRole::EmployeeId), Some(9));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnOffsets {
    /// Offset of the label column.
    pub label: u32,
    /// Offset of the value column.
    pub value: u32,
    /// Offset of the day-count column.
    pub days: u32,
    /// Offset of the minutes column, if the layout splits hours and minutes.
    pub minutes: Option<u32>,
    /// Offset of the period cell.
    pub period: u32,
    /// Offset of the employee identifier cell.
    pub employee_id: u32,
}

impl Default for ColumnOffsets {
    fn default() -> Self {
        Self {
            label: 0,
            value: 2,
            days: 1,
            minutes: None,
            period: 2,
            employee_id: 2,
        }
    }
}

impl ColumnOffsets {
    /// Returns the offset for a role, if the layout has that column.
    pub fn offset(&self, role: ColumnRole) -> Option<u32> {
        match role {
            ColumnRole::Label => Some(self.label),
            ColumnRole::Value => Some(self.value),
            ColumnRole::Days => Some(self.days),
            ColumnRole::Minutes => self.minutes,
            ColumnRole::Period => Some(self.period),
            ColumnRole::EmployeeId => Some(self.employee_id),
        }
    }

    /// Returns the absolute column for a role in the block at `origin`.
    pub fn column(&self, origin: u32, role: ColumnRole) -> Option<u32> {
        self.offset(role).map(|offset| origin + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_column_adds_offset_to_origin() {
        let offsets = ColumnOffsets {
            label: 0,
            value: 3,
            days: 1,
            minutes: Some(4),
            period: 3,
            employee_id: 2,
        };
        assert_eq!(offsets.column(10, ColumnRole::Label), Some(10));
        assert_eq!(offsets.column(10, ColumnRole::Value), Some(13));
        assert_eq!(offsets.column(10, ColumnRole::Minutes), Some(14));
        assert_eq!(offsets.column(10, ColumnRole::EmployeeId), Some(12));
    }

    #[test]
    fn test_missing_minutes_column() {
        assert_eq!(ColumnOffsets::default().column(1, ColumnRole::Minutes), None);
    }

    #[test]
    fn test_older_json_without_minutes_still_loads() {
        let json = r#"{"label":0,"value":2,"days":1,"period":2,"employee_id":2}"#;
        let offsets: ColumnOffsets = serde_json::from_str(json).unwrap();
        assert_eq!(offsets, ColumnOffsets::default());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let offsets: ColumnOffsets = serde_json::from_str(r#"{"value":4}"#).unwrap();
        assert_eq!(offsets.value, 4);
        assert_eq!(offsets.employee_id, 2);
    }
}
