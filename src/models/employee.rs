//! Employee master rates.
//!
//! The engine only needs two numbers per employee: the unit rate billed to
//! the client and the hourly pay rate. An employee that is not in the master
//! is treated as having both rates at zero.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Rates for one employee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRates {
    /// Unit rate billed to the client per regular hour.
    pub billing_rate: Decimal,
    /// Hourly pay rate.
    pub hourly_rate: Decimal,
}

/// A row of the employee master file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeMasterEntry {
    /// 6-digit employee identifier.
    pub employee_id: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Unit rate billed to the client.
    #[serde(default)]
    pub billing_rate: Decimal,
    /// Hourly pay rate.
    #[serde(default)]
    pub hourly_rate: Decimal,
}

/// Looks up rates by employee identifier.
pub trait EmployeeDirectory: Send + Sync {
    /// Returns the rates for an employee, or `None` if unknown.
    fn rates(&self, employee_id: &str) -> Option<EmployeeRates>;
}

/// A directory held in memory.
///
/// # Example
///
/// ```
/// use payroll_extract::models::{EmployeeDirectory, EmployeeRates, InMemoryEmployeeDirectory};
/// use rust_decimal::Decimal;
///
/// let mut directory = InMemoryEmployeeDirectory::new();
/// directory.insert("100001", EmployeeRates {
///     billing_rate: Decimal::from(1700),
///     hourly_rate: Decimal::from(1250),
/// });
///
/// assert_eq!(directory.rates("100001").unwrap().billing_rate, Decimal::from(1700));
/// assert!(directory.rates("999999").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryEmployeeDirectory {
    entries: HashMap<String, EmployeeRates>,
}

impl InMemoryEmployeeDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an employee's rates.
    pub fn insert(&mut self, employee_id: impl Into<String>, rates: EmployeeRates) {
        self.entries.insert(employee_id.into(), rates);
    }

    /// Builds a directory from master entries. Later duplicates win.
    pub fn from_entries(entries: impl IntoIterator<Item = EmployeeMasterEntry>) -> Self {
        let mut directory = Self::new();
        for entry in entries {
            directory.insert(
                entry.employee_id,
                EmployeeRates {
                    billing_rate: entry.billing_rate,
                    hourly_rate: entry.hourly_rate,
                },
            );
        }
        directory
    }

    /// Loads a YAML file holding a list of [`EmployeeMasterEntry`].
    pub fn load_yaml<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| EngineError::EmployeeDirectory {
            message: format!("{}: {}", path.display(), e),
        })?;
        let entries: Vec<EmployeeMasterEntry> =
            serde_yaml::from_str(&content).map_err(|e| EngineError::EmployeeDirectory {
                message: format!("{}: {}", path.display(), e),
            })?;
        Ok(Self::from_entries(entries))
    }

    /// Number of employees.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EmployeeDirectory for InMemoryEmployeeDirectory {
    fn rates(&self, employee_id: &str) -> Option<EmployeeRates> {
        self.entries.get(employee_id).copied()
    }
}
