//! Error types for the Payroll Statement Extraction Engine.
//!
//! Only a handful of conditions are hard errors: configuration problems, an
//! unreadable workbook container, and template store failures. Everything that
//! goes wrong inside a sheet degrades to a [`ParseWarning`] instead.
//!
//! [`ParseWarning`]: crate::models::ParseWarning

use thiserror::Error;

/// The main error type for the extraction engine.
///
/// # Example
///
/// ```
/// use payroll_extract::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/engine.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/engine.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// The spreadsheet container could not be opened or read.
    #[error("Workbook could not be read: {message}")]
    WorkbookUnreadable {
        /// A description of the container failure.
        message: String,
    },

    /// The template store failed to read or write.
    #[error("Template store error: {message}")]
    TemplateStore {
        /// A description of the storage failure.
        message: String,
    },

    /// A template was rejected before it reached the store.
    #[error("Invalid template '{identifier}': {message}")]
    InvalidTemplate {
        /// The factory identifier of the rejected template.
        identifier: String,
        /// Why the template was rejected.
        message: String,
    },

    /// The employee master could not be loaded.
    #[error("Employee directory error: {message}")]
    EmployeeDirectory {
        /// A description of the failure.
        message: String,
    },
}

impl From<rusqlite::Error> for EngineError {
    fn from(error: rusqlite::Error) -> Self {
        EngineError::TemplateStore {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(error: serde_json::Error) -> Self {
        EngineError::TemplateStore {
            message: format!("template column encoding: {}", error),
        }
    }
}

impl From<calamine::Error> for EngineError {
    fn from(error: calamine::Error) -> Self {
        EngineError::WorkbookUnreadable {
            message: error.to_string(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
