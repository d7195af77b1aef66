//! Response types for the extraction API.
//!
//! This module defines the error response structures and error handling
//! for the HTTP API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates an empty upload error response.
    pub fn empty_body() -> Self {
        Self::new("EMPTY_BODY", "Request body must contain a workbook file")
    }

    /// Creates a template not found error response.
    pub fn template_not_found(identifier: &str) -> Self {
        Self::with_details(
            "TEMPLATE_NOT_FOUND",
            format!("Template not found: {}", identifier),
            format!("No template is stored for the factory identifier '{}'", identifier),
        )
    }

    /// Creates an internal error response.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// Creates an error response.
    pub fn new(status: StatusCode, error: ApiError) -> Self {
        Self { status, error }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::ConfigNotFound { path } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration error",
                    format!("Configuration file not found: {}", path),
                ),
            },
            EngineError::ConfigParseError { path, message } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration parse error",
                    format!("Failed to parse {}: {}", path, message),
                ),
            },
            EngineError::WorkbookUnreadable { message } => ApiErrorResponse {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: ApiError::with_details(
                    "UNREADABLE_WORKBOOK",
                    "The uploaded file is not a readable workbook",
                    message,
                ),
            },
            EngineError::TemplateStore { message } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "TEMPLATE_STORE_ERROR",
                    "Template store failure",
                    message,
                ),
            },
            EngineError::InvalidTemplate {
                identifier,
                message,
            } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::with_details(
                    "INVALID_TEMPLATE",
                    format!("Invalid template '{}'", identifier),
                    message,
                ),
            },
            EngineError::EmployeeDirectory { message } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "EMPLOYEE_DIRECTORY_ERROR",
                    "Employee master failure",
                    message,
                ),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(!json.contains("details")); // skipped when None
    }

    #[test]
    fn test_template_not_found_error() {
        let error = ApiError::template_not_found("第一工場");
        assert_eq!(error.code, "TEMPLATE_NOT_FOUND");
        assert!(error.message.contains("第一工場"));
    }

    #[test]
    fn test_unreadable_workbook_is_422() {
        let response: ApiErrorResponse = EngineError::WorkbookUnreadable {
            message: "zip header missing".to_string(),
        }
        .into();
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.error.code, "UNREADABLE_WORKBOOK");
        assert_eq!(response.error.details.as_deref(), Some("zip header missing"));
    }

    #[test]
    fn test_store_failure_is_500() {
        let response: ApiErrorResponse = EngineError::TemplateStore {
            message: "database is locked".to_string(),
        }
        .into();
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.error.code, "TEMPLATE_STORE_ERROR");
    }
}
