//! Request types for the extraction API.

use serde::{Deserialize, Serialize};

/// Query string for `GET /templates`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListTemplatesQuery {
    /// Include deactivated templates.
    pub include_inactive: bool,
}

/// Body returned by `POST /templates/{identifier}/deactivate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivateResponse {
    /// The template that was deactivated.
    pub identifier: String,
    /// Always true; a missing template is a 404.
    pub deactivated: bool,
}
