//! HTTP API module for the Payroll Statement Extraction Engine.
//!
//! This module provides the REST endpoints for parsing statement workbooks
//! and managing learned layout templates.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::{MAX_UPLOAD_BYTES, create_router};
pub use request::{DeactivateResponse, ListTemplatesQuery};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
