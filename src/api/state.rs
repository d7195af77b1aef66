//! Application state for the extraction API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::extraction::PayrollExtractor;
use crate::models::EmployeeDirectory;
use crate::template::TemplateStore;

/// Shared application state.
///
/// Holds the extractor and the template store it writes to, so template
/// management endpoints see exactly what parses learn.
#[derive(Clone)]
pub struct AppState {
    extractor: Arc<PayrollExtractor>,
    templates: Arc<dyn TemplateStore>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        config: EngineConfig,
        templates: Arc<dyn TemplateStore>,
        directory: Arc<dyn EmployeeDirectory>,
    ) -> Self {
        let extractor = PayrollExtractor::new(config, templates.clone(), directory);
        Self {
            extractor: Arc::new(extractor),
            templates,
        }
    }

    /// Returns a shared handle to the extractor.
    pub fn extractor(&self) -> Arc<PayrollExtractor> {
        self.extractor.clone()
    }

    /// Returns the template store.
    pub fn templates(&self) -> &dyn TemplateStore {
        self.templates.as_ref()
    }
}
