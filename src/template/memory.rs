//! In-memory template store.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::error::{EngineError, EngineResult};

use super::{NewTemplate, Template, TemplateStore};

/// A template store that lives as long as the process.
///
/// # Example
///
/// ```
/// use payroll_extract::models::ColumnOffsets;
/// use payroll_extract::template::{InMemoryTemplateStore, NewTemplate, TemplateStore};
///
/// let store = InMemoryTemplateStore::new();
/// store
///     .save(NewTemplate::new("第一工場", Default::default(), ColumnOffsets::default(), 0.9))
///     .unwrap();
///
/// assert!(store.find_matching("第一工場_2025年1月").unwrap().is_some());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryTemplateStore {
    templates: RwLock<BTreeMap<String, Template>>,
}

impl InMemoryTemplateStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> EngineResult<RwLockReadGuard<'_, BTreeMap<String, Template>>> {
        self.templates.read().map_err(|_| poisoned())
    }

    fn write(&self) -> EngineResult<RwLockWriteGuard<'_, BTreeMap<String, Template>>> {
        self.templates.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> EngineError {
    EngineError::TemplateStore {
        message: "template store lock poisoned".to_string(),
    }
}

impl TemplateStore for InMemoryTemplateStore {
    fn save(&self, template: NewTemplate) -> EngineResult<Template> {
        template.validate()?;
        let now = Utc::now();
        let mut templates = self.write()?;
        let created_at = templates
            .get(&template.factory_identifier)
            .map(|existing| existing.created_at)
            .unwrap_or(now);
        let stored = Template::from_new(template, created_at, now);
        templates.insert(stored.factory_identifier.clone(), stored.clone());
        Ok(stored)
    }

    fn load(&self, identifier: &str) -> EngineResult<Option<Template>> {
        Ok(self
            .read()?
            .get(identifier)
            .filter(|t| t.is_active)
            .cloned())
    }

    fn list(&self, include_inactive: bool) -> EngineResult<Vec<Template>> {
        Ok(self
            .read()?
            .values()
            .filter(|t| include_inactive || t.is_active)
            .cloned()
            .collect())
    }

    fn deactivate(&self, identifier: &str) -> EngineResult<bool> {
        let mut templates = self.write()?;
        match templates.get_mut(identifier) {
            Some(template) => {
                template.is_active = false;
                template.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn hard_delete(&self, identifier: &str) -> EngineResult<bool> {
        Ok(self.write()?.remove(identifier).is_some())
    }
}
