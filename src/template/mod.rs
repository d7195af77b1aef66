//! Learned layout templates and their persistence.
//!
//! A template remembers where a factory's statements keep each field so the
//! next file from the same factory can skip detection. Two backends are
//! provided: [`InMemoryTemplateStore`] for tests and short-lived processes,
//! and [`SqliteTemplateStore`] for everything else.

mod memory;
mod model;
mod sqlite;
mod store;

pub use memory::InMemoryTemplateStore;
pub use model::{NewTemplate, Template, TemplateStats};
pub use sqlite::SqliteTemplateStore;
pub use store::{TemplateStore, select_best_match};
