//! Task and category persistence.
//!
//! Both entity types sit behind a trait with two backings: an in-memory
//! collection seeded from the bundled fixtures, and a SQLite table store.
//! The backing is picked from [`Config::backend`] at startup.

mod memory;
mod sqlite;

pub use memory::{MemoryCategoryStore, MemoryTaskStore};
pub use sqlite::{Database, SqliteCategoryStore, SqliteTaskStore};

use std::rc::Rc;
use thiserror::Error;

use crate::config::{Config, StoreBackend};
use crate::models::{Category, CategoryPatch, NewCategory, NewTask, Task, TaskPatch};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to load fixture data: {0}")]
    FixtureError(#[from] serde_json::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("Invalid database path: {0}")]
    InvalidPath(String),
}

impl StoreError {
    pub fn task_not_found(id: i64) -> Self {
        StoreError::NotFound { entity: "Task", id }
    }

    pub fn category_not_found(id: i64) -> Self {
        StoreError::NotFound { entity: "Category", id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// CRUD contract shared by every task backing.
///
/// Stores do no semantic validation; titles, lengths and due dates are
/// checked by the form layer before anything reaches here.
pub trait TaskStore {
    fn get_all(&self) -> Result<Vec<Task>, StoreError>;

    fn get_by_id(&self, id: i64) -> Result<Option<Task>, StoreError>;

    /// Insert with id `max(existing, 0) + 1`, stamping `created_at` and
    /// resetting completion and archive flags
    fn create(&mut self, data: NewTask) -> Result<Task, StoreError>;

    /// Shallow-merge `patch` onto the stored record
    fn update(&mut self, id: i64, patch: TaskPatch) -> Result<Task, StoreError>;

    /// Remove and return the record
    fn delete(&mut self, id: i64) -> Result<Task, StoreError>;
}

pub trait CategoryStore {
    fn get_all(&self) -> Result<Vec<Category>, StoreError>;

    fn get_by_id(&self, id: i64) -> Result<Option<Category>, StoreError>;

    fn create(&mut self, data: NewCategory) -> Result<Category, StoreError>;

    fn update(&mut self, id: i64, patch: CategoryPatch) -> Result<Category, StoreError>;

    fn delete(&mut self, id: i64) -> Result<Category, StoreError>;

    /// Set the denormalized counter on the category called `name`.
    /// Returns `None` when no category has that name.
    fn update_task_count(&mut self, name: &str, count: u32) -> Result<Option<Category>, StoreError>;
}

pub type Stores = (Box<dyn TaskStore>, Box<dyn CategoryStore>);

/// Build the store pair selected by the configuration
pub fn open_stores(config: &Config) -> Result<Stores, StoreError> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::info!("using in-memory stores seeded from fixtures");
            Ok((
                Box::new(MemoryTaskStore::from_fixtures()?),
                Box::new(MemoryCategoryStore::from_fixtures()?),
            ))
        }
        StoreBackend::Sqlite => {
            let path = config.get_database_path();
            let path_str = path
                .to_str()
                .ok_or_else(|| StoreError::InvalidPath(path.to_string_lossy().to_string()))?;
            tracing::info!(path = path_str, "opening sqlite stores");
            let db = Rc::new(Database::new(path_str)?);
            db.seed_categories_if_empty()?;
            Ok((
                Box::new(SqliteTaskStore::new(Rc::clone(&db))),
                Box::new(SqliteCategoryStore::new(db)),
            ))
        }
    }
}

/// Next id for a collection: one past the largest, starting at 1
pub(crate) fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
    ids.max().unwrap_or(0).max(0) + 1
}

#[cfg(test)]
pub(crate) mod contract {
    //! Behaviour every `TaskStore` must share, run against each backing.

    use super::*;
    use crate::models::{CategoryRef, Priority};
    use chrono::NaiveDate;

    pub fn create_assigns_next_id(store: &mut dyn TaskStore) {
        let before = store.get_all().unwrap();
        let expected = next_id(before.iter().map(|t| t.id));

        let mut data = NewTask::new("Plan sprint");
        data.priority = Priority::High;
        data.due_date = NaiveDate::from_ymd_opt(2030, 5, 1);
        let created = store.create(data).unwrap();

        assert_eq!(created.id, expected);
        assert!(!created.completed);
        assert!(created.completed_at.is_none());
        assert!(!created.archived);
        assert_eq!(store.get_all().unwrap().len(), before.len() + 1);
    }

    pub fn create_then_get_round_trips(store: &mut dyn TaskStore) {
        let mut data = NewTask::new("Call plumber");
        data.description = "kitchen sink".to_string();
        data.category = CategoryRef::ByName("personal".to_string());
        let created = store.create(data).unwrap();

        let fetched = store.get_by_id(created.id).unwrap().expect("created task is readable");
        assert_eq!(fetched.title, "Call plumber");
        assert_eq!(fetched.description, "kitchen sink");
        assert_eq!(fetched.category.name(), "personal");
        assert_eq!(fetched.created_at, created.created_at);
    }

    pub fn completion_toggles_completed_at(store: &mut dyn TaskStore) {
        let created = store.create(NewTask::new("Ship release")).unwrap();

        let done = store.update(created.id, TaskPatch::completed(true)).unwrap();
        assert!(done.completed);
        assert!(done.completed_at.is_some());

        let reopened = store.update(created.id, TaskPatch::completed(false)).unwrap();
        assert!(!reopened.completed);
        assert!(reopened.completed_at.is_none());
    }

    pub fn unknown_ids_are_not_found(store: &mut dyn TaskStore) {
        assert!(store.get_by_id(9_999).unwrap().is_none());
        assert!(store.update(9_999, TaskPatch::completed(true)).unwrap_err().is_not_found());
        assert!(store.delete(9_999).unwrap_err().is_not_found());
    }

    pub fn delete_returns_removed(store: &mut dyn TaskStore) {
        let created = store.create(NewTask::new("Temporary")).unwrap();
        let removed = store.delete(created.id).unwrap();
        assert_eq!(removed.id, created.id);
        assert!(store.get_by_id(created.id).unwrap().is_none());
    }

    pub fn category_crud(store: &mut dyn CategoryStore) {
        let created = store
            .create(NewCategory {
                name: "errands".to_string(),
                color: "#A78BFA".to_string(),
            })
            .unwrap();
        assert_eq!(created.task_count, 0);

        let renamed = store
            .update(
                created.id,
                CategoryPatch {
                    color: Some("#000000".to_string()),
                    ..CategoryPatch::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.name, "errands");
        assert_eq!(renamed.color, "#000000");

        let counted = store.update_task_count("errands", 4).unwrap().unwrap();
        assert_eq!(counted.task_count, 4);
        assert!(store.update_task_count("nope", 1).unwrap().is_none());

        store.delete(created.id).unwrap();
        assert!(store.delete(created.id).unwrap_err().is_not_found());
    }
}
