use chrono::Utc;

use crate::models::{Category, CategoryPatch, NewCategory, NewTask, Task, TaskPatch};
use crate::store::{next_id, CategoryStore, StoreError, TaskStore};

const TASK_FIXTURES: &str = include_str!("../fixtures/tasks.json");
const CATEGORY_FIXTURES: &str = include_str!("../fixtures/categories.json");

/// Task store backed by a plain vector
#[derive(Debug, Clone, Default)]
pub struct MemoryTaskStore {
    tasks: Vec<Task>,
}

impl MemoryTaskStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// Seed from the bundled fixture data
    pub fn from_fixtures() -> Result<Self, StoreError> {
        let tasks: Vec<Task> = serde_json::from_str(TASK_FIXTURES)?;
        tracing::debug!(count = tasks.len(), "loaded task fixtures");
        Ok(Self::new(tasks))
    }

    fn position(&self, id: i64) -> Result<usize, StoreError> {
        self.tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| StoreError::task_not_found(id))
    }
}

impl TaskStore for MemoryTaskStore {
    fn get_all(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.tasks.clone())
    }

    fn get_by_id(&self, id: i64) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.iter().find(|task| task.id == id).cloned())
    }

    fn create(&mut self, data: NewTask) -> Result<Task, StoreError> {
        let id = next_id(self.tasks.iter().map(|task| task.id));
        let task = data.into_task(id, Utc::now());
        self.tasks.push(task.clone());
        tracing::debug!(id, "created task");
        Ok(task)
    }

    fn update(&mut self, id: i64, patch: TaskPatch) -> Result<Task, StoreError> {
        let index = self.position(id)?;
        let task = &mut self.tasks[index];
        patch.apply(task, Utc::now());
        tracing::debug!(id, "updated task");
        Ok(task.clone())
    }

    fn delete(&mut self, id: i64) -> Result<Task, StoreError> {
        let index = self.position(id)?;
        tracing::debug!(id, "deleted task");
        Ok(self.tasks.remove(index))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCategoryStore {
    categories: Vec<Category>,
}

impl MemoryCategoryStore {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn from_fixtures() -> Result<Self, StoreError> {
        Ok(Self::new(default_categories()?))
    }

    fn position(&self, id: i64) -> Result<usize, StoreError> {
        self.categories
            .iter()
            .position(|category| category.id == id)
            .ok_or_else(|| StoreError::category_not_found(id))
    }
}

/// Categories shipped with the application
pub fn default_categories() -> Result<Vec<Category>, StoreError> {
    Ok(serde_json::from_str(CATEGORY_FIXTURES)?)
}

impl CategoryStore for MemoryCategoryStore {
    fn get_all(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.categories.clone())
    }

    fn get_by_id(&self, id: i64) -> Result<Option<Category>, StoreError> {
        Ok(self.categories.iter().find(|c| c.id == id).cloned())
    }

    fn create(&mut self, data: NewCategory) -> Result<Category, StoreError> {
        let id = next_id(self.categories.iter().map(|c| c.id));
        let category = data.into_category(id);
        self.categories.push(category.clone());
        Ok(category)
    }

    fn update(&mut self, id: i64, patch: CategoryPatch) -> Result<Category, StoreError> {
        let index = self.position(id)?;
        let category = &mut self.categories[index];
        patch.apply(category);
        Ok(category.clone())
    }

    fn delete(&mut self, id: i64) -> Result<Category, StoreError> {
        let index = self.position(id)?;
        Ok(self.categories.remove(index))
    }

    fn update_task_count(&mut self, name: &str, count: u32) -> Result<Option<Category>, StoreError> {
        Ok(self
            .categories
            .iter_mut()
            .find(|c| c.name == name)
            .map(|category| {
                category.task_count = count;
                category.clone()
            }))
    }
}
