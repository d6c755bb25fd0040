use chrono::NaiveDate;
use std::collections::HashMap;
use thiserror::Error;

use crate::form::{FormErrors, TaskDraft};
use crate::models::{Category, Task, TaskPatch};
use crate::presenter::{derive_view, TaskView, ViewSelector};
use crate::store::{CategoryStore, StoreError, TaskStore};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load tasks. Please try again.";

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Validation(#[from] FormErrors),
    #[error("No task form is open")]
    NoTaskForm,
    #[error("Task not found: {0}")]
    UnknownTask(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormState {
    Closed,
    Create,
    Edit(Task),
}

impl FormState {
    pub fn is_open(&self) -> bool {
        !matches!(self, FormState::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// One-line message for the user about the last action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

/// Owns the stores and the page state, and turns user actions into store
/// calls. Mutations wait for the store before touching local state.
pub struct TaskController {
    task_store: Box<dyn TaskStore>,
    category_store: Box<dyn CategoryStore>,
    tasks: Vec<Task>,
    categories: Vec<Category>,
    load_state: LoadState,
    form: FormState,
    search: String,
    selector: ViewSelector,
    notification: Option<Notification>,
}

impl TaskController {
    pub fn new(task_store: Box<dyn TaskStore>, category_store: Box<dyn CategoryStore>) -> Self {
        Self {
            task_store,
            category_store,
            tasks: Vec::new(),
            categories: Vec::new(),
            load_state: LoadState::Loading,
            form: FormState::Closed,
            search: String::new(),
            selector: ViewSelector::default(),
            notification: None,
        }
    }

    /// Fetch tasks and categories. A task failure moves to `Failed`; a
    /// category failure only leaves the category list empty.
    pub fn load(&mut self) -> &LoadState {
        self.load_state = LoadState::Loading;

        match self.category_store.get_all() {
            Ok(categories) => self.categories = categories,
            Err(e) => {
                tracing::error!(error = %e, "failed to load categories");
                self.categories.clear();
            }
        }

        match self.task_store.get_all() {
            Ok(tasks) => {
                tracing::info!(tasks = tasks.len(), categories = self.categories.len(), "loaded");
                self.tasks = tasks;
                self.load_state = LoadState::Loaded;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load tasks");
                self.load_state = LoadState::Failed(LOAD_FAILED_MESSAGE.to_string());
            }
        }
        &self.load_state
    }

    pub fn retry(&mut self) -> &LoadState {
        self.load()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn task(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    pub fn selector(&self) -> &ViewSelector {
        &self.selector
    }

    pub fn set_selector(&mut self, selector: ViewSelector) {
        self.selector = selector;
    }

    /// Switch view by route path such as `/overdue` or `/category/work`
    pub fn navigate(&mut self, route: &str) {
        self.selector = ViewSelector::from_route(route);
    }

    /// Select `selector`, or go back to the default view if it is already active
    pub fn toggle_selector(&mut self, selector: ViewSelector) {
        if self.selector == selector {
            self.selector = ViewSelector::All;
        } else {
            self.selector = selector;
        }
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn take_notification(&mut self) -> Option<Notification> {
        self.notification.take()
    }

    pub fn view(&self, today: NaiveDate) -> TaskView {
        derive_view(&self.tasks, &self.selector, &self.search, today)
    }

    pub fn open_create_form(&mut self) {
        self.form = FormState::Create;
    }

    pub fn open_edit_form(&mut self, id: i64) -> Result<(), ControllerError> {
        let task = self.task(id).cloned().ok_or(ControllerError::UnknownTask(id))?;
        self.form = FormState::Edit(task);
        Ok(())
    }

    pub fn cancel_form(&mut self) {
        self.form = FormState::Closed;
    }

    /// Validate and save the open form. The form stays open on any failure.
    pub fn submit_form(&mut self, draft: TaskDraft, today: NaiveDate) -> Result<Task, ControllerError> {
        if let Err(errors) = draft.validate(today) {
            self.notification = Some(Notification::error(errors.to_string()));
            return Err(errors.into());
        }

        let result = match &self.form {
            FormState::Closed => return Err(ControllerError::NoTaskForm),
            FormState::Create => self.task_store.create(draft.into_new_task()),
            FormState::Edit(task) => self.task_store.update(task.id, draft.into_patch()),
        };

        let saved = match result {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!(error = %e, "failed to save task");
                self.notification = Some(Notification::error("Failed to save task. Please try again."));
                return Err(e.into());
            }
        };

        let message = if matches!(self.form, FormState::Create) {
            self.tasks.insert(0, saved.clone());
            "Task created successfully!"
        } else {
            self.replace_task(saved.clone());
            "Task updated successfully!"
        };
        self.form = FormState::Closed;
        self.notification = Some(Notification::success(message));
        Ok(saved)
    }

    /// Flip completion of one task. The store call finishes before this
    /// returns, so a second toggle of the same task cannot overlap it.
    pub fn toggle_complete(&mut self, id: i64) -> Result<Task, ControllerError> {
        let completed = self.task(id).ok_or(ControllerError::UnknownTask(id))?.completed;

        match self.task_store.update(id, TaskPatch::completed(!completed)) {
            Ok(updated) => {
                if updated.completed {
                    self.notification = Some(Notification::success("Task completed!"));
                }
                self.replace_task(updated.clone());
                Ok(updated)
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "failed to toggle task");
                self.notification = Some(Notification::error("Failed to update task"));
                Err(e.into())
            }
        }
    }

    /// Delete a task. Confirmation happens before this is called.
    pub fn delete(&mut self, id: i64) -> Result<Task, ControllerError> {
        match self.task_store.delete(id) {
            Ok(removed) => {
                self.tasks.retain(|t| t.id != id);
                self.notification = Some(Notification::success("Task deleted successfully"));
                Ok(removed)
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "failed to delete task");
                self.notification = Some(Notification::error("Failed to delete task"));
                Err(e.into())
            }
        }
    }

    /// Recompute each category's task count and write it back
    pub fn recount_categories(&mut self) -> Result<(), ControllerError> {
        let mut counts: HashMap<&str, u32> = HashMap::new();
        for task in &self.tasks {
            *counts.entry(task.category.name()).or_insert(0) += 1;
        }

        let mut refreshed = Vec::with_capacity(self.categories.len());
        for category in &self.categories {
            let count = counts.get(category.name.as_str()).copied().unwrap_or(0);
            if let Some(updated) = self.category_store.update_task_count(&category.name, count)? {
                refreshed.push(updated);
            }
        }
        self.categories = refreshed;
        Ok(())
    }

    fn replace_task(&mut self, updated: Task) {
        if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == updated.id) {
            *slot = updated;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTask, Priority};
    use crate::store::{MemoryCategoryStore, MemoryTaskStore};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Task store whose every call fails, for error paths
    struct BrokenStore;

    impl TaskStore for BrokenStore {
        fn get_all(&self) -> Result<Vec<Task>, StoreError> {
            Err(StoreError::DirectoryError("offline".to_string()))
        }
        fn get_by_id(&self, _id: i64) -> Result<Option<Task>, StoreError> {
            Err(StoreError::DirectoryError("offline".to_string()))
        }
        fn create(&mut self, _data: NewTask) -> Result<Task, StoreError> {
            Err(StoreError::DirectoryError("offline".to_string()))
        }
        fn update(&mut self, id: i64, _patch: TaskPatch) -> Result<Task, StoreError> {
            Err(StoreError::task_not_found(id))
        }
        fn delete(&mut self, id: i64) -> Result<Task, StoreError> {
            Err(StoreError::task_not_found(id))
        }
    }

    /// In-memory task store that fails every call while `offline` is set
    struct SwitchableStore {
        inner: MemoryTaskStore,
        offline: Rc<Cell<bool>>,
    }

    impl SwitchableStore {
        fn check(&self) -> Result<(), StoreError> {
            if self.offline.get() {
                return Err(StoreError::DirectoryError("offline".to_string()));
            }
            Ok(())
        }
    }

    impl TaskStore for SwitchableStore {
        fn get_all(&self) -> Result<Vec<Task>, StoreError> {
            self.check()?;
            self.inner.get_all()
        }
        fn get_by_id(&self, id: i64) -> Result<Option<Task>, StoreError> {
            self.check()?;
            self.inner.get_by_id(id)
        }
        fn create(&mut self, data: NewTask) -> Result<Task, StoreError> {
            self.check()?;
            self.inner.create(data)
        }
        fn update(&mut self, id: i64, patch: TaskPatch) -> Result<Task, StoreError> {
            self.check()?;
            self.inner.update(id, patch)
        }
        fn delete(&mut self, id: i64) -> Result<Task, StoreError> {
            self.check()?;
            self.inner.delete(id)
        }
    }

    /// Controller over a switchable store, plus the switch
    fn switchable(offline: bool) -> (TaskController, Rc<Cell<bool>>) {
        let switch = Rc::new(Cell::new(offline));
        let store = SwitchableStore {
            inner: MemoryTaskStore::default(),
            offline: Rc::clone(&switch),
        };
        let c = TaskController::new(
            Box::new(store),
            Box::new(MemoryCategoryStore::from_fixtures().unwrap()),
        );
        (c, switch)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn controller() -> TaskController {
        let mut c = TaskController::new(
            Box::new(MemoryTaskStore::default()),
            Box::new(MemoryCategoryStore::from_fixtures().unwrap()),
        );
        c.load();
        c
    }

    fn draft(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            ..TaskDraft::default()
        }
    }

    #[test]
    fn starts_loading_then_loaded() {
        let mut c = TaskController::new(
            Box::new(MemoryTaskStore::from_fixtures().unwrap()),
            Box::new(MemoryCategoryStore::from_fixtures().unwrap()),
        );
        assert_eq!(c.load_state(), &LoadState::Loading);
        assert_eq!(c.load(), &LoadState::Loaded);
        assert!(!c.tasks().is_empty());
        assert!(c.category("work").is_some());
    }

    #[test]
    fn failed_load_offers_retry() {
        let mut c = TaskController::new(
            Box::new(BrokenStore),
            Box::new(MemoryCategoryStore::default()),
        );
        assert_eq!(c.load(), &LoadState::Failed(LOAD_FAILED_MESSAGE.to_string()));
        assert_eq!(c.retry(), &LoadState::Failed(LOAD_FAILED_MESSAGE.to_string()));
    }

    #[test]
    fn retry_recovers_once_the_store_is_back() {
        let (mut c, offline) = switchable(true);
        assert_eq!(c.load(), &LoadState::Failed(LOAD_FAILED_MESSAGE.to_string()));

        offline.set(false);
        assert_eq!(c.retry(), &LoadState::Loaded);
        assert!(c.category("work").is_some());
    }

    #[test]
    fn failed_toggle_leaves_task_unchanged() {
        let (mut c, offline) = switchable(false);
        c.load();
        c.open_create_form();
        let created = c.submit_form(draft("Stay open"), today()).unwrap();

        offline.set(true);
        let err = c.toggle_complete(created.id).unwrap_err();
        assert!(matches!(err, ControllerError::Store(_)));
        assert_eq!(c.notification(), Some(&Notification::error("Failed to update task")));
        assert_eq!(c.task(created.id), Some(&created));
    }

    #[test]
    fn failed_delete_keeps_task() {
        let (mut c, offline) = switchable(false);
        c.load();
        c.open_create_form();
        let created = c.submit_form(draft("Keep me"), today()).unwrap();

        offline.set(true);
        let err = c.delete(created.id).unwrap_err();
        assert!(matches!(err, ControllerError::Store(_)));
        assert_eq!(c.notification(), Some(&Notification::error("Failed to delete task")));
        assert_eq!(c.tasks().len(), 1);
        assert!(c.task(created.id).is_some());
    }

    #[test]
    fn create_prepends_and_closes_form() {
        let mut c = controller();
        c.open_create_form();
        let first = c.submit_form(draft("First"), today()).unwrap();
        c.open_create_form();
        let second = c.submit_form(draft("Second"), today()).unwrap();

        assert_eq!(c.tasks()[0].id, second.id);
        assert_eq!(c.tasks()[1].id, first.id);
        assert_eq!(c.form(), &FormState::Closed);
        assert_eq!(
            c.notification(),
            Some(&Notification::success("Task created successfully!"))
        );
    }

    #[test]
    fn invalid_draft_never_reaches_store() {
        let mut c = controller();
        c.open_create_form();
        let err = c.submit_form(draft(""), today()).unwrap_err();
        assert!(matches!(err, ControllerError::Validation(_)));
        assert!(c.tasks().is_empty());
        assert_eq!(c.form(), &FormState::Create);
    }

    #[test]
    fn submit_without_form_is_rejected() {
        let mut c = controller();
        let err = c.submit_form(draft("Orphan"), today()).unwrap_err();
        assert!(matches!(err, ControllerError::NoTaskForm));
    }

    #[test]
    fn store_failure_keeps_form_open() {
        let mut c = TaskController::new(Box::new(BrokenStore), Box::new(MemoryCategoryStore::default()));
        c.open_create_form();
        let err = c.submit_form(draft("Never saved"), today()).unwrap_err();
        assert!(matches!(err, ControllerError::Store(_)));
        assert_eq!(c.form(), &FormState::Create);
        assert_eq!(
            c.notification().map(|n| n.kind),
            Some(NotificationKind::Error)
        );
    }

    #[test]
    fn edit_replaces_record() {
        let mut c = controller();
        c.open_create_form();
        let created = c.submit_form(draft("Draft"), today()).unwrap();

        c.open_edit_form(created.id).unwrap();
        let mut edited = TaskDraft::from_task(c.task(created.id).unwrap());
        edited.title = "Final".to_string();
        edited.priority = Priority::High;
        c.submit_form(edited, today()).unwrap();

        let task = c.task(created.id).unwrap();
        assert_eq!(task.title, "Final");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(c.tasks().len(), 1);
        assert_eq!(c.form(), &FormState::Closed);
    }

    #[test]
    fn toggle_and_delete() {
        let mut c = controller();
        c.open_create_form();
        let created = c.submit_form(draft("Toggle me"), today()).unwrap();

        let done = c.toggle_complete(created.id).unwrap();
        assert!(done.completed && done.completed_at.is_some());
        assert!(c.task(created.id).unwrap().completed);

        let reopened = c.toggle_complete(created.id).unwrap();
        assert!(reopened.completed_at.is_none());

        c.delete(created.id).unwrap();
        assert!(c.task(created.id).is_none());
        assert!(c.delete(created.id).is_err());
        assert!(matches!(c.toggle_complete(created.id), Err(ControllerError::UnknownTask(_))));
    }

    #[test]
    fn navigation_and_toggle_selector() {
        let mut c = controller();
        c.navigate("/category/work");
        assert_eq!(c.selector(), &ViewSelector::Category("work".to_string()));
        c.toggle_selector(ViewSelector::Category("work".to_string()));
        assert_eq!(c.selector(), &ViewSelector::All);
    }

    #[test]
    fn recount_updates_categories() {
        let mut c = controller();
        for title in ["a", "b"] {
            c.open_create_form();
            c.submit_form(draft(title), today()).unwrap();
        }
        c.recount_categories().unwrap();
        assert_eq!(c.category("work").unwrap().task_count, 2);
        assert_eq!(c.category("personal").unwrap().task_count, 0);
    }
}
