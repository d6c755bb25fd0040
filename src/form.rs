use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

use crate::models::{CategoryRef, NewTask, Priority, Task, TaskPatch, DEFAULT_CATEGORY};

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Description,
    DueDate,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::DueDate => "due date",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Title is required")]
    TitleRequired,
    #[error("Title must be less than 100 characters")]
    TitleTooLong,
    #[error("Description must be less than 500 characters")]
    DescriptionTooLong,
    #[error("Due date cannot be in the past")]
    DueDateInPast,
}

impl FieldError {
    pub fn field(&self) -> Field {
        match self {
            FieldError::TitleRequired | FieldError::TitleTooLong => Field::Title,
            FieldError::DescriptionTooLong => Field::Description,
            FieldError::DueDateInPast => Field::DueDate,
        }
    }
}

/// Every problem found in one draft, in field order
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Please fix the errors below")]
pub struct FormErrors(pub Vec<FieldError>);

impl FormErrors {
    pub fn for_field(&self, field: Field) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field() == field)
    }
}

/// User-entered values for creating or editing a task
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: String,
    pub due_date: Option<NaiveDate>,
}

impl Default for TaskDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            priority: Priority::Medium,
            category: DEFAULT_CATEGORY.to_string(),
            due_date: None,
        }
    }
}

impl TaskDraft {
    /// Prefill from an existing task for editing
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            category: task.category.name().to_string(),
            due_date: task.due_date,
        }
    }

    pub fn validate(&self, today: NaiveDate) -> Result<(), FormErrors> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push(FieldError::TitleRequired);
        } else if self.title.chars().count() > TITLE_MAX_CHARS {
            errors.push(FieldError::TitleTooLong);
        }

        if self.description.chars().count() > DESCRIPTION_MAX_CHARS {
            errors.push(FieldError::DescriptionTooLong);
        }

        if self.due_date.is_some_and(|due| due < today) {
            errors.push(FieldError::DueDateInPast);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(FormErrors(errors))
        }
    }

    pub fn into_new_task(self) -> NewTask {
        NewTask {
            title: self.title,
            description: self.description,
            priority: self.priority,
            category: CategoryRef::ByName(self.category),
            due_date: self.due_date,
        }
    }

    /// Patch replacing every editable field
    pub fn into_patch(self) -> TaskPatch {
        TaskPatch {
            title: Some(self.title),
            description: Some(self.description),
            priority: Some(self.priority),
            category: Some(CategoryRef::ByName(self.category)),
            due_date: Some(self.due_date),
            ..TaskPatch::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn draft(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            ..TaskDraft::default()
        }
    }

    #[test]
    fn valid_draft_passes() {
        let mut d = draft("Book flights");
        d.due_date = Some(today());
        assert_eq!(d.validate(today()), Ok(()));
    }

    #[test]
    fn blank_title_is_required() {
        let errors = draft("   ").validate(today()).unwrap_err();
        assert_eq!(errors.for_field(Field::Title), Some(&FieldError::TitleRequired));
    }

    #[test]
    fn length_limits() {
        assert!(draft(&"a".repeat(100)).validate(today()).is_ok());

        let mut d = draft(&"a".repeat(101));
        d.description = "b".repeat(501);
        let errors = d.validate(today()).unwrap_err();
        assert_eq!(
            errors.0,
            vec![FieldError::TitleTooLong, FieldError::DescriptionTooLong]
        );
    }

    #[test]
    fn past_due_date_is_rejected() {
        let mut d = draft("Late");
        d.due_date = today().pred_opt();
        let errors = d.validate(today()).unwrap_err();
        assert_eq!(errors.0, vec![FieldError::DueDateInPast]);
        assert_eq!(errors.to_string(), "Please fix the errors below");
    }

    #[test]
    fn defaults_match_new_task_form() {
        let d = TaskDraft::default();
        assert_eq!(d.priority, Priority::Medium);
        assert_eq!(d.category, "work");
    }
}
