use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Sort weight: higher sorts first
    pub fn weight(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown priority '{0}' (expected low, medium or high)")]
pub struct UnknownPriority(pub String);

impl FromStr for Priority {
    type Err = UnknownPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(UnknownPriority(other.to_string())),
        }
    }
}

/// Reference from a task to its category.
///
/// The in-memory store keeps plain names; the table-backed store resolves
/// names to category rows. Everything past the store boundary reads the
/// name through [`CategoryRef::name`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    ById { id: i64, name: String },
    ByName(String),
}

impl CategoryRef {
    pub fn name(&self) -> &str {
        match self {
            CategoryRef::ById { name, .. } => name,
            CategoryRef::ByName(name) => name,
        }
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            CategoryRef::ById { id, .. } => Some(*id),
            CategoryRef::ByName(_) => None,
        }
    }
}

impl From<&str> for CategoryRef {
    fn from(name: &str) -> Self {
        CategoryRef::ByName(name.to_string())
    }
}

impl Default for CategoryRef {
    fn default() -> Self {
        CategoryRef::ByName(DEFAULT_CATEGORY.to_string())
    }
}

pub const DEFAULT_CATEGORY: &str = "work";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: CategoryRef,
    #[serde(default)]
    pub due_date: Option<NaiveDate>, // calendar date, no time component
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived: bool,
}

impl Task {
    pub fn is_due_on(&self, day: NaiveDate) -> bool {
        self.due_date == Some(day)
    }

    /// Open task whose due date is strictly before `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < today)
    }

    pub fn is_due_today(&self, today: NaiveDate) -> bool {
        !self.completed && self.is_due_on(today)
    }

    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due >= today)
    }
}

/// Field set accepted by `TaskStore::create`
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: CategoryRef,
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority: Priority::default(),
            category: CategoryRef::default(),
            due_date: None,
        }
    }

    /// Build the stored record. Store-owned fields are stamped here.
    pub fn into_task(self, id: i64, now: DateTime<Utc>) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            priority: self.priority,
            category: self.category,
            due_date: self.due_date,
            completed: false,
            created_at: now,
            completed_at: None,
            archived: false,
        }
    }
}

/// Partial update for a task. `None` leaves the field untouched.
///
/// `due_date` and `completed_at` are doubly optional so a patch can clear them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<CategoryRef>,
    pub due_date: Option<Option<NaiveDate>>,
    pub completed: Option<bool>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub archived: Option<bool>,
}

impl TaskPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    /// Shallow merge onto `task`.
    ///
    /// A change of `completed` always decides `completed_at`, whatever the
    /// patch says about it.
    pub fn apply(mut self, task: &mut Task, now: DateTime<Utc>) {
        if let Some(completed) = self.completed {
            if completed != task.completed {
                self.completed_at = Some(completed.then_some(now));
            }
        }

        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(completed_at) = self.completed_at {
            task.completed_at = completed_at;
        }
        if let Some(archived) = self.archived {
            task.archived = archived;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub task_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub color: String,
}

impl NewCategory {
    pub fn into_category(self, id: i64) -> Category {
        Category {
            id,
            name: self.name,
            color: self.color,
            task_count: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub task_count: Option<u32>,
}

impl CategoryPatch {
    pub fn apply(self, category: &mut Category) {
        if let Some(name) = self.name {
            category.name = name;
        }
        if let Some(color) = self.color {
            category.color = color;
        }
        if let Some(task_count) = self.task_count {
            category.task_count = task_count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_task() -> Task {
        NewTask::new("Write report").into_task(1, Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap())
    }

    #[test]
    fn completing_stamps_completed_at() {
        let mut task = sample_task();
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();

        TaskPatch::completed(true).apply(&mut task, now);
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(now));

        TaskPatch::completed(false).apply(&mut task, now);
        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn explicit_completed_at_is_overridden_on_transition() {
        let mut task = sample_task();
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
        let patch = TaskPatch {
            completed: Some(true),
            completed_at: Some(None),
            ..TaskPatch::default()
        };
        patch.apply(&mut task, now);
        assert_eq!(task.completed_at, Some(now));
    }

    #[test]
    fn patch_without_completed_keeps_timestamps() {
        let mut task = sample_task();
        let created = task.created_at;
        let patch = TaskPatch {
            title: Some("Renamed".to_string()),
            due_date: Some(NaiveDate::from_ymd_opt(2024, 2, 1)),
            ..TaskPatch::default()
        };
        patch.apply(&mut task, Utc::now());
        assert_eq!(task.title, "Renamed");
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(task.created_at, created);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn category_ref_deserializes_both_shapes() {
        let by_name: CategoryRef = serde_json::from_str("\"personal\"").unwrap();
        assert_eq!(by_name, CategoryRef::ByName("personal".to_string()));
        let by_id: CategoryRef = serde_json::from_str(r#"{"id": 2, "name": "personal"}"#).unwrap();
        assert_eq!(by_id.name(), "personal");
        assert_eq!(by_id.id(), Some(2));
    }

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::High));
        let err = "urgent".parse::<Priority>().unwrap_err();
        assert_eq!(err, UnknownPriority("urgent".to_string()));
        assert_eq!(err.to_string(), "unknown priority 'urgent' (expected low, medium or high)");
    }
}
