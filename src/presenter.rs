//! Derived task views.
//!
//! Everything here is a pure function of the task collection, the selected
//! view, the search text and the current date. Nothing is cached; callers
//! re-derive on every change.

use chrono::NaiveDate;
use std::cmp::Ordering;
use std::fmt;

use crate::models::{Priority, Task};

/// Date-driven views reachable from the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialRoute {
    Today,
    Overdue,
    Completed,
    Upcoming,
}

impl SpecialRoute {
    pub const ALL: [SpecialRoute; 4] = [
        SpecialRoute::Today,
        SpecialRoute::Overdue,
        SpecialRoute::Completed,
        SpecialRoute::Upcoming,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            SpecialRoute::Today => "today",
            SpecialRoute::Overdue => "overdue",
            SpecialRoute::Completed => "completed",
            SpecialRoute::Upcoming => "upcoming",
        }
    }
}

/// Which subset of tasks is shown
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewSelector {
    /// Open tasks only
    #[default]
    All,
    Category(String),
    Priority(Priority),
    Special(SpecialRoute),
}

impl ViewSelector {
    /// Route path for this selector, the inverse of [`ViewSelector::from_route`]
    pub fn route(&self) -> String {
        match self {
            ViewSelector::All => "/".to_string(),
            ViewSelector::Category(name) => format!("/category/{}", name),
            ViewSelector::Priority(level) => format!("/priority/{}", level),
            ViewSelector::Special(route) => format!("/{}", route.slug()),
        }
    }

    /// Parse a route path. Unknown paths fall back to the default view.
    pub fn from_route(path: &str) -> Self {
        let trimmed = path.trim().trim_end_matches('/');
        let mut parts = trimmed.trim_start_matches('/').splitn(2, '/');
        let head = parts.next().unwrap_or("");
        let tail = parts.next();

        match (head, tail) {
            ("category", Some(name)) if !name.is_empty() => ViewSelector::Category(name.to_string()),
            ("priority", Some(level)) => level
                .parse()
                .map(ViewSelector::Priority)
                .unwrap_or_default(),
            ("today", None) => ViewSelector::Special(SpecialRoute::Today),
            ("overdue", None) => ViewSelector::Special(SpecialRoute::Overdue),
            ("completed", None) => ViewSelector::Special(SpecialRoute::Completed),
            ("upcoming", None) => ViewSelector::Special(SpecialRoute::Upcoming),
            _ => ViewSelector::All,
        }
    }

    /// Heading shown above the list
    pub fn title(&self) -> String {
        match self {
            ViewSelector::All => "All Tasks".to_string(),
            ViewSelector::Category(name) => format!("{} Tasks", capitalize(name)),
            ViewSelector::Priority(level) => format!("{} Priority Tasks", capitalize(level.as_str())),
            ViewSelector::Special(SpecialRoute::Today) => "Due Today".to_string(),
            ViewSelector::Special(SpecialRoute::Overdue) => "Overdue Tasks".to_string(),
            ViewSelector::Special(SpecialRoute::Completed) => "Completed Tasks".to_string(),
            ViewSelector::Special(SpecialRoute::Upcoming) => "Upcoming Tasks".to_string(),
        }
    }

    fn filter(&self) -> TaskFilter<'_> {
        match self {
            ViewSelector::All => TaskFilter::Pending,
            ViewSelector::Category(name) => TaskFilter::Category(name),
            ViewSelector::Priority(level) => TaskFilter::Priority(*level),
            ViewSelector::Special(SpecialRoute::Today) => TaskFilter::DueToday,
            ViewSelector::Special(SpecialRoute::Overdue) => TaskFilter::Overdue,
            ViewSelector::Special(SpecialRoute::Completed) => TaskFilter::Completed,
            ViewSelector::Special(SpecialRoute::Upcoming) => TaskFilter::Upcoming,
        }
    }
}

impl fmt::Display for ViewSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.route())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Single predicate over a task, covering every read helper the stores
/// would otherwise expose separately
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter<'a> {
    Category(&'a str),
    Priority(Priority),
    Completed,
    Pending,
    Overdue,
    DueToday,
    Upcoming,
    /// Case-insensitive substring of title or description
    Search(&'a str),
}

impl TaskFilter<'_> {
    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        match self {
            TaskFilter::Category(name) => task.category.name() == *name,
            TaskFilter::Priority(level) => task.priority == *level,
            TaskFilter::Completed => task.completed,
            TaskFilter::Pending => !task.completed,
            TaskFilter::Overdue => task.is_overdue(today),
            TaskFilter::DueToday => task.is_due_today(today),
            TaskFilter::Upcoming => task.is_upcoming(today),
            TaskFilter::Search(query) => {
                let query = query.to_lowercase();
                task.title.to_lowercase().contains(&query)
                    || task.description.to_lowercase().contains(&query)
            }
        }
    }
}

/// Tasks matching `filter`, in input order
pub fn apply_filter<'t>(tasks: &'t [Task], filter: TaskFilter<'_>, today: NaiveDate) -> Vec<&'t Task> {
    tasks.iter().filter(|task| filter.matches(task, today)).collect()
}

/// Display order: priority weight descending, then dated before undated with
/// the earlier date first, then newest `created_at` first
pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    b.priority
        .weight()
        .cmp(&a.priority.weight())
        .then_with(|| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Aggregates over the whole collection, independent of the active view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskCounts {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
    pub due_today: usize,
    pub upcoming: usize,
}

impl TaskCounts {
    pub fn from_tasks(tasks: &[Task], today: NaiveDate) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            total,
            completed,
            pending: total - completed,
            overdue: tasks.iter().filter(|t| t.is_overdue(today)).count(),
            due_today: tasks.iter().filter(|t| t.is_due_today(today)).count(),
            upcoming: tasks.iter().filter(|t| t.is_upcoming(today)).count(),
        }
    }

    /// Rounded percentage of completed tasks; 0 when there are none
    pub fn completion_rate(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed as f64 / self.total as f64) * 100.0).round() as u32
    }

    pub fn for_route(&self, route: SpecialRoute) -> usize {
        match route {
            SpecialRoute::Today => self.due_today,
            SpecialRoute::Overdue => self.overdue,
            SpecialRoute::Completed => self.completed,
            SpecialRoute::Upcoming => self.upcoming,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    pub title: String,
    pub description: String,
}

impl EmptyState {
    fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn for_view(selector: &ViewSelector, search: &str) -> Self {
        if !search.is_empty() {
            return Self::new(
                "No tasks found",
                format!("No tasks match \"{}\". Try adjusting your search terms.", search),
            );
        }

        match selector {
            ViewSelector::Category(name) => Self::new(
                format!("No {} tasks", name),
                format!("You don't have any tasks in the {} category yet.", name),
            ),
            ViewSelector::Priority(level) => Self::new(
                format!("No {} priority tasks", level),
                format!("You don't have any {} priority tasks at the moment.", level),
            ),
            ViewSelector::Special(SpecialRoute::Today) => Self::new(
                "Nothing due today",
                "Great! You don't have any tasks due today. Enjoy your free time!",
            ),
            ViewSelector::Special(SpecialRoute::Overdue) => Self::new(
                "No overdue tasks",
                "Excellent! You're all caught up with your deadlines.",
            ),
            ViewSelector::Special(SpecialRoute::Completed) => Self::new(
                "No completed tasks yet",
                "Complete some tasks to see them here. You've got this!",
            ),
            ViewSelector::Special(SpecialRoute::Upcoming) => Self::new(
                "No upcoming tasks",
                "You don't have any upcoming deadlines. Perfect time to plan ahead!",
            ),
            ViewSelector::All => Self::new(
                "No tasks yet",
                "Create your first task to get started organizing your day.",
            ),
        }
    }
}

/// Everything a front end needs to render one list
#[derive(Debug, Clone, PartialEq)]
pub struct TaskView {
    pub tasks: Vec<Task>,
    pub counts: TaskCounts,
    pub title: String,
    pub summary: String,
    pub empty_state: EmptyState,
}

pub fn derive_view(tasks: &[Task], selector: &ViewSelector, search: &str, today: NaiveDate) -> TaskView {
    let selector_filter = selector.filter();

    let mut visible: Vec<Task> = tasks
        .iter()
        .filter(|task| search.is_empty() || TaskFilter::Search(search).matches(task, today))
        .filter(|task| selector_filter.matches(task, today))
        .cloned()
        .collect();
    visible.sort_by(compare_tasks);

    let summary = summarize(visible.len(), search);
    TaskView {
        counts: TaskCounts::from_tasks(tasks, today),
        title: selector.title(),
        empty_state: EmptyState::for_view(selector, search),
        summary,
        tasks: visible,
    }
}

fn summarize(count: usize, search: &str) -> String {
    let plural = if count == 1 { "" } else { "s" };
    if search.is_empty() {
        format!("{} task{}", count, plural)
    } else {
        format!("{} result{} for \"{}\"", count, plural, search)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryRef, NewTask};
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    fn task(id: i64, priority: Priority, due: Option<NaiveDate>, completed: bool) -> Task {
        let mut data = NewTask::new(format!("Task {}", id));
        data.priority = priority;
        data.due_date = due;
        let mut task = data.into_task(id, at(id as u32));
        task.completed = completed;
        task
    }

    fn ids(view: &TaskView) -> Vec<i64> {
        view.tasks.iter().map(|t| t.id).collect()
    }

    const TODAY: (i32, u32, u32) = (2024, 1, 15);

    fn today() -> NaiveDate {
        day(TODAY.0, TODAY.1, TODAY.2)
    }

    #[test]
    fn sorts_by_priority_weight() {
        let tasks = vec![
            task(1, Priority::Low, None, false),
            task(2, Priority::High, None, false),
            task(3, Priority::Medium, None, false),
        ];
        let view = derive_view(&tasks, &ViewSelector::All, "", today());
        assert_eq!(ids(&view), vec![2, 3, 1]);
    }

    #[test]
    fn dated_tasks_sort_before_undated_within_priority() {
        let tasks = vec![
            task(1, Priority::High, Some(day(2024, 1, 10)), false),
            task(2, Priority::High, None, false),
            task(3, Priority::Low, Some(day(2024, 1, 5)), false),
        ];
        let view = derive_view(&tasks, &ViewSelector::All, "", today());
        assert_eq!(ids(&view), vec![1, 2, 3]);

        // creation order does not matter when only one has a due date
        let tasks = vec![
            task(5, Priority::Medium, None, false),
            task(4, Priority::Medium, Some(day(2024, 3, 1)), false),
        ];
        let view = derive_view(&tasks, &ViewSelector::All, "", today());
        assert_eq!(ids(&view), vec![4, 5]);
    }

    #[test]
    fn earlier_due_date_then_newer_creation() {
        let tasks = vec![
            task(1, Priority::Medium, Some(day(2024, 2, 1)), false),
            task(2, Priority::Medium, Some(day(2024, 1, 20)), false),
            task(3, Priority::Medium, None, false),
            task(4, Priority::Medium, None, false),
        ];
        let view = derive_view(&tasks, &ViewSelector::All, "", today());
        assert_eq!(ids(&view), vec![2, 1, 4, 3]);
    }

    #[test]
    fn default_view_hides_completed() {
        let tasks = vec![
            task(1, Priority::Medium, None, true),
            task(2, Priority::Medium, None, false),
        ];
        let view = derive_view(&tasks, &ViewSelector::All, "", today());
        assert_eq!(ids(&view), vec![2]);
    }

    #[test]
    fn overdue_excludes_due_today() {
        let tasks = vec![
            task(1, Priority::Medium, Some(day(2024, 1, 15)), false),
            task(2, Priority::Medium, Some(day(2024, 1, 14)), false),
            task(3, Priority::Medium, Some(day(2024, 1, 1)), true),
        ];
        let view = derive_view(&tasks, &ViewSelector::Special(SpecialRoute::Overdue), "", today());
        assert_eq!(ids(&view), vec![2]);
    }

    #[test]
    fn special_routes() {
        let tasks = vec![
            task(1, Priority::Medium, Some(day(2024, 1, 15)), false),
            task(2, Priority::Medium, Some(day(2024, 1, 14)), false),
            task(3, Priority::Medium, Some(day(2024, 1, 20)), false),
            task(4, Priority::Medium, Some(day(2024, 1, 15)), true),
            task(5, Priority::Medium, None, false),
        ];
        let view = |route| derive_view(&tasks, &ViewSelector::Special(route), "", today());

        assert_eq!(ids(&view(SpecialRoute::Today)), vec![1]);
        assert_eq!(ids(&view(SpecialRoute::Upcoming)), vec![1, 3]);
        assert_eq!(ids(&view(SpecialRoute::Completed)), vec![4]);
    }

    #[test]
    fn category_and_priority_include_completed() {
        let mut personal = task(1, Priority::High, None, true);
        personal.category = CategoryRef::ById {
            id: 2,
            name: "personal".to_string(),
        };
        let tasks = vec![personal, task(2, Priority::Low, None, false)];

        let by_category = derive_view(&tasks, &ViewSelector::Category("personal".to_string()), "", today());
        assert_eq!(ids(&by_category), vec![1]);

        let by_priority = derive_view(&tasks, &ViewSelector::Priority(Priority::Low), "", today());
        assert_eq!(ids(&by_priority), vec![2]);
    }

    #[test]
    fn search_matches_title_or_description_case_insensitively() {
        let mut meeting = task(1, Priority::Medium, None, false);
        meeting.title = "Team Meeting".to_string();
        let mut client = task(2, Priority::Medium, None, false);
        client.description = "meet client".to_string();
        let other = task(3, Priority::Medium, None, false);
        let tasks = vec![meeting, client, other];

        let view = derive_view(&tasks, &ViewSelector::All, "MEET", today());
        assert_eq!(ids(&view), vec![2, 1]);
        assert_eq!(view.summary, "2 results for \"MEET\"");
    }

    #[test]
    fn search_uses_the_query_as_typed() {
        let mut meeting = task(1, Priority::Medium, None, false);
        meeting.title = "Team Meeting".to_string();
        let mut groceries = task(2, Priority::Medium, None, false);
        groceries.title = "Groceries".to_string();
        let tasks = vec![meeting, groceries];

        let trailing = derive_view(&tasks, &ViewSelector::All, "meet ", today());
        assert!(trailing.tasks.is_empty());
        assert_eq!(trailing.empty_state.title, "No tasks found");

        let spaces = derive_view(&tasks, &ViewSelector::All, " ", today());
        assert_eq!(ids(&spaces), vec![1]);
        assert_eq!(spaces.summary, "1 result for \" \"");

        assert!(derive_view(&tasks, &ViewSelector::All, "   ", today()).tasks.is_empty());
    }

    #[test]
    fn search_and_selector_combine() {
        let mut done = task(1, Priority::Medium, None, true);
        done.title = "report".to_string();
        let mut open = task(2, Priority::Medium, None, false);
        open.title = "report draft".to_string();
        let tasks = vec![done, open];

        let view = derive_view(&tasks, &ViewSelector::Special(SpecialRoute::Completed), "report", today());
        assert_eq!(ids(&view), vec![1]);
    }

    #[test]
    fn counts_cover_the_whole_collection() {
        let tasks = vec![
            task(1, Priority::Medium, Some(day(2024, 1, 15)), false),
            task(2, Priority::Medium, Some(day(2024, 1, 14)), false),
            task(3, Priority::Medium, Some(day(2024, 1, 10)), true),
            task(4, Priority::Medium, None, false),
        ];
        let view = derive_view(&tasks, &ViewSelector::Special(SpecialRoute::Completed), "", today());
        assert_eq!(
            view.counts,
            TaskCounts {
                total: 4,
                completed: 1,
                pending: 3,
                overdue: 1,
                due_today: 1,
                upcoming: 1,
            }
        );
        assert_eq!(view.counts.completion_rate(), 25);
        assert_eq!(TaskCounts::default().completion_rate(), 0);
    }

    #[test]
    fn overdue_tasks_are_always_pending() {
        let tasks: Vec<Task> = (1..=12)
            .map(|i| {
                let due = (i % 3 != 0).then(|| day(2024, 1, 10 + i as u32));
                task(i, Priority::Medium, due, i % 2 == 0)
            })
            .collect();
        let counts = TaskCounts::from_tasks(&tasks, today());
        assert_eq!(counts.pending, counts.total - counts.completed);

        let overdue = apply_filter(&tasks, TaskFilter::Overdue, today());
        assert!(overdue.iter().all(|t| !t.completed));
        assert!(overdue.len() <= counts.pending);
    }

    #[test]
    fn route_parsing() {
        assert_eq!(ViewSelector::from_route("/"), ViewSelector::All);
        assert_eq!(ViewSelector::from_route("/today"), ViewSelector::Special(SpecialRoute::Today));
        assert_eq!(ViewSelector::from_route("upcoming/"), ViewSelector::Special(SpecialRoute::Upcoming));
        assert_eq!(
            ViewSelector::from_route("/category/work"),
            ViewSelector::Category("work".to_string())
        );
        assert_eq!(
            ViewSelector::from_route("/priority/high"),
            ViewSelector::Priority(Priority::High)
        );
        assert_eq!(ViewSelector::from_route("/priority/urgent"), ViewSelector::All);
        assert_eq!(ViewSelector::from_route("/nowhere"), ViewSelector::All);

        for selector in [
            ViewSelector::All,
            ViewSelector::Category("work".to_string()),
            ViewSelector::Priority(Priority::Medium),
            ViewSelector::Special(SpecialRoute::Overdue),
        ] {
            assert_eq!(ViewSelector::from_route(&selector.route()), selector);
        }
    }

    #[test]
    fn titles_and_empty_states() {
        assert_eq!(ViewSelector::Category("work".to_string()).title(), "Work Tasks");
        assert_eq!(ViewSelector::Priority(Priority::High).title(), "High Priority Tasks");

        let view = derive_view(&[], &ViewSelector::Special(SpecialRoute::Today), "", today());
        assert_eq!(view.empty_state.title, "Nothing due today");
        assert_eq!(view.summary, "0 tasks");

        let searching = EmptyState::for_view(&ViewSelector::All, "xyz");
        assert_eq!(searching.title, "No tasks found");
    }
}
