use chrono::NaiveDate;
use ratatui::widgets::ListState;
use std::time::Instant;

use crate::config::{Config, KeyBindings};
use crate::controller::{ControllerError, FormState, LoadState, Notification, TaskController};
use crate::form::{Field, FormErrors, TaskDraft};
use crate::models::{Priority, Task};
use crate::presenter::{SpecialRoute, TaskCounts, TaskView, ViewSelector};
use crate::tui::error::TuiError;
use crate::utils::{parse_date, parse_key_binding, ParsedKeyBinding};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Search,
    Form,
    ConfirmDelete(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Title,
    Description,
    Priority,
    Category,
    DueDate,
}

impl TaskField {
    pub const ORDER: [TaskField; 5] = [
        TaskField::Title,
        TaskField::Description,
        TaskField::Priority,
        TaskField::Category,
        TaskField::DueDate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TaskField::Title => "Title",
            TaskField::Description => "Description",
            TaskField::Priority => "Priority",
            TaskField::Category => "Category",
            TaskField::DueDate => "Due date (YYYY-MM-DD)",
        }
    }

    pub fn is_text(self) -> bool {
        matches!(self, TaskField::Title | TaskField::Description | TaskField::DueDate)
    }

    fn validated_as(self) -> Option<Field> {
        match self {
            TaskField::Title => Some(Field::Title),
            TaskField::Description => Some(Field::Description),
            TaskField::DueDate => Some(Field::DueDate),
            _ => None,
        }
    }
}

/// Editable copy of a task draft. The due date stays raw text until save.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskForm {
    pub current_field: TaskField,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: String,
    pub due_date: String,
    pub errors: Option<FormErrors>,
    pub date_error: Option<String>,
}

impl TaskForm {
    pub fn from_draft(draft: TaskDraft) -> Self {
        Self {
            current_field: TaskField::Title,
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            category: draft.category,
            due_date: draft.due_date.map(|d| d.to_string()).unwrap_or_default(),
            errors: None,
            date_error: None,
        }
    }

    pub fn to_draft(&self) -> Result<TaskDraft, String> {
        let due_date = if self.due_date.trim().is_empty() {
            None
        } else {
            Some(parse_date(&self.due_date).map_err(|_| "Use the YYYY-MM-DD format".to_string())?)
        };
        Ok(TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            priority: self.priority,
            category: self.category.clone(),
            due_date,
        })
    }

    /// Error text to show under a field, if any
    pub fn error_for(&self, field: TaskField) -> Option<String> {
        if field == TaskField::DueDate {
            if let Some(msg) = &self.date_error {
                return Some(msg.clone());
            }
        }
        let errors = self.errors.as_ref()?;
        field
            .validated_as()
            .and_then(|f| errors.for_field(f))
            .map(|e| e.to_string())
    }

    pub fn value(&self, field: TaskField) -> String {
        match field {
            TaskField::Title => self.title.clone(),
            TaskField::Description => self.description.clone(),
            TaskField::Priority => self.priority.to_string(),
            TaskField::Category => self.category.clone(),
            TaskField::DueDate => self.due_date.clone(),
        }
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.current_field {
            TaskField::Title => Some(&mut self.title),
            TaskField::Description => Some(&mut self.description),
            TaskField::DueDate => Some(&mut self.due_date),
            _ => None,
        }
    }

    pub fn insert_char(&mut self, ch: char) {
        if let Some(text) = self.text_mut() {
            text.push(ch);
        }
    }

    pub fn delete_char(&mut self) {
        if let Some(text) = self.text_mut() {
            text.pop();
        }
    }

    pub fn navigate_field(&mut self, forward: bool) {
        let order = TaskField::ORDER;
        let index = order.iter().position(|f| *f == self.current_field).unwrap_or(0);
        let next = if forward {
            (index + 1) % order.len()
        } else {
            (index + order.len() - 1) % order.len()
        };
        self.current_field = order[next];
    }

    /// Step the priority or category choice; `categories` is the list of names
    pub fn cycle_choice(&mut self, forward: bool, categories: &[String]) {
        match self.current_field {
            TaskField::Priority => {
                // Priority::ALL runs high to low
                let levels = Priority::ALL;
                let index = levels.iter().position(|p| *p == self.priority).unwrap_or(1);
                let next = if forward {
                    (index + levels.len() - 1) % levels.len()
                } else {
                    (index + 1) % levels.len()
                };
                self.priority = levels[next];
            }
            TaskField::Category if !categories.is_empty() => {
                let index = categories.iter().position(|c| *c == self.category);
                let next = match (index, forward) {
                    (Some(i), true) => (i + 1) % categories.len(),
                    (Some(i), false) => (i + categories.len() - 1) % categories.len(),
                    (None, _) => 0,
                };
                self.category = categories[next].clone();
            }
            _ => {}
        }
    }
}

/// One selectable row of the sidebar
#[derive(Debug, Clone, PartialEq)]
pub struct SidebarEntry {
    pub label: String,
    pub selector: ViewSelector,
    pub count: Option<usize>,
    pub color: Option<String>,
}

pub fn priority_color(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "#FF6B6B",
        Priority::Medium => "#FFE66D",
        Priority::Low => "#4ECDC4",
    }
}

/// Key bindings from the config, parsed once at startup
#[derive(Debug, Clone)]
pub struct KeyMap {
    pub quit: ParsedKeyBinding,
    pub new: ParsedKeyBinding,
    pub edit: ParsedKeyBinding,
    pub save: ParsedKeyBinding,
    pub delete: ParsedKeyBinding,
    pub search: ParsedKeyBinding,
    pub toggle_complete: ParsedKeyBinding,
    pub retry: ParsedKeyBinding,
    pub list_up: ParsedKeyBinding,
    pub list_down: ParsedKeyBinding,
    pub focus_sidebar: ParsedKeyBinding,
}

impl KeyMap {
    pub fn from_config(bindings: &KeyBindings) -> Result<Self, TuiError> {
        let parse = |s: &str| parse_key_binding(s).map_err(TuiError::KeyBindingError);
        Ok(Self {
            quit: parse(&bindings.quit)?,
            new: parse(&bindings.new)?,
            edit: parse(&bindings.edit)?,
            save: parse(&bindings.save)?,
            delete: parse(&bindings.delete)?,
            search: parse(&bindings.search)?,
            toggle_complete: parse(&bindings.toggle_complete)?,
            retry: parse(&bindings.retry)?,
            list_up: parse(&bindings.list_up)?,
            list_down: parse(&bindings.list_down)?,
            focus_sidebar: parse(&bindings.focus_sidebar)?,
        })
    }
}

pub struct StatusState {
    pub message: Option<Notification>,
    pub message_time: Option<Instant>,
}

pub struct App {
    pub config: Config,
    pub controller: TaskController,
    pub keys: KeyMap,
    pub today: NaiveDate,

    pub focus: Focus,
    pub mode: Mode,
    pub sidebar_index: usize,
    pub list_state: ListState,
    pub task_form: Option<TaskForm>,
    pub status: StatusState,
}

impl App {
    pub fn new(config: Config, controller: TaskController, today: NaiveDate) -> Result<Self, TuiError> {
        let keys = KeyMap::from_config(&config.key_bindings)?;
        let mut app = Self {
            config,
            controller,
            keys,
            today,
            focus: Focus::List,
            mode: Mode::Normal,
            sidebar_index: 0,
            list_state: ListState::default(),
            task_form: None,
            status: StatusState {
                message: None,
                message_time: None,
            },
        };
        app.controller.load();
        app.adjust_selection();
        Ok(app)
    }

    pub fn view(&self) -> TaskView {
        self.controller.view(self.today)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.controller.load_state(), LoadState::Loaded)
    }

    pub fn sidebar_entries(&self, counts: &TaskCounts) -> Vec<SidebarEntry> {
        let mut entries = vec![SidebarEntry {
            label: "All Tasks".to_string(),
            selector: ViewSelector::All,
            count: Some(counts.total),
            color: None,
        }];

        entries.extend(SpecialRoute::ALL.into_iter().map(|route| {
            let selector = ViewSelector::Special(route);
            SidebarEntry {
                label: selector.title(),
                selector,
                count: Some(counts.for_route(route)),
                color: None,
            }
        }));

        entries.extend(self.controller.categories().iter().map(|category| SidebarEntry {
            label: category.name.clone(),
            selector: ViewSelector::Category(category.name.clone()),
            count: None,
            color: Some(category.color.clone()),
        }));

        entries.extend(Priority::ALL.into_iter().map(|level| SidebarEntry {
            label: format!("{} priority", level),
            selector: ViewSelector::Priority(level),
            count: None,
            color: Some(priority_color(level).to_string()),
        }));

        entries
    }

    pub fn selected_task(&self) -> Option<Task> {
        let index = self.list_state.selected()?;
        self.view().tasks.into_iter().nth(index)
    }

    /// Keep the list selection inside the current view
    pub fn adjust_selection(&mut self) {
        let len = self.view().tasks.len();
        if len == 0 {
            self.list_state.select(None);
        } else {
            let index = self.list_state.selected().unwrap_or(0).min(len - 1);
            self.list_state.select(Some(index));
        }
    }

    pub fn move_selection_up(&mut self) {
        match self.focus {
            Focus::Sidebar => self.sidebar_index = self.sidebar_index.saturating_sub(1),
            Focus::List => {
                if let Some(index) = self.list_state.selected() {
                    self.list_state.select(Some(index.saturating_sub(1)));
                }
            }
        }
    }

    pub fn move_selection_down(&mut self) {
        match self.focus {
            Focus::Sidebar => {
                let len = self.sidebar_entries(&TaskCounts::default()).len();
                if self.sidebar_index + 1 < len {
                    self.sidebar_index += 1;
                }
            }
            Focus::List => {
                let len = self.view().tasks.len();
                if let Some(index) = self.list_state.selected() {
                    if index + 1 < len {
                        self.list_state.select(Some(index + 1));
                    }
                }
            }
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Sidebar => Focus::List,
            Focus::List => Focus::Sidebar,
        };
    }

    /// Apply the highlighted sidebar entry. Category and priority entries
    /// switch back to the default view when chosen twice.
    pub fn activate_sidebar_entry(&mut self) {
        let entries = self.sidebar_entries(&TaskCounts::default());
        let Some(entry) = entries.into_iter().nth(self.sidebar_index) else {
            return;
        };
        match entry.selector {
            selector @ (ViewSelector::Category(_) | ViewSelector::Priority(_)) => {
                self.controller.toggle_selector(selector)
            }
            selector => self.controller.set_selector(selector),
        }
        self.list_state.select(Some(0));
        self.adjust_selection();
    }

    pub fn set_status_message(&mut self, message: Notification) {
        self.status.message = Some(message);
        self.status.message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status.message = None;
        self.status.message_time = None;
    }

    /// Clear the status message after 3 seconds
    pub fn check_status_message_timeout(&mut self) {
        const STATUS_MESSAGE_TIMEOUT_SECS: u64 = 3;
        if let Some(time) = self.status.message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_TIMEOUT_SECS {
                self.clear_status_message();
            }
        }
    }

    /// Move the controller's latest notification into the status bar
    fn pull_notification(&mut self) {
        if let Some(notification) = self.controller.take_notification() {
            self.set_status_message(notification);
        }
    }

    pub fn enter_search_mode(&mut self) {
        self.mode = Mode::Search;
    }

    pub fn exit_search_mode(&mut self) {
        self.mode = Mode::Normal;
    }

    pub fn clear_search(&mut self) {
        self.controller.set_search(String::new());
        self.mode = Mode::Normal;
        self.adjust_selection();
    }

    pub fn add_to_search(&mut self, ch: char) {
        let mut query = self.controller.search().to_string();
        query.push(ch);
        self.controller.set_search(query);
        self.list_state.select(Some(0));
        self.adjust_selection();
    }

    pub fn remove_from_search(&mut self) {
        let mut query = self.controller.search().to_string();
        query.pop();
        self.controller.set_search(query);
        self.adjust_selection();
    }

    pub fn category_names(&self) -> Vec<String> {
        self.controller.categories().iter().map(|c| c.name.clone()).collect()
    }

    pub fn enter_create_mode(&mut self) {
        self.controller.open_create_form();
        self.task_form = Some(TaskForm::from_draft(TaskDraft::default()));
        self.mode = Mode::Form;
    }

    pub fn enter_edit_mode(&mut self) {
        let Some(task) = self.selected_task() else {
            self.set_status_message(Notification::error("No task selected"));
            return;
        };
        match self.controller.open_edit_form(task.id) {
            Ok(()) => {
                self.task_form = Some(TaskForm::from_draft(TaskDraft::from_task(&task)));
                self.mode = Mode::Form;
            }
            Err(e) => self.set_status_message(Notification::error(e.to_string())),
        }
    }

    pub fn exit_form_mode(&mut self) {
        self.controller.cancel_form();
        self.task_form = None;
        self.mode = Mode::Normal;
    }

    /// Submit the open form. Validation problems stay on the form.
    pub fn save_form(&mut self) {
        let Some(form) = self.task_form.as_mut() else {
            return;
        };
        let draft = match form.to_draft() {
            Ok(draft) => {
                form.date_error = None;
                draft
            }
            Err(msg) => {
                form.date_error = Some(msg);
                return;
            }
        };

        match self.controller.submit_form(draft, self.today) {
            Ok(saved) => {
                self.task_form = None;
                self.mode = Mode::Normal;
                self.select_task(saved.id);
            }
            Err(ControllerError::Validation(errors)) => {
                if let Some(form) = self.task_form.as_mut() {
                    form.errors = Some(errors);
                }
            }
            Err(e) => tracing::debug!(error = %e, "form submit failed"),
        }
        self.pull_notification();
    }

    /// Put the list cursor on `id` if it is visible in the current view
    fn select_task(&mut self, id: i64) {
        let position = self.view().tasks.iter().position(|t| t.id == id);
        match position {
            Some(index) => self.list_state.select(Some(index)),
            None => self.adjust_selection(),
        }
    }

    pub fn toggle_selected(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        if let Err(e) = self.controller.toggle_complete(task.id) {
            tracing::debug!(id = task.id, error = %e, "toggle failed");
        }
        self.pull_notification();
        self.adjust_selection();
    }

    pub fn request_delete(&mut self) {
        if let Some(task) = self.selected_task() {
            self.mode = Mode::ConfirmDelete(task.id);
        }
    }

    pub fn confirm_delete(&mut self) {
        if let Mode::ConfirmDelete(id) = self.mode {
            if let Err(e) = self.controller.delete(id) {
                tracing::debug!(id, error = %e, "delete failed");
            }
            self.pull_notification();
        }
        self.mode = Mode::Normal;
        self.adjust_selection();
    }

    pub fn cancel_delete(&mut self) {
        self.mode = Mode::Normal;
    }

    pub fn retry(&mut self) {
        self.controller.retry();
        self.adjust_selection();
    }

    /// True while the controller holds an open form; kept in step with `mode`
    pub fn form_open(&self) -> bool {
        self.controller.form() != &FormState::Closed
    }
}
