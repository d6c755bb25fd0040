use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use thiserror::Error;

use crate::config::StoreBackend;
use crate::controller::{ControllerError, LoadState, TaskController};
use crate::form::TaskDraft;
use crate::models::{Priority, Task};
use crate::presenter::{SpecialRoute, TaskCounts, ViewSelector};
use crate::utils::parse_date;

#[derive(Parser)]
#[command(name = "taskflow")]
#[command(about = "Tasks with categories, priorities and due dates")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (separate config and database)
    #[arg(long)]
    pub dev: bool,

    /// Override the configured store backend
    #[arg(long, value_enum)]
    pub backend: Option<StoreBackend>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Print tasks for a view
    List {
        /// Route: /, /today, /overdue, /completed, /upcoming,
        /// /category/<name> or /priority/<level>
        #[arg(default_value = "/")]
        route: String,
        /// Only tasks whose title or description contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Add a new task
    Add {
        /// Task title
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// low, medium or high
        #[arg(long, default_value = "medium")]
        priority: Priority,
        #[arg(long, default_value = crate::models::DEFAULT_CATEGORY)]
        category: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },
    /// Edit fields of an existing task
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        category: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
    },
    /// Mark a task completed, or reopen it
    Toggle { id: i64 },
    /// Delete a task
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show task counts
    Stats,
    /// List categories
    Categories {
        /// Recompute and store the per-category task counts first
        #[arg(long)]
        recount: bool,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    ControllerError(#[from] ControllerError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("{0}")]
    LoadError(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Load the controller's data, turning a failed load into an error
pub fn load(controller: &mut TaskController) -> Result<(), CliError> {
    match controller.load() {
        LoadState::Failed(message) => Err(CliError::LoadError(message.clone())),
        _ => Ok(()),
    }
}

fn parse_due(due: &str) -> Result<NaiveDate, CliError> {
    parse_date(due).map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", due, e)))
}

/// One line per task: status, id, priority, title, category and due date
pub fn format_task_line(task: &Task, today: NaiveDate) -> String {
    let status = if task.completed { "✓" } else { "○" };
    let due = match task.due_date {
        Some(due) if task.is_overdue(today) => format!(" [due {} OVERDUE]", due),
        Some(due) if due == today => " [due today]".to_string(),
        Some(due) => format!(" [due {}]", due),
        None => String::new(),
    };
    format!(
        "{} #{:<4} {:<6} {} ({}){}",
        status,
        task.id,
        task.priority,
        task.title,
        task.category.name(),
        due
    )
}

pub fn format_counts(counts: &TaskCounts) -> String {
    format!(
        "Total: {}  Completed: {}  Pending: {}  Overdue: {}  Due today: {}  Progress: {}%",
        counts.total,
        counts.completed,
        counts.pending,
        counts.overdue,
        counts.due_today,
        counts.completion_rate()
    )
}

/// Handle the list command
pub fn handle_list(
    controller: &mut TaskController,
    route: &str,
    search: Option<String>,
    today: NaiveDate,
) -> Result<(), CliError> {
    controller.navigate(route);
    controller.set_search(search.unwrap_or_default());

    let view = controller.view(today);
    println!("{} ({})", view.title, view.summary);
    if view.tasks.is_empty() {
        println!("{}: {}", view.empty_state.title, view.empty_state.description);
    }
    for task in &view.tasks {
        println!("{}", format_task_line(task, today));
    }
    Ok(())
}

pub struct AddArgs {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: String,
    pub due: Option<String>,
}

/// Handle the add command
pub fn handle_add(controller: &mut TaskController, args: AddArgs, today: NaiveDate) -> Result<(), CliError> {
    let due_date = args.due.as_deref().map(parse_due).transpose()?;

    controller.open_create_form();
    let task = controller.submit_form(
        TaskDraft {
            title: args.title,
            description: args.description,
            priority: args.priority,
            category: args.category,
            due_date,
        },
        today,
    )?;
    println!("Task created successfully (ID: {})", task.id);
    Ok(())
}

pub struct EditArgs {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub due: Option<String>,
    pub clear_due: bool,
}

/// Handle the edit command: start from the stored task, overlay the given flags
pub fn handle_edit(controller: &mut TaskController, args: EditArgs, today: NaiveDate) -> Result<(), CliError> {
    controller.open_edit_form(args.id)?;
    let mut draft = match controller.task(args.id) {
        Some(task) => TaskDraft::from_task(task),
        None => return Err(ControllerError::UnknownTask(args.id).into()),
    };

    if let Some(title) = args.title {
        draft.title = title;
    }
    if let Some(description) = args.description {
        draft.description = description;
    }
    if let Some(priority) = args.priority {
        draft.priority = priority;
    }
    if let Some(category) = args.category {
        draft.category = category;
    }
    if let Some(due) = args.due {
        draft.due_date = Some(parse_due(&due)?);
    } else if args.clear_due {
        draft.due_date = None;
    }

    let task = controller.submit_form(draft, today)?;
    println!("Task updated successfully (ID: {})", task.id);
    Ok(())
}

/// Handle the toggle command
pub fn handle_toggle(controller: &mut TaskController, id: i64) -> Result<(), CliError> {
    let task = controller.toggle_complete(id)?;
    if task.completed {
        println!("Task {} completed", task.id);
    } else {
        println!("Task {} reopened", task.id);
    }
    Ok(())
}

/// Handle the delete command, asking for confirmation unless `yes`
pub fn handle_delete(controller: &mut TaskController, id: i64, yes: bool) -> Result<(), CliError> {
    let title = match controller.task(id) {
        Some(task) => task.title.clone(),
        None => return Err(ControllerError::UnknownTask(id).into()),
    };

    if !yes {
        print!("Are you sure you want to delete \"{}\"? [y/N] ", title);
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            println!("Cancelled");
            return Ok(());
        }
    }

    let removed = controller.delete(id)?;
    println!("Task deleted successfully (ID: {})", removed.id);
    Ok(())
}

/// Handle the stats command
pub fn handle_stats(controller: &TaskController, today: NaiveDate) -> Result<(), CliError> {
    let counts = controller.view(today).counts;
    println!("{}", format_counts(&counts));
    for route in SpecialRoute::ALL {
        println!(
            "  {:<10} {}",
            ViewSelector::Special(route).route(),
            counts.for_route(route)
        );
    }
    Ok(())
}

/// Handle the categories command
pub fn handle_categories(controller: &mut TaskController, recount: bool) -> Result<(), CliError> {
    if recount {
        controller.recount_categories()?;
    }
    for category in controller.categories() {
        println!("{:<12} {:<8} {}", category.name, category.color, category.task_count);
    }
    Ok(())
}
