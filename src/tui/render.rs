use ratatui::layout::{Alignment, Constraint, Direction, Layout as RatLayout};
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::controller::{FormState, LoadState};
use crate::tui::app::{App, Focus, Mode};
use crate::tui::layout::Layout;
use crate::tui::widgets::{
    color::parse_color,
    confirm_delete::render_confirm_delete,
    form::render_task_form,
    sidebar::render_sidebar,
    stats::render_stats,
    status_bar::render_status_bar,
    task_list::{render_message, render_task_list},
};

/// Hints for the status bar in the current mode, using the configured keys
fn key_hints(app: &App) -> Vec<String> {
    let keys = &app.config.key_bindings;
    match app.mode {
        Mode::Search => vec![
            "Type to search".to_string(),
            "Enter: Keep".to_string(),
            "Esc: Clear".to_string(),
        ],
        Mode::Form | Mode::ConfirmDelete(_) => Vec::new(),
        Mode::Normal if !app.is_loaded() => vec![
            format!("{}: Retry", keys.retry),
            format!("{}: Quit", keys.quit),
        ],
        Mode::Normal => vec![
            format!("{}: New", keys.new),
            format!("{}: Edit", keys.edit),
            format!("{}: Toggle", keys.toggle_complete),
            format!("{}: Delete", keys.delete),
            format!("{}: Search", keys.search),
            format!("{}: Filters", keys.focus_sidebar),
            format!("{}/{}: Move", keys.list_down, keys.list_up),
            format!("{}: Quit", keys.quit),
        ],
    }
}

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let theme = app.config.theme.clone();
    let fg_color = parse_color(&theme.fg);
    let bg_color = parse_color(&theme.bg);

    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("TaskFlow")
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(fg_color).bg(bg_color));
    f.render_widget(outer_block, f.area());

    let view = app.view();

    let entries = app.sidebar_entries(&view.counts);
    app.sidebar_index = app.sidebar_index.min(entries.len().saturating_sub(1));
    render_sidebar(
        f,
        layout.sidebar_area,
        &entries,
        app.sidebar_index,
        app.controller.selector(),
        app.focus == Focus::Sidebar,
        &theme,
    );

    // The search line sits above the list while a query is set
    let searching = app.mode == Mode::Search || !app.controller.search().is_empty();
    let (search_area, list_area) = if searching {
        let split = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(layout.main_area);
        (Some(split[0]), split[1])
    } else {
        (None, layout.main_area)
    };

    if let Some(area) = search_area {
        let cursor = if app.mode == Mode::Search { "▏" } else { "" };
        let search = Paragraph::new(Line::from(format!("{}{}", app.controller.search(), cursor)))
            .block(Block::default().borders(Borders::ALL).title("Search"))
            .style(Style::default().fg(fg_color).bg(bg_color));
        f.render_widget(search, area);
    }

    match app.controller.load_state().clone() {
        LoadState::Loading => render_message(f, list_area, "Tasks", "Loading tasks...", "", &theme),
        LoadState::Failed(message) => render_message(
            f,
            list_area,
            "Tasks",
            "Something went wrong",
            &format!("{} Press {} to retry.", message, app.config.key_bindings.retry),
            &theme,
        ),
        LoadState::Loaded => {
            render_task_list(
                f,
                list_area,
                &view,
                app.controller.categories(),
                &mut app.list_state,
                app.today,
                app.focus == Focus::List,
                &theme,
            );
        }
    }

    render_stats(f, layout.stats_area, &view.counts, &theme);

    let hints = key_hints(app);
    render_status_bar(f, layout.status_area, app.status.message.as_ref(), &hints, &theme);

    match app.mode {
        Mode::Form => {
            if let Some(form) = &app.task_form {
                let editing = matches!(app.controller.form(), FormState::Edit(_));
                render_task_form(f, layout.inner_area, form, editing, &theme);
            }
        }
        Mode::ConfirmDelete(id) => {
            if let Some(task) = app.controller.task(id) {
                render_confirm_delete(f, layout.inner_area, task, &theme);
            }
        }
        _ => {}
    }
}
