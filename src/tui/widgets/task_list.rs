use chrono::NaiveDate;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, List, ListItem, ListState, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
};
use ratatui::Frame;

use crate::config::Theme;
use crate::models::{Category, Priority, Task};
use crate::presenter::TaskView;
use crate::tui::app::priority_color;
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};

fn priority_badge(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "[H]",
        Priority::Medium => "[M]",
        Priority::Low => "[L]",
    }
}

/// Due-date label relative to `today`
pub fn due_label(task: &Task, today: NaiveDate) -> Option<String> {
    let due = task.due_date?;
    let label = if task.is_overdue(today) {
        format!("overdue {}", due.format("%b %-d"))
    } else if due == today {
        "today".to_string()
    } else if today.succ_opt() == Some(due) {
        "tomorrow".to_string()
    } else {
        due.format("%b %-d").to_string()
    };
    Some(label)
}

fn task_item<'a>(task: &'a Task, categories: &[Category], today: NaiveDate, theme: &Theme) -> ListItem<'a> {
    let status = if task.completed { "✓" } else { "○" };
    let title_style = if task.completed {
        Style::default().add_modifier(Modifier::CROSSED_OUT | Modifier::DIM)
    } else {
        Style::default()
    };
    let category_color = categories
        .iter()
        .find(|c| c.name == task.category.name())
        .map(|c| parse_color(&c.color))
        .unwrap_or_else(|| parse_color(&theme.fg));

    let mut spans = vec![
        Span::raw(format!("{} ", status)),
        Span::styled(
            format!("{} ", priority_badge(task.priority)),
            Style::default().fg(parse_color(priority_color(task.priority))),
        ),
        Span::styled(task.title.as_str(), title_style),
        Span::styled(format!("  #{}", task.category.name()), Style::default().fg(category_color)),
    ];
    if let Some(label) = due_label(task, today) {
        let style = if task.is_overdue(today) {
            Style::default().fg(parse_color(&theme.error_fg))
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        spans.push(Span::styled(format!("  [{}]", label), style));
    }
    ListItem::new(Line::from(spans))
}

/// Centered message used for the empty, loading and failed states
pub fn render_message(f: &mut Frame, area: Rect, title: &str, heading: &str, body: &str, theme: &Theme) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(heading.to_string(), Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(body.to_string()),
    ];
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .style(Style::default().fg(parse_color(&theme.fg)).bg(parse_color(&theme.bg)))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

#[allow(clippy::too_many_arguments)]
pub fn render_task_list(
    f: &mut Frame,
    area: Rect,
    view: &TaskView,
    categories: &[Category],
    list_state: &mut ListState,
    today: NaiveDate,
    focused: bool,
    theme: &Theme,
) {
    let title = format!("{} ({})", view.title, view.summary);

    if view.tasks.is_empty() {
        render_message(f, area, &title, &view.empty_state.title, &view.empty_state.description, theme);
        return;
    }

    let highlight_bg = parse_color(&theme.highlight_bg);
    let items: Vec<ListItem> = view
        .tasks
        .iter()
        .map(|task| task_item(task, categories, today, theme))
        .collect();
    let total_items = items.len();

    let list_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let list_area = list_areas[0];
    let scrollbar_area = list_areas[1];

    let border_style = if focused {
        Style::default().fg(highlight_bg)
    } else {
        Style::default().fg(parse_color(&theme.fg))
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title).border_style(border_style))
        .style(Style::default().fg(parse_color(&theme.fg)))
        .highlight_style(Style::default().fg(get_contrast_text_color(highlight_bg)).bg(highlight_bg));

    f.render_stateful_widget(list, list_area, list_state);

    let visible_items = list_area.height.saturating_sub(2) as usize;
    if total_items > visible_items && scrollbar_area.width > 0 && list_area.height > 2 {
        let scrollbar_inner_area = Rect::new(
            scrollbar_area.x,
            list_area.y + 1,
            scrollbar_area.width,
            list_area.height.saturating_sub(2),
        );
        let selected_index = list_state.selected().unwrap_or(0);
        let scroll_position = selected_index.saturating_sub(visible_items.saturating_sub(1));

        let mut scrollbar_state = ScrollbarState::new(total_items)
            .viewport_content_length(visible_items)
            .position(scroll_position);
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");
        f.render_stateful_widget(scrollbar, scrollbar_inner_area, &mut scrollbar_state);
    }
}
