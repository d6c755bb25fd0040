use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::config::Theme;
use crate::form::{DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS};
use crate::tui::app::{TaskField, TaskForm};
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::confirm_delete::popup_area;

/// Value as shown in the form: a cursor on the active text field, arrows on
/// the active choice field, and a character counter where a limit applies
fn display_value(form: &TaskForm, field: TaskField) -> String {
    let value = form.value(field);
    let active = form.current_field == field;
    let shown = match (active, field.is_text()) {
        (true, true) => format!("{}▏", value),
        (true, false) => format!("◂ {} ▸", value),
        (false, _) => value,
    };
    let limit = match field {
        TaskField::Title => Some(TITLE_MAX_CHARS),
        TaskField::Description => Some(DESCRIPTION_MAX_CHARS),
        _ => None,
    };
    match limit {
        Some(max) if active => format!("{}  ({}/{})", shown, form.value(field).chars().count(), max),
        _ => shown,
    }
}

pub fn render_task_form(f: &mut Frame, area: Rect, form: &TaskForm, editing: bool, theme: &Theme) {
    let fg_color = parse_color(&theme.fg);
    let bg_color = parse_color(&theme.bg);
    let highlight = parse_color(&theme.highlight_bg);
    let error_color = parse_color(&theme.error_fg);
    let base = Style::default().fg(fg_color).bg(bg_color);

    let popup = popup_area(area, 70, 75);
    f.render_widget(Clear, popup);

    let mut lines = Vec::new();
    for field in TaskField::ORDER {
        let label_style = if form.current_field == field {
            Style::default().fg(highlight).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        lines.push(Line::from(Span::styled(field.label(), label_style)));
        lines.push(Line::from(format!("  {}", display_value(form, field))));
        if let Some(error) = form.error_for(field) {
            lines.push(Line::from(Span::styled(format!("  {}", error), Style::default().fg(error_color))));
        }
        lines.push(Line::from(""));
    }
    if let Some(errors) = &form.errors {
        lines.push(Line::from(Span::styled(errors.to_string(), Style::default().fg(error_color))));
    }
    lines.push(Line::from(
        "Tab/↑↓: Field • ←→/Space: Change choice • Enter/Ctrl+s: Save • Esc: Cancel",
    ));

    let title = if editing { "Edit Task" } else { "New Task" };
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_alignment(Alignment::Center)
                .style(base),
        )
        .style(base)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, popup);
}
