use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};
use ratatui::Frame;

use crate::config::Theme;
use crate::presenter::ViewSelector;
use crate::tui::app::SidebarEntry;
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};

pub fn render_sidebar(
    f: &mut Frame,
    area: Rect,
    entries: &[SidebarEntry],
    selected_index: usize,
    active: &ViewSelector,
    focused: bool,
    theme: &Theme,
) {
    let fg_color = parse_color(&theme.fg);
    let highlight_bg = parse_color(&theme.highlight_bg);
    let inner_width = area.width.saturating_sub(2) as usize;

    let items: Vec<ListItem> = entries
        .iter()
        .map(|entry| {
            let marker = if &entry.selector == active { "▸ " } else { "  " };
            let mut spans = vec![Span::raw(marker)];
            if let Some(color) = &entry.color {
                spans.push(Span::styled("● ", Style::default().fg(parse_color(color))));
            }
            spans.push(Span::raw(entry.label.clone()));

            if let Some(count) = entry.count {
                let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
                let count_text = count.to_string();
                let pad = inner_width.saturating_sub(used + count_text.len() + 1);
                spans.push(Span::raw(" ".repeat(pad.max(1))));
                spans.push(Span::styled(count_text, Style::default().add_modifier(Modifier::DIM)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let border_style = if focused {
        Style::default().fg(highlight_bg)
    } else {
        Style::default().fg(fg_color)
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Filters")
                .border_style(border_style),
        )
        .style(Style::default().fg(fg_color))
        .highlight_style(if focused {
            Style::default().fg(get_contrast_text_color(highlight_bg)).bg(highlight_bg)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        });

    let mut state = ListState::default().with_selected(Some(selected_index));
    f.render_stateful_widget(list, area, &mut state);
}
