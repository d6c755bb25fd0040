use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::config::Theme;
use crate::presenter::TaskCounts;
use crate::tui::widgets::color::parse_color;

/// Text bar of `width` cells, filled in proportion to `percent`
pub fn progress_bar(percent: u32, width: usize) -> String {
    let filled = (percent.min(100) as usize * width) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn render_stats(f: &mut Frame, area: Rect, counts: &TaskCounts, theme: &Theme) {
    let fg_color = parse_color(&theme.fg);
    let bg_color = parse_color(&theme.bg);
    let rate = counts.completion_rate();

    let mut spans = vec![
        Span::raw(format!("Total {}  ", counts.total)),
        Span::raw(format!("Done {}  ", counts.completed)),
        Span::raw(format!("Pending {}  ", counts.pending)),
    ];
    if counts.overdue > 0 {
        spans.push(Span::styled(
            format!("Overdue {}  ", counts.overdue),
            Style::default().fg(parse_color(&theme.error_fg)),
        ));
    } else {
        spans.push(Span::raw("Overdue 0  "));
    }
    spans.push(Span::raw(format!("{} {}%", progress_bar(rate, 10), rate)));

    let paragraph = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .style(Style::default().fg(fg_color).bg(bg_color));
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(progress_bar(0, 4), "░░░░");
        assert_eq!(progress_bar(50, 4), "██░░");
        assert_eq!(progress_bar(100, 4), "████");
        assert_eq!(progress_bar(250, 4), "████");
    }
}
