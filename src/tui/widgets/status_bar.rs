use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::config::Theme;
use crate::controller::{Notification, NotificationKind};
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};

const SEPARATOR: &str = " • ";
const ELLIPSIS: &str = "...";

/// Join as many hints as fit in `max_width`, ending with an ellipsis when
/// some had to be dropped
pub fn fit_hints(key_hints: &[String], max_width: usize) -> String {
    let mut text = String::new();
    for (i, hint) in key_hints.iter().enumerate() {
        let current_len = text.chars().count();
        let would_be_len = if i == 0 {
            hint.chars().count()
        } else {
            current_len + SEPARATOR.chars().count() + hint.chars().count()
        };

        if would_be_len > max_width {
            let source = if i == 0 { hint.as_str() } else { text.as_str() };
            if i > 0 && current_len + ELLIPSIS.len() <= max_width {
                text.push_str(ELLIPSIS);
            } else {
                let truncated: String = source.chars().take(max_width.saturating_sub(ELLIPSIS.len())).collect();
                text = truncated + ELLIPSIS;
            }
            break;
        }

        if i > 0 {
            text.push_str(SEPARATOR);
        }
        text.push_str(hint);
    }
    text
}

pub fn render_status_bar(f: &mut Frame, area: Rect, message: Option<&Notification>, key_hints: &[String], theme: &Theme) {
    let fg_color = parse_color(&theme.fg);
    let bg_color = parse_color(&theme.bg);
    let max_width = area.width as usize;

    let (content, style) = match message {
        Some(notification) => {
            let msg_bg = match notification.kind {
                NotificationKind::Success => parse_color(&theme.highlight_bg),
                NotificationKind::Error => parse_color(&theme.error_fg),
            };
            let mut text = notification.message.clone();
            if text.chars().count() > max_width {
                text = text.chars().take(max_width.saturating_sub(3)).collect::<String>() + ELLIPSIS;
            }
            let style = Style::default()
                .fg(get_contrast_text_color(msg_bg))
                .bg(msg_bg)
                .add_modifier(Modifier::BOLD);
            (text, style)
        }
        None => (fit_hints(key_hints, max_width), Style::default().fg(fg_color).bg(bg_color)),
    };

    f.render_widget(Paragraph::new(content).style(style), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn all_hints_fit() {
        assert_eq!(fit_hints(&hints(&["q: Quit", "n: New"]), 40), "q: Quit • n: New");
    }

    #[test]
    fn overflow_ends_with_ellipsis() {
        let text = fit_hints(&hints(&["q: Quit", "n: New", "e: Edit"]), 20);
        assert_eq!(text, "q: Quit • n: New...");
        assert_eq!(fit_hints(&hints(&["a very long hint"]), 8), "a ver...");
    }
}
