use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Rect};

pub struct Layout {
    pub inner_area: Rect, // Area inside the outer border
    pub sidebar_area: Rect,
    pub main_area: Rect,
    pub stats_area: Rect,
    pub status_area: Rect,
}

impl Layout {
    /// Minimum terminal dimensions inside the outer border.
    /// Width leaves room for the 22 column sidebar plus a usable list.
    pub const MIN_WIDTH: u16 = 48;
    pub const MIN_HEIGHT: u16 = 12;

    pub fn calculate(size: Rect, sidebar_width_percent: u16) -> Self {
        let min_width_with_border = Self::MIN_WIDTH + 2;
        let min_height_with_border = Self::MIN_HEIGHT + 2;
        let width = size.width.max(min_width_with_border);
        let height = size.height.max(min_height_with_border);
        let size = Rect::new(size.x, size.y, width, height);

        let inner_area = Rect::new(
            size.x + 1,
            size.y + 1,
            size.width.saturating_sub(2),
            size.height.saturating_sub(2),
        );

        // Sidebar between 22 columns and 40%, main area keeps at least 20
        let percent_of = |percent: u16| (u32::from(inner_area.width) * u32::from(percent.min(100)) / 100) as u16;
        let requested_width = percent_of(sidebar_width_percent);
        let max_width = percent_of(40);
        let sidebar_width = requested_width
            .max(22)
            .min(max_width)
            .min(inner_area.width.saturating_sub(20));

        let vertical = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // Sidebar + task list
                Constraint::Length(3), // Stats (borders + one line)
                Constraint::Length(1), // Status
            ])
            .split(inner_area);

        let horizontal = RatLayout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(sidebar_width), Constraint::Min(1)])
            .split(vertical[0]);

        Self {
            inner_area,
            sidebar_area: horizontal[0],
            main_area: horizontal[1],
            stats_area: vertical[1],
            status_area: vertical[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn areas_fit_inside_border() {
        let layout = Layout::calculate(Rect::new(0, 0, 100, 30), 28);
        assert_eq!(layout.inner_area, Rect::new(1, 1, 98, 28));
        assert_eq!(layout.sidebar_area.width, 27);
        assert_eq!(layout.sidebar_area.width + layout.main_area.width, 98);
        assert_eq!(layout.stats_area.height, 3);
        assert_eq!(layout.status_area.height, 1);
        assert_eq!(layout.status_area.y + 1, 29);
    }

    #[test]
    fn oversized_percent_stays_within_bounds() {
        let layout = Layout::calculate(Rect::new(0, 0, 250, 40), 300);
        assert_eq!(layout.sidebar_area.width, 99);
        assert_eq!(layout.sidebar_area.width + layout.main_area.width, 248);
    }

    #[test]
    fn narrow_terminal_clamps_sidebar() {
        let layout = Layout::calculate(Rect::new(0, 0, 50, 14), 80);
        assert!(layout.sidebar_area.width <= 19);
        assert!(layout.main_area.width >= 20);
    }
}
