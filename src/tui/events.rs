use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, size as terminal_size, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::io;

use crate::tui::app::{App, Focus, Mode};
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;

/// Restores the terminal when dropped, including during a panic unwind.
/// A TUI that exits in raw mode leaves the user's shell unusable.
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    /// Restore on normal exit; the guard does nothing on drop afterwards
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Check size before entering the alternate screen so the error is readable
    let (width, height) = terminal_size()?;
    let min_width = Layout::MIN_WIDTH + 2;
    let min_height = Layout::MIN_HEIGHT + 2;
    if width < min_width || height < min_height {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, Minimum required: {}x{}. Please resize your terminal window.",
            width, height, min_width, min_height
        )));
    }

    let mut guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    loop {
        app.check_status_message_timeout();

        let size = terminal.size()?;
        let terminal_rect = Rect::new(0, 0, size.width, size.height);
        terminal.draw(|f| {
            let layout = Layout::calculate(terminal_rect, app.config.sidebar_width_percent);
            crate::tui::render::render(f, &mut app, &layout);
        })?;

        // Only Press events; Windows also reports Release
        if event::poll(std::time::Duration::from_millis(16))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && handle_key_event(&mut app, key_event) {
                    break;
                }
            }
        }
    }

    guard.restore()?;
    Ok(())
}

/// Dispatch one key press. Returns true when the user asked to quit.
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> bool {
    match app.mode {
        Mode::Search => {
            handle_search_key(app, key_event);
            false
        }
        Mode::Form => {
            handle_form_key(app, key_event);
            false
        }
        Mode::ConfirmDelete(_) => {
            handle_delete_confirmation(app, key_event);
            false
        }
        Mode::Normal => handle_normal_key(app, key_event),
    }
}

fn handle_normal_key(app: &mut App, key_event: KeyEvent) -> bool {
    let keys = app.keys.clone();

    if keys.quit.matches(key_event) {
        return true;
    }

    if !app.is_loaded() {
        // Only retry and quit do anything until the tasks are loaded
        if keys.retry.matches(key_event) {
            app.retry();
        }
        return false;
    }

    if keys.search.matches(key_event) {
        app.enter_search_mode();
    } else if keys.new.matches(key_event) {
        app.enter_create_mode();
    } else if keys.edit.matches(key_event) {
        app.enter_edit_mode();
    } else if keys.toggle_complete.matches(key_event) {
        app.toggle_selected();
    } else if keys.delete.matches(key_event) {
        app.request_delete();
    } else if keys.focus_sidebar.matches(key_event) {
        app.toggle_focus();
    } else if keys.list_up.matches(key_event) || key_event.code == KeyCode::Up {
        app.move_selection_up();
    } else if keys.list_down.matches(key_event) || key_event.code == KeyCode::Down {
        app.move_selection_down();
    } else if key_event.code == KeyCode::Enter && app.focus == Focus::Sidebar {
        app.activate_sidebar_entry();
    } else if key_event.code == KeyCode::Esc {
        app.clear_search();
    }
    false
}

fn handle_search_key(app: &mut App, key_event: KeyEvent) {
    match key_event.code {
        KeyCode::Esc => app.clear_search(),
        KeyCode::Enter => app.exit_search_mode(),
        KeyCode::Backspace => app.remove_from_search(),
        KeyCode::Char(ch) => app.add_to_search(ch),
        _ => {}
    }
}

fn handle_form_key(app: &mut App, key_event: KeyEvent) {
    if app.keys.save.matches(key_event) || key_event.code == KeyCode::Enter {
        app.save_form();
        return;
    }
    if key_event.code == KeyCode::Esc {
        app.exit_form_mode();
        return;
    }

    // Unbound Ctrl/Alt chords are not text
    let chord = key_event.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
    let categories = app.category_names();
    let Some(form) = app.task_form.as_mut() else {
        return;
    };

    match key_event.code {
        KeyCode::Tab | KeyCode::Down => form.navigate_field(true),
        KeyCode::BackTab | KeyCode::Up => form.navigate_field(false),
        KeyCode::Left if !form.current_field.is_text() => form.cycle_choice(false, &categories),
        KeyCode::Right if !form.current_field.is_text() => form.cycle_choice(true, &categories),
        KeyCode::Char(' ') if !form.current_field.is_text() => form.cycle_choice(true, &categories),
        KeyCode::Backspace => form.delete_char(),
        KeyCode::Char(ch) if !chord => form.insert_char(ch),
        _ => {}
    }
}

fn handle_delete_confirmation(app: &mut App, key_event: KeyEvent) {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_delete(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_delete(),
        _ => {}
    }
}
