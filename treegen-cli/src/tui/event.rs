//! Event handling for the TUI

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::app::App;

/// Poll for events with timeout
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Result of handling a key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleResult {
    /// Continue running
    Continue,
    /// Quit the application
    Quit,
    /// Start a generate run
    Generate,
}

/// Handle a key event
pub fn handle_key(app: &App, key: KeyEvent) -> HandleResult {
    if key.kind != KeyEventKind::Press {
        return HandleResult::Continue;
    }

    // Global quit shortcuts (Ctrl+C, Ctrl+Q)
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => HandleResult::Quit,
            _ => HandleResult::Continue,
        };
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => HandleResult::Quit,

        // The button is disabled while a run is active
        KeyCode::Char('g') | KeyCode::Char('G') | KeyCode::Enter if !app.is_busy() => {
            HandleResult::Generate
        }

        _ => HandleResult::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treegen_core::GallerySession;

    fn idle() -> App {
        App::new(GallerySession::new("http://localhost:5000/output", 5))
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn generate_keys_trigger_when_idle() {
        let app = idle();
        assert_eq!(handle_key(&app, press(KeyCode::Char('g'))), HandleResult::Generate);
        assert_eq!(handle_key(&app, press(KeyCode::Enter)), HandleResult::Generate);
    }

    #[test]
    fn generate_is_ignored_while_busy() {
        let mut app = idle();
        app.trigger();
        assert_eq!(handle_key(&app, press(KeyCode::Char('g'))), HandleResult::Continue);
        assert_eq!(handle_key(&app, press(KeyCode::Enter)), HandleResult::Continue);
    }

    #[test]
    fn quit_keys() {
        let mut app = idle();
        app.trigger();
        assert_eq!(handle_key(&app, press(KeyCode::Char('q'))), HandleResult::Quit);
        assert_eq!(handle_key(&app, press(KeyCode::Esc)), HandleResult::Quit);
        assert_eq!(
            handle_key(&app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            HandleResult::Quit
        );
    }

    #[test]
    fn key_release_is_ignored() {
        let app = idle();
        let mut key = press(KeyCode::Char('g'));
        key.kind = KeyEventKind::Release;
        assert_eq!(handle_key(&app, key), HandleResult::Continue);
    }
}
