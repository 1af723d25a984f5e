//! UI state for the analyzer screen.
//!
//! Kept free of terminal I/O so key handling and outcome bookkeeping can be
//! exercised directly.

use crate::error::AnalysisError;
use crate::protocol::AnalysisResponse;
use crate::render::{render, Section};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::text::Span;
use tui_input::backend::crossterm::EventHandler;
use tui_input::{Input, InputRequest};

/// Result of one analysis request as the UI sees it.
pub type Outcome = Result<AnalysisResponse, AnalysisError>;

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const SCROLL_STEP: u16 = 5;
const DEFAULT_WRAP_WIDTH: usize = 80;

/// What the event loop should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    /// Send this text to the API.
    Submit(String),
    Quit,
}

pub struct App {
    input: Input,
    in_flight: usize,
    outcome: Option<Outcome>,
    sections: Vec<Section>,
    show_raw: bool,
    scroll: u16,
    tick: usize,
    /// Editor width in cells, for moving the cursor by wrapped row.
    wrap_width: usize,
}

impl App {
    /// Create the screen with the editor pre-filled.
    pub fn new(initial_text: impl Into<String>) -> Self {
        Self {
            input: Input::default().with_value(initial_text.into()),
            in_flight: 0,
            outcome: None,
            sections: Vec::new(),
            show_raw: false,
            scroll: 0,
            tick: 0,
            wrap_width: DEFAULT_WRAP_WIDTH,
        }
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn set_wrap_width(&mut self, width: usize) {
        self.wrap_width = width.max(1);
    }

    /// Map a key press onto state changes.
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => Action::Quit,
            KeyCode::Char('c') if ctrl => Action::Quit,
            KeyCode::Char('s') if ctrl => Action::Submit(self.submit()),
            KeyCode::F(5) => Action::Submit(self.submit()),
            KeyCode::Char('r') if ctrl => {
                self.toggle_raw();
                Action::None
            }
            KeyCode::F(2) => {
                self.toggle_raw();
                Action::None
            }
            KeyCode::PageDown => {
                self.scroll = self.scroll.saturating_add(SCROLL_STEP);
                Action::None
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(SCROLL_STEP);
                Action::None
            }
            KeyCode::Up => {
                self.move_cursor_row(false);
                Action::None
            }
            KeyCode::Down => {
                self.move_cursor_row(true);
                Action::None
            }
            KeyCode::Enter => {
                self.input.handle(InputRequest::InsertChar('\n'));
                Action::None
            }
            _ => {
                self.input.handle_event(&Event::Key(key));
                Action::None
            }
        }
    }

    /// Move the cursor one wrapped row, keeping its column where possible.
    fn move_cursor_row(&mut self, down: bool) {
        let value = self.input.value();
        let (rows, (row, col)) = wrap_input(value, self.input.cursor(), self.wrap_width);

        let target = if down {
            row + 1
        } else {
            match row.checked_sub(1) {
                Some(target) => target,
                None => return,
            }
        };
        if target >= rows.len() {
            return;
        }

        let idx = index_at(value, self.wrap_width, target, col);
        self.input.handle(InputRequest::SetCursor(idx));
    }

    /// Mark a request as started and return the text to send.
    ///
    /// Submitting again while a request is outstanding is allowed.
    pub fn submit(&mut self) -> String {
        self.in_flight += 1;
        self.input.value().to_string()
    }

    /// Record a finished request. The latest completion replaces whatever
    /// was shown before, so an error never leaves stale sections behind.
    pub fn complete(&mut self, outcome: Outcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.sections = match &outcome {
            Ok(analysis) => render(analysis),
            Err(_) => Vec::new(),
        };
        self.outcome = Some(outcome);
        self.scroll = 0;
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Sections of the latest successful analysis; empty otherwise.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn toggle_raw(&mut self) {
        self.show_raw = !self.show_raw;
    }

    pub fn show_raw(&self) -> bool {
        self.show_raw
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    /// Advance the busy spinner.
    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    pub fn spinner(&self) -> char {
        SPINNER[self.tick % SPINNER.len()]
    }
}

/// Soft-wrap `text` into rows at most `width` cells wide.
///
/// Returns the rows and the (row, column) cell of the character index
/// `cursor`. Wide characters count as two cells and are never split.
pub fn wrap_input(text: &str, cursor: usize, width: usize) -> (Vec<String>, (usize, usize)) {
    let width = width.max(1);
    let mut rows = vec![String::new()];
    let mut col = 0;
    let mut cursor_pos = None;

    for (idx, ch) in text.chars().enumerate() {
        if ch == '\n' {
            if idx == cursor {
                cursor_pos = Some((rows.len() - 1, col));
            }
            rows.push(String::new());
            col = 0;
            continue;
        }

        let ch_width = char_width(ch);
        if col > 0 && col + ch_width > width {
            rows.push(String::new());
            col = 0;
        }
        if idx == cursor {
            cursor_pos = Some((rows.len() - 1, col));
        }
        if let Some(row) = rows.last_mut() {
            row.push(ch);
        }
        col += ch_width;
    }

    let cursor_pos = match cursor_pos {
        Some(pos) => pos,
        // Cursor after the last character: a full row pushes it down
        None if col >= width => {
            rows.push(String::new());
            (rows.len() - 1, 0)
        }
        None => (rows.len() - 1, col),
    };

    (rows, cursor_pos)
}

fn char_width(ch: char) -> usize {
    let mut buf = [0u8; 4];
    Span::raw(&*ch.encode_utf8(&mut buf)).width()
}

/// Character index at (`target_row`, `target_col`) of the wrapped text.
///
/// Lands on the character covering that column, or the end of the row when
/// the row is shorter. Rows past the end map to the end of the text.
fn index_at(text: &str, width: usize, target_row: usize, target_col: usize) -> usize {
    let width = width.max(1);
    let mut row = 0;
    let mut col = 0;

    for (idx, ch) in text.chars().enumerate() {
        if ch == '\n' {
            if row == target_row {
                return idx;
            }
            row += 1;
            col = 0;
            continue;
        }

        let ch_width = char_width(ch);
        if col > 0 && col + ch_width > width {
            if row == target_row {
                // Last character of a soft-wrapped row
                return idx - 1;
            }
            row += 1;
            col = 0;
        }
        if row == target_row && col + ch_width > target_col {
            return idx;
        }
        col += ch_width;
    }

    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_prefilled_input() {
        let app = App::new("お世話になっております。");
        assert_eq!(app.input().value(), "お世話になっております。");
        assert!(!app.is_busy());
        assert!(app.outcome().is_none());
    }

    #[test]
    fn test_typing_and_newline() {
        let mut app = App::new("");
        app.handle_key(key(KeyCode::Char('a')));
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('b')));
        assert_eq!(app.input().value(), "a\nb");

        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.input().value(), "a\n");
    }

    #[test]
    fn test_submit_keys() {
        let mut app = App::new("拝見します");
        assert_eq!(app.handle_key(ctrl('s')), Action::Submit("拝見します".to_string()));
        assert_eq!(app.handle_key(key(KeyCode::F(5))), Action::Submit("拝見します".to_string()));
        assert!(app.is_busy());
    }

    #[test]
    fn test_quit_keys() {
        let mut app = App::new("");
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(app.handle_key(ctrl('c')), Action::Quit);
    }

    #[test]
    fn test_overlapping_requests() {
        let mut app = App::new("text");
        app.submit();
        app.submit();
        assert!(app.is_busy());

        app.complete(Err(AnalysisError::MalformedResponse));
        assert!(app.is_busy());

        app.complete(Ok(AnalysisResponse::default()));
        assert!(!app.is_busy());
        assert!(matches!(app.outcome(), Some(Ok(_))));
    }

    #[test]
    fn test_error_clears_previous_sections() {
        let mut app = App::new("text");
        app.submit();
        app.complete(Ok(AnalysisResponse::default()));
        assert_eq!(app.sections().len(), 5);

        app.submit();
        app.complete(Err(AnalysisError::RequestFailed {
            status: 500,
            body: "Internal Error".to_string(),
        }));
        assert!(app.sections().is_empty());
        assert!(matches!(app.outcome(), Some(Err(_))));
    }

    #[test]
    fn test_raw_toggle() {
        let mut app = App::new("");
        assert!(!app.show_raw());
        app.handle_key(ctrl('r'));
        assert!(app.show_raw());
        app.handle_key(key(KeyCode::F(2)));
        assert!(!app.show_raw());
    }

    #[test]
    fn test_scroll_resets_on_completion() {
        let mut app = App::new("");
        app.handle_key(key(KeyCode::PageDown));
        app.handle_key(key(KeyCode::PageDown));
        assert_eq!(app.scroll(), 10);
        app.handle_key(key(KeyCode::PageUp));
        assert_eq!(app.scroll(), 5);

        app.submit();
        app.complete(Ok(AnalysisResponse::default()));
        assert_eq!(app.scroll(), 0);
    }

    #[test]
    fn test_spinner_cycles() {
        let mut app = App::new("");
        let first = app.spinner();
        app.on_tick();
        assert_ne!(app.spinner(), first);
        for _ in 0..9 {
            app.on_tick();
        }
        assert_eq!(app.spinner(), first);
    }

    #[test]
    fn test_wrap_ascii() {
        let (rows, cursor) = wrap_input("abcdef", 6, 4);
        assert_eq!(rows, vec!["abcd", "ef"]);
        assert_eq!(cursor, (1, 2));
    }

    #[test]
    fn test_wrap_wide_characters() {
        let (rows, cursor) = wrap_input("敬語です", 2, 5);
        assert_eq!(rows, vec!["敬語", "です"]);
        assert_eq!(cursor, (1, 0));
    }

    #[test]
    fn test_wrap_newlines() {
        let (rows, cursor) = wrap_input("ab\ncd", 2, 10);
        assert_eq!(rows, vec!["ab", "cd"]);
        assert_eq!(cursor, (0, 2));

        let (rows, cursor) = wrap_input("ab\n", 3, 10);
        assert_eq!(rows, vec!["ab", ""]);
        assert_eq!(cursor, (1, 0));
    }

    #[test]
    fn test_wrap_cursor_after_full_row() {
        let (rows, cursor) = wrap_input("abcd", 4, 4);
        assert_eq!(rows, vec!["abcd", ""]);
        assert_eq!(cursor, (1, 0));
    }

    #[test]
    fn test_char_width() {
        assert_eq!(char_width('a'), 1);
        assert_eq!(char_width('敬'), 2);
    }

    #[test]
    fn test_up_down_between_lines() {
        let mut app = App::new("abc\ndefg");
        assert_eq!(app.input().cursor(), 8);

        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.input().cursor(), 3);

        // Already on the first row
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.input().cursor(), 3);

        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.input().cursor(), 7);
    }

    #[test]
    fn test_up_down_across_wrapped_rows() {
        let mut app = App::new("abcdefgh");
        app.set_wrap_width(4);

        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.input().cursor(), 4);
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.input().cursor(), 0);
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.input().cursor(), 4);
    }

    #[test]
    fn test_up_into_shorter_wide_row() {
        let mut app = App::new("敬語です");
        app.set_wrap_width(5);

        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.input().cursor(), 1);
    }
}
