//! Full-screen analyzer TUI.
//!
//! Layout, top to bottom: header, multi-line editor, status line, results,
//! collapsible raw response panel, key help.

use super::app::{wrap_input, Action, App, Outcome};
use super::http::AnalysisClient;
use crate::render::{render_raw, SUCCESS_BANNER};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const INPUT_HEIGHT: u16 = 8;
const RAW_PANEL_HEIGHT: u16 = 12;

/// Run the analyzer until the user quits.
///
/// Must be called from inside a tokio runtime; requests are spawned onto it
/// while this thread keeps drawing.
pub fn run_tui(client: AnalysisClient, endpoint: Option<String>, initial_text: String) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_event_loop(&mut terminal, client, endpoint, initial_text);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    client: AnalysisClient,
    endpoint: Option<String>,
    initial_text: String,
) -> Result<()> {
    let runtime = Handle::current();
    let (tx, mut rx) = mpsc::unbounded_channel::<Outcome>();
    let mut app = App::new(initial_text);

    loop {
        while let Ok(outcome) = rx.try_recv() {
            debug!("Request finished: {}", if outcome.is_ok() { "ok" } else { "error" });
            app.complete(outcome);
        }

        let raw = client.last_raw_response();
        terminal.draw(|frame| draw_ui(frame, &app, raw.as_deref()))?;

        if !event::poll(POLL_INTERVAL)? {
            app.on_tick();
            continue;
        }

        if let Event::Key(key) = event::read()? {
            // Only handle key press events (not release)
            if key.kind != KeyEventKind::Press {
                continue;
            }

            let size = terminal.size()?;
            app.set_wrap_width(size.width.saturating_sub(2) as usize);

            match app.handle_key(key) {
                Action::Quit => return Ok(()),
                Action::Submit(text) => {
                    let client = client.clone();
                    let endpoint = endpoint.clone();
                    let tx = tx.clone();
                    runtime.spawn(async move {
                        let outcome = client.analyze(&text, endpoint.as_deref()).await;
                        // The receiver only goes away when the UI has exited.
                        let _ = tx.send(outcome);
                    });
                }
                Action::None => {}
            }
        }
    }
}

/// Draw the whole screen.
pub fn draw_ui(frame: &mut Frame, app: &App, raw: Option<&str>) {
    let raw_height = if app.show_raw() { RAW_PANEL_HEIGHT } else { 1 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(raw_height),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_header(frame, chunks[0]);
    draw_input(frame, app, chunks[1]);
    draw_status(frame, app, chunks[2]);
    draw_results(frame, app, chunks[3]);
    draw_raw_panel(frame, app, raw, chunks[4]);
    draw_help(frame, chunks[5]);
}

fn draw_header(frame: &mut Frame, area: Rect) {
    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            "Keigo Analyzer",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Analyze Your Japanese Text for Keigo Usage",
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    frame.render_widget(header, area);
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Enter your Japanese text: ")
        .title_style(Style::default().fg(Color::Cyan))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let input = app.input();
    let (rows, (cursor_row, cursor_col)) =
        wrap_input(input.value(), input.cursor(), inner.width as usize);

    // Keep the cursor row on screen
    let height = inner.height as usize;
    let offset = (cursor_row + 1).saturating_sub(height);

    let lines: Vec<Line> = rows
        .into_iter()
        .skip(offset)
        .take(height)
        .map(|row| Line::from(Span::styled(row, Style::default().fg(Color::White))))
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);

    frame.set_cursor_position((
        inner.x + cursor_col as u16,
        inner.y + (cursor_row - offset) as u16,
    ));
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = if app.is_busy() {
        Line::from(Span::styled(
            format!("{} Analyzing...", app.spinner()),
            Style::default().fg(Color::Yellow),
        ))
    } else {
        match app.outcome() {
            Some(Ok(_)) => Line::from(Span::styled(
                SUCCESS_BANNER,
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )),
            Some(Err(err)) => Line::from(Span::styled(
                err.to_string(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            None => Line::from(Span::styled(
                "Press Ctrl+S to analyze",
                Style::default().fg(Color::DarkGray),
            )),
        }
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_results(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Results ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let mut lines: Vec<Line> = Vec::new();
    for section in app.sections() {
        lines.push(Line::from(Span::styled(
            section.title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        lines.extend(section.lines.iter().map(|l| Line::from(l.as_str())));
        lines.push(Line::default());
    }

    // The status line is one row; the full message and any server body wrap here
    if let Some(Err(err)) = app.outcome() {
        lines.push(Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(Color::Red),
        )));
        if let Some(detail) = err.detail() {
            lines.push(Line::default());
            lines.extend(detail.lines().map(|l| Line::from(l.to_string())));
        }
    }

    let results = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll(), 0));
    frame.render_widget(results, area);
}

fn draw_raw_panel(frame: &mut Frame, app: &App, raw: Option<&str>, area: Rect) {
    if !app.show_raw() {
        let collapsed = Paragraph::new(Line::from(Span::styled(
            "▶ View Raw Response (Ctrl+R)",
            Style::default().fg(Color::DarkGray),
        )));
        frame.render_widget(collapsed, area);
        return;
    }

    let block = Block::default()
        .title(" ▼ View Raw Response (Ctrl+R) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let panel = Paragraph::new(render_raw(raw))
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(panel, area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(Line::from(Span::styled(
        "Ctrl+S analyze  Enter newline  ↑/↓ line  PgUp/PgDn scroll  Ctrl+R raw response  Esc quit",
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(help, area);
}
