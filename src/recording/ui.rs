//! Terminal user interface for the recording workflow.
//!
//! Presents two views: an idle view bound to the record action and a
//! recording view bound to the stop action, with the elapsed `M:SS` display
//! updated at one-second granularity while recording.

use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    style::{Color, Style},
    widgets::Paragraph,
};
use std::io::{stdout, Stdout};

use super::session::SessionState;

/// User input command on the recording screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    /// No actionable key pressed
    Continue,
    /// Begin recording (record control, idle view)
    StartRecording,
    /// Finish recording and upload (stop control, recording view)
    StopRecording,
    /// Leave the recorder
    Quit,
}

/// Recording screen with idle and recording views.
///
/// Restores the terminal on drop, so raw mode does not outlive an error
/// propagated out of the event loop.
pub struct RecordTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    cleaned_up: bool,
}

impl RecordTui {
    /// Creates the TUI and enters alternate screen mode.
    ///
    /// # Errors
    /// - If raw mode cannot be enabled
    /// - If the terminal cannot be initialized
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(RecordTui {
            terminal,
            cleaned_up: false,
        })
    }

    /// Renders the current view.
    ///
    /// While recording, `elapsed` is the formatted `M:SS` display text;
    /// while idle it is ignored.
    pub fn render(&mut self, state: SessionState, elapsed: &str) -> anyhow::Result<()> {
        self.terminal.draw(|frame| {
            let area = frame.area();

            let status_line = match state {
                SessionState::Idle => Line::from(vec![
                    Span::styled("○ ", Style::default().fg(Color::DarkGray)),
                    Span::raw("ready"),
                ]),
                SessionState::Recording => Line::from(vec![
                    Span::styled("● ", Style::default().fg(Color::Red)),
                    Span::raw(elapsed.to_string()),
                ]),
            };

            let help_line = match state {
                SessionState::Idle => Line::from(Span::styled(
                    "Enter/r record   q quit",
                    Style::default().fg(Color::DarkGray),
                )),
                SessionState::Recording => Line::from(Span::styled(
                    "Enter/s stop and upload   Esc cancel",
                    Style::default().fg(Color::DarkGray),
                )),
            };

            let centered = Rect {
                x: area.x,
                y: area.y + area.height / 2,
                width: area.width,
                height: area.height.saturating_sub(area.height / 2).min(3),
            };

            let paragraph = Paragraph::new(vec![status_line, Line::default(), help_line])
                .alignment(Alignment::Center);

            frame.render_widget(paragraph, centered);
        })?;

        Ok(())
    }

    /// Polls for input and maps keys to commands for the current view.
    ///
    /// The mapping is state-gated: the stop key is only dispatched while
    /// recording, the record key only while idle. Everything else is
    /// `Continue`.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self, state: SessionState) -> anyhow::Result<UiCommand> {
        if event::poll(std::time::Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    tracing::debug!("Ctrl+C pressed: quitting");
                    return Ok(UiCommand::Quit);
                }

                return Ok(match (state, key.code) {
                    (SessionState::Idle, KeyCode::Enter | KeyCode::Char('r')) => {
                        tracing::debug!("Record key pressed");
                        UiCommand::StartRecording
                    }
                    (SessionState::Idle, KeyCode::Char('q') | KeyCode::Esc) => UiCommand::Quit,
                    (SessionState::Recording, KeyCode::Enter | KeyCode::Char('s')) => {
                        tracing::debug!("Stop key pressed");
                        UiCommand::StopRecording
                    }
                    (SessionState::Recording, KeyCode::Char('q') | KeyCode::Esc) => {
                        tracing::debug!("Cancel requested while recording");
                        UiCommand::Quit
                    }
                    _ => UiCommand::Continue,
                });
            }
        }
        Ok(UiCommand::Continue)
    }

    /// Cleans up terminal state and exits alternate screen mode.
    ///
    /// Idempotent: a second call (including the one from `Drop`) is a no-op,
    /// so an already-cleaned instance cannot undo a successor's raw mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        if self.cleaned_up {
            return Ok(());
        }
        self.cleaned_up = true;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for RecordTui {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
