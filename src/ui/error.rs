//! Blocking error notification screen.
//!
//! Used for failures the user must acknowledge before continuing, such as
//! microphone permission denial. Fills the screen red and waits for a key
//! press.

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::Paragraph};
use std::io::{self, Stdout};

/// Full-screen blocking error display.
pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    cleaned_up: bool,
}

impl ErrorScreen {
    /// Creates the error screen and enters alternate screen mode.
    ///
    /// # Errors
    /// - If raw mode cannot be enabled
    /// - If the terminal cannot be initialized
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(ErrorScreen {
            terminal,
            cleaned_up: false,
        })
    }

    /// Displays the message on a red screen and blocks until a key press.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn show_error(&mut self, error_message: &str) -> anyhow::Result<()> {
        loop {
            self.terminal.draw(|frame| {
                let area = frame.area();
                let red = Style::default().bg(Color::Rgb(200, 0, 0));

                for y in area.y..area.y + area.height {
                    for x in area.x..area.x + area.width {
                        frame.buffer_mut().set_string(x, y, " ", red);
                    }
                }

                let lines = vec![
                    Line::from(Span::styled(
                        error_message.to_string(),
                        red.fg(Color::White),
                    )),
                    Line::default(),
                    Line::from(Span::styled(
                        "Press any key to continue",
                        red.fg(Color::Rgb(255, 200, 200)),
                    )),
                ];

                let text_area = Rect {
                    x: area.x + area.width / 10,
                    y: area.y + area.height / 3,
                    width: (area.width * 80) / 100,
                    height: area.height - area.height / 3,
                };

                let paragraph = Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .wrap(ratatui::widgets::Wrap { trim: true });

                frame.render_widget(paragraph, text_area);
            })?;

            if event::poll(std::time::Duration::from_millis(100))? {
                if let Event::Key(_) = event::read()? {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Cleans up terminal state and exits alternate screen mode.
    ///
    /// Idempotent; the `Drop` call after an explicit cleanup is a no-op.
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

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
