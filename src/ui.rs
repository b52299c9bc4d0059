//! Single-line terminal status display

use std::fmt;
use std::io::{self, IsTerminal, Write, stdout};

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, ClearType};
use crossterm::{cursor, queue};

/// What the assistant is doing right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Ready,
    Listening,
    Processing,
    Thinking,
    Responding,
    Stopped,
    Error(String),
}

impl Status {
    fn color(&self) -> Color {
        match self {
            Status::Ready | Status::Listening => Color::Green,
            Status::Processing | Status::Thinking => Color::Yellow,
            Status::Responding => Color::Magenta,
            Status::Stopped => Color::DarkGrey,
            Status::Error(_) => Color::Red,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Status::Ready => "●",
            Status::Listening => "◉",
            Status::Processing => "⠋",
            Status::Thinking => "⠹",
            Status::Responding => "♪",
            Status::Stopped => "■",
            Status::Error(_) => "✗",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ready => f.write_str("Ready"),
            Status::Listening => f.write_str("Listening..."),
            Status::Processing => f.write_str("Processing..."),
            Status::Thinking => f.write_str("Thinking..."),
            Status::Responding => f.write_str("Responding..."),
            Status::Stopped => f.write_str("Stopped"),
            Status::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// Status line at the bottom of the transcript
///
/// Transcript lines scroll above it; the status is redrawn in place. When
/// stdout is not a terminal only transcript lines are written.
pub struct StatusLine {
    status: Status,
    interactive: bool,
    drawn: bool,
}

impl StatusLine {
    pub fn new() -> Self {
        Self {
            status: Status::Ready,
            interactive: stdout().is_terminal(),
            drawn: false,
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn set(&mut self, status: Status) {
        if status == self.status && self.drawn {
            return;
        }
        self.status = status;
        if let Err(e) = self.draw() {
            tracing::debug!(error = %e, "status line draw failed");
        }
    }

    /// What the user said
    pub fn show_user(&mut self, text: &str) {
        self.print_line(&format!("> {}", text), None);
    }

    /// What the assistant answered
    pub fn show_response(&mut self, name: &str, text: &str) {
        self.print_line(&format!("{}: {}", name, text), Some(Color::Cyan));
    }

    pub fn show_message(&mut self, text: &str) {
        for line in text.lines() {
            self.print_line(line, None);
        }
    }

    fn print_line(&mut self, text: &str, color: Option<Color>) {
        if let Err(e) = self.write_line(text, color) {
            tracing::debug!(error = %e, "transcript write failed");
        }
    }

    fn write_line(&mut self, text: &str, color: Option<Color>) -> io::Result<()> {
        let mut out = stdout();
        if self.interactive && self.drawn {
            queue!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine)
            )?;
        }
        if let Some(color) = color.filter(|_| self.interactive) {
            queue!(out, SetForegroundColor(color), Print(text), ResetColor)?;
        } else {
            queue!(out, Print(text))?;
        }
        queue!(out, Print("\r\n"))?;
        out.flush()?;
        self.drawn = false;
        self.draw()
    }

    fn draw(&mut self) -> io::Result<()> {
        if !self.interactive {
            return Ok(());
        }
        let mut out = stdout();
        queue!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(self.status.color()),
            Print(format!("{} {}", self.status.symbol(), self.status)),
            ResetColor,
        )?;
        out.flush()?;
        self.drawn = true;
        Ok(())
    }

    /// Leave the cursor on a fresh line
    pub fn finish(&mut self) {
        if self.interactive && self.drawn {
            let mut out = stdout();
            let _ = queue!(out, Print("\r\n"));
            let _ = out.flush();
            self.drawn = false;
        }
    }
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(Status::Listening.to_string(), "Listening...");
        assert_eq!(
            Status::Error("no input device".into()).to_string(),
            "Error: no input device"
        );
    }
}
