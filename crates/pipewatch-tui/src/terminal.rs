//! Terminal capability seam for the diff renderer.
//!
//! The renderer only ever needs cursor addressing, clear-to-end-of-line, and
//! cursor visibility; it talks to this trait so tests can inject a recording
//! sink instead of a real terminal. No alternate-screen modes are used.

use std::io::{Stdout, Write, stdout};

use crossterm::{
    cursor,
    queue,
    style::{Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};

use pipewatch_core::error::{Result, WatchError};

use crate::theme::ColorTag;

/// The minimal cursor-addressed surface the renderer writes through.
pub trait Terminal {
    /// Move the cursor to a 0-based (row, column) position.
    fn move_to(&mut self, row: u16, col: u16) -> Result<()>;
    /// Clear from the cursor to the end of the current line.
    fn clear_line(&mut self) -> Result<()>;
    /// Clear the whole screen (first cycle only).
    fn clear_screen(&mut self) -> Result<()>;
    /// Write text at the cursor in the tag's color.
    fn write_styled(&mut self, tag: ColorTag, text: &str) -> Result<()>;
    fn hide_cursor(&mut self) -> Result<()>;
    fn show_cursor(&mut self) -> Result<()>;
    fn save_cursor(&mut self) -> Result<()>;
    fn restore_cursor(&mut self) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
}

/// Real terminal backed by stdout and ANSI escapes via crossterm.
pub struct AnsiTerminal {
    out: Stdout,
}

impl AnsiTerminal {
    pub fn new() -> Self {
        Self { out: stdout() }
    }
}

impl Default for AnsiTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for AnsiTerminal {
    fn move_to(&mut self, row: u16, col: u16) -> Result<()> {
        // crossterm's MoveTo takes (column, row)
        queue!(self.out, cursor::MoveTo(col, row)).map_err(WatchError::terminal_write)
    }

    fn clear_line(&mut self) -> Result<()> {
        queue!(self.out, Clear(ClearType::UntilNewLine)).map_err(WatchError::terminal_write)
    }

    fn clear_screen(&mut self) -> Result<()> {
        queue!(self.out, Clear(ClearType::All)).map_err(WatchError::terminal_write)
    }

    fn write_styled(&mut self, tag: ColorTag, text: &str) -> Result<()> {
        match tag.color() {
            Some(color) => queue!(self.out, SetForegroundColor(color), Print(text), ResetColor),
            None => queue!(self.out, Print(text)),
        }
        .map_err(WatchError::terminal_write)
    }

    fn hide_cursor(&mut self) -> Result<()> {
        queue!(self.out, cursor::Hide).map_err(WatchError::terminal_write)
    }

    fn show_cursor(&mut self) -> Result<()> {
        queue!(self.out, cursor::Show).map_err(WatchError::terminal_write)
    }

    fn save_cursor(&mut self) -> Result<()> {
        queue!(self.out, cursor::SavePosition).map_err(WatchError::terminal_write)
    }

    fn restore_cursor(&mut self) -> Result<()> {
        queue!(self.out, cursor::RestorePosition).map_err(WatchError::terminal_write)
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush().map_err(WatchError::terminal_write)
    }
}

/// One recorded terminal operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermOp {
    MoveTo(u16, u16),
    ClearLine,
    ClearScreen,
    Write { tag: ColorTag, text: String },
    HideCursor,
    ShowCursor,
    SaveCursor,
    RestoreCursor,
}

/// Records operations instead of writing, for renderer tests.
#[derive(Debug, Default)]
pub struct RecordingTerminal {
    pub ops: Vec<TermOp>,
}

impl RecordingTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded `Write` operations.
    pub fn writes(&self) -> Vec<&TermOp> {
        self.ops
            .iter()
            .filter(|op| matches!(op, TermOp::Write { .. }))
            .collect()
    }

    /// Number of times the cursor-visible sequence was emitted.
    pub fn show_cursor_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, TermOp::ShowCursor))
            .count()
    }

    /// Drop everything recorded so far.
    pub fn reset(&mut self) {
        self.ops.clear();
    }
}

impl Terminal for RecordingTerminal {
    fn move_to(&mut self, row: u16, col: u16) -> Result<()> {
        self.ops.push(TermOp::MoveTo(row, col));
        Ok(())
    }

    fn clear_line(&mut self) -> Result<()> {
        self.ops.push(TermOp::ClearLine);
        Ok(())
    }

    fn clear_screen(&mut self) -> Result<()> {
        self.ops.push(TermOp::ClearScreen);
        Ok(())
    }

    fn write_styled(&mut self, tag: ColorTag, text: &str) -> Result<()> {
        self.ops.push(TermOp::Write {
            tag,
            text: text.to_string(),
        });
        Ok(())
    }

    fn hide_cursor(&mut self) -> Result<()> {
        self.ops.push(TermOp::HideCursor);
        Ok(())
    }

    fn show_cursor(&mut self) -> Result<()> {
        self.ops.push(TermOp::ShowCursor);
        Ok(())
    }

    fn save_cursor(&mut self) -> Result<()> {
        self.ops.push(TermOp::SaveCursor);
        Ok(())
    }

    fn restore_cursor(&mut self) -> Result<()> {
        self.ops.push(TermOp::RestoreCursor);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
