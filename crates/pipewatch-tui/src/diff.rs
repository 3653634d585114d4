//! Differential renderer: writes only the lines that changed since the
//! last cycle.
//!
//! The renderer holds the last record shown per entity. Rendering an
//! identical record produces zero terminal writes; otherwise only the
//! changed line indexes are rewritten in place, which is what keeps the
//! display from flickering. Blank lines in a new record overwrite stale
//! content (recovered errors) because every record is padded to the slot
//! budget.

use std::collections::HashMap;

use chrono::{DateTime, Local};
use tracing::debug;

use pipewatch_core::error::Result;

use crate::layout::Layout;
use crate::record::DisplayRecord;
use crate::terminal::Terminal;
use crate::theme::ColorTag;

/// Renders display records through cursor-addressed writes.
pub struct DiffRenderer<T: Terminal> {
    term: T,
    layout: Layout,
    previous: HashMap<String, DisplayRecord>,
    cursor_restored: bool,
    transient_shown: bool,
}

impl<T: Terminal> DiffRenderer<T> {
    pub fn new(term: T, layout: Layout) -> Self {
        Self {
            term,
            layout,
            previous: HashMap::new(),
            cursor_restored: false,
            transient_shown: false,
        }
    }

    /// One-time setup before the first cycle: hide the cursor, clear the
    /// screen, and leave every slot blank. Every later write goes through
    /// the diff path.
    pub fn draw_skeleton(&mut self) -> Result<()> {
        self.term.hide_cursor()?;
        self.term.clear_screen()?;
        self.term.move_to(0, 0)?;
        self.term.flush()
    }

    /// Bring one entity's slot up to date.
    ///
    /// Compares line-by-line (text and color tag) against the last record
    /// shown; equal lines are left untouched on the terminal, and an equal
    /// record writes nothing at all.
    pub fn render(&mut self, name: &str, record: DisplayRecord) -> Result<()> {
        let Some(slot) = self.layout.slot(name) else {
            debug!(entity = name, "render for entity without a slot ignored");
            return Ok(());
        };

        let blank = DisplayRecord::blank(slot.lines as usize);
        let previous = self.previous.get(name).unwrap_or(&blank);

        if *previous == record {
            return Ok(());
        }

        let mut wrote = false;
        for (i, line) in record.lines().iter().enumerate().take(slot.lines as usize) {
            if previous.lines().get(i) == Some(line) {
                continue;
            }

            self.term.move_to(slot.row + i as u16, 0)?;
            self.term.clear_line()?;
            if !line.is_blank() {
                self.term.write_styled(line.tag, &line.text)?;
            }
            wrote = true;
        }

        if wrote {
            self.term.flush()?;
        }
        self.previous.insert(name.to_string(), record);
        Ok(())
    }

    /// Rewrite the header row. The timestamp changes every cycle, so this
    /// skips the diff entirely.
    pub fn render_header_timestamp(&mut self, now: DateTime<Local>) -> Result<()> {
        self.term.move_to(0, 0)?;
        self.term.clear_line()?;
        self.term.write_styled(
            ColorTag::Header,
            &format!(
                "PipeWatch | last update {} | Ctrl-C to quit",
                now.format("%Y-%m-%d %H:%M:%S")
            ),
        )?;
        self.term.flush()
    }

    /// Report a loop-scoped failure on the reserved row below all slots,
    /// saving and restoring the cursor so the main layout is untouched.
    pub fn render_transient_error(&mut self, message: &str) -> Result<()> {
        self.term.save_cursor()?;
        self.term.move_to(self.layout.transient_error_row(), 0)?;
        self.term.clear_line()?;
        self.term
            .write_styled(ColorTag::Bad, &format!("\u{26a0} {message}"))?;
        self.term.restore_cursor()?;
        self.transient_shown = true;
        self.term.flush()
    }

    /// Blank the transient error row once the loop recovers. Writes nothing
    /// when no transient error is showing.
    pub fn clear_transient_error(&mut self) -> Result<()> {
        if !self.transient_shown {
            return Ok(());
        }

        self.term.save_cursor()?;
        self.term.move_to(self.layout.transient_error_row(), 0)?;
        self.term.clear_line()?;
        self.term.restore_cursor()?;
        self.transient_shown = false;
        self.term.flush()
    }

    /// Make the cursor visible again, exactly once across every exit path.
    /// Safe to call repeatedly; only the first call writes.
    pub fn restore_cursor(&mut self) -> Result<()> {
        if self.cursor_restored {
            return Ok(());
        }
        self.cursor_restored = true;

        // Park the cursor below the layout so the shell prompt does not land
        // inside the display.
        self.term.move_to(self.layout.transient_error_row() + 1, 0)?;
        self.term.show_cursor()?;
        self.term.flush()
    }

    #[cfg(test)]
    pub fn terminal(&self) -> &T {
        &self.term
    }

    #[cfg(test)]
    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.term
    }
}

impl<T: Terminal> Drop for DiffRenderer<T> {
    fn drop(&mut self) {
        // Guaranteed release: the cursor comes back on every exit path,
        // including unwinding. Errors are unreportable here.
        let _ = self.restore_cursor();
    }
}
