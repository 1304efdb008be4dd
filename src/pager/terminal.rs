//! Terminal session for the pager
//!
//! Enter: raw mode, alternate screen, hidden cursor, scroll region over the
//! content rows. Exit undoes all of it in reverse order. Exit runs from
//! `Drop`, so it also happens on early returns and panics.

use std::fmt;
use std::io::{self, Write};

use crossterm::cursor::{Hide, Show};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{queue, Command};

/// DECSTBM: restrict scrolling to rows `1..=rows`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetScrollRegion(pub u16);

impl Command for SetScrollRegion {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(f, "\x1b[1;{}r", self.0.max(1))
    }

    #[cfg(windows)]
    fn execute_winapi(&self) -> io::Result<()> {
        Ok(())
    }
}

/// DECSTBM with no arguments: scroll the whole screen again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetScrollRegion;

impl Command for ResetScrollRegion {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        f.write_str("\x1b[r")
    }

    #[cfg(windows)]
    fn execute_winapi(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Write the enter sequence to `out`
pub fn write_enter<W: Write>(out: &mut W, alternate: bool, content_rows: u16) -> io::Result<()> {
    if alternate {
        queue!(out, EnterAlternateScreen)?;
    }
    queue!(out, Hide, SetScrollRegion(content_rows))?;
    out.flush()
}

/// Write the exit sequence to `out`, the reverse of [`write_enter`]
pub fn write_exit<W: Write>(out: &mut W, alternate: bool) -> io::Result<()> {
    queue!(out, ResetScrollRegion, Show)?;
    if alternate {
        queue!(out, LeaveAlternateScreen)?;
    }
    out.flush()
}

/// RAII guard over the terminal modes used by the pager
pub struct TerminalSession<W: Write> {
    out: W,
    alternate: bool,
    raw: bool,
}

impl<W: Write> TerminalSession<W> {
    /// Enter raw mode and write the enter sequence
    pub fn enter(out: W, alternate: bool, content_rows: u16) -> io::Result<Self> {
        enable_raw_mode()?;
        Self::with_modes(out, alternate, content_rows, true)
    }

    /// Write the enter sequence without touching raw mode
    pub fn without_raw_mode(out: W, alternate: bool, content_rows: u16) -> io::Result<Self> {
        Self::with_modes(out, alternate, content_rows, false)
    }

    fn with_modes(mut out: W, alternate: bool, content_rows: u16, raw: bool) -> io::Result<Self> {
        // Build the guard first so a failed write still restores raw mode
        let session_result = write_enter(&mut out, alternate, content_rows);
        let session = Self {
            out,
            alternate,
            raw,
        };
        session_result.map(|_| session)
    }

    /// Move the scroll region after a resize
    pub fn set_scroll_region(&mut self, content_rows: u16) -> io::Result<()> {
        queue!(self.out, ResetScrollRegion, SetScrollRegion(content_rows))?;
        self.out.flush()
    }

    pub fn writer(&mut self) -> &mut W {
        &mut self.out
    }
}

impl<W: Write> Drop for TerminalSession<W> {
    fn drop(&mut self) {
        if let Err(e) = write_exit(&mut self.out, self.alternate) {
            tracing::warn!("Failed to restore terminal: {}", e);
        }
        if self.raw {
            if let Err(e) = disable_raw_mode() {
                tracing::warn!("Failed to disable raw mode: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture_ansi<C: Command>(cmd: C) -> String {
        let mut buf = String::new();
        cmd.write_ansi(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_scroll_region_sequences() {
        assert_eq!(capture_ansi(SetScrollRegion(23)), "\x1b[1;23r");
        assert_eq!(capture_ansi(SetScrollRegion(0)), "\x1b[1;1r");
        assert_eq!(capture_ansi(ResetScrollRegion), "\x1b[r");
    }

    #[test]
    fn test_session_writes_enter_then_exit() {
        let mut buf = Vec::new();
        {
            let _session = TerminalSession::without_raw_mode(&mut buf, true, 10).unwrap();
        }
        let out = String::from_utf8(buf).unwrap();
        let enter_alt = out.find("\x1b[?1049h").unwrap();
        let region = out.find("\x1b[1;10r").unwrap();
        let reset = out.find("\x1b[r").unwrap();
        let leave_alt = out.find("\x1b[?1049l").unwrap();
        assert!(enter_alt < region);
        assert!(region < reset);
        assert!(reset < leave_alt);
    }
}
