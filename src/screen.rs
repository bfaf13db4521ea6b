//! Terminal output: size queries and whole-frame flushes.
//!
//! Stdout is the one shared mutable resource in the process. The render loop
//! and the signal cleanup path both go through [`SharedOutput`], so a frame is
//! either written completely or not at all, and nothing draws after cleanup.

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    queue,
    terminal::{size as terminal_size, Clear, ClearType},
};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::frame::Frame;
use crate::lock_or_recover;

/// Abstraction over the terminal the render loop draws on.
pub trait Screen {
    /// `(columns, rows)`
    fn size(&mut self) -> io::Result<(u16, u16)>;
    fn present(&mut self, frame: &Frame) -> io::Result<()>;
}

struct OutputState {
    writer: Box<dyn Write + Send>,
    closed: bool,
}

/// Lock-protected terminal writer shared by the render loop and cleanup.
#[derive(Clone)]
pub struct SharedOutput {
    inner: Arc<Mutex<OutputState>>,
}

impl SharedOutput {
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(OutputState {
                writer,
                closed: false,
            })),
        }
    }

    /// Write `bytes` and flush under the lock. Returns `Ok(false)` once the
    /// output has been closed by cleanup.
    pub fn write_frame(&self, bytes: &[u8]) -> io::Result<bool> {
        let mut state = lock_or_recover(&self.inner, "SharedOutput::write_frame");
        if state.closed {
            return Ok(false);
        }
        state.writer.write_all(bytes)?;
        state.writer.flush()?;
        Ok(true)
    }

    /// Final write: show the cursor, clear the screen, and refuse any later frame.
    pub fn close(&self) -> io::Result<()> {
        let mut state = lock_or_recover(&self.inner, "SharedOutput::close");
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        let mut bytes = Vec::new();
        queue!(bytes, Show, Clear(ClearType::All), MoveTo(0, 0))?;
        state.writer.write_all(&bytes)?;
        state.writer.flush()
    }

    pub fn is_closed(&self) -> bool {
        lock_or_recover(&self.inner, "SharedOutput::is_closed").closed
    }
}

/// Encode a frame as one escape-sequence buffer. Rows are positioned
/// explicitly because `\n` does not return the carriage in raw mode.
pub fn encode_frame(frame: &Frame) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity((frame.width() + 8) * frame.height() + 16);
    queue!(bytes, Hide, Clear(ClearType::All))?;
    for (y, line) in frame.serialize().split('\n').enumerate() {
        if line.is_empty() {
            continue;
        }
        queue!(bytes, MoveTo(0, y as u16))?;
        bytes.extend_from_slice(line.as_bytes());
    }
    Ok(bytes)
}

/// The real terminal.
pub struct TerminalScreen {
    output: SharedOutput,
}

impl TerminalScreen {
    pub fn new(output: SharedOutput) -> Self {
        Self { output }
    }
}

impl Screen for TerminalScreen {
    fn size(&mut self) -> io::Result<(u16, u16)> {
        terminal_size()
    }

    fn present(&mut self, frame: &Frame) -> io::Result<()> {
        let bytes = encode_frame(frame)?;
        self.output.write_frame(&bytes)?;
        Ok(())
    }
}
