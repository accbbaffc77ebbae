//! Print handler for configurable output.
//!
//! The engine performs no I/O itself: `print` formats its arguments
//! and hands the line to the configured handler. Tests and embedders
//! use the buffer variant to capture output for assertions.
//!
//! Enum dispatch instead of trait objects: the set of destinations is
//! closed and `print` is a hot path.

use parking_lot::Mutex;

/// Where `print` output goes.
#[derive(Debug)]
pub enum PrintHandler {
    /// Write to stdout (the default).
    Stdout,
    /// Capture into a buffer for later inspection.
    Buffer(BufferPrintHandler),
}

impl PrintHandler {
    /// Create a buffering handler.
    pub fn buffer() -> Self {
        PrintHandler::Buffer(BufferPrintHandler::new())
    }

    /// Print a line (with newline).
    pub fn println(&self, msg: &str) {
        match self {
            PrintHandler::Stdout => println!("{msg}"),
            PrintHandler::Buffer(buffer) => buffer.println(msg),
        }
    }

    /// All captured output. Empty for the stdout handler, which does
    /// not capture.
    pub fn output(&self) -> String {
        match self {
            PrintHandler::Stdout => String::new(),
            PrintHandler::Buffer(buffer) => buffer.output(),
        }
    }

    /// Clear captured output. No-op for stdout.
    pub fn clear(&self) {
        if let PrintHandler::Buffer(buffer) = self {
            buffer.clear();
        }
    }
}

impl Default for PrintHandler {
    fn default() -> Self {
        PrintHandler::Stdout
    }
}

/// Print handler that captures output to a buffer.
#[derive(Debug, Default)]
pub struct BufferPrintHandler {
    buffer: Mutex<String>,
}

impl BufferPrintHandler {
    /// Create an empty buffer handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line to the buffer.
    pub fn println(&self, msg: &str) {
        let mut buf = self.buffer.lock();
        buf.push_str(msg);
        buf.push('\n');
    }

    /// The captured output so far.
    pub fn output(&self) -> String {
        self.buffer.lock().clone()
    }

    /// Discard the captured output.
    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_captures_lines_in_order() {
        let handler = PrintHandler::buffer();
        handler.println("one");
        handler.println("two");
        assert_eq!(handler.output(), "one\ntwo\n");
    }

    #[test]
    fn clear_discards_captured_output() {
        let handler = PrintHandler::buffer();
        handler.println("x");
        handler.clear();
        assert_eq!(handler.output(), "");
    }
}
