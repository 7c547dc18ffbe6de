//! Where eval-and-print results go.

use crate::ast::Span;
use std::cell::RefCell;
use std::rc::Rc;

/// Receives printed evaluation results, making printing testable and injectable.
pub trait OutputSink {
    fn emit(&mut self, text: &str, span: Option<&Span>);
}

/// Discards everything.
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit(&mut self, _text: &str, _span: Option<&Span>) {}
}

/// Collects output into a String, one line per emitted value.
#[derive(Debug, Default, Clone)]
pub struct OutputBuffer {
    pub buffer: String,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }
}

impl OutputSink for OutputBuffer {
    fn emit(&mut self, text: &str, _span: Option<&Span>) {
        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
        self.buffer.push_str(text);
    }
}

/// Writes each value to stdout on its own line.
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&mut self, text: &str, _span: Option<&Span>) {
        println!("{}", text);
    }
}

/// A sink shared with the caller, so output can be inspected after the
/// session that owns the other handle has written to it.
impl<S: OutputSink> OutputSink for Rc<RefCell<S>> {
    fn emit(&mut self, text: &str, span: Option<&Span>) {
        self.borrow_mut().emit(text, span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_joins_lines() {
        let mut buffer = OutputBuffer::new();
        buffer.emit("1", None);
        buffer.emit("(1, 2)", None);
        assert_eq!(buffer.as_str(), "1\n(1, 2)");
    }

    #[test]
    fn shared_buffer_is_visible_through_every_handle() {
        let shared = Rc::new(RefCell::new(OutputBuffer::new()));
        let mut handle = Rc::clone(&shared);
        handle.emit("x", None);
        assert_eq!(shared.borrow().as_str(), "x");
    }
}
