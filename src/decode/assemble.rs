// src/decode/assemble.rs

//! Cross-line buffering for logical records whose closing quote has not
//! been seen yet.

use crate::decode::scan;

/// Owns the single pending-line buffer. At most one partial record is
/// outstanding at any time; reassignment replaces the previous buffer
/// entirely.
#[derive(Debug, Default)]
pub struct LineAssembler {
    pending: Option<String>,
}

impl LineAssembler {
    pub fn new() -> Self {
        LineAssembler { pending: None }
    }

    /// Combine the new physical line with any pending buffer. Returns the
    /// complete logical line together with its field count, or buffers the
    /// joined text and returns `None` while a quoted region is still open.
    pub fn push(&mut self, line: &str) -> Option<(String, usize)> {
        let logical = match self.pending.take() {
            Some(mut prev) => {
                // the original line break was inside an open quote
                prev.push('\n');
                prev.push_str(line);
                prev
            }
            None => line.to_string(),
        };

        match scan::count_fields(&logical) {
            Some(count) => Some((logical, count)),
            None => {
                self.pending = Some(logical);
                None
            }
        }
    }

    /// True while a partial record is buffered.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Give up on any outstanding partial record.
    pub fn take_pending(&mut self) -> Option<String> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_line_passes_through() {
        let mut asm = LineAssembler::new();
        let (line, count) = asm.push("a,b,c").unwrap();
        assert_eq!(line, "a,b,c");
        assert_eq!(count, 3);
        assert!(!asm.is_pending());
    }

    #[test]
    fn open_quote_buffers_until_closed() {
        let mut asm = LineAssembler::new();
        assert!(asm.push("\"line1").is_none());
        assert!(asm.is_pending());

        let (line, count) = asm.push("line2\",x").unwrap();
        assert_eq!(line, "\"line1\nline2\",x");
        assert_eq!(count, 2);
        assert!(!asm.is_pending());
    }

    #[test]
    fn buffer_accumulates_over_many_lines() {
        let mut asm = LineAssembler::new();
        assert!(asm.push("\"one").is_none());
        assert!(asm.push("two").is_none());
        let (line, count) = asm.push("three\"").unwrap();
        assert_eq!(line, "\"one\ntwo\nthree\"");
        assert_eq!(count, 1);
    }

    #[test]
    fn take_pending_clears_the_buffer() {
        let mut asm = LineAssembler::new();
        assert!(asm.push("\"open").is_none());
        assert_eq!(asm.take_pending().as_deref(), Some("\"open"));
        assert!(!asm.is_pending());
    }
}
