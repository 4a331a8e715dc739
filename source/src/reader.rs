use crate::chars::{CARRIAGE_RETURN, LINE_FEED};
use crate::pos::Position;

/// Replace CRLF pairs and lone CRs with LF.
pub fn normalize_line_feed(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == CARRIAGE_RETURN {
            if chars.peek() == Some(&LINE_FEED) {
                chars.next();
            }
            normalized.push(LINE_FEED);
        } else {
            normalized.push(ch);
        }
    }
    normalized
}

/// Random-access character buffer over a whole source text.
///
/// Offsets taken and returned by the reader are character offsets; the
/// positions it reports carry byte offsets so they can be used as
/// diagnostic ranges.
#[derive(Debug, Clone)]
pub struct SourceReader {
    text: String,
    chars: Vec<char>,
    // Byte offset of every char, plus the total length at the end
    byte_offsets: Vec<usize>,
    // Char offsets at which lines begin
    line_starts: Vec<usize>,
}

impl SourceReader {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut chars = Vec::with_capacity(text.len());
        let mut byte_offsets = Vec::with_capacity(text.len() + 1);
        let mut line_starts = vec![0];
        for (index, (byte, ch)) in text.char_indices().enumerate() {
            chars.push(ch);
            byte_offsets.push(byte);
            if ch == LINE_FEED {
                line_starts.push(index + 1);
            }
        }
        byte_offsets.push(text.len());
        SourceReader {
            text,
            chars,
            byte_offsets,
            line_starts,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn get_char(&self, offset: usize) -> Option<char> {
        self.chars.get(offset).copied()
    }

    pub fn is_eof(&self, offset: usize) -> bool {
        offset >= self.chars.len()
    }

    pub fn starts_with_at(&self, offset: usize, pattern: &str) -> bool {
        let mut cursor = offset;
        for expected in pattern.chars() {
            match self.get_char(cursor) {
                Some(ch) if ch == expected => cursor += 1,
                _ => return false,
            }
        }
        true
    }

    pub fn starts_with_ignore_case_at(&self, offset: usize, pattern: &str) -> bool {
        let mut cursor = offset;
        for expected in pattern.chars() {
            match self.get_char(cursor) {
                Some(ch) if ch.eq_ignore_ascii_case(&expected) => cursor += 1,
                _ => return false,
            }
        }
        true
    }

    /// Char offset of the next occurrence of `pattern` at or after `from`.
    pub fn find(&self, from: usize, pattern: &str) -> Option<usize> {
        (from..self.chars.len()).find(|&offset| self.starts_with_at(offset, pattern))
    }

    /// The text between two char offsets. Out-of-range offsets are clamped.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        let end = end.min(self.chars.len());
        let start = start.min(end);
        &self.text[self.byte_offsets[start]..self.byte_offsets[end]]
    }

    pub fn byte_offset(&self, offset: usize) -> usize {
        self.byte_offsets[offset.min(self.chars.len())]
    }

    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.chars.len());
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index - 1,
        };
        let column = offset - self.line_starts[line_index] + 1;
        Position::new(line_index + 1, column, self.byte_offset(offset))
    }
}
