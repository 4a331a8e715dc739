use std::iter::Peekable;
use std::str::Chars;

use source::diagnostics::{ByteIndex, Span};

#[derive(Debug)]
pub struct Reader<'a> {
    chars: Peekable<Chars<'a>>,
    current_pos: ByteIndex,
}

impl<'a> Reader<'a> {
    pub fn new(source: &'a str) -> Self {
        let chars = source.chars().peekable();
        Reader {
            chars,
            current_pos: ByteIndex(0),
        }
    }

    pub fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    pub fn start(&self) -> ByteIndex {
        self.current_pos
    }

    pub fn end(&self, lo: ByteIndex) -> Span {
        Span::new(lo, self.current_pos)
    }

    pub fn offset(&self) -> ByteIndex {
        self.current_pos
    }
}

impl<'a> Iterator for Reader<'a> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        let ch = self.chars.next()?;
        #[allow(clippy::cast_possible_truncation)]
        let width = ch.len_utf8() as u32;
        self.current_pos = ByteIndex(self.current_pos.0 + width);
        Some(ch)
    }
}

#[cfg(test)]
mod tests {
    use super::Reader;

    #[test]
    fn offsets_are_bytes() {
        let mut reader = Reader::new("äb");
        reader.next();
        assert_eq!(reader.offset().to_usize(), 2);
        reader.next();
        assert_eq!(reader.offset().to_usize(), 3);
        assert_eq!(reader.next(), None);
        assert_eq!(reader.offset().to_usize(), 3);
    }
}
