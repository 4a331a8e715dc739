//! Layout of generated code. The debug formatter indents and breaks lines,
//! the release formatter emits the same characters without the line breaks
//! and the indentation that follows them.

use syntax::ast::quote_string;

pub trait Formatter {
    /// A statement on its own line.
    fn format_line(&self, line: &str) -> String;
    /// Code written elsewhere, taken line by line.
    fn format_block(&self, block: &str) -> String {
        block.lines().map(|line| self.format_line(line)).collect()
    }
    /// An object literal. Keys are quoted here.
    fn format_object(&self, entries: &[(String, String)]) -> String;
    fn format_array(&self, items: &[String]) -> String;
    /// Comma separated items, like call arguments.
    fn format_sequence(&self, items: &[String]) -> String;
    fn enter(&mut self);
    fn leave(&mut self);
}

pub struct DebugFormatter {
    width: usize,
    character: char,
    offset: usize,
}

impl DebugFormatter {
    pub fn new(width: usize, character: char) -> Self {
        DebugFormatter {
            width,
            character,
            offset: 0,
        }
    }

    fn indent(&self, depth: usize) -> String {
        std::iter::repeat(self.character)
            .take(self.width * depth)
            .collect()
    }

    fn block(&self, open: char, close: char, items: Vec<String>) -> String {
        if items.is_empty() {
            return format!("{}{}", open, close);
        }
        let inner = self.indent(self.offset + 1);
        let lines: Vec<String> = items.into_iter().map(|item| format!("{}{}", inner, item)).collect();
        format!("{}\n{}\n{}{}", open, lines.join(",\n"), self.indent(self.offset), close)
    }
}

impl Default for DebugFormatter {
    fn default() -> Self {
        DebugFormatter::new(2, ' ')
    }
}

impl Formatter for DebugFormatter {
    fn format_line(&self, line: &str) -> String {
        format!("{}{}\n", self.indent(self.offset), line)
    }

    fn format_object(&self, entries: &[(String, String)]) -> String {
        let items = entries
            .iter()
            .map(|(key, value)| format!("{}: {}", quote_string(key), value))
            .collect();
        self.block('{', '}', items)
    }

    fn format_array(&self, items: &[String]) -> String {
        self.block('[', ']', items.to_vec())
    }

    fn format_sequence(&self, items: &[String]) -> String {
        items.join(&format!(",\n{}", self.indent(self.offset)))
    }

    fn enter(&mut self) {
        self.offset += 1;
    }

    fn leave(&mut self) {
        self.offset = self.offset.saturating_sub(1);
    }
}

#[derive(Default)]
pub struct ReleaseFormatter;

impl Formatter for ReleaseFormatter {
    fn format_line(&self, line: &str) -> String {
        line.to_string()
    }

    /// Line breaks of a foreign block may end a statement or a `//`
    /// comment, so a block spanning lines or holding a comment keeps them.
    fn format_block(&self, block: &str) -> String {
        if !block.contains('\n') && !block.contains("//") {
            return block.to_string();
        }
        block.lines().map(|line| format!("{}\n", line)).collect()
    }

    fn format_object(&self, entries: &[(String, String)]) -> String {
        let items: Vec<String> = entries
            .iter()
            .map(|(key, value)| format!("{}: {}", quote_string(key), value))
            .collect();
        format!("{{{}}}", items.join(","))
    }

    fn format_array(&self, items: &[String]) -> String {
        format!("[{}]", items.join(","))
    }

    fn format_sequence(&self, items: &[String]) -> String {
        items.join(",")
    }

    fn enter(&mut self) {}

    fn leave(&mut self) {}
}
