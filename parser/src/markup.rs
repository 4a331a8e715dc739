//! Tree builder: markup text to a `Node` tree.

use crate::options::ParserOptions;
use crate::patch::PatchVisitor;
use crate::whitespace::{RudeWhiteSpaceVisitor, WhiteSpaceVisitor};

use diagnostics::{ErrorHandler, Meta, ParseResult as Result};
use source::chars::{
    is_name_char, is_name_start, is_whitespace, APOSTROPHE, BOM, EQUALS, GREATER_THAN, LESS_THAN,
    QUOTATION_MARK, SLASH,
};
use source::diagnostics::{Diagnostic, Label};
use source::{normalize_line_feed, Position, SourceReader};
use syntax::markup::{Attribute, CData, Comment, Doctype, Instruction, Node, Tag, Text};

use log::debug;

/// Parse markup into a node tree, then run the whitespace and patch passes
/// the options ask for.
pub fn parse(
    text: &str,
    path: &str,
    options: &ParserOptions,
    handler: &mut dyn ErrorHandler,
) -> Result<Vec<Node>> {
    debug!("parse {} ({:?})", path, options);
    let mut text = text;
    if options.need_preprocess {
        text = text.strip_prefix(BOM).unwrap_or(text);
    }
    let text = if options.normalize_line_feed {
        normalize_line_feed(text)
    } else {
        text.to_string()
    };
    let builder = TreeBuilder::new(text, path, options, handler);
    let mut nodes = builder.build()?;
    if options.clean_white_spaces {
        nodes = if options.rude_white_space_cleaning {
            RudeWhiteSpaceVisitor::new().clean(&nodes)
        } else {
            WhiteSpaceVisitor.clean(&nodes)
        };
    }
    if options.compatible_tree_structure {
        nodes = PatchVisitor::new(options.tag_descriptor).patch(&nodes);
    }
    Ok(nodes)
}

struct TreeBuilder<'a> {
    reader: SourceReader,
    offset: usize,
    path: &'a str,
    options: &'a ParserOptions,
    handler: &'a mut dyn ErrorHandler,
    // Open elements, innermost last
    stack: Vec<Tag>,
    roots: Vec<Node>,
}

impl<'a> TreeBuilder<'a> {
    fn new(
        text: String,
        path: &'a str,
        options: &'a ParserOptions,
        handler: &'a mut dyn ErrorHandler,
    ) -> Self {
        TreeBuilder {
            reader: SourceReader::new(text),
            offset: 0,
            path,
            options,
            handler,
            stack: vec![],
            roots: vec![],
        }
    }

    fn fatal(&self, message: &str, start: usize, end: usize) -> Diagnostic {
        let range = self.reader.byte_offset(start)..self.reader.byte_offset(end);
        Diagnostic::error()
            .with_message(message)
            .with_labels(vec![Label::primary(range)])
            .at(self.reader.position(start))
            .in_file(self.path)
    }

    fn warn(&mut self, message: &str, position: Position) {
        self.handler
            .warn(message, Meta::new(Some(self.path), Some(position)));
    }

    fn current_char(&self) -> Option<char> {
        self.reader.get_char(self.offset)
    }

    fn peek_char(&self, ahead: usize) -> Option<char> {
        self.reader.get_char(self.offset + ahead)
    }

    fn starts_with(&self, pattern: &str) -> bool {
        self.reader.starts_with_at(self.offset, pattern)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if !is_whitespace(ch) {
                break;
            }
            self.offset += 1;
        }
    }

    fn read_name(&mut self) -> String {
        let start = self.offset;
        while let Some(ch) = self.current_char() {
            if !is_name_char(ch) {
                break;
            }
            self.offset += 1;
        }
        self.reader.slice(start, self.offset).to_string()
    }

    fn append(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn build(mut self) -> Result<Vec<Node>> {
        while !self.reader.is_eof(self.offset) {
            if self.starts_markup() {
                self.markup()?;
            } else {
                self.text();
            }
        }
        if let Some(tag) = self.stack.last() {
            let start = self.reader.len();
            return Err(Diagnostic::error()
                .with_message(format!("Unclosed tag <{}>", tag.name))
                .with_labels(vec![Label::primary(
                    tag.position.offset..self.reader.byte_offset(start),
                )])
                .at(tag.position)
                .in_file(self.path));
        }
        Ok(self.roots)
    }

    /// `<` opens markup only before a name, `/`, `!` or `?`.
    fn starts_markup(&self) -> bool {
        if self.current_char() != Some(LESS_THAN) {
            return false;
        }
        match self.peek_char(1) {
            Some(ch) if is_name_start(ch) => true,
            Some('/') => self.peek_char(2).map_or(false, is_name_start),
            Some('!') | Some('?') => true,
            _ => false,
        }
    }

    fn markup(&mut self) -> Result<()> {
        if self.starts_with("<!--") {
            self.comment()
        } else if self.starts_with("<![CDATA[") {
            self.cdata()
        } else if self.starts_with("<!") {
            self.doctype()
        } else if self.starts_with("<?") {
            self.instruction()
        } else if self.starts_with("</") {
            self.close_tag()
        } else {
            self.open_tag()
        }
    }

    fn last_open_child_mut(&mut self) -> Option<&mut Node> {
        match self.stack.last_mut() {
            Some(parent) => parent.children.last_mut(),
            None => self.roots.last_mut(),
        }
    }

    fn text(&mut self) {
        let start = self.offset;
        while !self.reader.is_eof(self.offset) {
            if self.starts_with("{{") {
                self.skip_opaque("{{", "}}");
            } else if self.starts_with("{[") {
                self.skip_opaque("{[", "]}");
            } else if self.starts_markup() {
                break;
            } else {
                self.offset += 1;
            }
        }
        let data = self.reader.slice(start, self.offset).to_string();
        let position = self.reader.position(start);
        // Text around a dropped comment continues the same node
        if let Some(Node::Text(previous)) = self.last_open_child_mut() {
            previous.data.push_str(&data);
            return;
        }
        self.append(Node::Text(Text { data, position }));
    }

    // Mustache bodies may hold `<` comparisons; skip them whole. An
    // unterminated body runs to the end of input and is reported later by
    // the text parser.
    fn skip_opaque(&mut self, open: &str, close: &str) {
        let body = self.offset + open.chars().count();
        self.offset = match self.reader.find(body, close) {
            Some(end) => end + close.chars().count(),
            None => self.reader.len(),
        };
    }

    fn comment(&mut self) -> Result<()> {
        let start = self.offset;
        let body = start + 4;
        let end = self
            .reader
            .find(body, "-->")
            .ok_or_else(|| self.fatal("Unterminated comment", start, self.reader.len()))?;
        self.offset = end + 3;
        if self.options.allow_comments {
            let data = self.reader.slice(body, end).to_string();
            let position = self.reader.position(start);
            self.append(Node::Comment(Comment { data, position }));
        }
        Ok(())
    }

    fn cdata(&mut self) -> Result<()> {
        let start = self.offset;
        let body = start + 9;
        let end = self
            .reader
            .find(body, "]]>")
            .ok_or_else(|| self.fatal("Unterminated CDATA section", start, self.reader.len()))?;
        self.offset = end + 3;
        let position = self.reader.position(start);
        if self.options.allow_cdata {
            let data = self.reader.slice(body, end).to_string();
            self.append(Node::CData(CData { data, position }));
        } else {
            self.warn("CDATA sections are not allowed here, the section is dropped", position);
        }
        Ok(())
    }

    fn doctype(&mut self) -> Result<()> {
        let start = self.offset;
        let body = start + 2;
        let end = self
            .reader
            .find(body, ">")
            .ok_or_else(|| self.fatal("Unterminated doctype", start, self.reader.len()))?;
        self.offset = end + 1;
        let data = self.reader.slice(body, end).to_string();
        let position = self.reader.position(start);
        self.append(Node::Doctype(Doctype { data, position }));
        Ok(())
    }

    fn instruction(&mut self) -> Result<()> {
        let start = self.offset;
        let body = start + 2;
        let end = self.reader.find(body, "?>").ok_or_else(|| {
            self.fatal("Unterminated processing instruction", start, self.reader.len())
        })?;
        self.offset = end + 2;
        let data = self.reader.slice(body, end).to_string();
        let position = self.reader.position(start);
        self.append(Node::Instruction(Instruction { data, position }));
        Ok(())
    }

    fn close_tag(&mut self) -> Result<()> {
        let start = self.offset;
        self.offset += 2;
        let name = self.read_name();
        self.skip_whitespace();
        if self.current_char() != Some(GREATER_THAN) {
            return Err(self.fatal(
                &format!("Unterminated closing tag </{}>", name),
                start,
                self.offset,
            ));
        }
        self.offset += 1;
        let expected = self.stack.last().map(|open| (open.name.clone(), open.position));
        match expected {
            Some((open, _)) if open == name => {
                if let Some(tag) = self.stack.pop() {
                    self.append(Node::Tag(tag));
                }
                Ok(())
            }
            Some((open, position)) => Err(self.fatal(
                &format!(
                    "Unexpected closing tag </{}>, expected </{}> for the tag at {}",
                    name, open, position
                ),
                start,
                self.offset,
            )),
            None => Err(self.fatal(
                &format!("Unexpected closing tag </{}>", name),
                start,
                self.offset,
            )),
        }
    }

    fn open_tag(&mut self) -> Result<()> {
        let start = self.offset;
        let position = self.reader.position(start);
        self.offset += 1;
        let name = self.read_name();
        let mut tag = Tag::new(&name, position);
        loop {
            self.skip_whitespace();
            match self.current_char() {
                None => {
                    return Err(self.fatal(
                        &format!("Unterminated tag <{}>", name),
                        start,
                        self.offset,
                    ))
                }
                Some(GREATER_THAN) => {
                    self.offset += 1;
                    break;
                }
                Some(SLASH) if self.peek_char(1) == Some(GREATER_THAN) => {
                    self.offset += 2;
                    tag.is_self_closing = true;
                    break;
                }
                Some(ch) if is_name_char(ch) => self.attribute(&mut tag)?,
                Some(ch) => {
                    return Err(self.fatal(
                        &format!("Invalid attribute syntax in <{}> near '{}'", name, ch),
                        self.offset,
                        self.offset + 1,
                    ))
                }
            }
        }
        let descriptor = (self.options.tag_descriptor)(&name);
        if tag.is_self_closing {
            self.append(Node::Tag(tag));
        } else if descriptor.is_void && !self.options.xml {
            tag.is_void = true;
            self.append(Node::Tag(tag));
        } else if descriptor.is_raw_text || (descriptor.is_escapable_raw_text && !self.options.xml) {
            self.raw_text(tag, start)?;
        } else {
            self.stack.push(tag);
        }
        Ok(())
    }

    fn attribute(&mut self, tag: &mut Tag) -> Result<()> {
        let start = self.offset;
        let position = self.reader.position(start);
        let name = self.read_name();
        self.skip_whitespace();
        let value = if self.current_char() == Some(EQUALS) {
            self.offset += 1;
            self.skip_whitespace();
            Some(self.attribute_value(&name)?)
        } else {
            None
        };
        let attribute = Attribute {
            name: name.clone(),
            value,
            position,
        };
        if !tag.attributes.insert_first(name.clone(), attribute) {
            if self.options.compatible_tree_structure {
                self.warn(
                    &format!(
                        "Duplicate attribute \"{}\" on <{}>, the first occurrence is used",
                        name, tag.name
                    ),
                    position,
                );
            } else {
                return Err(self.fatal(
                    &format!("Duplicate attribute \"{}\" on <{}>", name, tag.name),
                    start,
                    self.offset,
                ));
            }
        }
        Ok(())
    }

    fn attribute_value(&mut self, name: &str) -> Result<String> {
        let start = self.offset;
        match self.current_char() {
            Some(quote) if quote == QUOTATION_MARK || quote == APOSTROPHE => {
                let body = start + 1;
                let mut cursor = body;
                loop {
                    match self.reader.get_char(cursor) {
                        Some(ch) if ch == quote => break,
                        Some(_) => cursor += 1,
                        None => {
                            return Err(self.fatal(
                                &format!("Unterminated value of attribute \"{}\"", name),
                                start,
                                cursor,
                            ))
                        }
                    }
                }
                self.offset = cursor + 1;
                Ok(self.reader.slice(body, cursor).to_string())
            }
            Some(ch) if ch != GREATER_THAN && !is_whitespace(ch) => {
                while let Some(ch) = self.current_char() {
                    if is_whitespace(ch) || ch == GREATER_THAN {
                        break;
                    }
                    self.offset += 1;
                }
                Ok(self.reader.slice(start, self.offset).to_string())
            }
            _ => Err(self.fatal(
                &format!("Missing value of attribute \"{}\"", name),
                start,
                self.offset,
            )),
        }
    }

    fn raw_text(&mut self, mut tag: Tag, start: usize) -> Result<()> {
        let body = self.offset;
        let closing = format!("</{}", tag.name);
        let mut cursor = body;
        let end = loop {
            if self.reader.is_eof(cursor) {
                return Err(self.fatal(
                    &format!("Missing closing tag </{}>", tag.name),
                    start,
                    body,
                ));
            }
            if self.reader.starts_with_ignore_case_at(cursor, &closing) {
                let after = cursor + closing.chars().count();
                match self.reader.get_char(after) {
                    Some(ch) if is_whitespace(ch) || ch == GREATER_THAN => break cursor,
                    _ => {}
                }
            }
            cursor += 1;
        };
        let close_end = self.reader.find(end, ">").ok_or_else(|| {
            self.fatal(
                &format!("Unterminated closing tag </{}>", tag.name),
                end,
                self.reader.len(),
            )
        })?;
        if end > body {
            tag.children.push(Node::Text(Text {
                data: self.reader.slice(body, end).to_string(),
                position: self.reader.position(body),
            }));
        }
        self.offset = close_end + 1;
        self.append(Node::Tag(tag));
        Ok(())
    }
}
