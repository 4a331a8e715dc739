//! Whitespace cleaning passes. Both return new node lists and leave the
//! input untouched; applying either one twice gives the same tree as
//! applying it once.

use source::chars::{is_whitespace, LINE_FEED, SPACE};
use syntax::markup::*;
use syntax::visitor::{visit_node, Visitor};

/// Tags whose content is kept byte for byte.
pub const RAW_CONTENT_TAGS: &[&str] = &["pre", "listing", "textarea", "template", "script", "style"];

fn is_raw_content(tag: &Tag) -> bool {
    RAW_CONTENT_TAGS
        .iter()
        .any(|name| tag.name.eq_ignore_ascii_case(name))
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for ch in text.chars() {
        if is_whitespace(ch) {
            if !in_run {
                out.push(SPACE);
            }
            in_run = true;
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

fn with_children(tag: &Tag, children: Vec<Node>) -> Node {
    Node::Tag(Tag {
        children,
        ..tag.clone()
    })
}

/// Collapses whitespace runs to one space and drops whitespace-only text.
pub struct WhiteSpaceVisitor;

impl WhiteSpaceVisitor {
    pub fn clean(&mut self, nodes: &[Node]) -> Vec<Node> {
        nodes
            .iter()
            .filter_map(|node| visit_node(self, node))
            .collect()
    }
}

impl Visitor for WhiteSpaceVisitor {
    type Output = Option<Node>;

    fn visit_text(&mut self, text: &Text) -> Option<Node> {
        if text.data.chars().all(is_whitespace) {
            return None;
        }
        Some(Node::Text(Text {
            data: collapse_whitespace(&text.data),
            position: text.position,
        }))
    }

    fn visit_comment(&mut self, comment: &Comment) -> Option<Node> {
        Some(Node::Comment(comment.clone()))
    }

    fn visit_cdata(&mut self, cdata: &CData) -> Option<Node> {
        Some(Node::CData(cdata.clone()))
    }

    fn visit_doctype(&mut self, doctype: &Doctype) -> Option<Node> {
        Some(Node::Doctype(doctype.clone()))
    }

    fn visit_instruction(&mut self, instruction: &Instruction) -> Option<Node> {
        Some(Node::Instruction(instruction.clone()))
    }

    fn visit_tag(&mut self, tag: &Tag) -> Option<Node> {
        if is_raw_content(tag) {
            return Some(Node::Tag(tag.clone()));
        }
        let children = self.clean(&tag.children);
        Some(with_children(tag, children))
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Context {
    has_previous: bool,
    has_next: bool,
    has_parent: bool,
}

/// Strips whitespace that contains a line break at element boundaries, so
/// `>\n  <` becomes `><`, then collapses what is left.
#[derive(Debug, Default)]
pub struct RudeWhiteSpaceVisitor {
    context: Context,
}

impl RudeWhiteSpaceVisitor {
    pub fn new() -> Self {
        RudeWhiteSpaceVisitor::default()
    }

    pub fn clean(&mut self, nodes: &[Node]) -> Vec<Node> {
        let has_parent = self.context.has_parent;
        let mut cleaned = Vec::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            self.context = Context {
                has_previous: index > 0,
                has_next: index + 1 < nodes.len(),
                has_parent,
            };
            if let Some(node) = visit_node(self, node) {
                cleaned.push(node);
            }
        }
        self.context.has_parent = has_parent;
        cleaned
    }
}

/// Length in bytes of the leading whitespace run if it holds a line feed.
fn leading_break(text: &str) -> usize {
    let run = text.len() - text.trim_start_matches(is_whitespace).len();
    if text[..run].contains(LINE_FEED) {
        run
    } else {
        0
    }
}

fn trailing_break(text: &str) -> usize {
    let run = text.len() - text.trim_end_matches(is_whitespace).len();
    if text[text.len() - run..].contains(LINE_FEED) {
        run
    } else {
        0
    }
}

impl Visitor for RudeWhiteSpaceVisitor {
    type Output = Option<Node>;

    fn visit_text(&mut self, text: &Text) -> Option<Node> {
        let Context {
            has_previous,
            has_next,
            has_parent,
        } = self.context;
        let mut data = text.data.as_str();
        if has_previous || has_parent {
            data = &data[leading_break(data)..];
        }
        if has_next || has_parent {
            data = &data[..data.len() - trailing_break(data)];
        }
        let data = collapse_whitespace(data);
        if data.is_empty() || data == " " {
            return None;
        }
        Some(Node::Text(Text {
            data,
            position: text.position,
        }))
    }

    fn visit_comment(&mut self, comment: &Comment) -> Option<Node> {
        Some(Node::Comment(comment.clone()))
    }

    fn visit_cdata(&mut self, cdata: &CData) -> Option<Node> {
        Some(Node::CData(cdata.clone()))
    }

    fn visit_doctype(&mut self, doctype: &Doctype) -> Option<Node> {
        Some(Node::Doctype(doctype.clone()))
    }

    fn visit_instruction(&mut self, instruction: &Instruction) -> Option<Node> {
        Some(Node::Instruction(instruction.clone()))
    }

    fn visit_tag(&mut self, tag: &Tag) -> Option<Node> {
        if is_raw_content(tag) {
            return Some(Node::Tag(tag.clone()));
        }
        let saved = self.context;
        self.context.has_parent = true;
        let children = self.clean(&tag.children);
        self.context = saved;
        Some(with_children(tag, children))
    }
}
