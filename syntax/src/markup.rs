//! The markup tree produced by the tree builder.

use data_structures::OrderedMap;
use serde::Serialize;
use source::Position;

use crate::visitor::{visit_node, Visitor};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub enum Node {
    Text(Text),
    Comment(Comment),
    CData(CData),
    Doctype(Doctype),
    Instruction(Instruction),
    Tag(Tag),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Text {
    pub data: String,
    pub position: Position,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Comment {
    pub data: String,
    pub position: Position,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CData {
    pub data: String,
    pub position: Position,
}

/// `<!DOCTYPE html>` keeps `DOCTYPE html` as data.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Doctype {
    pub data: String,
    pub position: Position,
}

/// `<?xml version="1.0"?>` keeps `xml version="1.0"` as data.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Instruction {
    pub data: String,
    pub position: Position,
}

pub type Attributes = OrderedMap<Attribute>;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Tag {
    pub name: String,
    pub attributes: Attributes,
    pub children: Vec<Node>,
    pub is_void: bool,
    pub is_self_closing: bool,
    pub position: Position,
}

impl Tag {
    pub fn new(name: &str, position: Position) -> Tag {
        Tag {
            name: name.to_string(),
            attributes: Attributes::new(),
            children: vec![],
            is_void: false,
            is_self_closing: false,
            position,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Value of an attribute, with valueless attributes reading as "".
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(|attribute| attribute.value.as_deref().unwrap_or(""))
    }
}

/// An attribute. A missing value (`<input disabled>`) is distinct from an
/// empty one (`<input value="">`).
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
    pub position: Position,
}

impl Node {
    pub fn position(&self) -> Position {
        match self {
            Node::Text(node) => node.position,
            Node::Comment(node) => node.position,
            Node::CData(node) => node.position,
            Node::Doctype(node) => node.position,
            Node::Instruction(node) => node.position,
            Node::Tag(node) => node.position,
        }
    }

    pub fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        visit_node(visitor, self)
    }

    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Node::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn as_tag_mut(&mut self) -> Option<&mut Tag> {
        match self {
            Node::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn is_whitespace_text(&self) -> bool {
        match self {
            Node::Text(text) => text.data.chars().all(source::chars::is_whitespace),
            _ => false,
        }
    }
}
