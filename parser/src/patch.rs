//! Compatibility rewrites applied after tree building. The table is fixed;
//! each rule runs once per child list, in order:
//!
//! 1. adjacent text siblings are merged, keeping the first position;
//! 2. empty text nodes are removed;
//! 3. names of standard HTML elements written with upper case letters are
//!    lowercased (component names are never known elements);
//! 4. whitespace-only text between members of a `ws:if` / `ws:else` chain
//!    is removed.

use crate::options::TagDescriptor;

use syntax::markup::*;
use syntax::visitor::{visit_node, Visitor};

use log::debug;

pub struct PatchVisitor {
    tag_descriptor: fn(&str) -> TagDescriptor,
}

fn is_chain_member(node: &Node) -> bool {
    matches!(node, Node::Tag(tag) if tag.name == "ws:if" || tag.name == "ws:else")
}

fn is_chain_continuation(node: &Node) -> bool {
    matches!(node, Node::Tag(tag) if tag.name == "ws:else")
}

impl PatchVisitor {
    pub fn new(tag_descriptor: fn(&str) -> TagDescriptor) -> Self {
        PatchVisitor { tag_descriptor }
    }

    pub fn patch(&mut self, nodes: &[Node]) -> Vec<Node> {
        let rewritten: Vec<Node> = nodes.iter().map(|node| visit_node(self, node)).collect();

        let mut merged: Vec<Node> = Vec::with_capacity(rewritten.len());
        for node in rewritten {
            if let Node::Text(text) = &node {
                if let Some(Node::Text(previous)) = merged.last_mut() {
                    previous.data.push_str(&text.data);
                    continue;
                }
            }
            merged.push(node);
        }
        merged.retain(|node| !matches!(node, Node::Text(text) if text.data.is_empty()));

        let mut patched = Vec::with_capacity(merged.len());
        for index in 0..merged.len() {
            let node = &merged[index];
            if node.is_whitespace_text()
                && index > 0
                && is_chain_member(&merged[index - 1])
                && merged.get(index + 1).map_or(false, is_chain_continuation)
            {
                continue;
            }
            patched.push(node.clone());
        }
        patched
    }
}

impl Visitor for PatchVisitor {
    type Output = Node;

    fn visit_text(&mut self, text: &Text) -> Node {
        Node::Text(text.clone())
    }

    fn visit_comment(&mut self, comment: &Comment) -> Node {
        Node::Comment(comment.clone())
    }

    fn visit_cdata(&mut self, cdata: &CData) -> Node {
        Node::CData(cdata.clone())
    }

    fn visit_doctype(&mut self, doctype: &Doctype) -> Node {
        Node::Doctype(doctype.clone())
    }

    fn visit_instruction(&mut self, instruction: &Instruction) -> Node {
        Node::Instruction(instruction.clone())
    }

    fn visit_tag(&mut self, tag: &Tag) -> Node {
        let lowercase = tag.name.to_ascii_lowercase();
        let name = if lowercase != tag.name && (self.tag_descriptor)(&tag.name).is_known {
            debug!("patch: <{}> renamed to <{}>", tag.name, lowercase);
            lowercase
        } else {
            tag.name.clone()
        };
        Node::Tag(Tag {
            name,
            attributes: tag.attributes.clone(),
            children: self.patch(&tag.children),
            is_void: tag.is_void,
            is_self_closing: tag.is_self_closing,
            position: tag.position,
        })
    }
}
