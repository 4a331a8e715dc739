//! The read-only projection of containers into evaluation blocks.

use crate::container::ContainerId;

use syntax::ast::Expr;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalNodeKind {
    If,
    ElseIf,
    Else,
    Block,
}

impl fmt::Display for InternalNodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InternalNodeKind::If => "IF",
            InternalNodeKind::ElseIf => "ELSE_IF",
            InternalNodeKind::Else => "ELSE",
            InternalNodeKind::Block => "BLOCK",
        })
    }
}

#[derive(Debug, Clone)]
pub struct InternalNode {
    pub kind: InternalNodeKind,
    pub index: usize,
    pub is_in_data_type: bool,
    /// Only IF and ELSE_IF carry a test.
    pub test: Option<Expr>,
    pub storage: Vec<Expr>,
    pub container: ContainerId,
    pub children: Vec<InternalNode>,
}

impl InternalNode {
    /// Whether the subtree evaluates anything at all.
    pub fn is_empty(&self) -> bool {
        self.test.is_none() && self.storage.is_empty() && self.children.iter().all(InternalNode::is_empty)
    }

    /// Stored expressions of the whole subtree, in the order a
    /// dirty-checking function evaluates them.
    pub fn flatten(&self) -> Vec<&Expr> {
        let mut exprs: Vec<&Expr> = self.storage.iter().collect();
        for child in &self.children {
            exprs.extend(child.flatten());
        }
        exprs
    }
}

impl fmt::Display for InternalNode {
    /// One line per node, indented by depth: `IF #3 (a) [b, c]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_node(node: &InternalNode, depth: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}{} #{}", "  ".repeat(depth), node.kind, node.index)?;
            if let Some(test) = &node.test {
                write!(f, " ({})", test.to_source())?;
            }
            let storage: Vec<String> = node.storage.iter().map(Expr::to_source).collect();
            writeln!(f, " [{}]", storage.join(", "))?;
            for child in &node.children {
                write_node(child, depth + 1, f)?;
            }
            Ok(())
        }
        write_node(self, 0, f)
    }
}

#[cfg(test)]
mod tests {
    use crate::container::{ContainerArena, ContainerType, ProgramType};
    use parser::parse_expression;

    #[test]
    fn renders_the_tree() {
        let mut arena = ContainerArena::new();
        let global = arena.global();
        arena.register_program(global, &parse_expression("title").unwrap(), ProgramType::Attribute, "title");
        let branch = arena.create_container(global, ContainerType::Conditional);
        arena
            .register_test_program(branch, &parse_expression("a && b").unwrap())
            .unwrap();
        arena.register_program(branch, &parse_expression("c").unwrap(), ProgramType::Simple, "text");
        let tree = arena.internal_structure(global);
        assert_eq!(tree.to_string(), "BLOCK #0 [title]\n  IF #1 (a && b) [c]\n");
        assert_eq!(tree.flatten().len(), 2);
        assert!(!tree.is_empty());
    }
}
