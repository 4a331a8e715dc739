//! Dirty-checking functions. The runtime calls one per component to
//! collect the values its options depend on; a value under a condition is
//! only evaluated when the condition holds.

use crate::expr::ExpressionGenerator;
use crate::formatter::Formatter;

use hir::{InternalNode, InternalNodeKind};
use syntax::ast::quote_string;

pub struct InternalFunction<'a> {
    name: &'a str,
    tree: &'a InternalNode,
    counter: usize,
}

impl<'a> InternalFunction<'a> {
    pub fn new(name: &'a str, tree: &'a InternalNode) -> Self {
        InternalFunction { name, tree, counter: 0 }
    }

    pub fn generate(mut self, formatter: &mut dyn Formatter) -> String {
        let mut out = formatter.format_line(&format!("function {}(data) {{", self.name));
        formatter.enter();
        out.push_str(&formatter.format_line("var collection = {};"));
        let tree = self.tree;
        self.write_node(tree, formatter, &mut out);
        out.push_str(&formatter.format_line("return collection;"));
        formatter.leave();
        out.push_str(&formatter.format_line("}"));
        out
    }

    fn write_node(&mut self, node: &InternalNode, formatter: &mut dyn Formatter, out: &mut String) {
        let expressions = ExpressionGenerator::new("data");
        for expr in &node.storage {
            let slot = quote_string(&format!("__dirtyCheckingVars_{}", self.counter));
            self.counter += 1;
            out.push_str(&formatter.format_line(&format!(
                "collection[{}] = {};",
                slot,
                expressions.generate(expr)
            )));
        }
        // A branch whose chain head was demoted opens a chain of its own.
        let mut chain_open = false;
        for (index, child) in node.children.iter().enumerate() {
            let test = child.test.as_ref().map(|test| expressions.generate(test)).unwrap_or_default();
            let open = match (child.kind, chain_open) {
                (InternalNodeKind::Block, _) | (InternalNodeKind::Else, false) => {
                    self.write_node(child, formatter, out);
                    chain_open = false;
                    continue;
                }
                (InternalNodeKind::If, _) | (InternalNodeKind::ElseIf, false) => format!("if ({}) {{", test),
                (InternalNodeKind::ElseIf, true) => format!("}} else if ({}) {{", test),
                (InternalNodeKind::Else, true) => "} else {".to_string(),
            };
            out.push_str(&formatter.format_line(&open));
            formatter.enter();
            self.write_node(child, formatter, out);
            formatter.leave();
            chain_open = matches!(
                node.children.get(index + 1).map(|next| next.kind),
                Some(InternalNodeKind::ElseIf | InternalNodeKind::Else)
            ) && child.kind != InternalNodeKind::Else;
            if !chain_open {
                out.push_str(&formatter.format_line("}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::DebugFormatter;
    use hir::{ContainerArena, ContainerType, ProgramType};
    use parser::parse_expression;

    #[test]
    fn conditions_guard_their_values() {
        let mut arena = ContainerArena::new();
        let component = arena.create_container(arena.global(), ContainerType::Component);
        arena.register_program(component, &parse_expression("title").unwrap(), ProgramType::Option, "caption");

        let first = arena.create_container(component, ContainerType::Conditional);
        arena.register_test_program(first, &parse_expression("a").unwrap()).unwrap();
        arena.register_program(first, &parse_expression("b").unwrap(), ProgramType::Option, "text");

        let second = arena.create_container(component, ContainerType::Conditional);
        arena.set_else(second);
        arena.register_program(second, &parse_expression("c").unwrap(), ProgramType::Option, "text");

        let tree = arena.internal_structure(component);
        let text = InternalFunction::new("internal_1", &tree).generate(&mut DebugFormatter::default());
        let expected = concat!(
            "function internal_1(data) {\n",
            "  var collection = {};\n",
            "  collection[\"__dirtyCheckingVars_0\"] = thelpers.getter(data, [\"title\"]);\n",
            "  if (thelpers.getter(data, [\"a\"])) {\n",
            "    collection[\"__dirtyCheckingVars_1\"] = thelpers.getter(data, [\"b\"]);\n",
            "  } else {\n",
            "    collection[\"__dirtyCheckingVars_2\"] = thelpers.getter(data, [\"c\"]);\n",
            "  }\n",
            "  return collection;\n",
            "}\n",
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn demoted_tests_are_collected() {
        let mut arena = ContainerArena::new();
        let component = arena.create_container(arena.global(), ContainerType::Component);
        let conditional = arena.create_container(component, ContainerType::Conditional);
        arena.register_test_program(conditional, &parse_expression("check(a)").unwrap()).unwrap();
        arena.register_program(conditional, &parse_expression("b").unwrap(), ProgramType::Option, "text");

        let tree = arena.internal_structure(component);
        let text = InternalFunction::new("internal_1", &tree).generate(&mut crate::formatter::ReleaseFormatter);
        assert!(!text.contains("if ("));
        assert!(text.contains("collection[\"__dirtyCheckingVars_1\"] = thelpers.callFunction(thelpers.getter(data, [\"check\"]), [thelpers.getter(data, [\"a\"])]);"));
    }

    #[test]
    fn branches_after_a_demoted_head_open_their_own_chain() {
        let mut arena = ContainerArena::new();
        let component = arena.create_container(arena.global(), ContainerType::Component);
        let head = arena.create_container(component, ContainerType::Conditional);
        arena.register_test_program(head, &parse_expression("check(a)").unwrap()).unwrap();

        let branch = arena.create_container(component, ContainerType::Conditional);
        arena.set_else(branch);
        arena.register_test_program(branch, &parse_expression("b").unwrap()).unwrap();
        arena.register_program(branch, &parse_expression("c").unwrap(), ProgramType::Option, "text");

        let otherwise = arena.create_container(component, ContainerType::Conditional);
        arena.set_else(otherwise);
        arena.register_program(otherwise, &parse_expression("d").unwrap(), ProgramType::Option, "text");

        let tree = arena.internal_structure(component);
        let text = InternalFunction::new("internal_1", &tree).generate(&mut DebugFormatter::default());
        let expected = concat!(
            "function internal_1(data) {\n",
            "  var collection = {};\n",
            "  collection[\"__dirtyCheckingVars_0\"] = thelpers.callFunction(thelpers.getter(data, [\"check\"]), [thelpers.getter(data, [\"a\"])]);\n",
            "  if (thelpers.getter(data, [\"b\"])) {\n",
            "    collection[\"__dirtyCheckingVars_1\"] = thelpers.getter(data, [\"c\"]);\n",
            "  } else {\n",
            "    collection[\"__dirtyCheckingVars_2\"] = thelpers.getter(data, [\"d\"]);\n",
            "  }\n",
            "  return collection;\n",
            "}\n",
        );
        assert_eq!(text, expected);

        let lone = arena.create_container(component, ContainerType::Conditional);
        arena.set_else(lone);
        arena.register_program(lone, &parse_expression("e").unwrap(), ProgramType::Option, "text");
        let text = InternalFunction::new("internal_1", &arena.internal_structure(component))
            .generate(&mut crate::formatter::ReleaseFormatter);
        assert!(text.contains("} else {collection[\"__dirtyCheckingVars_2\"] = thelpers.getter(data, [\"d\"]);}collection[\"__dirtyCheckingVars_3\"]"));
        assert_eq!(text.matches('{').count(), text.matches('}').count());
    }
}
