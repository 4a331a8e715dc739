use crate::ast::*;
use crate::markup::*;

/// A visitor over the markup tree. Every node kind must be handled;
/// dispatch is an exhaustive match, so adding a node kind breaks every
/// visitor at compile time.
pub trait Visitor: Sized {
    type Output;

    fn visit_text(&mut self, text: &Text) -> Self::Output;
    fn visit_comment(&mut self, comment: &Comment) -> Self::Output;
    fn visit_cdata(&mut self, cdata: &CData) -> Self::Output;
    fn visit_doctype(&mut self, doctype: &Doctype) -> Self::Output;
    fn visit_instruction(&mut self, instruction: &Instruction) -> Self::Output;
    fn visit_tag(&mut self, tag: &Tag) -> Self::Output;
}

pub fn visit_node<V: Visitor>(visitor: &mut V, node: &Node) -> V::Output {
    match node {
        Node::Text(text) => visitor.visit_text(text),
        Node::Comment(comment) => visitor.visit_comment(comment),
        Node::CData(cdata) => visitor.visit_cdata(cdata),
        Node::Doctype(doctype) => visitor.visit_doctype(doctype),
        Node::Instruction(instruction) => visitor.visit_instruction(instruction),
        Node::Tag(tag) => visitor.visit_tag(tag),
    }
}

pub fn visit_all<V: Visitor>(visitor: &mut V, nodes: &[Node]) -> Vec<V::Output> {
    nodes.iter().map(|node| visit_node(visitor, node)).collect()
}

/// Renders a tree back to markup text.
pub struct MarkupVisitor;

impl Visitor for MarkupVisitor {
    type Output = String;

    fn visit_text(&mut self, text: &Text) -> String {
        text.data.clone()
    }

    fn visit_comment(&mut self, comment: &Comment) -> String {
        format!("<!--{}-->", comment.data)
    }

    fn visit_cdata(&mut self, cdata: &CData) -> String {
        format!("<![CDATA[{}]]>", cdata.data)
    }

    fn visit_doctype(&mut self, doctype: &Doctype) -> String {
        format!("<!{}>", doctype.data)
    }

    fn visit_instruction(&mut self, instruction: &Instruction) -> String {
        format!("<?{}?>", instruction.data)
    }

    fn visit_tag(&mut self, tag: &Tag) -> String {
        let mut out = format!("<{}", tag.name);
        for attribute in tag.attributes.values() {
            out.push(' ');
            out.push_str(&attribute.name);
            if let Some(value) = &attribute.value {
                let quote = if value.contains('"') { '\'' } else { '"' };
                out.push('=');
                out.push(quote);
                out.push_str(value);
                out.push(quote);
            }
        }
        if tag.is_self_closing {
            out.push_str(" />");
            return out;
        }
        out.push('>');
        if tag.is_void {
            return out;
        }
        for child in &tag.children {
            out.push_str(&visit_node(self, child));
        }
        out.push_str("</");
        out.push_str(&tag.name);
        out.push('>');
        out
    }
}

pub fn to_markup(nodes: &[Node]) -> String {
    visit_all(&mut MarkupVisitor, nodes).concat()
}

/// Read-only walk over expressions. Override `visit_expr` to stop the walk
/// at a node, or `visit_ident` to see free identifiers.
pub trait ExprVisitor: Sized {
    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_ident(&mut self, _ident: &Ident) {}
}

pub fn walk_expr<V: ExprVisitor>(visitor: &mut V, Expr { kind, .. }: &Expr) {
    use ExprKind::*;
    match kind {
        Lit(_) => {}
        Ident(ident) => visitor.visit_ident(ident),
        Member(object, _) => visitor.visit_expr(object),
        Index(object, index) => {
            visitor.visit_expr(object);
            visitor.visit_expr(index);
        }
        Call(callee, arguments) => {
            visitor.visit_expr(callee);
            for argument in arguments {
                visitor.visit_expr(argument);
            }
        }
        Unary(_, argument) => visitor.visit_expr(argument),
        Binary(_, left, right) | Assign(_, left, right) => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        Conditional(test, consequent, alternate) => {
            visitor.visit_expr(test);
            visitor.visit_expr(consequent);
            visitor.visit_expr(alternate);
        }
        Update { argument, .. } => visitor.visit_expr(argument),
        Array(elements) | Sequence(elements) => {
            for element in elements {
                visitor.visit_expr(element);
            }
        }
        Object(properties) => {
            for property in properties {
                visitor.visit_expr(&property.value);
            }
        }
        Decorated(value, decorators) => {
            visitor.visit_expr(value);
            for decorator in decorators {
                for argument in &decorator.arguments {
                    visitor.visit_expr(argument);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use source::Position;

    fn text(data: &str) -> Node {
        Node::Text(Text {
            data: data.to_string(),
            position: Position::default(),
        })
    }

    fn attribute(name: &str, value: Option<&str>) -> Attribute {
        Attribute {
            name: name.to_string(),
            value: value.map(String::from),
            position: Position::default(),
        }
    }

    #[test]
    fn renders_tags_and_attributes() {
        let mut div = Tag::new("div", Position::default());
        div.attributes.insert("class", attribute("class", Some("a")));
        div.attributes.insert("title", attribute("title", Some("say \"hi\"")));
        div.attributes.insert("hidden", attribute("hidden", None));
        div.children.push(text("x"));
        assert_eq!(
            to_markup(&[Node::Tag(div)]),
            "<div class=\"a\" title='say \"hi\"' hidden>x</div>"
        );
    }

    #[test]
    fn renders_void_and_self_closing() {
        let mut br = Tag::new("br", Position::default());
        br.is_void = true;
        let mut control = Tag::new("Controls.Button", Position::default());
        control.is_self_closing = true;
        assert_eq!(
            to_markup(&[Node::Tag(br), Node::Tag(control)]),
            "<br><Controls.Button />"
        );
    }

    #[test]
    fn renders_special_nodes() {
        let nodes = vec![
            Node::Doctype(Doctype {
                data: "DOCTYPE html".into(),
                position: Position::default(),
            }),
            Node::Instruction(Instruction {
                data: "xml version=\"1.0\"".into(),
                position: Position::default(),
            }),
            Node::Comment(Comment {
                data: " note ".into(),
                position: Position::default(),
            }),
            Node::CData(CData {
                data: "a<b".into(),
                position: Position::default(),
            }),
        ];
        assert_eq!(
            to_markup(&nodes),
            "<!DOCTYPE html><?xml version=\"1.0\"?><!-- note --><![CDATA[a<b]]>"
        );
    }

    struct Counter;

    impl Visitor for Counter {
        type Output = usize;

        fn visit_text(&mut self, _: &Text) -> usize {
            1
        }
        fn visit_comment(&mut self, _: &Comment) -> usize {
            1
        }
        fn visit_cdata(&mut self, _: &CData) -> usize {
            1
        }
        fn visit_doctype(&mut self, _: &Doctype) -> usize {
            1
        }
        fn visit_instruction(&mut self, _: &Instruction) -> usize {
            1
        }
        fn visit_tag(&mut self, tag: &Tag) -> usize {
            1 + visit_all(self, &tag.children).iter().sum::<usize>()
        }
    }

    #[test]
    fn visitors_carry_their_own_output() {
        let mut root = Tag::new("div", Position::default());
        root.children.push(text("a"));
        root.children.push(Node::Tag(Tag::new("span", Position::default())));
        assert_eq!(Node::Tag(root).accept(&mut Counter), 3);
    }
}
