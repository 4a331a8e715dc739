use crate::nodes::*;
use diagnostics::ParseResult as Result;

/// Walks the annotated tree. Every method defaults to visiting the
/// children, so implementors only override the nodes they care about.
pub trait Visitor: Sized {
    fn visit_node(&mut self, node: &AstNode) -> Result<()> {
        walk_node(self, node)
    }

    fn visit_element(&mut self, element: &Element) -> Result<()> {
        walk_nodes(self, &element.children)
    }

    fn visit_text(&mut self, _text: &TextNode) -> Result<()> {
        Ok(())
    }

    fn visit_component(&mut self, component: &Component) -> Result<()> {
        walk_options(self, &component.ws_options)
    }

    fn visit_partial(&mut self, partial: &Partial) -> Result<()> {
        walk_options(self, &partial.ws_options)
    }

    fn visit_template(&mut self, template: &Template) -> Result<()> {
        walk_nodes(self, &template.children)
    }

    fn visit_content_option(&mut self, option: &ContentOption) -> Result<()> {
        walk_nodes(self, &option.children)
    }

    fn visit_data(&mut self, data: &DataValue) -> Result<()> {
        walk_data(self, data)
    }
}

pub fn walk_nodes<V: Visitor>(visitor: &mut V, nodes: &[AstNode]) -> Result<()> {
    for node in nodes {
        visitor.visit_node(node)?;
    }
    Ok(())
}

pub fn walk_node<V: Visitor>(visitor: &mut V, node: &AstNode) -> Result<()> {
    match node {
        AstNode::Element(element) => visitor.visit_element(element),
        AstNode::Text(text) => visitor.visit_text(text),
        AstNode::Component(component) => visitor.visit_component(component),
        AstNode::Partial(partial) => visitor.visit_partial(partial),
        AstNode::Template(template) => visitor.visit_template(template),
        AstNode::If(_) | AstNode::Else(_) | AstNode::For(_) | AstNode::Foreach(_) => {
            walk_nodes(visitor, node.children())
        }
        AstNode::Comment(_) | AstNode::CData(_) | AstNode::Doctype(_) | AstNode::Instruction(_) => Ok(()),
    }
}

pub fn walk_options<V: Visitor>(
    visitor: &mut V,
    options: &data_structures::OrderedMap<OptionValue>,
) -> Result<()> {
    for (_, option) in options.iter() {
        match option {
            OptionValue::Content(content) => visitor.visit_content_option(content)?,
            OptionValue::Data(data) => visitor.visit_data(data)?,
            OptionValue::Value(_) | OptionValue::Bind(_) => {}
        }
    }
    Ok(())
}

pub fn walk_data<V: Visitor>(visitor: &mut V, data: &DataValue) -> Result<()> {
    match data {
        DataValue::Array(items) => {
            for item in items {
                visitor.visit_data(item)?;
            }
        }
        DataValue::Object(fields) => {
            for (_, field) in fields.iter() {
                visitor.visit_data(field)?;
            }
        }
        DataValue::Markup(content) => visitor.visit_content_option(content)?,
        DataValue::String(_)
        | DataValue::Number(_)
        | DataValue::Boolean(_)
        | DataValue::Value(_)
        | DataValue::Function { .. } => {}
    }
    Ok(())
}
