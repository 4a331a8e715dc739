//! The annotated tree: markup classified into elements, components,
//! partials, inline templates and directives, with every expression
//! registered as a program of its container.

use crate::container::{ContainerId, ProgramId};

use data_structures::OrderedMap;
use source::Position;
use syntax::ast::Expr;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub id: ProgramId,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextPart {
    Text(String),
    Expression(Program),
    Translation { text: String, context: Option<String> },
}

/// The value of an attribute or option.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A valueless attribute like `disabled`.
    Empty,
    /// Literal text, possibly mixed with mustaches. Evaluates to a string.
    Text(Vec<TextPart>),
    /// A value that is exactly one mustache. Evaluates to the raw value.
    Expression(Program),
}

impl Value {
    pub fn text(value: &str) -> Value {
        Value::Text(vec![TextPart::Text(value.to_string())])
    }

    /// The value when it is plain text without expressions.
    pub fn as_static(&self) -> Option<String> {
        match self {
            Value::Empty => Some(String::new()),
            Value::Text(parts) => parts
                .iter()
                .map(|part| match part {
                    TextPart::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .map(|parts| parts.concat()),
            Value::Expression(_) => None,
        }
    }

    pub fn programs(&self) -> Vec<&Program> {
        match self {
            Value::Empty => vec![],
            Value::Text(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    TextPart::Expression(program) => Some(program),
                    _ => None,
                })
                .collect(),
            Value::Expression(program) => vec![program],
        }
    }

    pub fn has_translations(&self) -> bool {
        matches!(self, Value::Text(parts) if parts.iter().any(|part| matches!(part, TextPart::Translation { .. })))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// `on:click="handler(args)"`
    Handler,
    /// `bind:value="path"`: writes the changed value back to the path.
    Bind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    /// Lowercased event name, or the bound property for binds.
    pub name: String,
    pub program: Program,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Raw {
    pub data: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub parts: Vec<TextPart>,
    pub key: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: OrderedMap<Value>,
    pub events: OrderedMap<Event>,
    pub children: Vec<AstNode>,
    pub is_void: bool,
    pub is_self_closing: bool,
    pub key: String,
    pub container: ContainerId,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComponentKind {
    /// `Controls.buttons:Button`
    Module { library: String, module: String },
    /// `Controls.Button`, resolved to `Controls/Button`.
    WsControl { path: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentOption {
    pub name: String,
    pub children: Vec<AstNode>,
    pub container: ContainerId,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Array(Vec<DataValue>),
    Object(OrderedMap<DataValue>),
    String(Value),
    Number(Value),
    Boolean(Value),
    Value(Value),
    /// A module function, `Module/path:function`, with bound arguments.
    Function { path: String, arguments: OrderedMap<Value> },
    Markup(ContentOption),
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Value(Value),
    /// Read side of a `bind:` on a component.
    Bind(Program),
    Content(ContentOption),
    Data(DataValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub kind: ComponentKind,
    pub ws_attributes: OrderedMap<Value>,
    pub ws_events: OrderedMap<Event>,
    pub ws_options: OrderedMap<OptionValue>,
    pub key: String,
    pub container: ContainerId,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateRef {
    /// A `ws:template` of the same file.
    Inline(String),
    /// A module template string like `wml!Controls/list`.
    Static(String),
    /// A slashed control name like `Controls/Button`.
    Control(String),
    /// Computed at runtime.
    Dynamic(Program),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Partial {
    pub template: TemplateRef,
    pub ws_attributes: OrderedMap<Value>,
    pub ws_events: OrderedMap<Event>,
    pub ws_options: OrderedMap<OptionValue>,
    pub key: String,
    pub container: ContainerId,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub children: Vec<AstNode>,
    pub container: ContainerId,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub test: Program,
    pub children: Vec<AstNode>,
    pub container: ContainerId,
    pub key: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Else {
    pub test: Option<Program>,
    pub children: Vec<AstNode>,
    pub container: ContainerId,
    pub key: String,
    pub position: Position,
}

/// `ws:for data="init; test; update"`
#[derive(Debug, Clone, PartialEq)]
pub struct For {
    pub init: Option<Program>,
    pub test: Option<Program>,
    pub update: Option<Program>,
    pub children: Vec<AstNode>,
    pub container: ContainerId,
    pub key: String,
    pub position: Position,
}

/// `ws:for data="key, value in collection"`
#[derive(Debug, Clone, PartialEq)]
pub struct Foreach {
    pub key_name: Option<String>,
    pub value_name: String,
    pub collection: Program,
    pub children: Vec<AstNode>,
    pub container: ContainerId,
    pub key: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    Element(Element),
    Text(TextNode),
    Comment(Raw),
    CData(Raw),
    Doctype(Raw),
    Instruction(Raw),
    Component(Component),
    Partial(Partial),
    Template(Template),
    If(If),
    Else(Else),
    For(For),
    Foreach(Foreach),
}

impl AstNode {
    pub fn position(&self) -> Position {
        match self {
            AstNode::Element(node) => node.position,
            AstNode::Text(node) => node.position,
            AstNode::Comment(node)
            | AstNode::CData(node)
            | AstNode::Doctype(node)
            | AstNode::Instruction(node) => node.position,
            AstNode::Component(node) => node.position,
            AstNode::Partial(node) => node.position,
            AstNode::Template(node) => node.position,
            AstNode::If(node) => node.position,
            AstNode::Else(node) => node.position,
            AstNode::For(node) => node.position,
            AstNode::Foreach(node) => node.position,
        }
    }

    pub fn children(&self) -> &[AstNode] {
        match self {
            AstNode::Element(node) => &node.children,
            AstNode::Template(node) => &node.children,
            AstNode::If(node) => &node.children,
            AstNode::Else(node) => &node.children,
            AstNode::For(node) => &node.children,
            AstNode::Foreach(node) => &node.children,
            _ => &[],
        }
    }

    /// Inline template definitions produce no output where they stand.
    pub fn is_definition(&self) -> bool {
        matches!(self, AstNode::Template(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{ContainerArena, ProgramType};
    use parser::parse_expression;

    #[test]
    fn static_values() {
        assert_eq!(Value::Empty.as_static(), Some(String::new()));
        assert_eq!(Value::text("a").as_static(), Some("a".to_string()));

        let mut arena = ContainerArena::new();
        let expr = parse_expression("b").unwrap();
        let id = arena.register_program(arena.global(), &expr, ProgramType::Attribute, "title");
        let program = Program { id, expr };
        let mixed = Value::Text(vec![
            TextPart::Text("a ".to_string()),
            TextPart::Expression(program.clone()),
        ]);
        assert_eq!(mixed.as_static(), None);
        assert_eq!(mixed.programs(), vec![&program]);
        assert!(!mixed.has_translations());
        assert!(Value::Text(vec![TextPart::Translation {
            text: "Save".to_string(),
            context: None
        }])
        .has_translations());
    }
}
