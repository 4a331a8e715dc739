//! Abstract syntax for the expressions embedded in templates: mustache
//! bodies, attribute values and directive arguments.

use crate::precedence::Precedence;
use crate::symbol::Symbol;
use crate::visitor::{walk_expr, ExprVisitor};

use serde::{Deserialize, Serialize};
use source::diagnostics::Span;

use std::fmt::{Debug, Error, Formatter, Write};

#[derive(Serialize, Deserialize, Clone, PartialEq)]
pub struct Ident {
    pub symbol: Symbol,
    pub span: Span,
}

impl Ident {
    pub fn new(name: &str, span: Span) -> Ident {
        Ident {
            symbol: Symbol::intern(name),
            span,
        }
    }

    pub fn to_str(&self) -> &str {
        self.symbol.as_str()
    }
}

impl Debug for Ident {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::result::Result<(), Error> {
        write!(f, "{:?}", self.symbol)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

pub fn expr(kind: ExprKind, span: Span) -> Expr {
    Expr { kind, span }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ExprKind {
    Lit(Literal),
    Ident(Ident),
    // obj.prop
    Member(Box<Expr>, Ident),
    // obj[prop]
    Index(Box<Expr>, Box<Expr>),
    // callee(args)
    Call(Box<Expr>, Vec<Expr>),
    Unary(UnOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    // test ? consequent : alternate
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    Assign(AssignOp, Box<Expr>, Box<Expr>),
    Update { op: UpdateOp, prefix: bool, argument: Box<Expr> },
    Array(Vec<Expr>),
    Object(Vec<Property>),
    Sequence(Vec<Expr>),
    // value | decorator: args | decorator
    Decorated(Box<Expr>, Vec<Decorator>),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Literal {
    Number(String),
    Str(String),
    Bool(bool),
    Null,
    Undefined,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Property {
    pub key: String,
    pub value: Expr,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Decorator {
    pub name: Ident,
    pub arguments: Vec<Expr>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Negate,
    Minus,
    Plus,
    Typeof,
}

impl UnOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnOp::Negate => "!",
            UnOp::Minus => "-",
            UnOp::Plus => "+",
            UnOp::Typeof => "typeof ",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Eq,
    StrictEq,
    NotEq,
    StrictNotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    In,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        use BinOp::*;
        match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            And => "&&",
            Or => "||",
            Eq => "==",
            StrictEq => "===",
            NotEq => "!=",
            StrictNotEq => "!==",
            Less => "<",
            LessEq => "<=",
            Greater => ">",
            GreaterEq => ">=",
            In => "in",
        }
    }

    pub fn precedence(self) -> Precedence {
        use BinOp::*;
        match self {
            Add | Sub => Precedence::SUM,
            Mul | Div | Mod => Precedence::PRODUCT,
            And => Precedence::AND,
            Or => Precedence::OR,
            Eq | StrictEq | NotEq | StrictNotEq => Precedence::EQUALITY,
            Less | LessEq | Greater | GreaterEq | In => Precedence::COMPARE,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Equals,
    PlusEquals,
    MinusEquals,
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Equals => "=",
            AssignOp::PlusEquals => "+=",
            AssignOp::MinusEquals => "-=",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

impl UpdateOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateOp::Increment => "++",
            UpdateOp::Decrement => "--",
        }
    }
}

/// One step of a member chain: `a.b[c]` is `Name(a)`, `Name(b)`, `Computed(c)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathPart<'a> {
    Name(&'a str),
    Computed(&'a Expr),
}

impl Expr {
    pub fn precedence(&self) -> Precedence {
        match &self.kind {
            ExprKind::Binary(op, ..) => op.precedence(),
            ExprKind::Conditional(..) => Precedence::CONDITIONAL,
            ExprKind::Assign(..) => Precedence::ASSIGNMENT,
            ExprKind::Sequence(..) => Precedence::SEQUENCE,
            ExprKind::Decorated(..) => Precedence::DECORATOR,
            ExprKind::Unary(..) => Precedence::PREFIX,
            ExprKind::Update { .. } => Precedence::POSTFIX,
            _ => Precedence::CALL,
        }
    }

    /// Canonical source text. Two spellings of the same expression (extra
    /// whitespace, redundant parentheses, quote style) print identically,
    /// which is what program deduplication keys on.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        self.write_source(&mut out);
        out
    }

    fn write_wrapped(&self, out: &mut String, wrap: bool) {
        if wrap {
            out.push('(');
            self.write_source(out);
            out.push(')');
        } else {
            self.write_source(out);
        }
    }

    fn write_source(&self, out: &mut String) {
        match &self.kind {
            ExprKind::Lit(lit) => write_literal(out, lit),
            ExprKind::Ident(ident) => out.push_str(ident.to_str()),
            ExprKind::Member(object, property) => {
                object.write_wrapped(out, object.precedence() < Precedence::CALL);
                out.push('.');
                out.push_str(property.to_str());
            }
            ExprKind::Index(object, index) => {
                object.write_wrapped(out, object.precedence() < Precedence::CALL);
                out.push('[');
                index.write_source(out);
                out.push(']');
            }
            ExprKind::Call(callee, arguments) => {
                callee.write_wrapped(out, callee.precedence() < Precedence::CALL);
                out.push('(');
                write_list(out, arguments);
                out.push(')');
            }
            ExprKind::Unary(op, argument) => {
                out.push_str(op.as_str());
                argument.write_wrapped(out, argument.precedence() < Precedence::PREFIX);
            }
            ExprKind::Binary(op, left, right) => {
                let precedence = op.precedence();
                left.write_wrapped(out, left.precedence() < precedence);
                let _ = write!(out, " {} ", op.as_str());
                right.write_wrapped(out, right.precedence() <= precedence);
            }
            ExprKind::Conditional(test, consequent, alternate) => {
                test.write_wrapped(out, test.precedence() <= Precedence::CONDITIONAL);
                out.push_str(" ? ");
                consequent.write_wrapped(out, consequent.precedence() < Precedence::CONDITIONAL);
                out.push_str(" : ");
                alternate.write_wrapped(out, alternate.precedence() < Precedence::CONDITIONAL);
            }
            ExprKind::Assign(op, target, value) => {
                target.write_wrapped(out, target.precedence() < Precedence::CALL);
                let _ = write!(out, " {} ", op.as_str());
                value.write_wrapped(out, value.precedence() < Precedence::ASSIGNMENT);
            }
            ExprKind::Update {
                op,
                prefix,
                argument,
            } => {
                if *prefix {
                    out.push_str(op.as_str());
                }
                argument.write_wrapped(out, argument.precedence() < Precedence::CALL);
                if !*prefix {
                    out.push_str(op.as_str());
                }
            }
            ExprKind::Array(elements) => {
                out.push('[');
                write_list(out, elements);
                out.push(']');
            }
            ExprKind::Object(properties) => {
                out.push('{');
                for (index, property) in properties.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    if is_identifier_name(&property.key) {
                        out.push_str(&property.key);
                    } else {
                        out.push_str(&quote_string(&property.key));
                    }
                    out.push_str(": ");
                    property
                        .value
                        .write_wrapped(out, property.value.precedence() <= Precedence::SEQUENCE);
                }
                out.push('}');
            }
            ExprKind::Sequence(expressions) => {
                for (index, expression) in expressions.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    expression.write_wrapped(out, expression.precedence() <= Precedence::SEQUENCE);
                }
            }
            ExprKind::Decorated(value, decorators) => {
                value.write_wrapped(out, value.precedence() <= Precedence::DECORATOR);
                for decorator in decorators {
                    out.push_str(" | ");
                    out.push_str(decorator.name.to_str());
                    if !decorator.arguments.is_empty() {
                        out.push_str(": ");
                        for (index, argument) in decorator.arguments.iter().enumerate() {
                            if index > 0 {
                                out.push_str(", ");
                            }
                            argument
                                .write_wrapped(out, argument.precedence() <= Precedence::DECORATOR);
                        }
                    }
                }
            }
        }
    }

    /// Free identifiers in order of first appearance, without duplicates.
    /// Member property names, object keys and decorator names are not
    /// identifiers.
    pub fn identifiers(&self) -> Vec<String> {
        let mut collector = IdentifierCollector { names: vec![] };
        collector.visit_expr(self);
        collector.names
    }

    /// Whether evaluating the expression may run user code or write data:
    /// calls, decorators, assignments and updates.
    pub fn has_side_effects(&self) -> bool {
        let mut finder = SideEffectFinder { found: false };
        finder.visit_expr(self);
        finder.found
    }

    /// The member chain rooted in a plain identifier, or None when the
    /// root is something else (a call, a literal).
    pub fn member_path(&self) -> Option<Vec<PathPart<'_>>> {
        match &self.kind {
            ExprKind::Ident(ident) => Some(vec![PathPart::Name(ident.to_str())]),
            ExprKind::Member(object, property) => {
                let mut path = object.member_path()?;
                path.push(PathPart::Name(property.to_str()));
                Some(path)
            }
            ExprKind::Index(object, index) => {
                let mut path = object.member_path()?;
                match &index.kind {
                    ExprKind::Lit(Literal::Str(name)) => path.push(PathPart::Name(name)),
                    ExprKind::Lit(Literal::Number(name)) => path.push(PathPart::Name(name)),
                    _ => path.push(PathPart::Computed(index)),
                }
                Some(path)
            }
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Lit(_))
    }
}

struct IdentifierCollector {
    names: Vec<String>,
}

impl ExprVisitor for IdentifierCollector {
    fn visit_ident(&mut self, ident: &Ident) {
        if !self.names.iter().any(|name| name == ident.to_str()) {
            self.names.push(ident.to_str().to_string());
        }
    }
}

struct SideEffectFinder {
    found: bool,
}

impl ExprVisitor for SideEffectFinder {
    fn visit_expr(&mut self, expr: &Expr) {
        match expr.kind {
            ExprKind::Call(..)
            | ExprKind::Decorated(..)
            | ExprKind::Assign(..)
            | ExprKind::Update { .. } => self.found = true,
            _ => walk_expr(self, expr),
        }
    }
}

fn write_list(out: &mut String, expressions: &[Expr]) {
    for (index, expression) in expressions.iter().enumerate() {
        if index > 0 {
            out.push_str(", ");
        }
        expression.write_wrapped(out, expression.precedence() <= Precedence::SEQUENCE);
    }
}

fn write_literal(out: &mut String, lit: &Literal) {
    match lit {
        Literal::Number(number) => out.push_str(number),
        Literal::Str(value) => out.push_str(&quote_string(value)),
        Literal::Bool(value) => out.push_str(if *value { "true" } else { "false" }),
        Literal::Null => out.push_str("null"),
        Literal::Undefined => out.push_str("undefined"),
    }
}

/// Double-quoted string literal with the escapes needed to read it back.
pub fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

pub fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(ch) if ch.is_alphabetic() || ch == '_' || ch == '$' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '$')
}

#[cfg(test)]
mod tests {
    use super::*;
    use source::diagnostics::Span;

    fn ident(name: &str) -> Expr {
        expr(ExprKind::Ident(Ident::new(name, Span::initial())), Span::initial())
    }

    fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
        expr(
            ExprKind::Binary(op, Box::new(left), Box::new(right)),
            Span::initial(),
        )
    }

    fn member(object: Expr, property: &str) -> Expr {
        expr(
            ExprKind::Member(Box::new(object), Ident::new(property, Span::initial())),
            Span::initial(),
        )
    }

    #[test]
    fn prints_minimal_parentheses() {
        let left_nested = binary(BinOp::Add, binary(BinOp::Add, ident("a"), ident("b")), ident("c"));
        assert_eq!(left_nested.to_source(), "a + b + c");
        let right_nested = binary(BinOp::Add, ident("a"), binary(BinOp::Add, ident("b"), ident("c")));
        assert_eq!(right_nested.to_source(), "a + (b + c)");
        let mixed = binary(BinOp::Mul, binary(BinOp::Add, ident("a"), ident("b")), ident("c"));
        assert_eq!(mixed.to_source(), "(a + b) * c");
    }

    #[test]
    fn collects_free_identifiers_once() {
        let value = binary(BinOp::Add, member(ident("item"), "title"), ident("item"));
        assert_eq!(value.identifiers(), vec!["item".to_string()]);
        let object = expr(
            ExprKind::Object(vec![Property {
                key: "caption".into(),
                value: ident("text"),
            }]),
            Span::initial(),
        );
        assert_eq!(object.identifiers(), vec!["text".to_string()]);
    }

    #[test]
    fn finds_member_paths() {
        let value = member(member(ident("a"), "b"), "c");
        let path = value.member_path().unwrap();
        assert_eq!(
            path,
            vec![PathPart::Name("a"), PathPart::Name("b"), PathPart::Name("c")]
        );
        let call = expr(ExprKind::Call(Box::new(ident("f")), vec![]), Span::initial());
        assert!(member(call, "x").member_path().is_none());
    }

    #[test]
    fn detects_side_effects() {
        let call = expr(ExprKind::Call(Box::new(ident("f")), vec![]), Span::initial());
        assert!(binary(BinOp::And, ident("a"), call).has_side_effects());
        assert!(!binary(BinOp::And, ident("a"), ident("b")).has_side_effects());
    }

    #[test]
    fn quotes_strings() {
        assert_eq!(quote_string("a\"b\n"), "\"a\\\"b\\n\"");
        assert!(is_identifier_name("$item_1"));
        assert!(!is_identifier_name("1item"));
        assert!(!is_identifier_name("data-qa"));
    }
}
