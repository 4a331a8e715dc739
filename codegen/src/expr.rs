//! Expressions to JavaScript. Every read and write of template data goes
//! through the runtime helpers, so a missing intermediate object yields
//! `undefined` instead of throwing.

use syntax::ast::{quote_string, AssignOp, Expr, ExprKind, Literal, PathPart, UpdateOp};

pub const HELPERS: &str = "thelpers";

pub struct ExpressionGenerator<'a> {
    scope: &'a str,
}

impl<'a> ExpressionGenerator<'a> {
    /// `scope` is the name of the variable holding the template data.
    pub fn new(scope: &'a str) -> Self {
        ExpressionGenerator { scope }
    }

    pub fn generate(&self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Lit(literal) => literal_code(literal),
            ExprKind::Ident(_) | ExprKind::Member(..) | ExprKind::Index(..) => {
                let (object, path) = self.target(expr);
                format!("{}.getter({}, [{}])", HELPERS, object, path.join(", "))
            }
            ExprKind::Call(callee, arguments) => {
                let arguments = self.list(arguments);
                match &callee.kind {
                    ExprKind::Member(..) | ExprKind::Index(..) => {
                        let (object, mut path) = self.target(callee);
                        let method = path.pop().unwrap_or_default();
                        let receiver = if path.is_empty() {
                            object
                        } else {
                            format!("{}.getter({}, [{}])", HELPERS, object, path.join(", "))
                        };
                        format!("{}.callMethod({}, {}, [{}])", HELPERS, receiver, method, arguments)
                    }
                    _ => format!("{}.callFunction({}, [{}])", HELPERS, self.generate(callee), arguments),
                }
            }
            ExprKind::Unary(op, argument) => format!("({}{})", op.as_str(), self.generate(argument)),
            ExprKind::Binary(op, left, right) => {
                format!("({} {} {})", self.generate(left), op.as_str(), self.generate(right))
            }
            ExprKind::Conditional(test, consequent, alternate) => format!(
                "({} ? {} : {})",
                self.generate(test),
                self.generate(consequent),
                self.generate(alternate)
            ),
            ExprKind::Assign(op, target, value) => {
                let value = self.generate(value);
                let value = match op {
                    AssignOp::Equals => value,
                    AssignOp::PlusEquals => format!("({} + {})", self.generate(target), value),
                    AssignOp::MinusEquals => format!("({} - {})", self.generate(target), value),
                };
                self.setter(target, &value)
            }
            ExprKind::Update { op, prefix, argument } => {
                let (step, undo) = match op {
                    UpdateOp::Increment => ("+", "-"),
                    UpdateOp::Decrement => ("-", "+"),
                };
                let update = self.setter(argument, &format!("({} {} 1)", self.generate(argument), step));
                if *prefix {
                    update
                } else {
                    format!("({} {} 1)", update, undo)
                }
            }
            ExprKind::Array(items) => format!("[{}]", self.list(items)),
            ExprKind::Object(properties) => {
                let properties: Vec<String> = properties
                    .iter()
                    .map(|property| format!("{}: {}", quote_string(&property.key), self.generate(&property.value)))
                    .collect();
                format!("{{{}}}", properties.join(", "))
            }
            ExprKind::Sequence(expressions) => format!("({})", self.list(expressions)),
            ExprKind::Decorated(value, decorators) => {
                decorators.iter().fold(self.generate(value), |value, decorator| {
                    let mut arguments = vec![value];
                    arguments.extend(decorator.arguments.iter().map(|argument| self.generate(argument)));
                    format!(
                        "{}.decorate({}, [{}])",
                        HELPERS,
                        quote_string(decorator.name.to_str()),
                        arguments.join(", ")
                    )
                })
            }
        }
    }

    /// Code that stores `value` at the location `target` reads from.
    pub fn setter(&self, target: &Expr, value: &str) -> String {
        let (object, path) = self.target(target);
        format!("{}.setter({}, [{}], {})", HELPERS, object, path.join(", "), value)
    }

    /// The object a member chain starts from and the keys leading from it.
    /// Chains rooted in an identifier start from the scope; anything else
    /// (a call result, a literal) is evaluated first.
    fn target(&self, expr: &Expr) -> (String, Vec<String>) {
        if let Some(path) = expr.member_path() {
            let keys = path
                .iter()
                .map(|part| match part {
                    PathPart::Name(name) => quote_string(name),
                    PathPart::Computed(key) => self.generate(key),
                })
                .collect();
            return (self.scope.to_string(), keys);
        }
        match &expr.kind {
            ExprKind::Member(object, property) => {
                (self.generate(object), vec![quote_string(property.to_str())])
            }
            ExprKind::Index(object, key) => (self.generate(object), vec![self.generate(key)]),
            _ => (self.generate(expr), vec![]),
        }
    }

    fn list(&self, expressions: &[Expr]) -> String {
        let items: Vec<String> = expressions.iter().map(|expr| self.generate(expr)).collect();
        items.join(", ")
    }
}

fn literal_code(literal: &Literal) -> String {
    match literal {
        Literal::Number(number) => number.clone(),
        Literal::Str(value) => quote_string(value),
        Literal::Bool(value) => value.to_string(),
        Literal::Null => "null".to_string(),
        Literal::Undefined => "undefined".to_string(),
    }
}

/// A translated string: `rk("text")` or `rk("text", "context")`.
pub fn translation(text: &str, context: Option<&str>) -> String {
    match context {
        Some(context) => format!("rk({}, {})", quote_string(text), quote_string(context)),
        None => format!("rk({})", quote_string(text)),
    }
}
