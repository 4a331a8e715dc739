//! Which expression shapes each binding site accepts.

use diagnostics::ParseResult as Result;
use source::diagnostics::{Diagnostic, Label};
use syntax::ast::{Expr, ExprKind, PathPart};
use syntax::visitor::{walk_expr, ExprVisitor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    /// `bind:value="..."`: a writable property path.
    Bind,
    /// `on:click="..."`: a handler reference or a handler call.
    Event,
    /// `ws:for` headers.
    Loop,
    /// Everything else: attribute and option values, text, tests.
    Value,
}

fn invalid(message: String, expr: &Expr) -> Diagnostic {
    Diagnostic::error()
        .with_message(message)
        .with_labels(vec![Label::primary(expr.span)])
}

fn is_static_path(expr: &Expr) -> bool {
    match expr.member_path() {
        Some(path) => path.iter().all(|part| matches!(part, PathPart::Name(_))),
        None => false,
    }
}

struct ForbiddenFinder<'a> {
    found: Option<&'a str>,
}

impl ExprVisitor for ForbiddenFinder<'_> {
    fn visit_expr(&mut self, expr: &Expr) {
        if self.found.is_some() {
            return;
        }
        match expr.kind {
            ExprKind::Assign(..) => self.found = Some("assignments"),
            ExprKind::Update { .. } => self.found = Some("increments and decrements"),
            ExprKind::Sequence(..) => self.found = Some("sequences"),
            _ => walk_expr(self, expr),
        }
    }
}

pub fn validate(expr: &Expr, site: Site) -> Result<()> {
    match site {
        Site::Bind => {
            if is_static_path(expr) {
                Ok(())
            } else {
                Err(invalid(
                    format!(
                        "Bind expression \"{}\" must be a property path",
                        expr.to_source()
                    ),
                    expr,
                ))
            }
        }
        Site::Event => {
            let callee = match &expr.kind {
                ExprKind::Call(callee, _) => callee,
                _ => expr,
            };
            if callee.member_path().is_some() {
                Ok(())
            } else {
                Err(invalid(
                    format!(
                        "Event handler \"{}\" must be a function name or a call of one",
                        expr.to_source()
                    ),
                    expr,
                ))
            }
        }
        Site::Loop => Ok(()),
        Site::Value => {
            let mut finder = ForbiddenFinder { found: None };
            finder.visit_expr(expr);
            match finder.found {
                Some(what) => Err(invalid(
                    format!("Expression \"{}\" must not contain {}", expr.to_source(), what),
                    expr,
                )),
                None => Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;

    fn check(source: &str, site: Site) -> bool {
        validate(&parse_expression(source).unwrap(), site).is_ok()
    }

    #[test]
    fn bind_accepts_static_paths_only() {
        assert!(check("value", Site::Bind));
        assert!(check("record.items['title']", Site::Bind));
        assert!(!check("record[key]", Site::Bind));
        assert!(!check("a + b", Site::Bind));
        assert!(!check("getValue()", Site::Bind));
    }

    #[test]
    fn event_accepts_handlers_and_calls() {
        assert!(check("onClick", Site::Event));
        assert!(check("_handlers.open(item, 1)", Site::Event));
        assert!(!check("a ? b : c", Site::Event));
        assert!(!check("'handler'", Site::Event));
    }

    #[test]
    fn values_reject_writes() {
        assert!(check("a ? f(b) : c | trim", Site::Value));
        assert!(!check("a = 1", Site::Value));
        assert!(!check("f(i++)", Site::Value));
        assert!(!check("a, b", Site::Value));
        assert!(check("i = 0", Site::Loop));
    }
}
