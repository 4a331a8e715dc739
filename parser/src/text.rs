//! Splitting text and attribute values into literal runs, `{{ expression }}`
//! mustaches and `{[ context @@ text ]}` translations.

use crate::parser::parse_expression;

use diagnostics::ParseResult as Result;
use source::diagnostics::Diagnostic;
use syntax::ast::Expr;

#[derive(Debug, Clone, PartialEq)]
pub enum TextChunk {
    Text(String),
    Expression(Expr),
    Translation {
        text: String,
        context: Option<String>,
    },
}

pub fn has_mustache(value: &str) -> bool {
    value.contains("{{") || value.contains("{[")
}

fn unterminated(open: &str, close: &str) -> Diagnostic {
    Diagnostic::error().with_message(format!(
        "Unterminated '{}': expected '{}' to close it",
        open, close
    ))
}

fn translation(body: &str) -> TextChunk {
    match body.find("@@") {
        Some(separator) => TextChunk::Translation {
            context: Some(body[..separator].trim().to_string()),
            text: body[separator + 2..].trim().to_string(),
        },
        None => TextChunk::Translation {
            context: None,
            text: body.trim().to_string(),
        },
    }
}

/// Split a value into chunks. Adjacent literal text ends up in one chunk.
pub fn parse_text(value: &str) -> Result<Vec<TextChunk>> {
    let mut chunks = vec![];
    let mut literal = String::new();
    let mut rest = value;
    loop {
        let mustache = rest.find("{{");
        let translation_start = rest.find("{[");
        let (start, is_translation) = match (mustache, translation_start) {
            (Some(a), Some(b)) if b < a => (b, true),
            (Some(a), _) => (a, false),
            (None, Some(b)) => (b, true),
            (None, None) => break,
        };
        literal.push_str(&rest[..start]);
        let (close, open) = if is_translation { ("]}", "{[") } else { ("}}", "{{") };
        let body_start = start + 2;
        let end = rest[body_start..]
            .find(close)
            .map(|end| body_start + end)
            .ok_or_else(|| unterminated(open, close))?;
        let body = &rest[body_start..end];
        if !literal.is_empty() {
            chunks.push(TextChunk::Text(std::mem::take(&mut literal)));
        }
        if is_translation {
            chunks.push(translation(body));
        } else {
            if body.trim().is_empty() {
                return Err(Diagnostic::error().with_message("Empty expression in '{{ }}'"));
            }
            chunks.push(TextChunk::Expression(parse_expression(body)?));
        }
        rest = &rest[end + 2..];
    }
    literal.push_str(rest);
    if !literal.is_empty() {
        chunks.push(TextChunk::Text(literal));
    }
    Ok(chunks)
}

/// The expression of a value that is exactly one mustache, like
/// `"{{ items }}"`. Such values bind the raw value instead of a string.
pub fn single_expression(chunks: &[TextChunk]) -> Option<&Expr> {
    match chunks {
        [TextChunk::Expression(expr)] => Some(expr),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn describe(value: &str) -> Vec<String> {
        parse_text(value)
            .unwrap()
            .into_iter()
            .map(|chunk| match chunk {
                TextChunk::Text(text) => format!("text({})", text),
                TextChunk::Expression(expr) => format!("expr({})", expr.to_source()),
                TextChunk::Translation { text, context } => {
                    format!("rk({}, {:?})", text, context)
                }
            })
            .collect()
    }

    #[test]
    fn splits_mustaches() {
        assert_eq!(
            describe("Hello, {{ user.name }}!"),
            vec!["text(Hello, )", "expr(user.name)", "text(!)"]
        );
        assert_eq!(describe("plain"), vec!["text(plain)"]);
        assert!(describe("").is_empty());
    }

    #[test]
    fn splits_translations() {
        assert_eq!(
            describe("{[ Save ]} {[ menu @@ Open ]}"),
            vec![
                "rk(Save, None)",
                "text( )",
                "rk(Open, Some(\"menu\"))"
            ]
        );
    }

    #[test]
    fn single_mustache_values() {
        let chunks = parse_text("{{ items }}").unwrap();
        assert!(single_expression(&chunks).is_some());
        let chunks = parse_text(" {{ items }}").unwrap();
        assert!(single_expression(&chunks).is_none());
    }

    #[test]
    fn reports_broken_mustaches() {
        assert!(parse_text("{{ a").unwrap_err().message.contains("Unterminated '{{'"));
        assert!(parse_text("{{ }}").is_err());
        assert!(parse_text("{{ a b }}").is_err());
    }
}
