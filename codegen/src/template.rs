//! Code templates with `/*#NAME#*/` slots.
//!
//! A template is parsed once into literal text and named slots, with line
//! breaks removed. Rendering asks a callback for the value of each slot and
//! copies the value as it is: values are never scanned for markers, so a
//! payload that itself contains `/*#X#*/` or `$1` comes out untouched.

use log::debug;

const OPEN: &str = "/*#";
const CLOSE: &str = "#*/";

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Slot(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    segments: Vec<Segment>,
}

fn is_slot_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_')
}

impl Template {
    pub fn parse(text: &str) -> Template {
        let text: String = text.chars().filter(|ch| *ch != '\n' && *ch != '\r').collect();
        let mut segments = vec![];
        let mut literal = String::new();
        let mut rest = text.as_str();
        while let Some(start) = rest.find(OPEN) {
            let after = &rest[start + OPEN.len()..];
            match after.find(CLOSE) {
                Some(end) if is_slot_name(&after[..end]) => {
                    literal.push_str(&rest[..start]);
                    if !literal.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot(after[..end].to_string()));
                    rest = &after[end + CLOSE.len()..];
                }
                _ => {
                    literal.push_str(&rest[..start + OPEN.len()]);
                    rest = after;
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Text(literal));
        }
        Template { segments }
    }

    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Slot(name) => Some(name.as_str()),
            Segment::Text(_) => None,
        })
    }

    pub fn render<F: FnMut(&str) -> String>(&self, mut value: F) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Slot(name) => out.push_str(&value(name)),
            }
        }
        out
    }

    /// Renders with a fixed table of values. Slots missing from the table
    /// render empty.
    pub fn fill(&self, values: &[(&str, &str)]) -> String {
        self.render(|slot| {
            match values.iter().find(|(name, _)| *name == slot) {
                Some((_, value)) => (*value).to_string(),
                None => {
                    debug!("template slot {} has no value", slot);
                    String::new()
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn parses_slots_and_strips_line_breaks() {
        let template = Template::parse("function /*#NAME#*/() {\n  return /*#BODY#*/;\n}");
        assert_eq!(template.slots().collect::<Vec<_>>(), vec!["NAME", "BODY"]);
        assert_snapshot!(template.fill(&[("NAME", "f"), ("BODY", "1")]), @"function f() {  return 1;}");
    }

    #[test]
    fn values_are_copied_verbatim() {
        let template = Template::parse("a(/*#X#*/)");
        let rendered = template.render(|_| "/*#X#*/ $1 $& $$".to_string());
        assert_eq!(rendered, "a(/*#X#*/ $1 $& $$)");
    }

    #[test]
    fn malformed_markers_are_text() {
        let template = Template::parse("/*# not a slot #*/ /*#OPEN");
        assert_eq!(template.slots().count(), 0);
        assert_eq!(template.fill(&[]), "/*# not a slot #*/ /*#OPEN");
    }

    #[test]
    fn missing_values_render_empty() {
        assert_eq!(Template::parse("[/*#A#*/]").fill(&[]), "[]");
    }
}
