//! Canonical characters of the markup source layer.

pub const NULL: char = '\u{0000}';
pub const TAB: char = '\t';
pub const LINE_FEED: char = '\n';
pub const FORM_FEED: char = '\u{000C}';
pub const CARRIAGE_RETURN: char = '\r';
pub const SPACE: char = ' ';
pub const BOM: char = '\u{FEFF}';

pub const LESS_THAN: char = '<';
pub const GREATER_THAN: char = '>';
pub const SLASH: char = '/';
pub const EQUALS: char = '=';
pub const QUOTATION_MARK: char = '"';
pub const APOSTROPHE: char = '\'';
pub const EXCLAMATION_MARK: char = '!';
pub const QUESTION_MARK: char = '?';

/// Whitespace as the markup grammar sees it. Unicode spaces are text.
pub fn is_whitespace(ch: char) -> bool {
    matches!(ch, TAB | LINE_FEED | FORM_FEED | CARRIAGE_RETURN | SPACE)
}

pub fn is_ascii_upper(ch: char) -> bool {
    ch.is_ascii_uppercase()
}

/// Characters that may start a tag name right after `<` or `</`.
pub fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

/// Characters allowed inside tag and attribute names. Template names use
/// namespaces (`ws:if`, `attr:class`) and dotted paths (`Controls.Button`),
/// so this is deliberately wider than HTML.
pub fn is_name_char(ch: char) -> bool {
    !is_whitespace(ch)
        && !matches!(
            ch,
            NULL | QUOTATION_MARK | APOSTROPHE | LESS_THAN | GREATER_THAN | SLASH | EQUALS
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_names_are_name_chars() {
        for name in &["ws:if", "attr:class", "Controls.buttons:Button", "data-access", "on:click"] {
            assert!(name.chars().all(is_name_char), "{}", name);
        }
        assert!(!is_name_char('='));
        assert!(!is_name_char(' '));
        assert!(is_name_start('d'));
        assert!(!is_name_start('1'));
    }
}
