use data_structures::HashSet;
use lazy_static::lazy_static;

/// What the tree builder needs to know about a tag name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagDescriptor {
    /// Never has children or a closing tag (`br`, `img`).
    pub is_void: bool,
    /// Content up to the closing tag is taken as one text child
    /// (`script`, `style`).
    pub is_raw_text: bool,
    /// Like raw text, but only outside xml mode (`textarea`, `title`).
    pub is_escapable_raw_text: bool,
    /// A standard HTML element.
    pub is_known: bool,
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];

const HTML_ELEMENTS: &[&str] = &[
    "a", "abbr", "address", "area", "article", "aside", "audio", "b", "base", "bdi", "bdo",
    "blockquote", "body", "br", "button", "canvas", "caption", "cite", "code", "col", "colgroup",
    "data", "datalist", "dd", "del", "details", "dfn", "dialog", "div", "dl", "dt", "em", "embed",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "head", "header", "hr", "html", "i", "iframe", "img", "input", "ins", "kbd", "keygen", "label",
    "legend", "li", "link", "listing", "main", "map", "mark", "menu", "meta", "meter", "nav",
    "noscript", "object", "ol", "optgroup", "option", "output", "p", "param", "picture", "pre",
    "progress", "q", "rp", "rt", "ruby", "s", "samp", "script", "section", "select", "small",
    "source", "span", "strong", "style", "sub", "summary", "sup", "svg", "table", "tbody", "td",
    "template", "textarea", "tfoot", "th", "thead", "time", "title", "tr", "track", "u", "ul",
    "var", "video", "wbr",
];

lazy_static! {
    static ref VOID_SET: HashSet<&'static str> = VOID_ELEMENTS.iter().copied().collect();
    static ref HTML_SET: HashSet<&'static str> = HTML_ELEMENTS.iter().copied().collect();
}

/// Descriptor for standard HTML, matching names case-insensitively.
pub fn html_tag_descriptor(name: &str) -> TagDescriptor {
    let lower = name.to_ascii_lowercase();
    let lower = lower.as_str();
    TagDescriptor {
        is_void: VOID_SET.contains(lower),
        is_raw_text: lower == "script" || lower == "style",
        is_escapable_raw_text: lower == "textarea" || lower == "title",
        is_known: HTML_SET.contains(lower),
    }
}

/// Parser configuration. The error handler is passed next to it.
#[derive(Clone, Copy)]
pub struct ParserOptions {
    /// Xml mode: no void elements and no escapable raw text.
    pub xml: bool,
    pub allow_comments: bool,
    pub allow_cdata: bool,
    /// Duplicate attributes keep the first occurrence instead of failing,
    /// and the patch rewrites run after building.
    pub compatible_tree_structure: bool,
    pub rude_white_space_cleaning: bool,
    pub normalize_line_feed: bool,
    pub clean_white_spaces: bool,
    /// Strip a leading byte order mark.
    pub need_preprocess: bool,
    pub tag_descriptor: fn(&str) -> TagDescriptor,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            xml: false,
            allow_comments: true,
            allow_cdata: true,
            compatible_tree_structure: false,
            rude_white_space_cleaning: false,
            normalize_line_feed: true,
            clean_white_spaces: true,
            need_preprocess: false,
            tag_descriptor: html_tag_descriptor,
        }
    }
}

impl std::fmt::Debug for ParserOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserOptions")
            .field("xml", &self.xml)
            .field("allow_comments", &self.allow_comments)
            .field("allow_cdata", &self.allow_cdata)
            .field("compatible_tree_structure", &self.compatible_tree_structure)
            .field("rude_white_space_cleaning", &self.rude_white_space_cleaning)
            .field("normalize_line_feed", &self.normalize_line_feed)
            .field("clean_white_spaces", &self.clean_white_spaces)
            .field("need_preprocess", &self.need_preprocess)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_html_tags() {
        assert!(html_tag_descriptor("br").is_void);
        assert!(html_tag_descriptor("BR").is_void);
        assert!(html_tag_descriptor("script").is_raw_text);
        assert!(html_tag_descriptor("textarea").is_escapable_raw_text);
        assert!(html_tag_descriptor("DIV").is_known);
        assert_eq!(html_tag_descriptor("Controls.Button"), TagDescriptor::default());
    }
}
