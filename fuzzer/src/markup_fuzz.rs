use quickcheck::{Arbitrary, Gen};

use rand::distributions::{Distribution, Standard};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use fxhash::FxHashSet;

#[derive(Debug)]
struct IdentDistribution;

impl Distribution<char> for IdentDistribution {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> char {
        const VALID_ASCII_IDENT_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
        VALID_ASCII_IDENT_CHARS[rng.gen_range(0..VALID_ASCII_IDENT_CHARS.len())] as char
    }
}

const ELEMENTS: &[&str] = &["div", "span", "p", "ul", "li", "section"];
const COMPONENTS: &[&str] = &["Controls.Button", "Controls.Input"];
const ATTRIBUTES: &[&str] = &["class", "title", "caption", "data-access", "tabindex", "attr:id"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FuzzNodeChoice {
    // Plain words, possibly surrounded by line breaks
    Text,
    // `{{ name }}`
    Mustache,
    Comment,
    // An element with children
    Element,
    // `<span ... />`
    SelfClosing,
    // A control with options and content
    Component,
    // `<ws:if data="...">`
    If,
    // `<ws:for data="item in items">`
    For,
}

/// Allow randomly generating a `FuzzNodeChoice` across a standard distribution
impl Distribution<FuzzNodeChoice> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> FuzzNodeChoice {
        match rng.gen_range(0..8) {
            0 => FuzzNodeChoice::Text,
            1 => FuzzNodeChoice::Mustache,
            2 => FuzzNodeChoice::Comment,
            3 => FuzzNodeChoice::Element,
            4 => FuzzNodeChoice::SelfClosing,
            5 => FuzzNodeChoice::Component,
            6 => FuzzNodeChoice::If,
            7 => FuzzNodeChoice::For,
            _ => unreachable!(),
        }
    }
}

#[derive(Default, Clone, Debug)]
pub struct MarkupFuzzerRestrictions {
    node_restrictions: Option<Vec<FuzzNodeChoice>>,
}

impl MarkupFuzzerRestrictions {
    pub fn nodes(&self) -> &Option<Vec<FuzzNodeChoice>> {
        &self.node_restrictions
    }

    pub fn set_node_restrictions(&mut self, restrictions: Vec<FuzzNodeChoice>) {
        self.node_restrictions = Some(restrictions);
    }
}

/// Generates random well-formed template markup. The text is written the
/// way `syntax::visitor::to_markup` prints a tree, so parsing it and
/// printing it again gives the same text.
#[derive(Clone, Debug)]
pub struct MarkupFuzzer {
    /// The markup that has already been generated
    /// for this instance.
    code: String,
    restrictions: MarkupFuzzerRestrictions,
    /// How many tags are currently open
    depth: usize,
    max_depth: usize,
    rng: StdRng,
}

/// This lets us use quickcheck for tests that rely on
/// parsing markup samples. The seed comes from quickcheck so a failing
/// case can be replayed.
impl Arbitrary for MarkupFuzzer {
    fn arbitrary(gen: &mut Gen) -> Self {
        let mut fuzz = MarkupFuzzer::new(u64::arbitrary(gen));
        let count = 1 + usize::arbitrary(gen) % 6;
        fuzz.gen_nodes(count);
        fuzz
    }
}

impl MarkupFuzzer {
    pub fn new(seed: u64) -> Self {
        MarkupFuzzer {
            code: String::new(),
            restrictions: MarkupFuzzerRestrictions::default(),
            depth: 0,
            max_depth: 3,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Get the markup that has been generated
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Restrict the fuzzer to some subset of node choices
    pub fn restrict_nodes(&mut self, restrictions: Vec<FuzzNodeChoice>) {
        self.restrictions.set_node_restrictions(restrictions);
    }

    /// Generate `count` sibling nodes at the current depth
    pub fn gen_nodes(&mut self, count: usize) {
        for _ in 0..count {
            self.gen_node();
        }
    }

    /// Randomly choose the kind of node to generate, respecting any
    /// restrictions. Past the depth limit only leaves are generated.
    fn choose_node_kind(&mut self) -> FuzzNodeChoice {
        use FuzzNodeChoice::{Comment, Mustache, SelfClosing, Text};
        let kind = match self.restrictions.nodes() {
            Some(restrictions) => restrictions
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(Text),
            None => self.rng.gen(),
        };
        if self.depth < self.max_depth {
            return kind;
        }
        match kind {
            Text | Mustache | Comment | SelfClosing => kind,
            _ => Text,
        }
    }

    fn commit(&mut self, code: &str) {
        self.code.push_str(code);
    }

    /// Generate a random identifier. The prefix keeps it clear of keywords.
    fn gen_ident(&mut self) -> String {
        let length = self.rng.gen_range(1..5);
        let name: String = (&mut self.rng).sample_iter(&IdentDistribution).take(length).collect();
        format!("v_{}", name)
    }

    fn gen_words(&mut self) -> String {
        let count = self.rng.gen_range(1..4);
        let words: Vec<String> = (0..count).map(|_| self.gen_ident()).collect();
        words.join(" ")
    }

    fn gen_attributes(&mut self) -> String {
        let mut used = FxHashSet::default();
        let mut out = String::new();
        for _ in 0..self.rng.gen_range(0..3) {
            let name = ATTRIBUTES.choose(&mut self.rng).copied().unwrap_or("class");
            if !used.insert(name) {
                continue;
            }
            let value = if self.rng.gen() {
                self.gen_words()
            } else {
                format!("{{{{ {} }}}}", self.gen_ident())
            };
            out.push_str(&format!(" {}=\"{}\"", name, value));
        }
        out
    }

    fn gen_children(&mut self) {
        self.depth += 1;
        let count = self.rng.gen_range(0..4);
        self.gen_nodes(count);
        self.depth -= 1;
    }

    /// Generate a single node
    fn gen_node(&mut self) {
        use FuzzNodeChoice::{Comment, Component, Element, For, If, Mustache, SelfClosing, Text};
        match self.choose_node_kind() {
            Text => {
                let mut text = self.gen_words();
                if self.rng.gen() {
                    text = format!("\n  {}\n", text);
                }
                self.commit(&text);
            }
            Mustache => {
                let name = self.gen_ident();
                self.commit(&format!("{{{{ {} }}}}", name));
            }
            Comment => {
                let words = self.gen_words();
                self.commit(&format!("<!-- {} -->", words));
            }
            Element => {
                let name = ELEMENTS.choose(&mut self.rng).copied().unwrap_or("div");
                let attributes = self.gen_attributes();
                self.commit(&format!("<{}{}>", name, attributes));
                self.gen_children();
                self.commit(&format!("</{}>", name));
            }
            SelfClosing => {
                let name = ELEMENTS.choose(&mut self.rng).copied().unwrap_or("span");
                let attributes = self.gen_attributes();
                self.commit(&format!("<{}{} />", name, attributes));
            }
            Component => {
                let name = COMPONENTS.choose(&mut self.rng).copied().unwrap_or("Controls.Button");
                let attributes = self.gen_attributes();
                if self.rng.gen() {
                    self.commit(&format!("<{}{} />", name, attributes));
                } else {
                    self.commit(&format!("<{}{}>", name, attributes));
                    self.gen_children();
                    self.commit(&format!("</{}>", name));
                }
            }
            If => {
                let test = self.gen_ident();
                self.commit(&format!("<ws:if data=\"{{{{ {} }}}}\">", test));
                self.gen_children();
                self.commit("</ws:if>");
            }
            For => {
                let item = self.gen_ident();
                let items = self.gen_ident();
                self.commit(&format!("<ws:for data=\"{} in {}\">", item, items));
                self.gen_children();
                self.commit("</ws:for>");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_markup() {
        let mut first = MarkupFuzzer::new(7);
        first.gen_nodes(5);
        let mut second = MarkupFuzzer::new(7);
        second.gen_nodes(5);
        assert_eq!(first.code(), second.code());
    }

    #[test]
    fn restrictions_are_respected() {
        let mut fuzz = MarkupFuzzer::new(1);
        fuzz.restrict_nodes(vec![FuzzNodeChoice::Comment]);
        fuzz.gen_nodes(3);
        assert!(fuzz.code().starts_with("<!-- "));
        assert_eq!(fuzz.code().matches("<!--").count(), 3);
    }
}
