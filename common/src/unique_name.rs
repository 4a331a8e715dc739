use data_structures::{HashMap, HashSet};

use std::fmt;

/// Function-name registry for one compilation.
///
/// Generated functions take a name derived from what they compile (the
/// template file, a content option, an inline template). Names that collide
/// within the same compilation get `_1`, `_2`, ... appended. A registry is
/// created per compilation and handed down explicitly, so batches compiled
/// side by side never see each other's names.
///
/// JavaScript keywords and the globals a function body cannot rebind are
/// never issued; a clash is resolved the same way as any other collision.
pub struct FunctionNames {
    counters: HashMap<String, u32>,
    taken: HashSet<String>,
    issued: Vec<String>,
}

const RESERVED_WORDS: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "enum", "eval", "export", "extends", "false", "finally", "for", "function", "if", "implements",
    "import", "in", "instanceof", "interface", "let", "new", "null", "package", "private", "protected", "public",
    "return", "static", "super", "switch", "this", "throw", "true", "try", "typeof", "undefined", "var", "void",
    "while", "with", "yield", "Infinity", "NaN",
];

impl Default for FunctionNames {
    fn default() -> Self {
        FunctionNames::new()
    }
}

impl FunctionNames {
    pub fn new() -> Self {
        FunctionNames {
            counters: HashMap::default(),
            taken: RESERVED_WORDS.iter().map(|word| (*word).to_string()).collect(),
            issued: vec![],
        }
    }

    /// Keep `name` out of the registry. Used for identifiers the generated
    /// module binds itself (dependency parameters, runtime arguments).
    pub fn reserve(&mut self, name: &str) {
        self.taken.insert(name.to_string());
    }

    /// Register a name derived from `raw`, returning the unique identifier
    /// to use in generated code.
    pub fn register(&mut self, raw: &str) -> String {
        let base = sanitize(raw);
        let mut name = base.clone();
        while self.taken.contains(&name) {
            let counter = self.counters.entry(base.clone()).or_insert(0);
            *counter += 1;
            name = format!("{}_{}", base, counter);
        }
        self.taken.insert(name.clone());
        self.issued.push(name.clone());
        name
    }

    pub fn issued(&self) -> &[String] {
        &self.issued
    }
}

impl fmt::Debug for FunctionNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.issued.iter()).finish()
    }
}

/// Turn an arbitrary string (a module path, an option name) into a valid
/// JavaScript identifier.
pub fn sanitize(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' { ch } else { '_' })
        .collect();
    if name.is_empty() || name.starts_with(|ch: char| ch.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}
