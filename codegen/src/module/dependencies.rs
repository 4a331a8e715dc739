use data_structures::OrderedMap;
use diagnostics::{Diagnostic, ParseResult as Result};
use log::debug;

/// The dependency table of one module: named dependencies bound to a
/// parameter of the module function, then nameless ones loaded only for
/// their side effects.
#[derive(Debug, Default, Clone)]
pub struct Dependencies {
    named: OrderedMap<String>,
    nameless: Vec<String>,
}

impl Dependencies {
    pub fn new() -> Self {
        Dependencies::default()
    }

    /// Adding the same pair twice does nothing. Binding a name that is
    /// already bound to another path is an error.
    pub fn add(&mut self, path: &str, name: Option<&str>) -> Result<()> {
        match name {
            Some(name) => {
                if let Some(existing) = self.named.get(name) {
                    if existing == path {
                        return Ok(());
                    }
                    return Err(Diagnostic::error().with_message(format!(
                        "Ambiguous dependencies: name '{}' is bound to both '{}' and '{}'",
                        name, existing, path
                    )));
                }
                debug!("dependency {} as {}", path, name);
                self.named.insert(name, path.to_string());
            }
            None => {
                if !self.nameless.iter().any(|existing| existing == path) {
                    debug!("dependency {}", path);
                    self.nameless.push(path.to_string());
                }
            }
        }
        Ok(())
    }

    /// Paths in load order: named first, so they line up with the
    /// parameters.
    pub fn paths(&self) -> Vec<String> {
        self.named
            .values()
            .cloned()
            .chain(self.nameless.iter().cloned())
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.named.keys().map(str::to_string).collect()
    }

    pub fn named(&self) -> impl Iterator<Item = (&str, &String)> {
        self.named.iter()
    }

    pub fn nameless(&self) -> &[String] {
        &self.nameless
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.nameless.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_names_are_rejected() {
        let mut dependencies = Dependencies::new();
        dependencies.add("Lib/A", Some("A")).unwrap();
        let error = dependencies.add("Lib/B", Some("A")).unwrap_err();
        assert_eq!(
            error.message,
            "Ambiguous dependencies: name 'A' is bound to both 'Lib/A' and 'Lib/B'"
        );
    }

    #[test]
    fn duplicates_collapse() {
        let mut dependencies = Dependencies::new();
        dependencies.add("Lib/A", Some("A")).unwrap();
        dependencies.add("Lib/A", Some("A")).unwrap();
        dependencies.add("Dep/Y", None).unwrap();
        dependencies.add("Dep/X", None).unwrap();
        dependencies.add("Dep/Y", None).unwrap();
        assert_eq!(dependencies.names(), vec!["A"]);
        assert_eq!(dependencies.nameless(), &["Dep/Y".to_string(), "Dep/X".to_string()]);
        assert_eq!(dependencies.paths(), vec!["Lib/A", "Dep/Y", "Dep/X"]);
    }

    #[quickcheck]
    fn nameless_keeps_first_appearance(paths: Vec<u8>) -> bool {
        let mut dependencies = Dependencies::new();
        let mut expected: Vec<String> = vec![];
        for path in paths {
            let path = format!("Dep/{}", path % 8);
            if !expected.contains(&path) {
                expected.push(path.clone());
            }
            if dependencies.add(&path, None).is_err() {
                return false;
            }
        }
        dependencies.nameless() == expected.as_slice()
    }
}
