pub use codespan_reporting::files::{Files as CodespanFiles, SimpleFiles};

#[derive(Debug, PartialEq, Clone, Copy, Hash, Eq)]
pub struct FileId(usize);

impl FileId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Named source texts kept around for rendering diagnostics. Reading and
/// writing files is the caller's business.
pub struct Files {
    files: SimpleFiles<String, String>,
}

impl Default for Files {
    fn default() -> Self {
        Files::new()
    }
}

impl Files {
    pub fn new() -> Self {
        Files {
            files: SimpleFiles::new(),
        }
    }

    pub fn add(&mut self, name: impl Into<String>, text: impl Into<String>) -> FileId {
        FileId(self.files.add(name.into(), text.into()))
    }

    pub fn source(&self, id: FileId) -> Option<&str> {
        self.files.get(id.0).ok().map(|file| file.source().as_str())
    }

    pub fn name(&self, id: FileId) -> Option<&str> {
        self.files.get(id.0).ok().map(|file| file.name().as_str())
    }

    pub(crate) fn inner(&self) -> &SimpleFiles<String, String> {
        &self.files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_named_sources() {
        let mut files = Files::new();
        let id = files.add("a.wml", "<div/>");
        assert_eq!(files.name(id), Some("a.wml"));
        assert_eq!(files.source(id), Some("<div/>"));
    }

    #[test]
    fn ids_follow_insertion_order() {
        let mut files = Files::default();
        let first = files.add("a.wml", "a");
        let second = files.add(String::from("b.tmpl"), String::from("b"));
        assert_eq!((first.index(), second.index()), (0, 1));
        assert_eq!(files.name(second), Some("b.tmpl"));
        assert_eq!(files.source(FileId(5)), None);
    }
}
