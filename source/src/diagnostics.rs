use crate::files::{FileId, Files};
use crate::pos::Position;
pub use codespan::{ByteIndex, Span};
use codespan_reporting::diagnostic::{
    Diagnostic as CodespanDiagnostic, Label as CodespanLabel, LabelStyle, Severity,
};
pub use codespan_reporting::term::*;
use std::fmt;
use std::ops::Range;

// These diagnostic interfaces implement the same API as the codespan_reporting crate, except
// Label, which does not require a FileId when instantiated.

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub message: String,
    pub labels: Vec<Label>,
    pub position: Option<Position>,
    pub file_name: Option<String>,
    severity: Severity,
}

impl Diagnostic {
    pub fn emit_to_terminal(self, files: &Files, file: FileId) {
        use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
        let writer = StandardStream::stderr(ColorChoice::Auto);
        let config = Config::default();
        let message = self.to_string();
        // Convert to a codespan-reporting diagnostic
        let diagnostic = CodespanDiagnostic::new(self.severity)
            .with_message(message)
            .with_labels(
                self.labels
                    .into_iter()
                    .map(|label| {
                        CodespanLabel::new(label.style, file.index(), label.range)
                            .with_message(label.message)
                    })
                    .collect(),
            );
        let mut lock = writer.lock();
        if let Err(error) = emit(&mut lock, &config, files.inner(), &diagnostic) {
            eprintln!("failed to render diagnostic: {}", error);
        }
    }

    pub fn error() -> Diagnostic {
        Diagnostic::new(Severity::Error)
    }

    pub fn warning() -> Diagnostic {
        Diagnostic::new(Severity::Warning)
    }

    fn new(severity: Severity) -> Diagnostic {
        Diagnostic {
            message: String::new(),
            labels: vec![],
            position: None,
            file_name: None,
            severity,
        }
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_labels(mut self, labels: impl Into<Vec<Label>>) -> Self {
        self.labels = labels.into();
        self
    }

    /// Attach the line/column the diagnostic points at. Keeps the first
    /// position when called more than once.
    pub fn at(mut self, position: Position) -> Self {
        if self.position.is_none() {
            self.position = Some(position);
        }
        self
    }

    /// Attach the file the diagnostic belongs to. Keeps the first name when
    /// called more than once, so inner stages win over outer ones.
    pub fn in_file(mut self, file_name: impl Into<String>) -> Self {
        if self.file_name.is_none() {
            self.file_name = Some(file_name.into());
        }
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file_name) = &self.file_name {
            write!(f, "{}:", file_name)?;
        }
        if let Some(position) = &self.position {
            write!(f, "{}:", position)?;
        }
        if self.file_name.is_some() || self.position.is_some() {
            write!(f, " ")?;
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

#[derive(Clone, Debug)]
pub struct Label {
    pub style: LabelStyle,
    pub range: Range<usize>,
    pub message: String,
}

impl Label {
    pub fn primary(range: impl Into<Range<usize>>) -> Label {
        Label {
            style: LabelStyle::Primary,
            range: range.into(),
            message: String::new(),
        }
    }

    pub fn secondary(range: impl Into<Range<usize>>) -> Label {
        Label {
            style: LabelStyle::Secondary,
            range: range.into(),
            message: String::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_file_and_position() {
        let diagnostic = Diagnostic::error()
            .with_message("Unexpected closing tag")
            .at(Position::new(3, 7, 20))
            .in_file("Controls/list.wml")
            .in_file("ignored.wml");
        assert_eq!(
            diagnostic.to_string(),
            "Controls/list.wml:3:7: Unexpected closing tag"
        );
    }

    #[test]
    fn display_without_location_is_just_the_message() {
        let diagnostic = Diagnostic::warning().with_message("Lost attribute");
        assert_eq!(diagnostic.to_string(), "Lost attribute");
        assert_eq!(diagnostic.severity(), Severity::Warning);
    }

    #[test]
    fn emits_labelled_diagnostics() {
        let mut files = Files::new();
        let file = files.add("a.wml", "<div>\n</span>");
        Diagnostic::error()
            .with_message("Unexpected closing tag")
            .with_labels(vec![Label::primary(6..13).with_message("expected </div>")])
            .emit_to_terminal(&files, file);
    }
}
