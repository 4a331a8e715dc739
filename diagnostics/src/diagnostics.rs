use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use source::diagnostics::Diagnostic;
use source::Position;

use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
    Error,
    Critical,
}

/// Where a reported anomaly comes from.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Meta {
    pub file_name: Option<String>,
    pub position: Option<Position>,
}

impl Meta {
    pub fn new(file_name: Option<&str>, position: Option<Position>) -> Self {
        Meta {
            file_name: file_name.map(String::from),
            position,
        }
    }
}

/// The diagnostics collaborator. The pipeline reports recoverable anomalies
/// (lost attributes, deprecated constructs, broken expressions that fall
/// back to plain values) here and keeps going.
pub trait ErrorHandler {
    fn info(&mut self, message: &str, meta: Meta);
    fn warn(&mut self, message: &str, meta: Meta);
    fn error(&mut self, message: &str, meta: Meta);
    fn critical(&mut self, message: &str, meta: Meta);
    fn has_errors(&self) -> bool;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub level: Level,
    pub text: String,
    #[serde(flatten)]
    pub meta: Meta,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file_name) = &self.meta.file_name {
            write!(f, "{}:", file_name)?;
        }
        if let Some(position) = &self.meta.position {
            write!(f, "{}:", position)?;
        }
        write!(f, " {:?}: {}", self.level, self.text)
    }
}

/// Collects every reported message in order and mirrors it to the log.
#[derive(Default, Debug, Clone)]
pub struct DiagnosticSet {
    pub messages: Vec<Message>,
}

impl DiagnosticSet {
    pub fn new() -> Self {
        DiagnosticSet::default()
    }

    pub fn add(&mut self, level: Level, message: &str, meta: Meta) {
        let message = Message {
            level,
            text: message.to_string(),
            meta,
        };
        match level {
            Level::Info => debug!("{}", message),
            Level::Warn => warn!("{}", message),
            Level::Error | Level::Critical => error!("{}", message),
        }
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|message| message.level == Level::Warn)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.messages)
    }

    /// Convert collected errors into diagnostics for terminal rendering.
    pub fn to_diagnostics(&self) -> Vec<Diagnostic> {
        self.messages
            .iter()
            .map(|message| {
                let mut diagnostic = match message.level {
                    Level::Error | Level::Critical => Diagnostic::error(),
                    Level::Info | Level::Warn => Diagnostic::warning(),
                }
                .with_message(message.text.clone());
                if let Some(position) = message.meta.position {
                    diagnostic = diagnostic.at(position);
                }
                if let Some(file_name) = &message.meta.file_name {
                    diagnostic = diagnostic.in_file(file_name.clone());
                }
                diagnostic
            })
            .collect()
    }
}

impl ErrorHandler for DiagnosticSet {
    fn info(&mut self, message: &str, meta: Meta) {
        self.add(Level::Info, message, meta);
    }

    fn warn(&mut self, message: &str, meta: Meta) {
        self.add(Level::Warn, message, meta);
    }

    fn error(&mut self, message: &str, meta: Meta) {
        self.add(Level::Error, message, meta);
    }

    fn critical(&mut self, message: &str, meta: Meta) {
        self.add(Level::Critical, message, meta);
    }

    fn has_errors(&self) -> bool {
        self.messages.iter().any(|message| message.level >= Level::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_messages_in_order() {
        let mut set = DiagnosticSet::new();
        set.warn("Lost attribute \"x\"", Meta::new(Some("a.wml"), Some(Position::new(1, 5, 4))));
        assert!(!set.has_errors());
        set.error("Broken", Meta::default());
        assert!(set.has_errors());
        assert_eq!(set.len(), 2);
        assert_eq!(set.warnings().count(), 1);
        assert_eq!(set.messages[0].meta.position.map(|p| p.column), Some(5));
    }

    #[test]
    fn serializes_flat_messages() {
        let mut set = DiagnosticSet::new();
        set.warn("w", Meta::new(Some("a.wml"), None));
        let json = set.to_json().unwrap();
        assert_eq!(json, r#"[{"level":"warn","text":"w","file_name":"a.wml","position":null}]"#);
    }

    #[test]
    fn converts_to_diagnostics() {
        let mut set = DiagnosticSet::new();
        set.critical("Oops", Meta::new(Some("b.tmpl"), Some(Position::new(2, 1, 9))));
        let diagnostics = set.to_diagnostics();
        assert_eq!(diagnostics[0].to_string(), "b.tmpl:2:1: Oops");
    }
}
