//! Ordered, severity-tagged diagnostics collected while reading an asset.

use std::fmt;

/// Severity of a reader message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Display,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Display => "info",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub severity: Severity,
    pub text: String,
}

/// Generation-ordered message list.
///
/// Every push is mirrored as a `tracing` event. Phase checks take a
/// [`MessageLog::mark`] before the phase and ask [`MessageLog::has_errors_since`]
/// afterwards.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, severity: Severity, text: impl Into<String>) {
        let text = text.into();
        match severity {
            Severity::Error => tracing::error!(target: "strata_gltf", "{text}"),
            Severity::Warning => tracing::warn!(target: "strata_gltf", "{text}"),
            Severity::Display => tracing::info!(target: "strata_gltf", "{text}"),
        }
        self.messages.push(Message { severity, text });
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(Severity::Error, text);
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.push(Severity::Warning, text);
    }

    pub fn display(&mut self, text: impl Into<String>) {
        self.push(Severity::Display, text);
    }

    /// Position to scan from in a later [`Self::has_errors_since`].
    pub fn mark(&self) -> usize {
        self.messages.len()
    }

    pub fn has_errors_since(&self, mark: usize) -> bool {
        self.messages
            .get(mark..)
            .is_some_and(|tail| tail.iter().any(|m| m.severity == Severity::Error))
    }

    pub fn has_errors(&self) -> bool {
        self.has_errors_since(0)
    }

    pub fn first_error(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.severity == Severity::Error)
            .map(|m| m.text.as_str())
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.messages.iter().filter(|m| m.severity == severity).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn append(&mut self, other: MessageLog) {
        self.messages.extend(other.messages);
    }

    pub fn into_vec(self) -> Vec<Message> {
        self.messages
    }
}
