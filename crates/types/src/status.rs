use serde::{Deserialize, Serialize};

/// Severity of a status line attached to an input or banner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Info,
    Warning,
    #[default]
    Error,
    Success,
}

impl StatusKind {
    /// Glyph drawn in front of the message text.
    pub fn icon(&self) -> &'static str {
        match self {
            StatusKind::Info => "ℹ",
            StatusKind::Warning => "⚠",
            StatusKind::Error => "✖",
            StatusKind::Success => "✔",
        }
    }

    /// Whether the message should be announced as an alert.
    pub fn is_alert(&self) -> bool {
        matches!(self, StatusKind::Error | StatusKind::Warning)
    }
}

/// A single message with its severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn new(kind: StatusKind, text: impl Into<String>) -> Self {
        Self { kind, text: text.into() }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(StatusKind::Info, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(StatusKind::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(StatusKind::Error, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(StatusKind::Success, text)
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}
