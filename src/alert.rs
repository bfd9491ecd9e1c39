//! Alerts: the transient success and error notifications shown to the user.
//!
//! Every failure that reaches the user interface is turned into an [Alert]
//! (see [crate::Error::into_alert]) rather than being allowed to escape.

use std::fmt::Display;

/// Alert message types for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// The action worked.
    Success,
    /// The action failed.
    Error,
}

/// A notification with a short title and a longer description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Whether the alert reports a success or a failure.
    pub kind: AlertKind,
    /// The headline, e.g. "Transaction added".
    pub title: String,
    /// Further details. May be empty.
    pub details: String,
}

impl Alert {
    /// Create a new success alert
    pub fn success(title: &str, details: &str) -> Self {
        Self {
            kind: AlertKind::Success,
            title: title.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Create a new error alert
    pub fn error(title: &str, details: &str) -> Self {
        Self {
            kind: AlertKind::Error,
            title: title.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Create a new error alert without details
    pub fn error_simple(title: &str) -> Self {
        Self::error(title, "")
    }
}

impl Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let marker = match self.kind {
            AlertKind::Success => "✓",
            AlertKind::Error => "✗",
        };

        if self.details.is_empty() {
            write!(f, "{marker} {}", self.title)
        } else {
            write!(f, "{marker} {}: {}", self.title, self.details)
        }
    }
}
