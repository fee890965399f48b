//! Transient UI signals: the toast banner and the scroll trigger.
//!
//! There is no queue. Opening a toast while one is showing replaces it.

use serde::{Deserialize, Serialize};

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    #[default]
    Info,
    Warning,
    Error,
}

/// Toast banner state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Toast {
    pub active: bool,
    pub severity: Severity,
    pub message: String,
}

impl Toast {
    /// Show `message`, replacing whatever was showing.
    pub fn open(&mut self, message: impl Into<String>, severity: Severity) {
        self.active = true;
        self.message = message.into();
        self.severity = severity;
    }

    /// Hide the banner. The last message is kept for fade-out.
    pub const fn close(&mut self) {
        self.active = false;
    }
}

/// Layout signals.
///
/// `scroll_signal` carries no meaning in its value; observers scroll to the
/// top whenever it flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Layout {
    pub scroll_signal: bool,
}

impl Layout {
    pub const fn toggle_scroll_signal(&mut self) {
        self.scroll_signal = !self.scroll_signal;
    }
}
