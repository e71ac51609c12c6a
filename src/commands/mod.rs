pub mod drift;
pub mod info;
pub mod resolve;
pub mod state;
pub mod sync;

use serde::Serialize;

use crate::logging;
use crate::probe::resolver::{ConfigSourceResolver, Resolution};

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
    /// Human-facing output printed instead of `details` in text mode.
    #[serde(skip)]
    pub text: Option<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
            text: None,
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }
}

/// Resolve the config source (once per process) and write whatever the
/// first resolution had to say to stderr.
pub fn resolve_and_log(resolver: &mut ConfigSourceResolver) -> Resolution {
    let resolution = resolver.resolve().clone();
    logging::emit_all(&resolver.take_events());
    resolution
}
