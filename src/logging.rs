use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
}

impl Level {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Info => "PROBE_INFO",
            Self::Warn => "PROBE_WARN",
        }
    }
}

/// One operator-facing line produced by decision logic. Rendering and
/// writing happen in the CLI, never where the event is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEvent {
    pub level: Level,
    pub code: String,
    pub path: Option<String>,
    pub message: String,
}

impl LogEvent {
    pub fn info(code: &str, message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            code: code.to_string(),
            path: None,
            message: message.into(),
        }
    }

    pub fn warn(code: &str, message: impl Into<String>) -> Self {
        Self {
            level: Level::Warn,
            code: code.to_string(),
            path: None,
            message: message.into(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Squeezes a `code=`/`path=` value into one whitespace-free token so a
/// line can still be split on spaces. Empty values become `na`.
fn field_token(value: &str) -> String {
    let token = value
        .split_whitespace()
        .map(|word| word.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    if token.is_empty() {
        "na".to_string()
    } else {
        token
    }
}

pub fn render(event: &LogEvent) -> String {
    let path = event.path.as_deref().unwrap_or("");
    format!(
        "{} code={} path={} msg={:?}",
        event.level.prefix(),
        field_token(&event.code),
        field_token(path),
        event.message.trim(),
    )
}

pub fn emit(event: &LogEvent) {
    eprintln!("{}", render(event));
}

pub fn emit_all(events: &[LogEvent]) {
    for event in events {
        emit(event);
    }
}
