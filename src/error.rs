use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("instance lookup command is empty")]
    EmptyLookupCommand,
    #[error("instance lookup `{command}` failed: {reason}")]
    LookupFailed { command: String, reason: String },
    #[error("git modified-file listing failed: {0}")]
    GitFailed(String),
    #[error("config file invalid or unreadable: {0}")]
    InvalidConfig(String),
    #[error("no deployed instance to sync into (root: {0})")]
    NoInstance(String),
    #[error(
        "failed to copy {from} -> {to}: {reason} (already copied: {})",
        display_paths(copied)
    )]
    SyncCopy {
        from: PathBuf,
        to: PathBuf,
        reason: String,
        copied: Vec<PathBuf>,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "none".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
