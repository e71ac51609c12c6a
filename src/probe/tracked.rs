use std::collections::BTreeSet;
use std::path::Path;

use crate::logging::LogEvent;
use crate::probe::config::TrackedPolicy;
use crate::probe::git;

/// Tracked paths relative to the working copy. Every entry exists in the
/// working copy; the set is empty while no instance exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedFileSet(Vec<String>);

impl TrackedFileSet {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Keeps order, drops duplicates and paths missing from the working copy.
    pub fn from_candidates<I, S>(working_copy: &Path, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for raw in candidates {
            let rel = raw.as_ref().trim().trim_start_matches("./");
            if rel.is_empty() || !working_copy.join(rel).is_file() {
                continue;
            }
            if seen.insert(rel.to_string()) {
                out.push(rel.to_string());
            }
        }
        Self(out)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

pub fn populate(
    policy: TrackedPolicy,
    working_copy: &Path,
    manifest: &[String],
    events: &mut Vec<LogEvent>,
) -> TrackedFileSet {
    match policy {
        TrackedPolicy::Fixed => TrackedFileSet::from_candidates(working_copy, manifest),
        TrackedPolicy::GitModified => match git::modified_files(working_copy) {
            Ok(changed) => TrackedFileSet::from_candidates(working_copy, changed),
            Err(err) => {
                events.push(LogEvent::warn(
                    "git_failed",
                    format!("cannot list locally modified files: {err}"),
                ));
                TrackedFileSet::empty()
            }
        },
    }
}
