use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ProbeError;
use crate::probe::descriptor::DeploymentDescriptor;
use crate::probe::drift::{DriftResult, drift_all};
use crate::probe::paths::is_readable;
use crate::probe::tracked::TrackedFileSet;

#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub copied: Vec<PathBuf>,
    pub skipped: Vec<String>,
}

pub fn instance_root(descriptor: &DeploymentDescriptor) -> Result<&Path, ProbeError> {
    descriptor
        .root
        .as_deref()
        .filter(|r| is_readable(r))
        .ok_or_else(|| ProbeError::NoInstance(descriptor.root_display()))
}

/// Tracked files that differ and are either missing in the instance or
/// newer in the working copy. Files that are older locally are left alone.
pub fn plan(working_copy: &Path, root: &Path, tracked: &TrackedFileSet) -> Vec<DriftResult> {
    drift_all(working_copy, root, tracked.as_slice())
        .into_iter()
        .filter(DriftResult::needs_sync)
        .collect()
}

/// Copies every file `plan` would select. Stops at the first failure; the
/// error lists what was already copied so the instance state is known.
pub fn apply(
    working_copy: &Path,
    root: &Path,
    tracked: &TrackedFileSet,
) -> Result<SyncOutcome, ProbeError> {
    let mut copied = Vec::new();
    let mut skipped = Vec::new();
    for drift in drift_all(working_copy, root, tracked.as_slice()) {
        if !drift.needs_sync() {
            skipped.push(drift.path);
            continue;
        }
        let from = working_copy.join(&drift.path);
        let to = root.join(&drift.path);
        let result = match to.parent() {
            Some(parent) => fs::create_dir_all(parent).and_then(|()| fs::copy(&from, &to)),
            None => fs::copy(&from, &to),
        };
        if let Err(err) = result {
            return Err(ProbeError::SyncCopy {
                from,
                to,
                reason: err.to_string(),
                copied,
            });
        }
        copied.push(to);
    }
    Ok(SyncOutcome { copied, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::config::ProbeConfig;
    use crate::probe::drift::files_differ;
    use crate::probe::drift::tests::{epoch, write_with_mtime};
    use tempfile::tempdir;

    #[test]
    fn copies_newer_and_missing_but_not_older() {
        let tmp = tempdir().expect("tempdir");
        let local = tmp.path().join("local");
        let inst = tmp.path().join("inst");
        write_with_mtime(&local.join(".config.sh"), "A=1\n", epoch(1_000));
        write_with_mtime(&local.join("utils/brand.env"), "B=2\n", epoch(3_000));
        write_with_mtime(&inst.join("utils/brand.env"), "B=1\n", epoch(2_000));
        write_with_mtime(&local.join("searx/settings.yml"), "old\n", epoch(1_000));
        write_with_mtime(&inst.join("searx/settings.yml"), "new\n", epoch(2_000));

        let tracked = TrackedFileSet::from_candidates(
            &local,
            [".config.sh", "utils/brand.env", "searx/settings.yml"],
        );
        let planned: Vec<_> = plan(&local, &inst, &tracked)
            .into_iter()
            .map(|d| d.path)
            .collect();
        assert_eq!(planned, vec![".config.sh", "utils/brand.env"]);

        let outcome = apply(&local, &inst, &tracked).expect("sync");
        assert_eq!(outcome.copied.len(), 2);
        assert_eq!(outcome.skipped, vec!["searx/settings.yml"]);
        assert!(!files_differ(&local.join(".config.sh"), &inst.join(".config.sh")));
        assert!(!files_differ(&local.join("utils/brand.env"), &inst.join("utils/brand.env")));
        assert!(files_differ(&local.join("searx/settings.yml"), &inst.join("searx/settings.yml")));
        assert!(plan(&local, &inst, &tracked).is_empty());
    }

    #[test]
    fn failed_copy_reports_files_already_copied() {
        let tmp = tempdir().expect("tempdir");
        let local = tmp.path().join("local");
        let inst = tmp.path().join("inst");
        write_with_mtime(&local.join(".config.sh"), "A=1\n", epoch(3_000));
        write_with_mtime(&local.join("utils/brand.env"), "B=2\n", epoch(3_000));
        // A directory where the file should go makes the second copy fail.
        fs::create_dir_all(inst.join("utils/brand.env")).expect("mkdir blocker");

        let tracked =
            TrackedFileSet::from_candidates(&local, [".config.sh", "utils/brand.env"]);
        let err = apply(&local, &inst, &tracked).expect_err("copy should fail");
        match &err {
            ProbeError::SyncCopy { to, copied, .. } => {
                assert_eq!(to, &inst.join("utils/brand.env"));
                assert_eq!(copied, &vec![inst.join(".config.sh")]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("already copied:"));
        assert!(!files_differ(&local.join(".config.sh"), &inst.join(".config.sh")));
    }

    #[test]
    fn refuses_without_instance() {
        let cfg = ProbeConfig::default();
        let d = DeploymentDescriptor::derive(None, &cfg);
        let err = instance_root(&d).expect_err("no instance");
        assert!(matches!(err, ProbeError::NoInstance(ref r) if r == "none"));
    }
}
