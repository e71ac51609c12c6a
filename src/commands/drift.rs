use anyhow::Result;
use std::path::Path;

use crate::commands::{CommandReport, resolve_and_log};
use crate::probe::drift::{drift_all, modified_rfc3339, sha256_hex};
use crate::probe::resolver::ConfigSourceResolver;
use crate::probe::sync::instance_root;

pub fn run(resolver: &mut ConfigSourceResolver) -> Result<CommandReport> {
    let resolution = resolve_and_log(resolver);
    let mut report = CommandReport::new("drift");

    let root = match instance_root(resolver.descriptor()) {
        Ok(root) => root,
        Err(err) => {
            report.detail(format!("instance={err}"));
            report.set_text("no deployed instance; nothing to compare");
            return Ok(report);
        }
    };
    if resolution.tracked.is_empty() {
        report.set_text("no tracked files");
        return Ok(report);
    }
    let working_copy = &resolver.paths().working_copy;

    let mut lines = Vec::new();
    for drift in drift_all(working_copy, root, resolution.tracked.as_slice()) {
        let local = working_copy.join(&drift.path);
        let deployed = root.join(&drift.path);
        let digest = |p: &Path| sha256_hex(p).unwrap_or_else(|| "-".to_string());
        let mtime = |p: &Path| modified_rfc3339(p).unwrap_or_else(|| "-".to_string());

        report.detail(format!(
            "{} exists_in_instance={} content_differs={} locally_newer={} local_sha256={} instance_sha256={} local_mtime={} instance_mtime={}",
            drift.path,
            drift.exists_in_instance,
            drift.content_differs,
            drift.locally_newer,
            digest(&local),
            digest(&deployed),
            mtime(&local),
            mtime(&deployed),
        ));
        if drift.needs_sync() {
            report.issue(format!("{} needs sync", drift.path));
        }

        let status = match (drift.exists_in_instance, drift.content_differs, drift.locally_newer) {
            (false, _, _) => "missing",
            (true, false, _) => "same",
            (true, true, true) => "newer",
            (true, true, false) => "differs",
        };
        lines.push(format!("{status}\t{}", drift.path));
    }
    report.set_text(lines.join("\n"));

    Ok(report)
}
