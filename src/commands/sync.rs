use anyhow::{Context, Result};

use crate::commands::{CommandReport, resolve_and_log};
use crate::probe::resolver::ConfigSourceResolver;
use crate::probe::sync::{apply, instance_root, plan};

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub dry_run: bool,
}

pub fn run(resolver: &mut ConfigSourceResolver, opts: &SyncOptions) -> Result<CommandReport> {
    let resolution = resolve_and_log(resolver);
    let root = instance_root(resolver.descriptor())?;
    let working_copy = &resolver.paths().working_copy;
    let mut report = CommandReport::new("sync");
    report.detail(format!("instance_root={}", root.display()));

    if opts.dry_run {
        let planned = plan(working_copy, root, &resolution.tracked);
        for drift in &planned {
            report.detail(format!("would_copy={}", drift.path));
        }
        let text = if planned.is_empty() {
            "instance is in sync".to_string()
        } else {
            planned
                .iter()
                .map(|d| format!("would copy {}", d.path))
                .collect::<Vec<_>>()
                .join("\n")
        };
        report.set_text(text);
        return Ok(report);
    }

    let outcome = apply(working_copy, root, &resolution.tracked)
        .with_context(|| format!("sync into {} failed", root.display()))?;
    for path in &outcome.copied {
        report.detail(format!("copied={}", path.display()));
    }
    for rel in &outcome.skipped {
        report.detail(format!("skipped={rel}"));
    }
    report.set_text(format!(
        "copied {} file(s) into {}",
        outcome.copied.len(),
        root.display()
    ));

    Ok(report)
}
