use anyhow::Result;

use crate::commands::{CommandReport, resolve_and_log};
use crate::probe::resolver::ConfigSourceResolver;

pub fn run(resolver: &mut ConfigSourceResolver) -> Result<CommandReport> {
    let resolution = resolve_and_log(resolver);
    let mut report = CommandReport::new("resolve");

    report.detail(format!("config_path={}", resolution.config_path.display()));
    report.detail(format!("config_source={}", resolution.source.as_str()));
    report.detail(format!("tracked_count={}", resolution.tracked.len()));
    for rel in resolution.tracked.as_slice() {
        report.detail(format!("tracked={rel}"));
    }
    report.detail(format!("loaded_keys={}", resolution.values.len()));

    let mut text = format!("{}\n", resolution.config_path.display());
    for rel in resolution.tracked.as_slice() {
        text.push_str(&format!("tracked: {rel}\n"));
    }
    report.set_text(text.trim_end());

    Ok(report)
}
