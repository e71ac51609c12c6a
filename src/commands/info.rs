use anyhow::Result;

use crate::commands::{CommandReport, resolve_and_log};
use crate::probe::container::ContainerProbe;
use crate::probe::report::{ReportInput, render_report};
use crate::probe::resolver::ConfigSourceResolver;
use crate::probe::state::get_state;

pub fn run(resolver: &mut ConfigSourceResolver, probe: &dyn ContainerProbe) -> Result<CommandReport> {
    let resolution = resolve_and_log(resolver);
    let descriptor = resolver.descriptor();
    let state = get_state(
        descriptor,
        &resolver.paths().working_copy,
        &resolution.tracked,
    );

    let input = ReportInput {
        settings_path: descriptor.settings_path.display().to_string(),
        instance_root: descriptor.root.as_ref().map(|r| r.display().to_string()),
        public_url: resolution.public_url(descriptor).to_string(),
        state,
        container_addresses: probe.in_container().then(|| probe.addresses()),
    };

    let mut report = CommandReport::new("info");
    report.detail(format!("settings_path={}", input.settings_path));
    report.detail(format!("instance_root={}", descriptor.root_display()));
    report.detail(format!("public_url={}", input.public_url));
    report.detail(format!("state={state}"));
    if let Some(addresses) = &input.container_addresses {
        for addr in addresses {
            report.detail(format!("container.{}={}", addr.family, addr.address));
        }
    }
    report.set_text(render_report(&input).trim_end());

    Ok(report)
}
