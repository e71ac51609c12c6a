use anyhow::Result;

use crate::commands::{CommandReport, resolve_and_log};
use crate::probe::resolver::ConfigSourceResolver;
use crate::probe::state::{InstallState, get_state};

#[derive(Debug, Clone, Default)]
pub struct StateOptions {
    pub strict: bool,
}

pub fn run(resolver: &mut ConfigSourceResolver, opts: &StateOptions) -> Result<CommandReport> {
    let resolution = resolve_and_log(resolver);
    let state = get_state(
        resolver.descriptor(),
        &resolver.paths().working_copy,
        &resolution.tracked,
    );

    let mut report = CommandReport::new("state");
    report.detail(format!("state={state}"));
    report.detail(format!("next_step={}", state.next_step()));
    report.set_text(state.as_str());

    if opts.strict && state != InstallState::PythonInstalled {
        report.issue(format!("installation is {state}: {}", state.next_step()));
    }

    Ok(report)
}
