use anyhow::Result;
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::error::ProbeError;
use crate::logging::LogEvent;
use crate::probe::config::ProbeConfig;
use crate::probe::util::{resolve_program, run_command_with_timeout};

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(15);

/// One deployed instance as seen from this host. Built once per process
/// and only observed afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentDescriptor {
    pub root: Option<PathBuf>,
    pub settings_path: PathBuf,
    pub runtime_marker: Option<PathBuf>,
    pub public_url: String,
}

impl DeploymentDescriptor {
    pub fn derive(root: Option<PathBuf>, cfg: &ProbeConfig) -> Self {
        let settings = Path::new(cfg.instance.settings_path.trim());
        let settings_path = match &root {
            Some(root) if settings.is_relative() => root.join(settings),
            _ => settings.to_path_buf(),
        };

        let marker = Path::new(cfg.instance.runtime_marker.trim());
        let runtime_marker = if marker.is_absolute() {
            Some(marker.to_path_buf())
        } else {
            root.as_ref().map(|root| root.join(marker))
        };

        Self {
            root,
            settings_path,
            runtime_marker,
            public_url: cfg.instance.public_url.trim().to_string(),
        }
    }

    pub fn root_display(&self) -> String {
        match &self.root {
            Some(root) => root.display().to_string(),
            None => "none".to_string(),
        }
    }
}

/// External collaborator answering "where is the deployed instance?".
pub trait InstanceLookup {
    fn instance_root(&self) -> Result<Option<PathBuf>>;
}

pub struct FixedLookup(pub Option<PathBuf>);

impl InstanceLookup for FixedLookup {
    fn instance_root(&self) -> Result<Option<PathBuf>> {
        Ok(self.0.clone())
    }
}

pub struct CommandLookup {
    pub argv: Vec<String>,
    pub working_copy: PathBuf,
}

impl CommandLookup {
    fn command_line(&self) -> String {
        self.argv.join(" ")
    }
}

fn parse_lookup_output(stdout: &str) -> Option<PathBuf> {
    let line = stdout.lines().map(str::trim).rfind(|l| !l.is_empty())?;
    Some(PathBuf::from(line))
}

impl InstanceLookup for CommandLookup {
    fn instance_root(&self) -> Result<Option<PathBuf>> {
        let Some((program, args)) = self.argv.split_first() else {
            return Err(ProbeError::EmptyLookupCommand.into());
        };
        let failed = |reason: String| ProbeError::LookupFailed {
            command: self.command_line(),
            reason,
        };

        let bin = resolve_program(program, &self.working_copy)
            .map_err(|err| failed(err.to_string()))?;
        let mut cmd = Command::new(&bin);
        cmd.args(args).current_dir(&self.working_copy);
        let out = run_command_with_timeout(&mut cmd, LOOKUP_TIMEOUT)
            .map_err(|err| failed(err.to_string()))?;
        if !out.status.success() {
            return Err(failed(format!(
                "exit {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            ))
            .into());
        }
        Ok(parse_lookup_output(&String::from_utf8_lossy(&out.stdout)))
    }
}

pub fn lookup_for(cfg: &ProbeConfig, working_copy: &Path) -> Box<dyn InstanceLookup> {
    match env::var("PROBE_INSTANCE_ROOT") {
        Ok(v) if !v.trim().is_empty() => Box::new(FixedLookup(Some(PathBuf::from(v.trim())))),
        _ => Box::new(CommandLookup {
            argv: cfg
                .instance
                .lookup_command
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            working_copy: working_copy.to_path_buf(),
        }),
    }
}

/// Run the lookup once. A failing lookup means "no instance" plus a warning;
/// it never aborts the caller.
pub fn establish(
    lookup: &dyn InstanceLookup,
    cfg: &ProbeConfig,
) -> (DeploymentDescriptor, Vec<LogEvent>) {
    let mut events = Vec::new();
    let root = match lookup.instance_root() {
        Ok(root) => root,
        Err(err) => {
            events.push(LogEvent::warn(
                "lookup_failed",
                format!("instance lookup failed, assuming none: {err:#}"),
            ));
            None
        }
    };
    (DeploymentDescriptor::derive(root, cfg), events)
}
