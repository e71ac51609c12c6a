use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ProbeError;

pub const DEFAULT_CONFIG_FILE: &str = ".config.sh";
pub const DEFAULT_SETTINGS_PATH: &str = "/etc/searxng/settings.yml";
/// Relative to the instance's source checkout; a standard install keeps the
/// runtime environment next to it, not inside it.
pub const DEFAULT_RUNTIME_MARKER: &str = "../searx-pyenv/bin/activate";
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost/";
pub const DEFAULT_SYNC_HINT: &str = "instance-probe sync";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackedPolicy {
    Fixed,
    GitModified,
}

impl TrackedPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "fixed" => Some(Self::Fixed),
            "git-modified" | "git" => Some(Self::GitModified),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    pub lookup_command: Vec<String>,
    pub settings_path: String,
    pub runtime_marker: String,
    pub public_url: String,
    pub config_file: String,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            lookup_command: vec![
                "./utils/searxng.sh".to_string(),
                "--getenv".to_string(),
                "SEARXNG_SRC".to_string(),
            ],
            settings_path: DEFAULT_SETTINGS_PATH.to_string(),
            runtime_marker: DEFAULT_RUNTIME_MARKER.to_string(),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            config_file: DEFAULT_CONFIG_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackedConfig {
    pub policy: TrackedPolicy,
    pub files: Vec<String>,
}

impl Default for TrackedConfig {
    fn default() -> Self {
        Self {
            policy: TrackedPolicy::Fixed,
            files: vec![
                DEFAULT_CONFIG_FILE.to_string(),
                "searx/settings.yml".to_string(),
                "utils/brand.env".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub hint: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            hint: DEFAULT_SYNC_HINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProbeConfig {
    pub instance: InstanceConfig,
    pub tracked: TrackedConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialProbeConfig {
    instance: Option<InstanceConfig>,
    tracked: Option<TrackedConfig>,
    sync: Option<SyncConfig>,
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_or_csv(var: &str, fallback: &[String]) -> Vec<String> {
    match env::var(var) {
        Ok(v) => {
            let out = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>();
            if out.is_empty() {
                fallback.to_vec()
            } else {
                out
            }
        }
        Err(_) => fallback.to_vec(),
    }
}

fn validate(cfg: &ProbeConfig) -> Result<()> {
    if cfg.instance.lookup_command.iter().all(|s| s.trim().is_empty()) {
        return Err(ProbeError::EmptyLookupCommand.into());
    }
    let config_file = cfg.instance.config_file.trim();
    if config_file.is_empty() {
        return Err(ProbeError::InvalidConfig("instance.config_file cannot be empty".into()).into());
    }
    if Path::new(config_file).is_absolute() {
        return Err(ProbeError::InvalidConfig(format!(
            "instance.config_file must be relative to the clone root: {config_file}"
        ))
        .into());
    }
    if cfg.instance.settings_path.trim().is_empty() {
        return Err(
            ProbeError::InvalidConfig("instance.settings_path cannot be empty".into()).into(),
        );
    }
    if let Some(abs) = cfg.tracked.files.iter().find(|f| Path::new(f).is_absolute()) {
        return Err(ProbeError::InvalidConfig(format!(
            "tracked file must be relative to the working copy: {abs}"
        ))
        .into());
    }
    Ok(())
}

fn resolve_config_path(working_copy: &Path) -> Option<PathBuf> {
    if let Ok(custom) = env::var("PROBE_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let local = working_copy.join(".instance-probe.toml");
    if local.is_file() {
        return Some(local);
    }

    let home = dirs::home_dir()?;
    Some(home.join(".config").join("instance-probe").join("config.toml"))
}

fn merge_file_config(base: &mut ProbeConfig, working_copy: &Path) -> Result<()> {
    let Some(path) = resolve_config_path(working_copy) else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)
        .map_err(|err| ProbeError::InvalidConfig(format!("{}: {err}", path.display())))?;
    merge_toml(base, &raw)
        .map_err(|err| anyhow!("failed to parse probe config {}: {err}", path.display()))
}

fn merge_toml(base: &mut ProbeConfig, raw: &str) -> Result<()> {
    let parsed: PartialProbeConfig = toml::from_str(raw)?;
    if let Some(instance) = parsed.instance {
        base.instance = instance;
    }
    if let Some(tracked) = parsed.tracked {
        base.tracked = tracked;
    }
    if let Some(sync) = parsed.sync {
        base.sync = sync;
    }
    Ok(())
}

pub fn load_config(working_copy: &Path) -> Result<ProbeConfig> {
    let mut cfg = ProbeConfig::default();
    merge_file_config(&mut cfg, working_copy)?;

    if let Ok(raw) = env::var("PROBE_TRACKED_POLICY")
        && !raw.trim().is_empty()
    {
        cfg.tracked.policy = TrackedPolicy::parse(&raw).ok_or_else(|| {
            ProbeError::InvalidConfig(format!(
                "invalid PROBE_TRACKED_POLICY `{}`: use `fixed` or `git-modified`",
                raw.trim()
            ))
        })?;
    }
    cfg.tracked.files = env_or_csv("PROBE_TRACKED_FILES", &cfg.tracked.files);
    cfg.instance.settings_path = env_or_string("PROBE_SETTINGS_PATH", &cfg.instance.settings_path);
    cfg.instance.runtime_marker =
        env_or_string("PROBE_RUNTIME_MARKER", &cfg.instance.runtime_marker);
    cfg.instance.public_url = env_or_string("PROBE_PUBLIC_URL", &cfg.instance.public_url);

    validate(&cfg)?;
    Ok(cfg)
}
