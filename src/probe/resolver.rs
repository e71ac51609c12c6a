//! Picks the authoritative config file for this process.
//!
//! The resolver decorates a base [`ConfigLoader`]: it decides *which* file
//! is authoritative, then hands that file to the loader. Decision logic
//! returns [`LogEvent`]s instead of printing so callers own the I/O.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::logging::LogEvent;
use crate::probe::config::ProbeConfig;
use crate::probe::descriptor::DeploymentDescriptor;
use crate::probe::drift::is_newer;
use crate::probe::paths::{ProbePaths, is_readable};
use crate::probe::tracked::{self, TrackedFileSet};

pub trait ConfigLoader {
    fn load(&self, path: &Path) -> Result<BTreeMap<String, String>>;
}

/// Reads shell-style `KEY=value` assignments (optionally `export`ed).
pub struct ShellConfigLoader;

impl ConfigLoader for ShellConfigLoader {
    fn load(&self, path: &Path) -> Result<BTreeMap<String, String>> {
        let iter = dotenvy::from_path_iter(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let mut values = BTreeMap::new();
        for item in iter {
            let (key, value) =
                item.with_context(|| format!("failed to parse {}", path.display()))?;
            values.insert(key, value);
        }
        Ok(values)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Local,
    Instance,
}

impl ConfigSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Instance => "instance",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub config_path: PathBuf,
    pub source: ConfigSource,
    pub tracked: TrackedFileSet,
    pub values: BTreeMap<String, String>,
}

impl Resolution {
    /// `PUBLIC_URL` from the authoritative config, else the descriptor's.
    pub fn public_url<'a>(&'a self, descriptor: &'a DeploymentDescriptor) -> &'a str {
        self.values
            .get("PUBLIC_URL")
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(&descriptor.public_url)
    }
}

pub struct ConfigSourceResolver {
    descriptor: DeploymentDescriptor,
    paths: ProbePaths,
    cfg: ProbeConfig,
    loader: Box<dyn ConfigLoader>,
    resolved: Option<Resolution>,
    events: Vec<LogEvent>,
}

impl ConfigSourceResolver {
    pub fn new(
        descriptor: DeploymentDescriptor,
        paths: ProbePaths,
        cfg: ProbeConfig,
        loader: Box<dyn ConfigLoader>,
    ) -> Self {
        Self {
            descriptor,
            paths,
            cfg,
            loader,
            resolved: None,
            events: Vec::new(),
        }
    }

    pub fn descriptor(&self) -> &DeploymentDescriptor {
        &self.descriptor
    }

    pub fn paths(&self) -> &ProbePaths {
        &self.paths
    }

    /// First call decides and records events; later calls return the same
    /// resolution without re-evaluating anything.
    pub fn resolve(&mut self) -> &Resolution {
        let resolution = match self.resolved.take() {
            Some(resolution) => resolution,
            None => {
                let (resolution, events) = self.evaluate();
                self.events.extend(events);
                resolution
            }
        };
        self.resolved.insert(resolution)
    }

    /// Drains the events produced by the first `resolve` call.
    pub fn take_events(&mut self) -> Vec<LogEvent> {
        std::mem::take(&mut self.events)
    }

    fn evaluate(&self) -> (Resolution, Vec<LogEvent>) {
        let mut events = Vec::new();
        let local_config = self.paths.local_config.clone();

        let Some(root) = self.descriptor.root.as_deref().filter(|r| is_readable(r)) else {
            events.push(LogEvent::info(
                "not_cloned",
                format!("not yet cloned ({})", self.descriptor.root_display()),
            ));
            let values = self.load_values(&local_config, &mut events);
            let resolution = Resolution {
                config_path: local_config,
                source: ConfigSource::Local,
                tracked: TrackedFileSet::empty(),
                values,
            };
            return (resolution, events);
        };

        events.push(LogEvent::info(
            "working_copy",
            format!("local clone (working copy): {}", self.paths.working_copy.display()),
        ));
        events.push(LogEvent::info(
            "instance_clone",
            format!("instance's clone: {}", root.display()),
        ));

        let tracked = tracked::populate(
            self.cfg.tracked.policy,
            &self.paths.working_copy,
            &self.cfg.tracked.files,
            &mut events,
        );

        let mut newer = Vec::new();
        for rel in tracked.as_slice() {
            let local = self.paths.working_copy.join(rel);
            let deployed = root.join(rel);
            if deployed.is_file() && is_newer(&local, &deployed) {
                events.push(
                    LogEvent::warn("local_newer", "local copy is newer than deployed copy")
                        .with_path(rel.clone()),
                );
                newer.push(rel.as_str());
            }
        }

        let instance_config = root.join(self.cfg.instance.config_file.trim());
        let instance_config_readable = instance_config.is_file() && is_readable(&instance_config);
        if !newer.is_empty() || !instance_config_readable {
            let reason = if newer.is_empty() {
                format!("instance has no {}", self.cfg.instance.config_file.trim())
            } else {
                format!("newer local files: {}", newer.join(", "))
            };
            events.push(LogEvent::warn(
                "sync_hint",
                format!("{reason}; to sync the instance run: {}", self.cfg.sync.hint),
            ));
        }

        let (config_path, source) = if instance_config_readable {
            events.push(
                LogEvent::info("config_source", "using instance's config")
                    .with_path(instance_config.display().to_string()),
            );
            (instance_config, ConfigSource::Instance)
        } else {
            events.push(
                LogEvent::info("config_source", "using local config")
                    .with_path(local_config.display().to_string()),
            );
            (local_config, ConfigSource::Local)
        };

        let values = self.load_values(&config_path, &mut events);
        let resolution = Resolution {
            config_path,
            source,
            tracked,
            values,
        };
        (resolution, events)
    }

    fn load_values(&self, path: &Path, events: &mut Vec<LogEvent>) -> BTreeMap<String, String> {
        if !path.is_file() {
            return BTreeMap::new();
        }
        match self.loader.load(path) {
            Ok(values) => values,
            Err(err) => {
                events.push(
                    LogEvent::warn("config_load_failed", format!("{err:#}"))
                        .with_path(path.display().to_string()),
                );
                BTreeMap::new()
            }
        }
    }
}
