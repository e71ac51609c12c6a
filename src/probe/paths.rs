use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

use crate::probe::config::ProbeConfig;

#[derive(Debug, Clone)]
pub struct ProbePaths {
    pub working_copy: PathBuf,
    /// Local default for the authoritative config file.
    pub local_config: PathBuf,
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_working_copy(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().context("current directory could not be resolved")?;
    Ok(env_or_default_path("PROBE_WORKING_COPY", cwd))
}

pub fn resolve_paths(working_copy: PathBuf, cfg: &ProbeConfig) -> ProbePaths {
    let local_config = working_copy.join(cfg.instance.config_file.trim());
    ProbePaths {
        working_copy,
        local_config,
    }
}

/// Readable directory or file: existence alone is not enough when
/// permissions hide the content.
pub fn is_readable(path: &Path) -> bool {
    if path.is_dir() {
        return std::fs::read_dir(path).is_ok();
    }
    std::fs::File::open(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn explicit_working_copy_wins() {
        let got = resolve_working_copy(Some(Path::new("/srv/clone"))).expect("resolve");
        assert_eq!(got, PathBuf::from("/srv/clone"));
    }

    #[test]
    fn local_config_joins_configured_file_name() {
        let cfg = ProbeConfig::default();
        let paths = resolve_paths(PathBuf::from("/srv/clone"), &cfg);
        assert_eq!(paths.local_config, PathBuf::from("/srv/clone/.config.sh"));
    }

    #[test]
    fn readability_covers_files_and_dirs() {
        let tmp = tempdir().expect("tempdir");
        let file = tmp.path().join("a.txt");
        std::fs::write(&file, "x").expect("write");
        assert!(is_readable(tmp.path()));
        assert!(is_readable(&file));
        assert!(!is_readable(&tmp.path().join("missing")));
    }
}
