use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::probe::descriptor::DeploymentDescriptor;
use crate::probe::drift::drift_for;
use crate::probe::paths::is_readable;
use crate::probe::tracked::TrackedFileSet;

/// Installation lifecycle, in check order. The first matching check wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallState {
    MissingClone,
    MissingPyenv,
    MissingSettings,
    InstallerModified,
    PythonInstalled,
}

impl InstallState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingClone => "missing-clone",
            Self::MissingPyenv => "missing-pyenv",
            Self::MissingSettings => "missing-settings",
            Self::InstallerModified => "installer-modified",
            Self::PythonInstalled => "python-installed",
        }
    }

    pub fn next_step(self) -> &'static str {
        match self {
            Self::MissingClone => "clone the service into the instance root",
            Self::MissingPyenv => "create the instance's runtime environment",
            Self::MissingSettings => "install the settings file",
            Self::InstallerModified => "sync locally modified files into the instance",
            Self::PythonInstalled => "nothing to do",
        }
    }
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the installation from live filesystem checks. Drift is
/// recomputed on every call.
pub fn get_state(
    descriptor: &DeploymentDescriptor,
    working_copy: &Path,
    tracked: &TrackedFileSet,
) -> InstallState {
    let Some(root) = descriptor.root.as_deref().filter(|r| is_readable(r)) else {
        return InstallState::MissingClone;
    };
    if !descriptor.runtime_marker.as_deref().is_some_and(Path::is_file) {
        return InstallState::MissingPyenv;
    }
    if !(descriptor.settings_path.is_file() && is_readable(&descriptor.settings_path)) {
        return InstallState::MissingSettings;
    }
    if tracked
        .as_slice()
        .iter()
        .any(|rel| drift_for(working_copy, root, rel).diverges())
    {
        return InstallState::InstallerModified;
    }
    InstallState::PythonInstalled
}
