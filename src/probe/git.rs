use std::path::Path;
use std::process::Command;
use std::time::Duration;

use crate::error::ProbeError;
use crate::probe::util::run_command_with_timeout;

const GIT_TIMEOUT: Duration = Duration::from_secs(30);

fn parse_name_only(stdout: &[u8]) -> Result<Vec<String>, ProbeError> {
    let mut out = Vec::new();
    for entry in stdout.split(|b| *b == 0) {
        if entry.is_empty() {
            continue;
        }
        let rel = String::from_utf8(entry.to_vec())
            .map_err(|_| ProbeError::GitFailed("git returned non-utf8 path".to_string()))?;
        out.push(rel);
    }
    Ok(out)
}

/// Paths changed in the working tree relative to the last commit, staged
/// or not. Paths are relative to `working_copy` and changes outside it are
/// left out, even when the repository top level sits higher up.
pub fn modified_files(working_copy: &Path) -> Result<Vec<String>, ProbeError> {
    let git = which::which("git").map_err(|err| ProbeError::GitFailed(err.to_string()))?;
    let mut cmd = Command::new(git);
    cmd.arg("-C")
        .arg(working_copy)
        .args(["diff", "--relative", "--name-only", "-z", "HEAD", "--"]);
    let output = run_command_with_timeout(&mut cmd, GIT_TIMEOUT)
        .map_err(|err| ProbeError::GitFailed(format!("git diff: {err}")))?;
    if !output.status.success() {
        return Err(ProbeError::GitFailed(format!(
            "git diff failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    parse_name_only(&output.stdout)
}
