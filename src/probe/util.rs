use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Resolve a program name the way an install script would: paths with a
/// separator are relative to `base`, bare names come from `PATH`.
pub fn resolve_program(program: &str, base: &Path) -> Result<PathBuf> {
    let candidate = Path::new(program);
    if candidate.is_absolute() {
        return Ok(candidate.to_path_buf());
    }
    if program.contains('/') {
        return Ok(base.join(candidate));
    }
    which::which(program).with_context(|| format!("`{program}` not found on PATH"))
}

fn drain<R: Read + Send + 'static>(source: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut source) = source {
            let _ = source.read_to_end(&mut buf);
        }
        buf
    })
}

/// Runs `cmd` with piped output, draining both pipes on reader threads so a
/// chatty child never blocks on a full pipe while we poll for exit.
pub fn run_command_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Output> {
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    let mut child = cmd.spawn()?;
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            // Readers may stay blocked on grandchildren holding the pipes; leave them detached.
            anyhow::bail!("command timed out after {}s", timeout.as_secs());
        }
        thread::sleep(Duration::from_millis(20));
    };
    let join = |handle: JoinHandle<Vec<u8>>| {
        handle
            .join()
            .map_err(|_| anyhow::anyhow!("output reader thread panicked"))
    };
    Ok(Output {
        status,
        stdout: join(stdout)?,
        stderr: join(stderr)?,
    })
}
