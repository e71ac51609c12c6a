#![allow(dead_code)]

use assert_cmd::Command;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::{TempDir, tempdir};

pub struct Fixture {
    _tmp: TempDir,
    pub home: PathBuf,
    pub local: PathBuf,
    pub inst: PathBuf,
    pub pyenv_marker: PathBuf,
}

pub fn epoch(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

pub fn write_with_mtime(path: &Path, body: &str, mtime: SystemTime) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir parent");
    }
    fs::write(path, body).expect("write file");
    File::options()
        .write(true)
        .open(path)
        .expect("open for mtime")
        .set_modified(mtime)
        .expect("set mtime");
}

impl Fixture {
    pub fn new() -> Self {
        let tmp = tempdir().expect("tempdir");
        let home = tmp.path().join("home");
        let local = tmp.path().join("local");
        let inst = tmp.path().join("inst");
        let pyenv_marker = tmp.path().join("searx-pyenv/bin/activate");
        fs::create_dir_all(&home).expect("mkdir home");
        fs::create_dir_all(&local).expect("mkdir local");
        write_with_mtime(
            &local.join(".config.sh"),
            "PUBLIC_URL=http://local.example/\n",
            epoch(1_000),
        );
        write_with_mtime(&local.join("utils/brand.env"), "export GIT_URL='a'\n", epoch(1_000));
        Self {
            _tmp: tmp,
            home,
            local,
            inst,
            pyenv_marker,
        }
    }

    /// Instance root plus runtime marker (next to the root) plus settings
    /// file, in sync with the working copy.
    pub fn install_instance(&self) {
        fs::create_dir_all(&self.inst).expect("mkdir inst");
        write_with_mtime(&self.pyenv_marker, "", epoch(1_000));
        write_with_mtime(&self.inst.join("etc/settings.yml"), "server: {}\n", epoch(1_000));
        write_with_mtime(
            &self.inst.join(".config.sh"),
            "PUBLIC_URL=http://local.example/\n",
            epoch(1_000),
        );
        write_with_mtime(&self.inst.join("utils/brand.env"), "export GIT_URL='a'\n", epoch(1_000));
    }

    /// Turns the working copy into a git repository with everything
    /// committed. Returns false when git is not installed.
    pub fn commit_working_copy(&self) -> bool {
        if which::which("git").is_err() {
            return false;
        }
        for args in [
            &["init", "-q"][..],
            &["add", "-A"][..],
            &[
                "-c",
                "user.name=fixture",
                "-c",
                "user.email=fixture@example.org",
                "-c",
                "commit.gpgsign=false",
                "commit",
                "-q",
                "-m",
                "init",
            ][..],
        ] {
            let status = std::process::Command::new("git")
                .args(args)
                .current_dir(&self.local)
                .status()
                .expect("run git");
            assert!(status.success(), "git {args:?} failed");
        }
        true
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("instance-probe");
        cmd.current_dir(&self.local)
            .env("HOME", &self.home)
            .env("PROBE_CONFIG_PATH", self.home.join("absent.toml"))
            .env("PROBE_WORKING_COPY", &self.local)
            .env("PROBE_SETTINGS_PATH", "etc/settings.yml")
            .env("PROBE_IN_CONTAINER", "0")
            .env_remove("PROBE_INSTANCE_ROOT")
            .env_remove("PROBE_HOME")
            .env_remove("PROBE_TRACKED_POLICY")
            .env_remove("PROBE_TRACKED_FILES")
            .env_remove("PROBE_RUNTIME_MARKER")
            .env_remove("PROBE_PUBLIC_URL");
        cmd
    }

    pub fn cmd_with_instance(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.env("PROBE_INSTANCE_ROOT", &self.inst);
        cmd
    }
}
