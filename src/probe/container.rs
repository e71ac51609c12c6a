use serde::Serialize;
use std::env;
use std::fmt;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use crate::probe::util::run_command_with_timeout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AddressFamily {
    #[serde(rename = "IPv4")]
    V4,
    #[serde(rename = "IPv6")]
    V6,
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4 => f.write_str("IPv4"),
            Self::V6 => f.write_str("IPv6"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerAddress {
    pub family: AddressFamily,
    pub address: String,
}

pub trait ContainerProbe {
    fn in_container(&self) -> bool;
    fn addresses(&self) -> Vec<ContainerAddress>;
}

/// Looks at the current host: container marker files, the `container`
/// environment variable, and `ip -o addr show`.
pub struct HostContainerProbe;

fn env_flag(var: &str) -> Option<bool> {
    match env::var(var).ok()?.trim() {
        "1" | "true" | "TRUE" | "yes" | "on" => Some(true),
        "0" | "false" | "FALSE" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ContainerProbe for HostContainerProbe {
    fn in_container(&self) -> bool {
        if let Some(forced) = env_flag("PROBE_IN_CONTAINER") {
            return forced;
        }
        if env::var("container").is_ok_and(|v| !v.trim().is_empty()) {
            return true;
        }
        Path::new("/.dockerenv").exists() || Path::new("/run/.containerenv").exists()
    }

    fn addresses(&self) -> Vec<ContainerAddress> {
        let Ok(ip) = which::which("ip") else {
            return Vec::new();
        };
        let mut cmd = Command::new(ip);
        cmd.args(["-o", "addr", "show"]);
        match run_command_with_timeout(&mut cmd, Duration::from_secs(5)) {
            Ok(out) if out.status.success() => parse_ip_addr(&String::from_utf8_lossy(&out.stdout)),
            _ => Vec::new(),
        }
    }
}

/// Parses one-line-per-address output such as
/// `2: eth0    inet 10.0.3.12/24 brd 10.0.3.255 scope global eth0`.
pub fn parse_ip_addr(raw: &str) -> Vec<ContainerAddress> {
    let mut out = Vec::new();
    for line in raw.lines() {
        let mut fields = line.split_whitespace();
        let Some(iface) = fields.nth(1) else {
            continue;
        };
        if iface == "lo" {
            continue;
        }
        let family = match fields.next() {
            Some("inet") => AddressFamily::V4,
            Some("inet6") => AddressFamily::V6,
            _ => continue,
        };
        let Some(cidr) = fields.next() else {
            continue;
        };
        let address = cidr.split('/').next().unwrap_or(cidr).to_string();
        out.push(ContainerAddress { family, address });
    }
    out
}
