use std::fmt::Write;

use crate::probe::container::ContainerAddress;
use crate::probe::state::InstallState;

/// Everything the operator report shows, already resolved.
#[derive(Debug, Clone)]
pub struct ReportInput {
    pub settings_path: String,
    pub instance_root: Option<String>,
    pub public_url: String,
    pub state: InstallState,
    /// `Some` only when running inside a container.
    pub container_addresses: Option<Vec<ContainerAddress>>,
}

pub fn render_report(input: &ReportInput) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "instance:");
    let _ = writeln!(out, "  settings:      {}", input.settings_path);
    let _ = writeln!(
        out,
        "  instance root: {}",
        input.instance_root.as_deref().unwrap_or("none")
    );
    let _ = writeln!(out, "  public URL:    {}", input.public_url);
    let _ = writeln!(out, "  install state: {}", input.state);

    if let Some(addresses) = &input.container_addresses {
        let _ = writeln!(out, "container addresses:");
        if addresses.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for addr in addresses {
            let _ = writeln!(out, "  {}: {}", addr.family, addr.address);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::container::AddressFamily;

    fn input() -> ReportInput {
        ReportInput {
            settings_path: "/etc/searxng/settings.yml".to_string(),
            instance_root: None,
            public_url: "http://localhost/".to_string(),
            state: InstallState::MissingClone,
            container_addresses: None,
        }
    }

    #[test]
    fn host_report_has_no_container_block() {
        let text = render_report(&input());
        assert_eq!(
            text,
            "instance:\n  settings:      /etc/searxng/settings.yml\n  instance root: none\n  public URL:    http://localhost/\n  install state: missing-clone\n"
        );
    }

    #[test]
    fn container_report_lists_families() {
        let mut i = input();
        i.instance_root = Some("/usr/local/searx/searx-src".to_string());
        i.state = InstallState::PythonInstalled;
        i.container_addresses = Some(vec![
            ContainerAddress {
                family: AddressFamily::V4,
                address: "10.0.3.12".to_string(),
            },
            ContainerAddress {
                family: AddressFamily::V6,
                address: "fd42::1".to_string(),
            },
        ]);
        let text = render_report(&i);
        assert!(text.contains("instance root: /usr/local/searx/searx-src\n"));
        assert!(text.contains("install state: python-installed\n"));
        assert!(text.ends_with("container addresses:\n  IPv4: 10.0.3.12\n  IPv6: fd42::1\n"));
    }

    #[test]
    fn container_without_addresses_says_none() {
        let mut i = input();
        i.container_addresses = Some(Vec::new());
        assert!(render_report(&i).ends_with("container addresses:\n  (none)\n"));
    }
}
