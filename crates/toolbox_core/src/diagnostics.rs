//! Read-only host diagnostics.
//!
//! Fixed commands, identical on every family. Always run captured.
//! Network checks target a public resolver and can take a while.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnostic {
    Kernel,
    Uptime,
    Memory,
    Disk,
    LoadAverage,
    TopProcesses,
    Connectivity,
    Addresses,
    Ping,
    DnsLookup,
    RouteTrace,
    ListeningSockets,
}

impl Diagnostic {
    pub const ALL: [Diagnostic; 12] = [
        Diagnostic::Kernel,
        Diagnostic::Uptime,
        Diagnostic::Memory,
        Diagnostic::Disk,
        Diagnostic::LoadAverage,
        Diagnostic::TopProcesses,
        Diagnostic::Connectivity,
        Diagnostic::Addresses,
        Diagnostic::Ping,
        Diagnostic::DnsLookup,
        Diagnostic::RouteTrace,
        Diagnostic::ListeningSockets,
    ];

    /// Network troubleshooting set
    pub const NETWORK: [Diagnostic; 5] = [
        Diagnostic::Ping,
        Diagnostic::DnsLookup,
        Diagnostic::RouteTrace,
        Diagnostic::ListeningSockets,
        Diagnostic::Addresses,
    ];

    /// The overview shown on a status page
    pub const SUMMARY: [Diagnostic; 5] = [
        Diagnostic::Kernel,
        Diagnostic::Uptime,
        Diagnostic::Memory,
        Diagnostic::Disk,
        Diagnostic::LoadAverage,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Diagnostic::Kernel => "kernel",
            Diagnostic::Uptime => "uptime",
            Diagnostic::Memory => "memory",
            Diagnostic::Disk => "disk",
            Diagnostic::LoadAverage => "load",
            Diagnostic::TopProcesses => "processes",
            Diagnostic::Connectivity => "connectivity",
            Diagnostic::Addresses => "addresses",
            Diagnostic::Ping => "ping",
            Diagnostic::DnsLookup => "dns",
            Diagnostic::RouteTrace => "route",
            Diagnostic::ListeningSockets => "sockets",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.key() == key.trim())
    }

    pub fn title(&self) -> &'static str {
        match self {
            Diagnostic::Kernel => "Kernel",
            Diagnostic::Uptime => "Uptime",
            Diagnostic::Memory => "Memory",
            Diagnostic::Disk => "Root filesystem",
            Diagnostic::LoadAverage => "Load average",
            Diagnostic::TopProcesses => "Top processes",
            Diagnostic::Connectivity => "Connectivity",
            Diagnostic::Addresses => "IPv4 addresses",
            Diagnostic::Ping => "Ping",
            Diagnostic::DnsLookup => "DNS lookup",
            Diagnostic::RouteTrace => "Route trace",
            Diagnostic::ListeningSockets => "Listening sockets",
        }
    }

    pub fn command(&self) -> &'static str {
        match self {
            Diagnostic::Kernel => "uname -r",
            Diagnostic::Uptime => "uptime -p",
            Diagnostic::Memory => "free -h | grep Mem",
            Diagnostic::Disk => "df -h / | tail -1",
            Diagnostic::LoadAverage => "cat /proc/loadavg",
            Diagnostic::TopProcesses => "ps aux --sort=-%cpu | head -20",
            Diagnostic::Connectivity => "ping -c 1 -W 1 8.8.8.8",
            Diagnostic::Addresses => "ip -4 addr show | grep 'inet ' | grep -v '127.0.0.1'",
            Diagnostic::Ping => "ping -c 4 8.8.8.8",
            Diagnostic::DnsLookup => "nslookup google.com 8.8.8.8",
            Diagnostic::RouteTrace => "traceroute 8.8.8.8",
            Diagnostic::ListeningSockets => "ss -tulpn",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keys() {
        for d in Diagnostic::ALL {
            assert_eq!(Diagnostic::parse(d.key()), Some(d));
        }
        assert_eq!(Diagnostic::parse("gpu"), None);
    }

    #[test]
    fn test_network_set() {
        assert_eq!(Diagnostic::parse("dns"), Some(Diagnostic::DnsLookup));
        assert_eq!(Diagnostic::Ping.command(), "ping -c 4 8.8.8.8");
        assert_eq!(Diagnostic::RouteTrace.command(), "traceroute 8.8.8.8");
        assert_eq!(Diagnostic::ListeningSockets.command(), "ss -tulpn");
        assert!(Diagnostic::DnsLookup.command().starts_with("nslookup "));
        for d in Diagnostic::NETWORK {
            assert!(Diagnostic::ALL.contains(&d));
            assert!(!Diagnostic::SUMMARY.contains(&d));
        }
    }

    #[test]
    fn test_no_diagnostic_elevates() {
        for d in Diagnostic::ALL {
            assert!(!crate::shell::invokes(d.command(), "sudo"), "{:?}", d);
        }
    }
}
