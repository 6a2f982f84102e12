//! Host profile detection.
//!
//! Classifies the running host into a package-manager family by reading the
//! `KEY=VALUE` identification file (`/etc/os-release`). Detection never fails:
//! unreadable or malformed data degrades to the `unknown` profile.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default host identification files, tried in order
pub const OS_RELEASE_PATHS: &[&str] = &["/etc/os-release", "/usr/lib/os-release"];

/// Distro id used when detection fails
pub const UNKNOWN_DISTRO_ID: &str = "unknown";

/// Distro name used when the identification data carries none
pub const UNKNOWN_DISTRO_NAME: &str = "Unknown Linux";

static CURRENT: OnceCell<Arc<HostProfile>> = OnceCell::new();

/// Native package-manager family of a distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageFamily {
    Pacman,
    Apt,
    Dnf,
    Zypper,
    Unknown,
}

impl PackageFamily {
    /// All families that carry command templates
    pub const SUPPORTED: [PackageFamily; 4] = [
        PackageFamily::Pacman,
        PackageFamily::Apt,
        PackageFamily::Dnf,
        PackageFamily::Zypper,
    ];

    /// Map a distro id to its family. Adding a distro is one arm here.
    pub fn from_distro_id(id: &str) -> Self {
        match id {
            "arch" => PackageFamily::Pacman,
            "debian" | "ubuntu" => PackageFamily::Apt,
            "centos" | "rhel" | "fedora" => PackageFamily::Dnf,
            "opensuse-leap" | "opensuse-tumbleweed" => PackageFamily::Zypper,
            _ => PackageFamily::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PackageFamily::Pacman => "pacman",
            PackageFamily::Apt => "apt",
            PackageFamily::Dnf => "dnf",
            PackageFamily::Zypper => "zypper",
            PackageFamily::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, PackageFamily::Unknown)
    }
}

impl std::fmt::Display for PackageFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the running host. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostProfile {
    distro_id: String,
    distro_name: String,
    family: PackageFamily,
}

impl Default for HostProfile {
    fn default() -> Self {
        Self::unknown()
    }
}

impl HostProfile {
    /// Build a profile for a known id; the family is derived, never supplied.
    pub fn new(distro_id: impl Into<String>, distro_name: impl Into<String>) -> Self {
        let distro_id = distro_id.into().to_lowercase();
        let family = PackageFamily::from_distro_id(&distro_id);
        Self {
            distro_id,
            distro_name: distro_name.into(),
            family,
        }
    }

    /// The degraded profile used when nothing can be read
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_DISTRO_ID, UNKNOWN_DISTRO_NAME)
    }

    /// Detect from the default identification files
    pub fn detect() -> Self {
        let paths: Vec<PathBuf> = OS_RELEASE_PATHS.iter().map(PathBuf::from).collect();
        Self::detect_from(&paths)
    }

    /// Detect from the first readable file in `paths`
    pub fn detect_from<P: AsRef<Path>>(paths: &[P]) -> Self {
        for path in paths {
            let path = path.as_ref();
            match fs::read_to_string(path) {
                Ok(content) => {
                    let profile = Self::from_os_release(&content);
                    info!(
                        "Detected host {} ({}) from {}, package family: {}",
                        profile.distro_name,
                        profile.distro_id,
                        path.display(),
                        profile.family
                    );
                    return profile;
                }
                Err(e) => debug!("Cannot read {}: {}", path.display(), e),
            }
        }

        warn!("No readable host identification file, using unknown profile");
        Self::unknown()
    }

    /// Parse os-release content. The first `ID=` and first `NAME=` line win.
    pub fn from_os_release(content: &str) -> Self {
        // Outer None: key not seen yet. Inner None: seen with an empty value.
        let mut id: Option<Option<String>> = None;
        let mut name: Option<Option<String>> = None;

        for line in content.lines() {
            let line = line.trim();
            if id.is_none() {
                if let Some(value) = line.strip_prefix("ID=") {
                    id = Some(clean_value(value));
                    continue;
                }
            }
            if name.is_none() {
                if let Some(value) = line.strip_prefix("NAME=") {
                    name = Some(clean_value(value));
                }
            }
        }

        Self::new(
            id.flatten().unwrap_or_else(|| UNKNOWN_DISTRO_ID.to_string()),
            name.flatten().unwrap_or_else(|| UNKNOWN_DISTRO_NAME.to_string()),
        )
    }

    /// Process-wide profile, detected on first use
    pub fn current() -> Arc<HostProfile> {
        CURRENT.get_or_init(|| Arc::new(Self::detect())).clone()
    }

    /// Process-wide profile detected from `paths` if not yet initialised
    pub fn current_from<P: AsRef<Path>>(paths: &[P]) -> Arc<HostProfile> {
        CURRENT
            .get_or_init(|| Arc::new(Self::detect_from(paths)))
            .clone()
    }

    pub fn distro_id(&self) -> &str {
        &self.distro_id
    }

    pub fn distro_name(&self) -> &str {
        &self.distro_name
    }

    pub fn family(&self) -> PackageFamily {
        self.family
    }
}

/// Strip surrounding quotes; empty values count as absent
fn clean_value(raw: &str) -> Option<String> {
    let value = raw.trim().trim_matches('"').trim_matches('\'').trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_family_table() {
        let cases = [
            ("arch", PackageFamily::Pacman),
            ("debian", PackageFamily::Apt),
            ("ubuntu", PackageFamily::Apt),
            ("centos", PackageFamily::Dnf),
            ("rhel", PackageFamily::Dnf),
            ("fedora", PackageFamily::Dnf),
            ("opensuse-leap", PackageFamily::Zypper),
            ("opensuse-tumbleweed", PackageFamily::Zypper),
        ];
        for (id, family) in cases {
            let content = format!("NAME=\"Test\"\nID={}\n", id);
            assert_eq!(HostProfile::from_os_release(&content).family(), family, "id {}", id);
        }
    }

    #[test]
    fn test_unrecognized_ids_are_unknown() {
        for id in ["manjaro", "gentoo", "nixos", "alpine", "", "ARCHLINUX"] {
            let content = format!("ID={}\n", id);
            assert_eq!(
                HostProfile::from_os_release(&content).family(),
                PackageFamily::Unknown,
                "id {:?}",
                id
            );
        }
    }

    #[test]
    fn test_parse_quoted_fields() {
        let content = r#"
NAME="Ubuntu"
VERSION_ID="24.04"
ID=ubuntu
ID_LIKE=debian
PRETTY_NAME="Ubuntu 24.04 LTS"
"#;
        let profile = HostProfile::from_os_release(content);
        assert_eq!(profile.distro_id(), "ubuntu");
        assert_eq!(profile.distro_name(), "Ubuntu");
        assert_eq!(profile.family(), PackageFamily::Apt);
    }

    #[test]
    fn test_first_id_line_wins() {
        let content = "ID=fedora\nNAME=Fedora Linux\nID=arch\nNAME=Arch\n";
        let profile = HostProfile::from_os_release(content);
        assert_eq!(profile.distro_id(), "fedora");
        assert_eq!(profile.distro_name(), "Fedora Linux");
    }

    #[test]
    fn test_empty_first_id_is_not_overridden() {
        let profile = HostProfile::from_os_release("ID=\nNAME=X\nID=arch\n");
        assert_eq!(profile.distro_id(), UNKNOWN_DISTRO_ID);
        assert_eq!(profile.distro_name(), "X");
        assert_eq!(profile.family(), PackageFamily::Unknown);

        let profile = HostProfile::from_os_release("NAME=\"\"\nID=debian\nNAME=Debian\n");
        assert_eq!(profile.distro_name(), UNKNOWN_DISTRO_NAME);
        assert_eq!(profile.family(), PackageFamily::Apt);
    }

    #[test]
    fn test_id_is_lowercased() {
        let profile = HostProfile::from_os_release("ID=\"Debian\"\n");
        assert_eq!(profile.distro_id(), "debian");
        assert_eq!(profile.family(), PackageFamily::Apt);
    }

    #[test]
    fn test_malformed_content_keeps_defaults() {
        let profile = HostProfile::from_os_release("garbage\n=\nID\nNAME\n\0\0");
        assert_eq!(profile, HostProfile::unknown());
        assert_eq!(profile.distro_name(), UNKNOWN_DISTRO_NAME);
    }

    #[test]
    fn test_missing_name_uses_placeholder() {
        let profile = HostProfile::from_os_release("ID=arch\n");
        assert_eq!(profile.distro_name(), UNKNOWN_DISTRO_NAME);
        assert_eq!(profile.family(), PackageFamily::Pacman);
    }

    #[test]
    fn test_detect_from_missing_files() {
        let profile = HostProfile::detect_from(&["/nonexistent/os-release", "/also/missing"]);
        assert_eq!(profile, HostProfile::unknown());
    }

    #[test]
    fn test_detect_from_falls_through_to_second_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "NAME=\"openSUSE Tumbleweed\"").unwrap();
        writeln!(file, "ID=\"opensuse-tumbleweed\"").unwrap();

        let paths = [PathBuf::from("/nonexistent/os-release"), file.path().to_path_buf()];
        let profile = HostProfile::detect_from(&paths);
        assert_eq!(profile.family(), PackageFamily::Zypper);
        assert_eq!(profile.distro_name(), "openSUSE Tumbleweed");
    }
}
