//! Superuser prefixing.

use crate::shell;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Elevation {
    prefix: String,
}

impl Default for Elevation {
    fn default() -> Self {
        Self::new("sudo")
    }
}

impl Elevation {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().trim().to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The program part of the prefix (`sudo` for `sudo -E`)
    fn program(&self) -> &str {
        self.prefix.split_whitespace().next().unwrap_or("")
    }

    /// Whether `command` already runs the elevation program somewhere
    pub fn is_elevated(&self, command: &str) -> bool {
        shell::invokes(command, self.program())
    }

    /// Prefix `command` unless it is already elevated. Idempotent.
    pub fn apply(&self, command: &str) -> String {
        if self.prefix.is_empty() || self.is_elevated(command) {
            command.to_string()
        } else {
            format!("{} {}", self.prefix, command.trim_start())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_adds_prefix() {
        let elevation = Elevation::default();
        assert_eq!(elevation.apply("fc-cache -fv"), "sudo fc-cache -fv");
    }

    #[test]
    fn test_apply_is_idempotent() {
        let elevation = Elevation::default();
        let once = elevation.apply("updatedb");
        assert_eq!(elevation.apply(&once), once);
        assert_eq!(elevation.apply("sudo pacman -Syu"), "sudo pacman -Syu");
    }

    #[test]
    fn test_inline_elevation_detected() {
        let elevation = Elevation::default();
        let cmd = "echo 'vm.swappiness=10' | sudo tee /etc/sysctl.d/99-swappiness.conf";
        assert_eq!(elevation.apply(cmd), cmd);
    }

    #[test]
    fn test_prefix_with_flags() {
        let elevation = Elevation::new("sudo -E");
        assert_eq!(elevation.apply("make install"), "sudo -E make install");
        assert_eq!(elevation.apply("sudo make install"), "sudo make install");
    }

    #[test]
    fn test_other_prefix_program() {
        let elevation = Elevation::new("doas");
        assert_eq!(elevation.apply("sudo true"), "doas sudo true");
        assert_eq!(elevation.apply("doas true"), "doas true");
    }
}
