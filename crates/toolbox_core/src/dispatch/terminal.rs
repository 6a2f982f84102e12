//! Terminal emulator probing and launch.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::shell;

/// Printed once the wrapped command has finished
pub const COMPLETION_MARKER: &str = "[linux-toolbox] Finished";

/// Prompt shown before the terminal window closes
pub const CLOSE_PROMPT: &str = "Press Enter to close...";

/// Terminal emulators the toolbox can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminalEmulator {
    Konsole,
    GnomeTerminal,
    Xfce4Terminal,
    Xterm,
    Alacritty,
    Kitty,
}

impl TerminalEmulator {
    /// Default preference: desktop terminals, then bare xterm, then GPU terminals
    pub const PREFERENCE: [TerminalEmulator; 6] = [
        TerminalEmulator::Konsole,
        TerminalEmulator::GnomeTerminal,
        TerminalEmulator::Xfce4Terminal,
        TerminalEmulator::Xterm,
        TerminalEmulator::Alacritty,
        TerminalEmulator::Kitty,
    ];

    pub fn binary(&self) -> &'static str {
        match self {
            TerminalEmulator::Konsole => "konsole",
            TerminalEmulator::GnomeTerminal => "gnome-terminal",
            TerminalEmulator::Xfce4Terminal => "xfce4-terminal",
            TerminalEmulator::Xterm => "xterm",
            TerminalEmulator::Alacritty => "alacritty",
            TerminalEmulator::Kitty => "kitty",
        }
    }

    pub fn from_binary(name: &str) -> Option<Self> {
        Self::PREFERENCE
            .iter()
            .copied()
            .find(|t| t.binary() == name.trim())
    }

    /// Arguments that introduce the program to run
    fn exec_args(&self) -> &'static [&'static str] {
        match self {
            TerminalEmulator::Konsole | TerminalEmulator::Xterm | TerminalEmulator::Alacritty => {
                &["-e"]
            }
            TerminalEmulator::GnomeTerminal => &["--"],
            TerminalEmulator::Xfce4Terminal => &["-x"],
            TerminalEmulator::Kitty => &[],
        }
    }

    /// Full argument list after the binary for running `script` in bash
    pub fn launch_args(&self, script: &str) -> Vec<String> {
        let mut args: Vec<String> = self.exec_args().iter().map(|a| a.to_string()).collect();
        args.push("bash".to_string());
        args.push("-c".to_string());
        args.push(script.to_string());
        args
    }

    /// Spawn the emulator at `program` and return without waiting on it
    pub fn launch(&self, program: &Path, script: &str) -> std::io::Result<Option<u32>> {
        let child = Command::new(program)
            .args(self.launch_args(script))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        // Dropped without kill_on_drop: the session outlives us and tokio reaps it
        Ok(child.id())
    }
}

impl std::fmt::Display for TerminalEmulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.binary())
    }
}

/// Script run inside the terminal: the command, a marker, then a pause
pub fn wrap_for_terminal(command: &str, title: &str) -> String {
    let marker = format!("{}: {}", COMPLETION_MARKER, title);
    format!(
        "{}\necho\necho {}\nread -r -p {} _",
        command,
        shell::quote(&marker),
        shell::quote(CLOSE_PROMPT)
    )
}

/// First terminal in `preference` the probe reports as installed
pub fn select_terminal(
    preference: &[TerminalEmulator],
    probe: &dyn BinaryProbe,
) -> Option<TerminalEmulator> {
    preference.iter().copied().find(|t| probe.exists(t.binary()))
}

/// Existence check for an executable by name
pub trait BinaryProbe: Send + Sync {
    fn exists(&self, binary: &str) -> bool;

    /// Path to spawn for `binary`; the bare name leaves lookup to the OS
    fn locate(&self, binary: &str) -> Option<PathBuf> {
        self.exists(binary).then(|| PathBuf::from(binary))
    }
}

/// Looks binaries up on a search path
#[derive(Debug, Clone, Default)]
pub struct PathProbe {
    dirs: Vec<PathBuf>,
}

impl PathProbe {
    /// Use the process `PATH`
    pub fn from_env() -> Self {
        let dirs = env::var_os("PATH")
            .map(|paths| env::split_paths(&paths).collect())
            .unwrap_or_default();
        Self { dirs }
    }

    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }
}

impl BinaryProbe for PathProbe {
    fn exists(&self, binary: &str) -> bool {
        self.locate(binary).is_some()
    }

    fn locate(&self, binary: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(binary))
            .find(|path| is_executable(path))
    }
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Fixed answer set, for hosts without a usable PATH and for tests
#[derive(Debug, Clone, Default)]
pub struct FixedProbe {
    present: HashSet<String>,
}

impl FixedProbe {
    pub fn new<I, S>(binaries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            present: binaries.into_iter().map(Into::into).collect(),
        }
    }

    /// Nothing installed
    pub fn none() -> Self {
        Self::default()
    }
}

impl BinaryProbe for FixedProbe {
    fn exists(&self, binary: &str) -> bool {
        self.present.contains(binary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_select_follows_preference_order() {
        let probe = FixedProbe::new(["kitty", "xterm", "gnome-terminal"]);
        assert_eq!(
            select_terminal(&TerminalEmulator::PREFERENCE, &probe),
            Some(TerminalEmulator::GnomeTerminal)
        );

        let probe = FixedProbe::new(["kitty", "alacritty"]);
        assert_eq!(
            select_terminal(&TerminalEmulator::PREFERENCE, &probe),
            Some(TerminalEmulator::Alacritty)
        );
    }

    #[test]
    fn test_select_none_available() {
        assert_eq!(select_terminal(&TerminalEmulator::PREFERENCE, &FixedProbe::none()), None);
    }

    #[test]
    fn test_custom_preference_wins() {
        let probe = FixedProbe::new(["konsole", "kitty"]);
        let preference = [TerminalEmulator::Kitty, TerminalEmulator::Konsole];
        assert_eq!(select_terminal(&preference, &probe), Some(TerminalEmulator::Kitty));
    }

    #[test]
    fn test_launch_args_per_emulator() {
        let args = TerminalEmulator::GnomeTerminal.launch_args("ls");
        assert_eq!(args, vec!["--", "bash", "-c", "ls"]);

        let args = TerminalEmulator::Kitty.launch_args("ls");
        assert_eq!(args, vec!["bash", "-c", "ls"]);

        let args = TerminalEmulator::Xfce4Terminal.launch_args("ls");
        assert_eq!(args[0], "-x");
    }

    #[test]
    fn test_wrap_runs_command_then_pauses() {
        let script = wrap_for_terminal("sudo pacman -Syu", "System update");
        let lines: Vec<&str> = script.lines().collect();
        assert_eq!(lines[0], "sudo pacman -Syu");
        assert!(lines[2].contains(COMPLETION_MARKER));
        assert!(lines[2].contains("System update"));
        assert!(lines[3].starts_with("read "));
    }

    #[test]
    fn test_wrap_quotes_title() {
        let script = wrap_for_terminal("true", "it's done");
        assert!(script.contains(r"it'\''s done"));
    }

    #[test]
    fn test_path_probe_requires_exec_bit() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("konsole");
        let plain = dir.path().join("xterm");
        fs::write(&exe, "#!/bin/sh\n").unwrap();
        fs::write(&plain, "").unwrap();
        fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();
        fs::set_permissions(&plain, fs::Permissions::from_mode(0o644)).unwrap();

        let probe = PathProbe::with_dirs(vec![dir.path().to_path_buf()]);
        assert!(probe.exists("konsole"));
        assert!(!probe.exists("xterm"));
        assert!(!probe.exists("kitty"));
        assert_eq!(probe.locate("konsole"), Some(exe));
        assert_eq!(probe.locate("xterm"), None);
    }

    #[test]
    fn test_fixed_probe_locates_by_name() {
        let probe = FixedProbe::new(["xterm"]);
        assert_eq!(probe.locate("xterm"), Some(PathBuf::from("xterm")));
        assert_eq!(probe.locate("kitty"), None);
    }
}
