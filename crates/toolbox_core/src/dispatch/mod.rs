//! Execution dispatcher.
//!
//! Takes a resolved command and decides, once per call, how to run it:
//! - Interactive terminal: a found emulator runs the command in a visible
//!   window. Fire-and-forget; success means "launched", not "completed".
//! - Captured background: no emulator, so the command runs under `sh -c`
//!   with output captured and a hard timeout.
//!
//! Every call yields exactly one `ExecutionResult`. Nothing is retried.

pub mod background;
pub mod elevation;
pub mod terminal;

use crate::config::EngineConfig;
use crate::host::HostProfile;
use crate::shell::truncate_chars;
use background::CapturedOutcome;
use elevation::Elevation;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use terminal::{BinaryProbe, PathProbe, TerminalEmulator};
use tracing::{error, info, warn};

/// Longest title carried into a message
const MAX_TITLE_CHARS: usize = 80;

/// How a request was carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    InteractiveTerminal,
    CapturedBackground,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::InteractiveTerminal => "interactive terminal",
            ExecutionMode::CapturedBackground => "captured background",
        }
    }
}

/// A resolved command ready to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub resolved_command: String,
    pub display_title: String,
    pub requires_elevation: bool,
}

impl ExecutionRequest {
    pub fn new(
        resolved_command: impl Into<String>,
        display_title: impl Into<String>,
        requires_elevation: bool,
    ) -> Self {
        Self {
            resolved_command: resolved_command.into(),
            display_title: display_title.into(),
            requires_elevation,
        }
    }
}

/// Outcome of one request. `succeeded` is binary; detail lives in `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub succeeded: bool,
    pub message: String,
    pub mode: ExecutionMode,
}

impl ExecutionResult {
    fn new(succeeded: bool, message: String, mode: ExecutionMode) -> Self {
        Self {
            succeeded,
            message,
            mode,
        }
    }

    /// True only for a captured run that exited zero
    pub fn is_verified_success(&self) -> bool {
        self.succeeded && self.mode == ExecutionMode::CapturedBackground
    }
}

pub struct Dispatcher {
    host: Arc<HostProfile>,
    probe: Arc<dyn BinaryProbe>,
    interpreter: PathBuf,
    terminals: Vec<TerminalEmulator>,
    elevation: Elevation,
    timeout: Duration,
    message_limit: usize,
    force_background: bool,
}

impl Dispatcher {
    pub fn new(host: Arc<HostProfile>, config: &EngineConfig) -> Self {
        Self {
            host,
            probe: Arc::new(PathProbe::from_env()),
            interpreter: PathBuf::from(background::DEFAULT_INTERPRETER),
            terminals: config.terminal_preference(),
            elevation: Elevation::new(config.elevation_prefix.clone()),
            timeout: config.background_timeout(),
            message_limit: config.message_limit,
            force_background: config.force_background,
        }
    }

    /// Replace the terminal existence probe
    pub fn with_probe(mut self, probe: impl BinaryProbe + 'static) -> Self {
        self.probe = Arc::new(probe);
        self
    }

    /// Replace the shell used for captured runs
    pub fn with_interpreter(mut self, interpreter: impl Into<PathBuf>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_force_background(mut self, force: bool) -> Self {
        self.force_background = force;
        self
    }

    pub fn elevation(&self) -> &Elevation {
        &self.elevation
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    /// Terminal that would be used right now, if any
    pub fn select_terminal(&self) -> Option<TerminalEmulator> {
        if self.force_background {
            return None;
        }
        terminal::select_terminal(&self.terminals, self.probe.as_ref())
    }

    pub async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        self.execute_command(
            &request.resolved_command,
            &request.display_title,
            request.requires_elevation,
        )
        .await
    }

    /// Elevate if asked, pick a mode, run, classify
    pub async fn execute_command(
        &self,
        command: &str,
        title: &str,
        requires_elevation: bool,
    ) -> ExecutionResult {
        let command = if requires_elevation {
            self.elevation.apply(command)
        } else {
            command.to_string()
        };
        let (title, _) = truncate_chars(title, MAX_TITLE_CHARS);

        match self.select_terminal() {
            Some(terminal) => self.launch_in_terminal(terminal, &command, &title),
            None => {
                info!("No terminal emulator available, running '{}' in background", title);
                self.capture(&command, &title).await
            }
        }
    }

    /// Always capture, never open a terminal. Used for read-only probes.
    pub async fn run_captured(&self, command: &str, title: &str) -> ExecutionResult {
        let (title, _) = truncate_chars(title, MAX_TITLE_CHARS);
        self.capture(command, &title).await
    }

    /// Raw captured outcome, for callers that interpret output themselves
    pub async fn capture_outcome(&self, command: &str) -> CapturedOutcome {
        background::run_with(&self.interpreter, command, self.timeout).await
    }

    fn launch_in_terminal(
        &self,
        terminal: TerminalEmulator,
        command: &str,
        title: &str,
    ) -> ExecutionResult {
        let script = terminal::wrap_for_terminal(command, title);
        let program = self
            .probe
            .locate(terminal.binary())
            .unwrap_or_else(|| PathBuf::from(terminal.binary()));
        match terminal.launch(&program, &script) {
            Ok(pid) => {
                info!("Launched {} (pid {:?}) for '{}'", terminal, pid, title);
                ExecutionResult::new(
                    true,
                    format!(
                        "[{}] {} is running in {}",
                        self.host.distro_name(),
                        title,
                        terminal
                    ),
                    ExecutionMode::InteractiveTerminal,
                )
            }
            Err(e) => {
                error!("Failed to launch {}: {}", terminal, e);
                ExecutionResult::new(
                    false,
                    format!(
                        "{} could not be started: failed to launch {}: {}",
                        title, terminal, e
                    ),
                    ExecutionMode::InteractiveTerminal,
                )
            }
        }
    }

    async fn capture(&self, command: &str, title: &str) -> ExecutionResult {
        let mode = ExecutionMode::CapturedBackground;
        match self.capture_outcome(command).await {
            CapturedOutcome::Exited {
                success: true,
                stdout,
                duration,
                ..
            } => {
                info!("'{}' succeeded in {}ms", title, duration.as_millis());
                let body = self.bound(&stdout);
                ExecutionResult::new(
                    true,
                    format!("{} succeeded\nOutput:\n{}", title, body),
                    mode,
                )
            }
            CapturedOutcome::Exited { code, stderr, .. } => {
                let status = code
                    .map(|c| format!("exit code {}", c))
                    .unwrap_or_else(|| "terminated by signal".to_string());
                warn!("'{}' failed with {}", title, status);
                let body = self.bound(&stderr);
                ExecutionResult::new(
                    false,
                    format!("{} failed ({})\nError:\n{}", title, status, body),
                    mode,
                )
            }
            CapturedOutcome::TimedOut { limit } => ExecutionResult::new(
                false,
                format!("{} timed out after {:?} and was stopped", title, limit),
                mode,
            ),
            CapturedOutcome::Failed(e) => {
                error!("Could not run '{}': {}", title, e);
                ExecutionResult::new(
                    false,
                    format!("{} could not be executed: {}", title, e),
                    mode,
                )
            }
        }
    }

    fn bound(&self, text: &str) -> String {
        let text = text.trim_end();
        if text.is_empty() {
            return "(no output)".to_string();
        }
        let (mut bounded, cut) = truncate_chars(text, self.message_limit);
        if cut {
            bounded.push_str("\n...");
        }
        bounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Instant;
    use terminal::{FixedProbe, COMPLETION_MARKER};

    fn dispatcher(probe: impl BinaryProbe + 'static) -> Dispatcher {
        let host = Arc::new(HostProfile::new("arch", "Arch Linux"));
        Dispatcher::new(host, &EngineConfig::default()).with_probe(probe)
    }

    /// Reports xterm as installed at a path that does not exist
    struct MisplacedXterm;

    impl BinaryProbe for MisplacedXterm {
        fn exists(&self, binary: &str) -> bool {
            binary == "xterm"
        }

        fn locate(&self, binary: &str) -> Option<PathBuf> {
            self.exists(binary).then(|| PathBuf::from("/nonexistent/bin/xterm"))
        }
    }

    /// Install an `xterm` stand-in that records its arguments to `argv`
    fn fake_xterm(dir: &Path) {
        let script = dir.join("xterm");
        fs::write(
            &script,
            "#!/bin/sh\n\
             out=\"$(dirname \"$0\")/argv\"\n\
             for arg in \"$@\"; do printf '%s\\n' \"$arg\"; done > \"$out.tmp\"\n\
             mv \"$out.tmp\" \"$out\"\n",
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_terminal_selection_uses_probe() {
        let d = dispatcher(FixedProbe::new(["xterm", "konsole"]));
        assert_eq!(d.select_terminal(), Some(TerminalEmulator::Konsole));
    }

    #[test]
    fn test_force_background_skips_probe() {
        let d = dispatcher(FixedProbe::new(["konsole"])).with_force_background(true);
        assert_eq!(d.select_terminal(), None);
    }

    #[tokio::test]
    async fn test_background_success_message() {
        let d = dispatcher(FixedProbe::none());
        let result = d.execute_command("printf ok", "Print", false).await;
        assert!(result.succeeded);
        assert!(result.message.contains("ok"));
        assert_eq!(result.mode, ExecutionMode::CapturedBackground);
        assert!(result.is_verified_success());
    }

    #[tokio::test]
    async fn test_background_failure_message() {
        let d = dispatcher(FixedProbe::none());
        let result = d.execute_command("echo bad >&2; exit 1", "Fail", false).await;
        assert!(!result.succeeded);
        assert!(result.message.contains("bad"));
        assert!(result.message.contains("exit code 1"));
    }

    #[tokio::test]
    async fn test_output_is_bounded() {
        let d = dispatcher(FixedProbe::none());
        let result = d
            .execute_command("head -c 5000 /dev/zero | tr '\\0' 'x'", "Long", false)
            .await;
        assert!(result.succeeded);
        let xs = result.message.chars().filter(|c| *c == 'x').count();
        assert_eq!(xs, 500);
        assert!(result.message.ends_with("..."));
    }

    #[tokio::test]
    async fn test_interactive_launch_is_not_verified_success() {
        let dir = tempfile::tempdir().unwrap();
        fake_xterm(dir.path());
        let d = dispatcher(PathProbe::with_dirs(vec![dir.path().to_path_buf()]));

        let result = d.execute_command("pacman -Syu", "Upd", true).await;
        assert!(result.succeeded);
        assert_eq!(result.mode, ExecutionMode::InteractiveTerminal);
        assert!(!result.is_verified_success());
        assert_eq!(result.message, "[Arch Linux] Upd is running in xterm");

        let argv_file = dir.path().join("argv");
        let deadline = Instant::now() + Duration::from_secs(5);
        while !argv_file.exists() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let argv = fs::read_to_string(&argv_file).unwrap();
        let lines: Vec<&str> = argv.lines().collect();
        assert_eq!(&lines[..4], &["-e", "bash", "-c", "sudo pacman -Syu"]);
        assert!(argv.contains(&format!("{}: Upd", COMPLETION_MARKER)));
        assert!(argv.contains("read -r -p"));
    }

    #[tokio::test]
    async fn test_missing_terminal_binary_is_failure() {
        let d = dispatcher(MisplacedXterm);
        let result = d.execute_command("true", "Launch", false).await;
        assert!(!result.succeeded);
        assert_eq!(result.mode, ExecutionMode::InteractiveTerminal);
        assert!(result.message.contains("could not be started"));
        assert!(result.message.contains("xterm"));
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_failure() {
        let d = dispatcher(FixedProbe::none()).with_interpreter("/nonexistent/bin/sh");
        let result = d.execute_command("echo hi", "T", false).await;
        assert!(!result.succeeded);
        assert_eq!(result.mode, ExecutionMode::CapturedBackground);
        assert!(result.message.starts_with("T could not be executed"));
    }

    #[tokio::test]
    async fn test_timeout_is_failure() {
        let d = dispatcher(FixedProbe::none()).with_timeout(Duration::from_millis(300));
        let result = d.execute_command("sleep 20", "Slow", false).await;
        assert!(!result.succeeded);
        assert!(result.message.contains("timed out"));
    }
}
