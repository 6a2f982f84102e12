//! Pending update check.
//!
//! Counting is only reliable where the package manager prints one upgrade
//! per line (pacman, apt). Other families report `Unavailable`.

use crate::action::Action;
use crate::dispatch::background::CapturedOutcome;
use crate::engine::Engine;
use crate::host::PackageFamily;
use crate::registry::Params;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum UpdateStatus {
    Pending(usize),
    UpToDate,
    Unavailable(String),
}

impl UpdateStatus {
    pub fn summary(&self) -> String {
        match self {
            UpdateStatus::Pending(1) => "1 update available".to_string(),
            UpdateStatus::Pending(n) => format!("{} updates available", n),
            UpdateStatus::UpToDate => "System is up to date".to_string(),
            UpdateStatus::Unavailable(reason) => reason.clone(),
        }
    }
}

/// Count upgrade lines in `check_updates` output for `family`
pub fn count_pending(family: PackageFamily, stdout: &str) -> Option<usize> {
    let lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty());
    match family {
        PackageFamily::Pacman => Some(lines.count()),
        PackageFamily::Apt => Some(lines.filter(|l| !l.starts_with("Listing")).count()),
        _ => None,
    }
}

/// Run `check_updates` for the engine's host and interpret it
pub async fn check(engine: &Engine) -> UpdateStatus {
    let host = engine.detect_host();
    let family = host.family();

    if !matches!(family, PackageFamily::Pacman | PackageFamily::Apt) {
        return UpdateStatus::Unavailable(format!(
            "[{}] Update counting is not available here; run the system update instead",
            host.distro_name()
        ));
    }

    let command = match engine.registry().resolve(Action::CheckUpdates, host, &Params::new()) {
        Ok(command) => command,
        Err(e) => return UpdateStatus::Unavailable(e.to_string()),
    };

    debug!("Checking updates with: {}", command);
    match engine.dispatcher().capture_outcome(&command).await {
        CapturedOutcome::Exited { success, code, stdout, stderr, .. } => {
            // pacman -Qu exits 1 with no output when nothing is pending
            let pacman_idle =
                family == PackageFamily::Pacman && code == Some(1) && stdout.trim().is_empty();
            if !success && !pacman_idle {
                return UpdateStatus::Unavailable(format!("Update check failed: {}", stderr.trim()));
            }
            match count_pending(family, &stdout) {
                Some(0) | None => UpdateStatus::UpToDate,
                Some(n) => {
                    info!("{} pending updates", n);
                    UpdateStatus::Pending(n)
                }
            }
        }
        CapturedOutcome::TimedOut { limit } => {
            UpdateStatus::Unavailable(format!("Update check timed out after {:?}", limit))
        }
        CapturedOutcome::Failed(e) => {
            UpdateStatus::Unavailable(format!("Update check failed: {}", e))
        }
    }
}
