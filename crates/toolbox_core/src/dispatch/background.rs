//! Captured background runs with a hard timeout.
//!
//! The command runs under `sh -c` in its own process group so a timeout can
//! take down everything it started, not just the shell.

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// How a captured run ended
#[derive(Debug)]
pub enum CapturedOutcome {
    /// Process exited on its own
    Exited {
        success: bool,
        /// None when terminated by a signal
        code: Option<i32>,
        stdout: String,
        stderr: String,
        duration: Duration,
    },
    /// Deadline passed; the process group was killed and reaped
    TimedOut { limit: Duration },
    /// The interpreter could not be started or waited on
    Failed(io::Error),
}

/// Interpreter used for captured runs unless another is configured
pub const DEFAULT_INTERPRETER: &str = "sh";

/// Run `command` under the default interpreter
pub async fn run_captured(command: &str, limit: Duration) -> CapturedOutcome {
    run_with(Path::new(DEFAULT_INTERPRETER), command, limit).await
}

/// Run `command` to completion via `interpreter -c`, capturing output,
/// bounded by `limit`
pub async fn run_with(interpreter: &Path, command: &str, limit: Duration) -> CapturedOutcome {
    let start = Instant::now();
    let mut child = match Command::new(interpreter)
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return CapturedOutcome::Failed(e),
    };

    let pid = child.id();
    debug!("Spawned background pid {:?}: {}", pid, command);

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let collected = tokio::time::timeout(limit, async {
        tokio::try_join!(read_pipe(stdout), read_pipe(stderr), child.wait())
    })
    .await;

    match collected {
        Ok(Ok((stdout, stderr, status))) => CapturedOutcome::Exited {
            success: status.success(),
            code: status.code(),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            duration: start.elapsed(),
        },
        Ok(Err(e)) => {
            terminate(&mut child, pid).await;
            CapturedOutcome::Failed(e)
        }
        Err(_) => {
            warn!("Background command exceeded {:?}, killing pid {:?}", limit, pid);
            terminate(&mut child, pid).await;
            CapturedOutcome::TimedOut { limit }
        }
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Kill the whole process group, then kill and reap the shell itself
async fn terminate(child: &mut Child, pid: Option<u32>) {
    if let Some(pid) = pid.and_then(|p| i32::try_from(p).ok()) {
        if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
            debug!("killpg({}) failed: {}", pid, e);
        }
    }
    if let Err(e) = child.kill().await {
        debug!("Reaping background child failed: {}", e);
    }
}
