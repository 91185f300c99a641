//! Shell command execution.

use super::ExecutionShim;
use crate::tools::ToolError;
use serde::Serialize;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;

/// Captured result of a shell command that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShellOutput {
    /// Standard output, capped with a truncation marker
    pub stdout: String,
    /// Standard error, capped with a truncation marker
    pub stderr: String,
    /// Exit code, or -1 if the process was killed by a signal
    pub exit_code: i32,
    /// Whether either stream was truncated
    pub truncated: bool,
}

impl ShellOutput {
    /// Returns true if the command exited with status zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Combines both streams into the text handed back to the model.
    #[must_use]
    pub fn render(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (true, true) => "(no output)".to_string(),
            (false, true) => self.stdout.clone(),
            (true, false) => format!("[stderr]\n{}", self.stderr),
            (false, false) => format!("{}\n[stderr]\n{}", self.stdout, self.stderr),
        }
    }
}

/// How long output is still read after the shell itself has exited.
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Bytes kept from a stream plus the total length seen.
struct Captured {
    kept: Vec<u8>,
    total: usize,
    /// Reading stopped while something still held the pipe open
    detached: bool,
}

impl ExecutionShim {
    /// Runs `command` with the configured shell.
    ///
    /// `cwd` resolves against the workspace root (default: the root itself).
    /// The command gets its own process group; if it outlives `timeout`
    /// (clamped to the configured maximum) the whole group is killed.
    /// Background jobs that outlive the shell are left running, but their
    /// output is no longer captured once the shell has exited.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the working directory does not exist,
    /// `Timeout` if the command ran too long, and `ExecutionFailed` if the
    /// shell could not be spawned or waited on.
    pub async fn run_shell(
        &self,
        command: &str,
        cwd: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<ShellOutput, ToolError> {
        let dir = cwd.map_or_else(|| self.root().to_path_buf(), |dir| self.resolve(dir));
        if !dir.is_dir() {
            return Err(ToolError::not_found(dir));
        }

        let limit = self.effective_timeout(timeout);
        let cap = self.config().max_output_bytes;
        let shell = &self.config().shell;

        let mut std_command = std::process::Command::new(shell);
        std_command
            .arg("-c")
            .arg(command)
            .current_dir(&dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_command.process_group(0);
        }

        let mut child = tokio::process::Command::from(std_command)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ToolError::execution_failed("run_shell", format!("failed to spawn {shell}: {e}"))
            })?;
        let pid = child.id();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        tracing::debug!(command, cwd = %dir.display(), timeout_secs = limit.as_secs(), "Spawned shell command");
        let started = Instant::now();

        // Background jobs can hold the pipes open after the shell exits, so the
        // shell's exit decides completion and the readers get a short grace period.
        let (exited_tx, exited_rx) = watch::channel(false);
        let out_task = tokio::spawn(read_capped(stdout, cap, exited_rx.clone()));
        let err_task = tokio::spawn(read_capped(stderr, cap, exited_rx));

        let status = match tokio::time::timeout(limit, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                kill_process_group(pid, &mut child);
                exited_tx.send_replace(true);
                return Err(ToolError::execution_failed(
                    "run_shell",
                    format!("process error: {e}"),
                ));
            }
            Err(_) => {
                kill_process_group(pid, &mut child);
                let _ = child.wait().await;
                exited_tx.send_replace(true);
                tracing::warn!(command, timeout_secs = limit.as_secs(), "Shell command timed out; process group killed");
                return Err(ToolError::timeout(limit));
            }
        };
        exited_tx.send_replace(true);

        let (out, err) = tokio::join!(out_task, err_task);
        let (out, err) = (join_reader(out)?, join_reader(err)?);
        let truncated = out.total > cap || err.total > cap;
        let output = ShellOutput {
            stdout: render_capped(&out.kept, out.total, cap),
            stderr: render_capped(&err.kept, err.total, cap),
            exit_code: status.code().unwrap_or(-1),
            truncated,
        };
        if out.detached || err.detached {
            tracing::debug!(command, "Background processes still hold the output pipes; stopped capturing");
        }
        tracing::debug!(
            exit_code = output.exit_code,
            truncated,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Shell command finished"
        );
        Ok(output)
    }
}

fn join_reader(
    joined: Result<std::io::Result<Captured>, tokio::task::JoinError>,
) -> Result<Captured, ToolError> {
    match joined {
        Ok(Ok(captured)) => Ok(captured),
        Ok(Err(e)) => Err(ToolError::execution_failed(
            "run_shell",
            format!("failed to read output: {e}"),
        )),
        Err(e) => Err(ToolError::execution_failed(
            "run_shell",
            format!("output reader failed: {e}"),
        )),
    }
}

/// Reads a stream until EOF, or until `DRAIN_GRACE` after the shell exited.
///
/// Keeps at most `cap` bytes but counts all of them.
async fn read_capped<R>(
    stream: Option<R>,
    cap: usize,
    mut exited: watch::Receiver<bool>,
) -> std::io::Result<Captured>
where
    R: AsyncRead + Unpin,
{
    let mut captured = Captured {
        kept: Vec::new(),
        total: 0,
        detached: false,
    };
    let Some(mut stream) = stream else {
        return Ok(captured);
    };

    let give_up = async move {
        let _ = exited.wait_for(|done| *done).await;
        tokio::time::sleep(DRAIN_GRACE).await;
    };
    tokio::pin!(give_up);

    let mut chunk = [0u8; 8192];
    loop {
        let n = tokio::select! {
            read = stream.read(&mut chunk) => read?,
            () = &mut give_up => {
                captured.detached = true;
                break;
            }
        };
        if n == 0 {
            break;
        }
        let room = cap.saturating_sub(captured.kept.len());
        captured.kept.extend_from_slice(&chunk[..n.min(room)]);
        captured.total += n;
    }
    Ok(captured)
}

/// Decodes captured bytes, appending a marker when `total` exceeded `cap`.
///
/// Truncated text is cut back to the last newline when there is one.
pub(crate) fn render_capped(kept: &[u8], total: usize, cap: usize) -> String {
    if total <= cap {
        return String::from_utf8_lossy(kept).into_owned();
    }
    let cut = kept
        .iter()
        .rposition(|&b| b == b'\n')
        .unwrap_or(kept.len());
    format!(
        "{}\n\n... (output truncated, {total} bytes total)",
        String::from_utf8_lossy(&kept[..cut])
    )
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>, child: &mut tokio::process::Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    match pid.and_then(|pid| i32::try_from(pid).ok()) {
        Some(pid) => {
            if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
                tracing::warn!(pid, error = %e, "killpg failed; killing shell only");
                let _ = child.start_kill();
            }
        }
        None => {
            let _ = child.start_kill();
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>, child: &mut tokio::process::Child) {
    let _ = child.start_kill();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shim::ShimConfig;
    use tempfile::TempDir;

    fn shim(dir: &TempDir) -> ExecutionShim {
        ExecutionShim::new(ShimConfig::new(dir.path()))
    }

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let dir = TempDir::new().unwrap();
        let output = shim(&dir)
            .run_shell("echo 'hello world'", None, None)
            .await
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "hello world\n");
        assert!(output.stderr.is_empty());
        assert!(!output.truncated);
    }

    #[tokio::test]
    async fn separates_stderr() {
        let dir = TempDir::new().unwrap();
        let output = shim(&dir)
            .run_shell("echo out; echo err >&2; exit 42", None, None)
            .await
            .unwrap();
        assert_eq!(output.exit_code, 42);
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert_eq!(output.render(), "out\n\n[stderr]\nerr\n");
    }

    #[tokio::test]
    async fn runs_in_workspace_root_by_default() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
        let output = shim(&dir).run_shell("ls", None, None).await.unwrap();
        assert!(output.stdout.contains("marker.txt"));
    }

    #[tokio::test]
    async fn relative_cwd_resolves_against_root() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let output = shim(&dir)
            .run_shell("basename \"$PWD\"", Some("sub"), None)
            .await
            .unwrap();
        assert_eq!(output.stdout.trim(), "sub");
    }

    #[tokio::test]
    async fn missing_cwd_is_not_found() {
        let dir = TempDir::new().unwrap();
        let error = shim(&dir)
            .run_shell("true", Some("nope"), None)
            .await
            .unwrap_err();
        assert_eq!(error.code(), crate::tools::ToolErrorCode::NotFound);
    }

    #[tokio::test]
    async fn output_is_capped_with_marker() {
        let dir = TempDir::new().unwrap();
        let shim = ExecutionShim::new(ShimConfig::new(dir.path()).with_max_output_bytes(1024));
        let output = shim
            .run_shell("head -c 100000 /dev/zero | tr '\\0' 'a'", None, None)
            .await
            .unwrap();
        assert!(output.truncated);
        assert!(output.stdout.len() < 1200);
        assert!(output.stdout.contains("output truncated, 100000 bytes total"));
    }

    #[tokio::test]
    async fn timeout_kills_process_group() {
        let dir = TempDir::new().unwrap();
        let started = Instant::now();
        let error = shim(&dir)
            .run_shell("sleep 10 & sleep 10", None, Some(Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert!(error.is_timeout());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn background_job_does_not_hold_the_result() {
        let dir = TempDir::new().unwrap();
        let started = Instant::now();
        let output = shim(&dir)
            .run_shell("echo started; sleep 30 &", None, Some(Duration::from_secs(3)))
            .await
            .unwrap();
        assert_eq!(output.exit_code, 0);
        assert_eq!(output.stdout, "started\n");
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn background_job_keeps_the_exit_code() {
        let dir = TempDir::new().unwrap();
        let output = shim(&dir)
            .run_shell("sleep 30 & echo failing >&2; exit 3", None, Some(Duration::from_secs(3)))
            .await
            .unwrap();
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stderr, "failing\n");
    }

    #[test]
    fn render_capped_cuts_at_newline() {
        let text = render_capped(b"line one\nline tw", 100, 16);
        assert!(text.starts_with("line one\n\n..."));
        assert!(text.ends_with("(output truncated, 100 bytes total)"));
        assert_eq!(render_capped(b"short", 5, 16), "short");
    }

    #[test]
    fn render_with_no_output() {
        let output = ShellOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
            truncated: false,
        };
        assert_eq!(output.render(), "(no output)");
    }
}
