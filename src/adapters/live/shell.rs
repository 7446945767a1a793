//! Live shell executor with a kill-on-timeout loop.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::ports::shell::{ShellExecutor, ShellOutput};
use crate::ports::PortError;

/// Exit code reported for a process killed at its timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// How long to wait for output readers once a timed-out group is killed.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Live shell executor that runs commands via `sh -c`.
pub struct LiveShellExecutor;

impl ShellExecutor for LiveShellExecutor {
    fn run(&self, command: &str, cwd: &Path, timeout: Duration) -> Result<ShellOutput, PortError> {
        let mut cmd = Command::new("sh");
        cmd.current_dir(cwd).args(["-c", command]);
        Ok(run_with_timeout(cmd, timeout)?)
    }
}

/// Spawns `cmd` with piped output and polls it until it exits or `timeout`
/// elapses, in which case its whole process group is killed and it is
/// reported with exit code 124.
pub(crate) fn run_with_timeout(mut cmd: Command, timeout: Duration) -> std::io::Result<ShellOutput> {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
    let started = Instant::now();
    let mut child = cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped()).spawn()?;

    let stdout = spawn_reader(child.stdout.take());
    let stderr = spawn_reader(child.stderr.take());

    let mut timed_out = false;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if started.elapsed() >= timeout {
            timed_out = true;
            kill_group(&mut child);
            break child.wait()?;
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    // A grandchild that escaped the group may still hold the pipes open.
    let collect = |rx: mpsc::Receiver<Vec<u8>>| {
        if timed_out { rx.recv_timeout(DRAIN_GRACE).unwrap_or_default() } else { rx.recv().unwrap_or_default() }
    };
    let stdout = collect(stdout);
    let stderr = collect(stderr);

    Ok(ShellOutput {
        exit_code: if timed_out { TIMEOUT_EXIT_CODE } else { status.code().unwrap_or(-1) },
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        timed_out,
    })
}

/// Reads `pipe` to the end on its own thread.
fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(buf);
    });
    rx
}

/// Kills the child and every process in its group.
fn kill_group(child: &mut Child) {
    #[cfg(unix)]
    {
        let group = format!("-{}", child.id());
        let killed = Command::new("kill")
            .args(["-KILL", "--", &group])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if let Err(e) = killed {
            tracing::debug!(error = %e, pgid = child.id(), "Failed to signal process group");
        }
    }
    let _ = child.kill();
}
