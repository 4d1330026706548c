use std::io::{self, Read, Write};
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::probe::{kill_group, ProcessProbe};

#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Wall time from spawn to exit.
    pub elapsed: Duration,
    /// Peak resident set size(KB).
    pub peak_memory: u64,
    /// The watchdog had to kill the process.
    pub timed_out: bool,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0) && !self.timed_out
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }
}

fn drain(mut pipe: impl Read) -> io::Result<String> {
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn broken_pipe(name: &str) -> Error {
    io::Error::new(io::ErrorKind::BrokenPipe, format!("failed to open {}", name)).into()
}

/// Spawns `command` as a process-group leader, feeds it `stdin` and waits for
/// it. A watchdog thread kills the group once `timeout` elapses; it is
/// cancelled and joined as soon as the process exits, so it never outlives
/// this call.
pub fn run_with_watchdog(mut command: Command, stdin: Option<&str>, timeout: Duration) -> Result<ProcessOutcome> {
    command
        .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0);

    let started = Instant::now();
    let mut child = command.spawn()?;
    let pid = child.id();
    let probe = match ProcessProbe::new(pid) {
        Ok(probe) => probe,
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }
    };

    let cin = child.stdin.take();
    let cout = child.stdout.take().ok_or_else(|| broken_pipe("stdout"))?;
    let cerr = child.stderr.take().ok_or_else(|| broken_pipe("stderr"))?;
    let (cancel, cancelled) = mpsc::channel::<()>();

    thread::scope(|scope| -> Result<ProcessOutcome> {
        let watchdog = scope.spawn(move || match cancelled.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => {
                warn!("process {} still alive after {:?}, killing it", pid, timeout);
                kill_group(pid);
                true
            }
            _ => false,
        });
        let out_reader = scope.spawn(move || drain(cout));
        let err_reader = scope.spawn(move || drain(cerr));

        if let (Some(mut pipe), Some(input)) = (cin, stdin) {
            // the program may exit without reading all of its input
            if let Err(e) = pipe.write_all(input.as_bytes()).and_then(|_| pipe.flush()) {
                debug!("process {} did not take its stdin: {}", pid, e);
            }
        }

        let exited = probe.wait_exit();
        let elapsed = started.elapsed();
        let _ = cancel.send(());
        let timed_out = watchdog
            .join()
            .map_err(|_| Error::Internal("watchdog panicked".into()))?;
        // the unreaped leader keeps the group id reserved; stragglers forked
        // by the program would keep the pipes open
        kill_group(pid);
        let bio = exited.and_then(|_| probe.watching());

        let stdout = out_reader
            .join()
            .map_err(|_| Error::Internal("stdout reader panicked".into()))??;
        let stderr = err_reader
            .join()
            .map_err(|_| Error::Internal("stderr reader panicked".into()))??;
        let bio = bio?;

        debug!(
            "process {} exited with {:?} (signal {:?}) in {:?}, cpu {} ms, rss {} KB",
            pid,
            bio.get_exit_code(),
            bio.get_signal(),
            elapsed,
            bio.get_time_usage(),
            bio.get_peak_memory()
        );

        Ok(ProcessOutcome {
            exit_code: bio.get_exit_code(),
            signal: bio.get_signal(),
            stdout,
            stderr,
            elapsed,
            peak_memory: bio.get_peak_memory(),
            timed_out,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        command
    }

    #[test]
    fn echo_stdin() -> Result<()> {
        let outcome = run_with_watchdog(sh("cat"), Some("hello\nworld\n"), Duration::from_secs(5))?;
        assert!(outcome.success());
        assert_eq!(outcome.stdout, "hello\nworld\n");
        assert!(outcome.stderr.is_empty());
        assert!(!outcome.timed_out);
        Ok(())
    }

    #[test]
    fn capture_stderr_and_exit_code() -> Result<()> {
        let outcome = run_with_watchdog(sh("echo oops >&2; exit 7"), None, Duration::from_secs(5))?;
        assert_eq!(outcome.exit_code, Some(7));
        assert_eq!(outcome.stderr.trim(), "oops");
        assert!(!outcome.success());
        Ok(())
    }

    #[test]
    fn watchdog_kills() -> Result<()> {
        let started = Instant::now();
        let outcome = run_with_watchdog(sh("sleep 30"), None, Duration::from_millis(300))?;
        assert!(outcome.timed_out);
        assert_eq!(outcome.signal, Some(libc::SIGKILL));
        assert!(!outcome.success());
        assert!(started.elapsed() < Duration::from_secs(10));
        Ok(())
    }

    #[test]
    fn watchdog_cancelled_on_exit() -> Result<()> {
        let started = Instant::now();
        let outcome = run_with_watchdog(sh("true"), None, Duration::from_secs(20))?;
        assert!(!outcome.timed_out);
        assert!(started.elapsed() < Duration::from_secs(10));
        Ok(())
    }

    #[test]
    fn ignores_unread_stdin() -> Result<()> {
        let input = "x".repeat(1 << 20);
        let outcome = run_with_watchdog(sh("echo done"), Some(&input), Duration::from_secs(5))?;
        assert_eq!(outcome.stdout.trim(), "done");
        Ok(())
    }

    #[test]
    fn background_children_are_killed() -> Result<()> {
        let started = Instant::now();
        let outcome = run_with_watchdog(sh("sleep 30 & echo started"), None, Duration::from_secs(20))?;
        assert!(!outcome.timed_out);
        assert_eq!(outcome.stdout.trim(), "started");
        assert!(started.elapsed() < Duration::from_secs(10));
        Ok(())
    }

    #[test]
    fn spawn_failure() {
        let result = run_with_watchdog(
            Command::new("/nonexistent/definitely-not-here"),
            None,
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(Error::IO(_))));
    }
}
