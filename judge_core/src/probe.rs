use std::io;
use std::path::Path;

use crate::error::Result;

/// Handle on a spawned child that reaps it with `wait4` so the kernel's
/// resource accounting (cpu time, peak RSS) comes back with the exit status.
pub struct ProcessProbe {
    pid: u32,
}

impl ProcessProbe {
    pub fn new(pid: u32) -> Result<Self> {
        let proc_path = format!("/proc/{}", pid);
        if !Path::new(&proc_path).exists() {
            let err = io::Error::new(io::ErrorKind::NotFound, "process does not exists");
            return Err(err.into());
        }
        Ok(Self { pid })
    }

    /// Blocks until the process has exited but leaves it unreaped, so its pid
    /// and process group id stay reserved until [`ProcessProbe::watching`].
    pub fn wait_exit(&self) -> Result<()> {
        // SAFETY: siginfo_t is plain old data, all-zero is a valid value.
        let mut info: libc::siginfo_t = unsafe { std::mem::zeroed() };
        loop {
            // SAFETY: the out-pointer refers to a live local.
            let ret = unsafe {
                libc::waitid(
                    libc::P_PID,
                    self.pid as libc::id_t,
                    &mut info,
                    libc::WEXITED | libc::WNOWAIT,
                )
            };
            if ret == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err.into());
            }
        }
    }

    /// Wait the process to stop and get whole usage status
    pub fn watching(&self) -> Result<ProcessBio> {
        let mut status: libc::c_int = 0;
        // SAFETY: rusage is plain old data, all-zero is a valid value.
        let mut ru: libc::rusage = unsafe { std::mem::zeroed() };
        loop {
            // SAFETY: both out-pointers refer to live locals.
            let ret = unsafe { libc::wait4(self.pid as libc::pid_t, &mut status, 0, &mut ru) };
            if ret >= 0 {
                break;
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err.into());
            }
        }

        let (exit_code, signal) = if libc::WIFEXITED(status) {
            (Some(libc::WEXITSTATUS(status)), None)
        } else if libc::WIFSIGNALED(status) {
            (None, Some(libc::WTERMSIG(status)))
        } else {
            (None, None)
        };

        Ok(ProcessBio {
            exit_code,
            signal,
            utime: (ru.ru_utime.tv_sec * 1000 + ru.ru_utime.tv_usec / 1000) as u64,
            stime: (ru.ru_stime.tv_sec * 1000 + ru.ru_stime.tv_usec / 1000) as u64,
            maxrss: ru.ru_maxrss as u64,
        })
    }
}

/// Sends SIGKILL to the whole process group led by `pid`. The child must have
/// been spawned as a group leader.
pub fn kill_group(pid: u32) -> bool {
    // SAFETY: kill has no memory-safety preconditions.
    unsafe { libc::kill(-(pid as libc::pid_t), libc::SIGKILL) == 0 }
}

#[derive(Debug, Clone, Copy)]
pub struct ProcessBio {
    exit_code: Option<i32>,
    signal: Option<i32>,
    utime: u64,
    stime: u64,
    maxrss: u64,
}

impl ProcessBio {
    /// Get cpu time usage(ms), user plus system.
    pub fn get_time_usage(&self) -> u64 {
        self.utime + self.stime
    }

    /// Exit code when the process exited normally.
    pub fn get_exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Terminating signal when the process was killed.
    pub fn get_signal(&self) -> Option<i32> {
        self.signal
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Peak resident set size(KB).
    pub fn get_peak_memory(&self) -> u64 {
        self.maxrss
    }
}
