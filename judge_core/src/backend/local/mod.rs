pub mod isolation;
pub mod process;
pub mod toolchain;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, error, info, warn};

use self::isolation::{Isolation, Unconfined};
use self::process::run_with_watchdog;
use self::toolchain::{Toolchain, ToolchainTable};
use super::ExecutionBackend;
use crate::config::LocalConfig;
use crate::error::Result;
use crate::{ExecutionRequest, ExecutionResult};

/// Compiles and runs submissions as local child processes.
///
/// Every submission gets its own working directory under the work root; it is
/// removed when the run ends, whatever the outcome.
pub struct LocalBackend {
    toolchains: ToolchainTable,
    work_dir: PathBuf,
    timeout: Duration,
    blocked_words: Vec<String>,
    isolation: Box<dyn Isolation>,
}

impl LocalBackend {
    pub fn new(config: &LocalConfig) -> Self {
        Self {
            toolchains: ToolchainTable::new(config.cpp_standard, &config.toolchains),
            work_dir: config.work_dir.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            blocked_words: config.blocked_words.clone(),
            isolation: isolation::from_config(&config.isolation),
        }
    }

    pub fn with_isolation(mut self, isolation: Box<dyn Isolation>) -> Self {
        self.isolation = isolation;
        self
    }

    pub fn toolchains(&self) -> &ToolchainTable {
        &self.toolchains
    }

    fn blocked_word(&self, code: &str) -> Option<&str> {
        self.blocked_words
            .iter()
            .find(|word| !word.is_empty() && code.contains(word.as_str()))
            .map(|word| word.as_str())
    }

    fn run_pipeline(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        let toolchain = self.toolchains.require(&request.language)?;

        if let Some(word) = self.blocked_word(&request.code) {
            warn!("refusing submission containing `{}`", word);
            return Ok(ExecutionResult::mismatch(
                format!("source contains forbidden word `{}`", word),
                Vec::new(),
                0,
                0,
            ));
        }

        fs::create_dir_all(&self.work_dir)?;
        let workspace = tempfile::Builder::new()
            .prefix("submission-")
            .tempdir_in(&self.work_dir)?;
        debug!("working directory {}", workspace.path().display());

        let result = self.judge_in(workspace.path(), toolchain, request);

        let path = workspace.path().to_path_buf();
        if let Err(e) = workspace.close() {
            error!("failed to remove working directory {}: {}", path.display(), e);
        }
        result
    }

    fn judge_in(&self, dir: &Path, toolchain: &Toolchain, request: &ExecutionRequest) -> Result<ExecutionResult> {
        let source = toolchain.save(dir, &request.code)?;

        if let Some(compile) = &toolchain.compile {
            let argv = toolchain.expand(compile, dir, &source);
            let mut command = Unconfined.command(&argv)?;
            command.current_dir(dir);
            let outcome = run_with_watchdog(command, None, self.timeout)?;
            if !outcome.success() {
                let diagnostic = if outcome.timed_out {
                    format!("compilation did not finish within {} ms", self.timeout.as_millis())
                } else if outcome.stderr.trim().is_empty() {
                    outcome.stdout
                } else {
                    outcome.stderr
                };
                info!("compilation failed with {:?}", outcome.exit_code);
                return Ok(ExecutionResult::system_error(diagnostic));
            }
        }

        let argv = toolchain.expand(&toolchain.run, dir, &source);
        let mut outputs = Vec::with_capacity(request.inputs.len());
        let mut max_time = 0;
        let mut max_memory = 0;

        for (index, input) in request.inputs.iter().enumerate() {
            let mut command = self.isolation.command(&argv)?;
            command.current_dir(dir);
            let outcome = run_with_watchdog(command, Some(input), self.timeout)?;

            max_time = max_time.max(outcome.elapsed_ms());
            max_memory = max_memory.max(outcome.peak_memory);
            debug!(
                "case {}: exit {:?}, {} ms, {} KB",
                index + 1,
                outcome.exit_code,
                outcome.elapsed_ms(),
                outcome.peak_memory
            );

            if outcome.timed_out {
                let note = format!("case {} killed after {} ms", index + 1, self.timeout.as_millis());
                warn!("{}", note);
                return Ok(ExecutionResult::mismatch(note, outputs, max_time, max_memory).with_time_limit_exceeded());
            }
            if !outcome.stderr.trim().is_empty() {
                return Ok(ExecutionResult::mismatch(outcome.stderr, outputs, max_time, max_memory));
            }
            outputs.push(outcome.stdout);
        }

        Ok(ExecutionResult::success(outputs, max_time, max_memory))
    }
}

impl ExecutionBackend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        if request.inputs.is_empty() {
            return ExecutionResult::system_error("no inputs");
        }
        match self.run_pipeline(request) {
            Ok(result) => result,
            Err(e) => {
                error!("local execution failed: {}", e.report());
                ExecutionResult::system_error(e.report())
            }
        }
    }
}
