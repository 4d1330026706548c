pub mod backend;
pub mod compare;
pub mod config;
pub mod error;
pub mod judge;
pub mod probe;
pub mod problem;
pub mod store;
pub mod strategy;
pub mod submission;
pub mod verdict;

use serde::{Deserialize, Serialize};

/// Everything a backend needs to run one submission: the program and one
/// stdin payload per test case, in case order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub code: String,
    pub language: String,
    pub inputs: Vec<String>,
}

/// Raw outcome of running a submission. On [`ExecutionStatus::Success`]
/// `outputs` has exactly one entry per input, in input order; otherwise it
/// must not be indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub message: String,
    pub outputs: Vec<String>,
    /// milliseconds
    pub time: u64,
    /// kilobytes
    pub memory: u64,
    /// A case was stopped for running too long: killed by the local
    /// watchdog, or reported as over the time limit by the remote service.
    #[serde(default)]
    pub time_limit_exceeded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Success,
    JudgeMismatch,
    SystemError,
}

impl ExecutionResult {
    pub fn success(outputs: Vec<String>, time: u64, memory: u64) -> Self {
        Self {
            status: ExecutionStatus::Success,
            message: String::new(),
            outputs,
            time,
            memory,
            time_limit_exceeded: false,
        }
    }

    pub fn mismatch(message: impl Into<String>, outputs: Vec<String>, time: u64, memory: u64) -> Self {
        Self {
            status: ExecutionStatus::JudgeMismatch,
            message: message.into(),
            outputs,
            time,
            memory,
            time_limit_exceeded: false,
        }
    }

    pub fn system_error(message: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::SystemError,
            message: message.into(),
            outputs: Vec::new(),
            time: 0,
            memory: 0,
            time_limit_exceeded: false,
        }
    }

    pub fn with_time_limit_exceeded(mut self) -> Self {
        self.time_limit_exceeded = true;
        self
    }

    pub fn is_system_error(&self) -> bool {
        self.status == ExecutionStatus::SystemError
    }
}
