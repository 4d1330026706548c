use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::verdict::Verdict;

/// Lifecycle: `Waiting -> Running -> {Accepted, Rejected}`. `Rejected`
/// covers wrong answers, exceeded limits and system errors; the verdict
/// message tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Waiting,
    Running,
    Accepted,
    Rejected,
}

impl SubmissionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SubmissionStatus::Accepted | SubmissionStatus::Rejected)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: u64,
    #[serde(rename = "problemId")]
    pub problem_id: u64,
    pub code: String,
    pub language: String,
    pub status: SubmissionStatus,
    pub verdict: Option<Verdict>,
    #[serde(rename = "createdAt")]
    pub created_at: SystemTime,
    #[serde(rename = "updatedAt")]
    pub updated_at: SystemTime,
}

impl Submission {
    pub fn new(id: u64, problem_id: u64, code: String, language: String) -> Self {
        let now = SystemTime::now();
        Self {
            id,
            problem_id,
            code,
            language,
            status: SubmissionStatus::Waiting,
            verdict: None,
            created_at: now,
            updated_at: now,
        }
    }
}
