use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictMessage {
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    SystemError,
}

impl fmt::Display for VerdictMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            VerdictMessage::Accepted => "Accepted",
            VerdictMessage::WrongAnswer => "Wrong Answer",
            VerdictMessage::TimeLimitExceeded => "Time Limit Exceeded",
            VerdictMessage::MemoryLimitExceeded => "Memory Limit Exceeded",
            VerdictMessage::SystemError => "System Error",
        };
        f.write_str(text)
    }
}

/// Judging outcome plus the measured resource usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub message: VerdictMessage,
    /// milliseconds
    pub time: u64,
    /// kilobytes
    pub memory: u64,
    /// Why the verdict was reached: compiler output, first mismatching case,
    /// limit numbers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Verdict {
    pub fn new(message: VerdictMessage, time: u64, memory: u64) -> Self {
        Self {
            message,
            time,
            memory,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn system_error(reason: &str) -> Self {
        Self::new(VerdictMessage::SystemError, 0, 0).with_detail(format!("System Error: {}", reason))
    }

    pub fn is_accepted(&self) -> bool {
        self.message == VerdictMessage::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_error_detail() {
        let verdict = Verdict::system_error("javac: not found");
        assert_eq!(verdict.message, VerdictMessage::SystemError);
        assert_eq!(verdict.detail.as_deref(), Some("System Error: javac: not found"));
        assert!(!verdict.is_accepted());
        assert_eq!(verdict.message.to_string(), "System Error");
    }

    #[test]
    fn serialized_names() -> crate::error::Result<()> {
        let s = serde_yaml::to_string(&Verdict::new(VerdictMessage::TimeLimitExceeded, 1200, 64))?;
        assert!(s.contains("TIME_LIMIT_EXCEEDED"));
        assert!(!s.contains("detail"));
        Ok(())
    }
}
