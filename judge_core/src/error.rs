use std::string;
use thiserror::Error;

use crate::submission::SubmissionStatus;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("entity `{0}` not found")]
    NotFound(String),
    #[error("submission {id} is {status:?}, only waiting submissions can be judged")]
    InvalidTransition { id: u64, status: SubmissionStatus },
    #[error("failed to persist {0}")]
    Persistence(String),
    #[error("failed in IO")]
    IO(#[from] std::io::Error),
    #[error("argument provided is error: {0}")]
    Argument(String),
    #[error("environment error: {0}")]
    Environment(String),
    #[error("judge `{judge_name}` error: {msg}")]
    Judge { judge_name: String, msg: String },
    #[error("network error")]
    Request(#[from] reqwest::Error),
    #[error("yaml error")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json error")]
    Json(#[from] serde_json::Error),
    #[error("invalid pattern")]
    Pattern(#[from] regex::Error),
    #[error("bytes is not in UTF8")]
    FromUtf8(#[from] string::FromUtf8Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Errors raised before anything was executed: the request itself was
    /// wrong (unknown ids, a submission that is not waiting, bad arguments).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::InvalidTransition { .. } | Error::Argument(_)
        )
    }

    /// The error followed by its whole `source()` chain, for diagnostics that
    /// end up in a verdict.
    pub fn report(&self) -> String {
        let mut text = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            text.push_str(": ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors() {
        assert!(Error::NotFound("submission 1".into()).is_configuration());
        assert!(Error::InvalidTransition {
            id: 1,
            status: SubmissionStatus::Running
        }
        .is_configuration());
        assert!(!Error::Persistence("verdict".into()).is_configuration());
        assert!(!Error::Environment("missing g++".into()).is_configuration());
    }

    #[test]
    fn report_includes_sources() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused").into();
        assert_eq!(err.report(), "failed in IO: connection refused");
        assert_eq!(Error::Internal("x".into()).report(), "internal error: x");
    }
}
