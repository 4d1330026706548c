use std::time::{Duration, SystemTime};

use log::{error, info, warn};

use crate::backend::{BackendSelector, ExecutionBackend, LoggingProxy};
use crate::config::JudgeConfig;
use crate::error::{Error, Result};
use crate::store::SubmissionStore;
use crate::strategy::StrategyRegistry;
use crate::submission::{Submission, SubmissionStatus};
use crate::verdict::Verdict;
use crate::ExecutionRequest;

/// Drives one submission from WAITING to ACCEPTED or REJECTED.
///
/// `judge` runs on the caller's thread; different submissions may be judged
/// from several threads at once.
pub struct Judge<S> {
    store: S,
    backend: Box<dyn ExecutionBackend>,
    strategies: StrategyRegistry,
}

impl<S: SubmissionStore> Judge<S> {
    /// Every backend call goes through a [`LoggingProxy`].
    pub fn new<B: ExecutionBackend + 'static>(store: S, backend: B, strategies: StrategyRegistry) -> Self {
        Self {
            store,
            backend: Box::new(LoggingProxy::new(backend)),
            strategies,
        }
    }

    pub fn from_config(store: S, config: &JudgeConfig) -> Self {
        let backend = BackendSelector::new().from_config(config);
        info!("judging with the `{}` backend", backend.name());
        Self::new(store, backend, StrategyRegistry::from_config(config))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn judge(&self, id: u64) -> Result<Submission> {
        let submission = self
            .store
            .get_submission(id)
            .ok_or_else(|| Error::NotFound(format!("submission {}", id)))?;
        let problem = self
            .store
            .get_problem(submission.problem_id)
            .ok_or_else(|| Error::NotFound(format!("problem {}", submission.problem_id)))?;

        if submission.status != SubmissionStatus::Waiting {
            return Err(Error::InvalidTransition {
                id,
                status: submission.status,
            });
        }
        if !self
            .store
            .compare_and_set_status(id, SubmissionStatus::Waiting, SubmissionStatus::Running)
        {
            let status = self
                .store
                .get_submission(id)
                .map(|s| s.status)
                .unwrap_or(submission.status);
            warn!("submission {} was taken by another judge ({:?})", id, status);
            return Err(Error::InvalidTransition { id, status });
        }

        info!(
            "judging submission {} of problem {} in {}",
            id, problem.id, submission.language
        );
        let request = ExecutionRequest {
            code: submission.code,
            language: submission.language.clone(),
            inputs: problem.inputs(),
        };
        let result = self.backend.execute(&request);

        let verdict = if result.is_system_error() {
            error!("submission {}: system error: {}", id, result.message);
            Verdict::system_error(&result.message)
        } else {
            self.strategies
                .get(&submission.language)
                .evaluate(&result, &problem.cases, &problem.limits)
        };
        let accepted = verdict.is_accepted();
        let status = if accepted {
            SubmissionStatus::Accepted
        } else {
            SubmissionStatus::Rejected
        };
        info!(
            "submission {}: {} ({} ms, {} KB)",
            id, verdict.message, verdict.time, verdict.memory
        );

        if !self.store.record_verdict(id, status, &verdict) {
            return Err(Error::Persistence(format!("verdict of submission {}", id)));
        }
        if !self.store.increment_counters(problem.id, accepted) {
            return Err(Error::Persistence(format!("counters of problem {}", problem.id)));
        }

        self.store
            .get_submission(id)
            .ok_or_else(|| Error::Persistence(format!("submission {} vanished", id)))
    }

    /// Puts RUNNING submissions untouched for at least `older_than` back to
    /// WAITING, e.g. after the process judging them died. Returns their ids.
    pub fn requeue_stuck(&self, older_than: Duration) -> Vec<u64> {
        let now = SystemTime::now();
        let mut requeued = Vec::new();
        for submission in self.store.submissions_with_status(SubmissionStatus::Running) {
            let idle = now
                .duration_since(submission.updated_at)
                .unwrap_or_else(|_| Duration::from_secs(0));
            if idle < older_than {
                continue;
            }
            if self.store.compare_and_set_status(
                submission.id,
                SubmissionStatus::Running,
                SubmissionStatus::Waiting,
            ) {
                warn!("submission {} stuck for {:?}, requeued", submission.id, idle);
                requeued.push(submission.id);
            }
        }
        requeued
    }
}
