use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;

use crate::error::{Error, Result};
use crate::problem::Problem;
use crate::submission::{Submission, SubmissionStatus};
use crate::verdict::Verdict;

/// Where submissions and problems live. Writes report success as `bool`;
/// the judge treats `false` as fatal.
pub trait SubmissionStore: Send + Sync {
    fn get_submission(&self, id: u64) -> Option<Submission>;
    fn get_problem(&self, id: u64) -> Option<Problem>;

    /// Moves the submission from `expected` to `new` only if it is still in
    /// `expected`.
    fn compare_and_set_status(&self, id: u64, expected: SubmissionStatus, new: SubmissionStatus) -> bool;
    fn record_verdict(&self, id: u64, status: SubmissionStatus, verdict: &Verdict) -> bool;
    fn increment_counters(&self, problem_id: u64, accepted: bool) -> bool;
    fn submissions_with_status(&self, status: SubmissionStatus) -> Vec<Submission>;
}

#[derive(Default)]
struct Tables {
    problems: BTreeMap<u64, Problem>,
    submissions: BTreeMap<u64, Submission>,
    next_problem: u64,
    next_submission: u64,
}

/// Keeps everything in memory behind one mutex.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        match self.tables.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Stores `problem` under a fresh id and returns it.
    pub fn add_problem(&self, mut problem: Problem) -> u64 {
        let mut tables = self.lock();
        tables.next_problem += 1;
        let id = tables.next_problem;
        problem.id = id;
        tables.problems.insert(id, problem);
        id
    }

    /// Creates a WAITING submission for an existing problem.
    pub fn submit(&self, problem_id: u64, code: &str, language: &str) -> Result<u64> {
        let mut tables = self.lock();
        if !tables.problems.contains_key(&problem_id) {
            return Err(Error::NotFound(format!("problem {}", problem_id)));
        }
        tables.next_submission += 1;
        let id = tables.next_submission;
        tables
            .submissions
            .insert(id, Submission::new(id, problem_id, code.into(), language.into()));
        Ok(id)
    }
}

impl SubmissionStore for MemoryStore {
    fn get_submission(&self, id: u64) -> Option<Submission> {
        self.lock().submissions.get(&id).cloned()
    }

    fn get_problem(&self, id: u64) -> Option<Problem> {
        self.lock().problems.get(&id).cloned()
    }

    fn compare_and_set_status(&self, id: u64, expected: SubmissionStatus, new: SubmissionStatus) -> bool {
        match self.lock().submissions.get_mut(&id) {
            Some(submission) if submission.status == expected => {
                submission.status = new;
                submission.updated_at = SystemTime::now();
                true
            }
            _ => false,
        }
    }

    fn record_verdict(&self, id: u64, status: SubmissionStatus, verdict: &Verdict) -> bool {
        match self.lock().submissions.get_mut(&id) {
            Some(submission) => {
                submission.status = status;
                submission.verdict = Some(verdict.clone());
                submission.updated_at = SystemTime::now();
                true
            }
            None => false,
        }
    }

    fn increment_counters(&self, problem_id: u64, accepted: bool) -> bool {
        match self.lock().problems.get_mut(&problem_id) {
            Some(problem) => {
                problem.submit_count += 1;
                if accepted {
                    problem.accepted_count += 1;
                }
                true
            }
            None => false,
        }
    }

    fn submissions_with_status(&self, status: SubmissionStatus) -> Vec<Submission> {
        self.lock()
            .submissions
            .values()
            .filter(|s| s.status == status)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{LimitConfig, TestCase};
    use crate::verdict::VerdictMessage;

    fn problem() -> Problem {
        Problem::new(
            "echo",
            vec![TestCase {
                input: "1".into(),
                output: "1".into(),
            }],
            LimitConfig {
                time_limit: 1000,
                memory_limit: 65536,
            },
        )
    }

    #[test]
    fn ids_are_assigned() -> Result<()> {
        let store = MemoryStore::new();
        let p = store.add_problem(problem());
        assert_eq!(store.get_problem(p).unwrap().id, p);

        let a = store.submit(p, "code", "java")?;
        let b = store.submit(p, "code", "java")?;
        assert_ne!(a, b);
        assert_eq!(store.get_submission(a).unwrap().status, SubmissionStatus::Waiting);
        assert!(matches!(store.submit(p + 1, "code", "java"), Err(Error::NotFound(_))));
        Ok(())
    }

    #[test]
    fn compare_and_set() -> Result<()> {
        let store = MemoryStore::new();
        let p = store.add_problem(problem());
        let id = store.submit(p, "code", "c")?;

        assert!(store.compare_and_set_status(id, SubmissionStatus::Waiting, SubmissionStatus::Running));
        assert!(!store.compare_and_set_status(id, SubmissionStatus::Waiting, SubmissionStatus::Running));
        assert!(!store.compare_and_set_status(id + 1, SubmissionStatus::Waiting, SubmissionStatus::Running));
        assert_eq!(store.submissions_with_status(SubmissionStatus::Running).len(), 1);
        assert!(store.submissions_with_status(SubmissionStatus::Waiting).is_empty());
        Ok(())
    }

    #[test]
    fn verdict_and_counters() -> Result<()> {
        let store = MemoryStore::new();
        let p = store.add_problem(problem());
        let id = store.submit(p, "code", "c")?;

        let verdict = Verdict::new(VerdictMessage::Accepted, 5, 10);
        assert!(store.record_verdict(id, SubmissionStatus::Accepted, &verdict));
        assert_eq!(store.get_submission(id).unwrap().verdict, Some(verdict));

        assert!(store.increment_counters(p, true));
        assert!(store.increment_counters(p, false));
        let stored = store.get_problem(p).unwrap();
        assert_eq!((stored.submit_count, stored.accepted_count), (2, 1));
        assert!(!store.increment_counters(p + 7, true));
        Ok(())
    }
}
