use log::debug;

use super::VerdictStrategy;
use crate::compare::{ComparisionMode, ComparisionResult, WhitespaceCompare};
use crate::problem::{LimitConfig, TestCase};
use crate::verdict::{Verdict, VerdictMessage};
use crate::{ExecutionResult, ExecutionStatus};

/// The checks shared by every strategy, in order: a run stopped for time,
/// backend mismatch, output count, per-case comparison (stops at the first
/// difference), time with `allowance` extra milliseconds, memory.
pub(crate) fn check(
    result: &ExecutionResult,
    cases: &[TestCase],
    limits: &LimitConfig,
    comparation: &dyn ComparisionMode,
    allowance: u64,
) -> Verdict {
    let verdict = |message| Verdict::new(message, result.time, result.memory);

    if result.time_limit_exceeded {
        return verdict(VerdictMessage::TimeLimitExceeded).with_detail(result.message.clone());
    }

    if result.status == ExecutionStatus::JudgeMismatch {
        return verdict(VerdictMessage::WrongAnswer).with_detail(result.message.clone());
    }

    if result.outputs.len() != cases.len() {
        return verdict(VerdictMessage::WrongAnswer).with_detail(format!(
            "expected {} outputs, got {}",
            cases.len(),
            result.outputs.len()
        ));
    }

    for (index, (case, actual)) in cases.iter().zip(result.outputs.iter()).enumerate() {
        if let ComparisionResult::Different = comparation.compare(&case.output, actual) {
            debug!("case {} differs", index + 1);
            return verdict(VerdictMessage::WrongAnswer).with_detail(format!("case {} differs", index + 1));
        }
    }

    if result.time > limits.time_limit.saturating_add(allowance) {
        let mut detail = format!("{} ms over the {} ms limit", result.time, limits.time_limit);
        if allowance > 0 {
            detail.push_str(&format!(" (+{} ms allowance)", allowance));
        }
        return verdict(VerdictMessage::TimeLimitExceeded).with_detail(detail);
    }

    if result.memory > limits.memory_limit {
        return verdict(VerdictMessage::MemoryLimitExceeded).with_detail(format!(
            "{} KB over the {} KB limit",
            result.memory, limits.memory_limit
        ));
    }

    verdict(VerdictMessage::Accepted)
}

pub struct DefaultStrategy {
    comparation: Box<dyn ComparisionMode>,
}

impl Default for DefaultStrategy {
    fn default() -> Self {
        Self::new(Box::new(WhitespaceCompare))
    }
}

impl DefaultStrategy {
    pub fn new(comparation: Box<dyn ComparisionMode>) -> Self {
        Self { comparation }
    }
}

impl VerdictStrategy for DefaultStrategy {
    fn name(&self) -> &str {
        "default"
    }

    fn evaluate(&self, result: &ExecutionResult, cases: &[TestCase], limits: &LimitConfig) -> Verdict {
        check(result, cases, limits, self.comparation.as_ref(), 0)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn cases(pairs: &[(&str, &str)]) -> Vec<TestCase> {
        pairs
            .iter()
            .map(|(input, output)| TestCase {
                input: input.to_string(),
                output: output.to_string(),
            })
            .collect()
    }

    fn limits() -> LimitConfig {
        LimitConfig {
            time_limit: 5000,
            memory_limit: 65536,
        }
    }

    fn ran(outputs: &[&str], time: u64, memory: u64) -> ExecutionResult {
        ExecutionResult::success(outputs.iter().map(|s| s.to_string()).collect(), time, memory)
    }

    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    impl ComparisionMode for Counting {
        fn compare(&self, expected: &str, actual: &str) -> ComparisionResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            WhitespaceCompare.compare(expected, actual)
        }
    }

    #[test]
    fn accept_ignoring_whitespace() {
        let verdict = DefaultStrategy::default().evaluate(&ran(&["42\n"], 10, 100), &cases(&[("", "  42  ")]), &limits());
        assert_eq!(verdict.message, VerdictMessage::Accepted);
        assert_eq!(verdict.time, 10);
        assert_eq!(verdict.memory, 100);
        assert!(verdict.detail.is_none());
    }

    #[test]
    fn stops_at_first_difference() {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = DefaultStrategy::new(Box::new(Counting { calls: calls.clone() }));
        let verdict = strategy.evaluate(
            &ran(&["0", "2", "3"], 10, 100),
            &cases(&[("", "1"), ("", "2"), ("", "3")]),
            &limits(),
        );
        assert_eq!(verdict.message, VerdictMessage::WrongAnswer);
        assert_eq!(verdict.detail.as_deref(), Some("case 1 differs"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn output_count_mismatch() {
        let verdict = DefaultStrategy::default().evaluate(&ran(&["1"], 10, 100), &cases(&[("", "1"), ("", "2")]), &limits());
        assert_eq!(verdict.message, VerdictMessage::WrongAnswer);
        assert_eq!(verdict.detail.as_deref(), Some("expected 2 outputs, got 1"));
    }

    #[test]
    fn judge_mismatch_is_wrong_answer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = DefaultStrategy::new(Box::new(Counting { calls: calls.clone() }));
        let result = ExecutionResult::mismatch("Exception in thread \"main\"", vec![], 20, 300);
        let verdict = strategy.evaluate(&result, &cases(&[("", "1")]), &limits());
        assert_eq!(verdict.message, VerdictMessage::WrongAnswer);
        assert_eq!(verdict.detail.as_deref(), Some("Exception in thread \"main\""));
        assert_eq!(verdict.time, 20);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stopped_run_is_time_limit_exceeded() {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = DefaultStrategy::new(Box::new(Counting { calls: calls.clone() }));

        // right answer printed, then killed well under the problem limit
        let result = ExecutionResult::mismatch("case 1 killed after 500 ms", vec![], 506, 100).with_time_limit_exceeded();
        let verdict = strategy.evaluate(&result, &cases(&[("", "3")]), &limits());
        assert_eq!(verdict.message, VerdictMessage::TimeLimitExceeded);
        assert_eq!(verdict.time, 506);
        assert_eq!(verdict.detail.as_deref(), Some("case 1 killed after 500 ms"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn wrong_answer_before_time_limit() {
        let verdict = DefaultStrategy::default().evaluate(&ran(&["2"], 9000, 100), &cases(&[("", "1")]), &limits());
        assert_eq!(verdict.message, VerdictMessage::WrongAnswer);
    }

    #[test]
    fn time_limit() {
        let strategy = DefaultStrategy::default();
        let verdict = strategy.evaluate(&ran(&["1"], 6000, 100), &cases(&[("", "1")]), &limits());
        assert_eq!(verdict.message, VerdictMessage::TimeLimitExceeded);
        assert_eq!(verdict.time, 6000);

        let verdict = strategy.evaluate(&ran(&["1"], 5000, 100), &cases(&[("", "1")]), &limits());
        assert_eq!(verdict.message, VerdictMessage::Accepted);
    }

    #[test]
    fn memory_limit() {
        let verdict = DefaultStrategy::default().evaluate(&ran(&["1"], 10, 65537), &cases(&[("", "1")]), &limits());
        assert_eq!(verdict.message, VerdictMessage::MemoryLimitExceeded);
        assert_eq!(verdict.memory, 65537);
    }
}
