use super::default::check;
use super::VerdictStrategy;
use crate::compare::{ComparisionMode, WhitespaceCompare};
use crate::problem::{LimitConfig, TestCase};
use crate::verdict::Verdict;
use crate::ExecutionResult;

/// The default checks with extra time granted to a slow-starting runtime,
/// e.g. the JVM.
pub struct LanguageAdjusted {
    language: String,
    allowance: u64,
    comparation: Box<dyn ComparisionMode>,
}

impl LanguageAdjusted {
    pub fn new(language: &str, allowance: u64) -> Self {
        Self {
            language: language.to_lowercase(),
            allowance,
            comparation: Box::new(WhitespaceCompare),
        }
    }

    pub fn allowance(&self) -> u64 {
        self.allowance
    }
}

impl VerdictStrategy for LanguageAdjusted {
    fn name(&self) -> &str {
        &self.language
    }

    fn evaluate(&self, result: &ExecutionResult, cases: &[TestCase], limits: &LimitConfig) -> Verdict {
        check(result, cases, limits, self.comparation.as_ref(), self.allowance)
    }
}
