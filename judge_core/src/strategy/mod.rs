mod adjusted;
mod default;

pub use self::adjusted::LanguageAdjusted;
pub use self::default::DefaultStrategy;

use std::collections::HashMap;

use crate::config::{JudgeConfig, JAVA_TIME_ALLOWANCE_MS};
use crate::problem::{LimitConfig, TestCase};
use crate::verdict::Verdict;
use crate::ExecutionResult;

/// Turns a successful (or mismatched) execution into a verdict.
pub trait VerdictStrategy: Send + Sync {
    fn name(&self) -> &str;
    fn evaluate(&self, result: &ExecutionResult, cases: &[TestCase], limits: &LimitConfig) -> Verdict;
}

/// One default strategy plus per-language overrides, keyed case-insensitively.
pub struct StrategyRegistry {
    default: Box<dyn VerdictStrategy>,
    overrides: HashMap<String, Box<dyn VerdictStrategy>>,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        let mut registry = Self::new(Box::new(DefaultStrategy::default()));
        registry.register("java", Box::new(LanguageAdjusted::new("java", JAVA_TIME_ALLOWANCE_MS)));
        registry
    }
}

impl StrategyRegistry {
    pub fn new(default: Box<dyn VerdictStrategy>) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    /// The default strategy plus one [`LanguageAdjusted`] per configured
    /// allowance.
    pub fn from_config(config: &JudgeConfig) -> Self {
        let mut registry = Self::new(Box::new(DefaultStrategy::default()));
        for (language, allowance) in config.allowances.iter() {
            registry.register(language, Box::new(LanguageAdjusted::new(language, *allowance)));
        }
        registry
    }

    pub fn register(&mut self, language: &str, strategy: Box<dyn VerdictStrategy>) {
        self.overrides.insert(language.trim().to_lowercase(), strategy);
    }

    pub fn get(&self, language: &str) -> &dyn VerdictStrategy {
        match self.overrides.get(&language.trim().to_lowercase()) {
            Some(strategy) => strategy.as_ref(),
            None => self.default.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::VerdictMessage;

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = StrategyRegistry::default();
        assert_eq!(registry.get("Java").name(), "java");
        assert_eq!(registry.get("JAVA").name(), "java");
        assert_eq!(registry.get("python").name(), "default");
        assert_eq!(registry.get("").name(), "default");
    }

    #[test]
    fn configured_allowances() {
        let mut config = JudgeConfig::default();
        config.allowances.insert("Kotlin".into(), 1500);
        let registry = StrategyRegistry::from_config(&config);

        let cases = vec![TestCase {
            input: String::new(),
            output: "ok".into(),
        }];
        let limits = LimitConfig {
            time_limit: 1000,
            memory_limit: 1024,
        };
        let result = ExecutionResult::success(vec!["ok".into()], 2400, 10);
        assert_eq!(registry.get("kotlin").evaluate(&result, &cases, &limits).message, VerdictMessage::Accepted);
        assert_eq!(
            registry.get("java").evaluate(&result, &cases, &limits).message,
            VerdictMessage::TimeLimitExceeded
        );
        assert_eq!(
            registry.get("c").evaluate(&result, &cases, &limits).message,
            VerdictMessage::TimeLimitExceeded
        );
    }
}
