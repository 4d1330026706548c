use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename = "limitConfig")]
pub struct LimitConfig {
    /// milliseconds
    #[serde(rename = "timeLimit")]
    pub time_limit: u64,
    /// kilobytes
    #[serde(rename = "memoryLimit")]
    pub memory_limit: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub input: String,
    pub output: String,
}

/// A problem as the judging engine sees it: ordered cases, limits and the
/// submission counters.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Problem {
    pub id: u64,
    pub name: String,
    pub cases: Vec<TestCase>,
    pub limits: LimitConfig,
    #[serde(rename = "submitCount", default)]
    pub submit_count: u64,
    #[serde(rename = "acceptedCount", default)]
    pub accepted_count: u64,
}

impl Problem {
    pub fn new(name: impl Into<String>, cases: Vec<TestCase>, limits: LimitConfig) -> Self {
        Self {
            id: 0,
            name: name.into(),
            cases,
            limits,
            submit_count: 0,
            accepted_count: 0,
        }
    }

    pub fn inputs(&self) -> Vec<String> {
        self.cases.iter().map(|case| case.input.clone()).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CaseConfig {
    #[serde(rename = "inputFile")]
    pub inputfile_path: String,
    #[serde(rename = "answerFile")]
    pub answerfile_path: String,
}

/// On-disk problem description. Case files are resolved relative to the
/// directory holding the YAML file.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProblemConfig {
    pub name: String,
    #[serde(skip_serializing, skip_deserializing)]
    path: PathBuf,
    #[serde(rename = "limitConfig")]
    pub limit_config: LimitConfig,
    pub cases: Vec<CaseConfig>,
}

impl ProblemConfig {
    fn from_string(content: &str) -> Result<Self> {
        let v: Self = serde_yaml::from_str(content)?;
        Ok(v)
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut v = Self::from_string(&content)?;

        let r_path = Path::new(path).canonicalize()?;
        let r_path = r_path
            .parent()
            .ok_or_else(|| Error::Argument(format!("`{}` has no parent directory", path)))?;
        v.path = r_path.to_path_buf();

        v.check_valid()?;
        Ok(v)
    }

    fn check_valid(&self) -> Result<()> {
        if self.cases.is_empty() {
            return Err(Error::Argument(format!("problem `{}` has no cases", self.name)));
        }
        for case in self.cases.iter() {
            if !self.find_relative_path(&case.inputfile_path).exists() {
                return Err(Error::NotFound(case.inputfile_path.to_string()));
            }
            if !self.find_relative_path(&case.answerfile_path).exists() {
                return Err(Error::NotFound(case.answerfile_path.to_string()));
            }
        }

        Ok(())
    }

    pub fn find_relative_path(&self, path: &str) -> PathBuf {
        self.path.join(path)
    }

    /// Reads every case file into memory.
    pub fn load(&self) -> Result<Problem> {
        let mut cases = Vec::with_capacity(self.cases.len());
        for case in self.cases.iter() {
            cases.push(TestCase {
                input: fs::read_to_string(self.find_relative_path(&case.inputfile_path))?,
                output: fs::read_to_string(self.find_relative_path(&case.answerfile_path))?,
            });
        }

        Ok(Problem::new(self.name.clone(), cases, self.limit_config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn serialize() -> Result<()> {
        let problem = ProblemConfig {
            name: "A".into(),
            limit_config: LimitConfig {
                time_limit: 1,
                memory_limit: 2,
            },
            cases: vec![CaseConfig {
                inputfile_path: "in".into(),
                answerfile_path: "out".into(),
            }],
            path: "../test_dep/problem".into(),
        };
        let s = serde_yaml::to_string(&problem)?;
        assert!(s.contains("timeLimit: 1"));
        assert!(s.contains("inputFile: in"));
        assert!(!s.contains("test_dep"));

        Ok(())
    }

    #[test]
    fn deserialize() -> Result<()> {
        let config = ProblemConfig::from_file("../test_dep/sum/problem.yaml")?;
        assert_eq!(config.name, "sum");
        let problem = config.load()?;
        assert_eq!(problem.cases.len(), 2);
        assert_eq!(problem.limits.time_limit, 1000);
        assert_eq!(problem.cases[0].input.trim(), "1 2");
        assert_eq!(problem.cases[0].output.trim(), "3");

        Ok(())
    }

    #[test]
    fn missing_case_file() {
        let result = ProblemConfig::from_file("../test_dep/broken/problem.yaml");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
