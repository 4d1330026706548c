use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::backend::local::toolchain::{GPPStandard, Toolchain};
use crate::error::Result;

pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_REMOTE_URL: &str = "https://extra-ce.judge0.com";
pub const DEFAULT_REMOTE_MEMORY_LIMIT_KB: u64 = 128_000;
pub const DEFAULT_REMOTE_CPU_TIME_LIMIT_S: f64 = 5.0;
pub const DEFAULT_REMOTE_LANGUAGE_ID: u32 = 62;
pub const JAVA_TIME_ALLOWANCE_MS: u64 = 1000;

/// Engine configuration, usually read from YAML and then patched from the
/// environment (`JUDGE_BACKEND`, `JUDGE_WORK_DIR`, `JUDGE_REMOTE_URL`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JudgeConfig {
    /// Backend token: `local`, `remote` or `stub`.
    pub backend: String,
    pub local: LocalConfig,
    pub remote: RemoteConfig,
    /// Extra time (ms) granted per language before the time limit check.
    pub allowances: BTreeMap<String, u64>,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        let mut allowances = BTreeMap::new();
        allowances.insert("java".to_string(), JAVA_TIME_ALLOWANCE_MS);
        Self {
            backend: "stub".into(),
            local: LocalConfig::default(),
            remote: RemoteConfig::default(),
            allowances,
        }
    }
}

impl JudgeConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Reads `path` when given, falls back to defaults otherwise, then applies
    /// the environment overrides.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(backend) = lookup("JUDGE_BACKEND") {
            self.backend = backend;
        }
        if let Some(dir) = lookup("JUDGE_WORK_DIR") {
            self.local.work_dir = dir.into();
        }
        if let Some(url) = lookup("JUDGE_REMOTE_URL") {
            self.remote.base_url = url;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocalConfig {
    /// Root under which one working directory per submission is created.
    pub work_dir: PathBuf,
    /// Hard wall-clock timeout per process.
    pub timeout_ms: u64,
    /// Source containing any of these words is refused before compiling.
    pub blocked_words: Vec<String>,
    pub isolation: IsolationConfig,
    /// `-std=` flag of the built-in C++ toolchain.
    pub cpp_standard: GPPStandard,
    /// Added to, or replacing, the built-in toolchains by language.
    pub toolchains: Vec<Toolchain>,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("judge-workspace"),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            blocked_words: Vec::new(),
            isolation: IsolationConfig::default(),
            cpp_standard: GPPStandard::default(),
            toolchains: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IsolationConfig {
    /// Run the program directly.
    None,
    /// Run the program through the `judge_cell` loader.
    Cell {
        /// Defaults to `judge_cell` next to the current executable.
        #[serde(rename = "cellPath", default)]
        cell_path: Option<PathBuf>,
        #[serde(rename = "memoryLimitMb", default = "default_cell_memory")]
        memory_limit_mb: u64,
        #[serde(rename = "cpuTimeLimitS", default = "default_cell_cpu_time")]
        cpu_time_limit_s: u64,
    },
}

fn default_cell_memory() -> u64 {
    256
}

fn default_cell_cpu_time() -> u64 {
    DEFAULT_TIMEOUT_MS / 1000
}

impl Default for IsolationConfig {
    fn default() -> Self {
        IsolationConfig::None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RemoteConfig {
    pub base_url: String,
    /// Per-call memory ceiling (KB).
    pub memory_limit_kb: u64,
    /// Per-call cpu time ceiling (seconds).
    pub cpu_time_limit_s: f64,
    /// Used when the submission's language has no known id.
    pub default_language_id: u32,
    pub base64_encoded: bool,
    /// Query the remote language catalog once at construction.
    pub refresh_languages: bool,
    pub request_timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REMOTE_URL.into(),
            memory_limit_kb: DEFAULT_REMOTE_MEMORY_LIMIT_KB,
            cpu_time_limit_s: DEFAULT_REMOTE_CPU_TIME_LIMIT_S,
            default_language_id: DEFAULT_REMOTE_LANGUAGE_ID,
            base64_encoded: true,
            refresh_languages: true,
            request_timeout_ms: 30_000,
        }
    }
}
