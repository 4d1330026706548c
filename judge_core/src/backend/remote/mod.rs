pub mod languages;
pub mod protocol;
pub mod transport;

use std::time::Duration;

use log::{debug, error, warn};

use self::languages::LanguageTable;
use self::protocol::{collapse_stdout, decode_field, encode, RemoteResponse, RemoteSubmission};
use self::transport::{HttpTransport, RemoteTransport};
use super::ExecutionBackend;
use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::{ExecutionRequest, ExecutionResult};

/// Runs submissions on a Judge0-style HTTP service, one synchronous call per
/// input.
pub struct RemoteBackend {
    transport: Box<dyn RemoteTransport>,
    languages: LanguageTable,
    config: RemoteConfig,
}

impl RemoteBackend {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let transport = HttpTransport::new(
            &config.base_url,
            Duration::from_millis(config.request_timeout_ms),
        )?;
        Ok(Self::with_transport(config, Box::new(transport)))
    }

    /// Builds the backend and, when enabled, refreshes the language table
    /// once. A failed refresh keeps the built-in table.
    pub fn with_transport(config: &RemoteConfig, transport: Box<dyn RemoteTransport>) -> Self {
        let backend = Self {
            transport,
            languages: LanguageTable::new(config.default_language_id),
            config: config.clone(),
        };
        if config.refresh_languages {
            match backend.transport.languages() {
                Ok(catalog) => {
                    backend.languages.refresh(&catalog);
                }
                Err(e) => warn!(
                    "failed to fetch remote language catalog, keeping the built-in table: {}",
                    e.report()
                ),
            }
        }
        backend
    }

    pub fn languages(&self) -> &LanguageTable {
        &self.languages
    }

    fn make_error(&self, msg: String) -> Error {
        Error::Judge {
            judge_name: self.config.base_url.clone(),
            msg,
        }
    }

    fn call(&self, submission: &RemoteSubmission) -> Result<RemoteResponse> {
        let reply = self.transport.submit(submission, self.config.base64_encoded)?;

        // only an error reply can name the language; a 2xx body carries the
        // program's own output
        let unknown_language = reply.status == 422
            || (!reply.is_success() && reply.body.to_lowercase().contains("language with id"));
        if unknown_language {
            return Err(self.make_error(format!(
                "language id {} is not supported: {}",
                submission.language_id,
                reply.body.trim()
            )));
        }
        if !reply.is_success() {
            return Err(self.make_error(format!("HTTP {}: {}", reply.status, reply.body.trim())));
        }

        let response: RemoteResponse = serde_json::from_str(&reply.body)
            .map_err(|e| self.make_error(format!("unreadable reply ({}): {}", e, reply.body.trim())))?;
        if response.status.is_none() {
            return Err(self.make_error(format!("reply carries no status: {}", reply.body.trim())));
        }
        Ok(response)
    }

    fn run(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        let encoded = self.config.base64_encoded;
        let wrap = |text: &str| if encoded { encode(text) } else { text.to_string() };
        let language_id = self.languages.resolve(&request.language);
        let source_code = wrap(&request.code);

        let mut outputs = Vec::with_capacity(request.inputs.len());
        let mut failures = Vec::new();
        let mut time_limit_exceeded = false;
        let mut total_time = 0;
        let mut max_memory = 0;

        for (index, input) in request.inputs.iter().enumerate() {
            let submission = RemoteSubmission {
                source_code: source_code.clone(),
                language_id,
                stdin: wrap(input),
                memory_limit: self.config.memory_limit_kb,
                cpu_time_limit: self.config.cpu_time_limit_s,
            };
            let response = self.call(&submission)?;

            total_time += response.time_ms();
            max_memory = max_memory.max(response.memory_kb());

            let stdout = response
                .stdout
                .as_deref()
                .map(|text| collapse_stdout(&decode_field(text, encoded)))
                .unwrap_or_default();
            if stdout.is_empty() {
                warn!("case {} produced no output, recording an empty one", index + 1);
            }
            outputs.push(stdout);

            if response.time_limit_exceeded() {
                time_limit_exceeded = true;
            }
            if !response.accepted() {
                let (id, description) = response
                    .status
                    .as_ref()
                    .map(|s| (s.id, s.description.as_str()))
                    .unwrap_or((0, ""));
                let mut failure = format!("case {}: {} (status {})", index + 1, description, id);
                let diagnostics = response.diagnostics(encoded);
                if !diagnostics.is_empty() {
                    failure.push('\n');
                    failure.push_str(&diagnostics);
                }
                debug!("{}", failure);
                failures.push(failure);
            }
        }

        if failures.is_empty() {
            return Ok(ExecutionResult::success(outputs, total_time, max_memory));
        }
        let result = ExecutionResult::mismatch(failures.join("\n"), outputs, total_time, max_memory);
        if time_limit_exceeded {
            Ok(result.with_time_limit_exceeded())
        } else {
            Ok(result)
        }
    }
}

impl ExecutionBackend for RemoteBackend {
    fn name(&self) -> &str {
        "remote"
    }

    fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        if request.inputs.is_empty() {
            return ExecutionResult::system_error("no inputs");
        }
        match self.run(request) {
            Ok(result) => result,
            Err(e) => {
                error!("remote execution failed: {}", e.report());
                ExecutionResult::system_error(e.report())
            }
        }
    }
}
