use super::ExecutionBackend;
use crate::{ExecutionRequest, ExecutionResult};

const STUB_TIME: u64 = 100;
const STUB_MEMORY: u64 = 100;

/// Runs nothing: every input is echoed back as its output. The fallback for
/// unknown backend tokens.
#[derive(Debug, Default)]
pub struct StubBackend;

impl ExecutionBackend for StubBackend {
    fn name(&self) -> &str {
        "stub"
    }

    fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        if request.inputs.is_empty() {
            return ExecutionResult::system_error("no inputs");
        }
        let mut result = ExecutionResult::success(request.inputs.clone(), STUB_TIME, STUB_MEMORY);
        result.message = "stub execution".into();
        result
    }
}
