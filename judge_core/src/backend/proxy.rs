use log::info;

use super::ExecutionBackend;
use crate::{ExecutionRequest, ExecutionResult};

/// Logs every request and result of the wrapped backend and forwards the
/// call untouched.
pub struct LoggingProxy<B> {
    inner: B,
}

impl<B: ExecutionBackend> LoggingProxy<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }
}

impl<B: ExecutionBackend> ExecutionBackend for LoggingProxy<B> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        info!("[{}] execution request: {:?}", self.inner.name(), request);
        let result = self.inner.execute(request);
        info!("[{}] execution result: {:?}", self.inner.name(), result);
        result
    }
}
