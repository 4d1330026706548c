pub mod local;
pub mod proxy;
pub mod remote;
pub mod selector;
pub mod stub;

pub use self::local::LocalBackend;
pub use self::proxy::LoggingProxy;
pub use self::remote::RemoteBackend;
pub use self::selector::BackendSelector;
pub use self::stub::StubBackend;

use crate::{ExecutionRequest, ExecutionResult};

/// Runs one submission against every input of a request.
///
/// Implementations never fail with `Err`: anything that prevents a fair run
/// is reported as [`crate::ExecutionStatus::SystemError`], and anything the
/// program itself did wrong as [`crate::ExecutionStatus::JudgeMismatch`].
pub trait ExecutionBackend: Send + Sync {
    fn name(&self) -> &str;
    fn execute(&self, request: &ExecutionRequest) -> ExecutionResult;
}

impl<B: ExecutionBackend + ?Sized> ExecutionBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        (**self).execute(request)
    }
}
