use thiserror::Error;

/// Lifecycle precondition failures. These are programmer errors and fail
/// loudly; runtime data errors (source failures) never surface here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("engine is already running")]
    AlreadyRunning,
    #[error("engine is not running")]
    NotRunning,
    #[error("engine has been stopped; a stopped engine cannot be restarted")]
    Stopped,
}
