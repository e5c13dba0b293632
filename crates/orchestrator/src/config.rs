//! Orchestrator settings.

use std::time::Duration;

/// Deadlines and fixed request values used by the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Shared deadline for one top-level operation.
    pub operation_timeout: Duration,
    /// Upper bound for any single collaborator or storage call.
    pub call_timeout: Duration,
    /// Budget for marking an order failed after its settlement call errored.
    ///
    /// Granted separately from the operation deadline, which a timed-out
    /// payment call has usually used up.
    pub recovery_timeout: Duration,
    /// Currency sent with every settlement request.
    pub currency: String,
}

impl OrchestratorConfig {
    pub fn with_timeouts(operation_timeout: Duration, call_timeout: Duration) -> Self {
        Self {
            operation_timeout,
            call_timeout,
            ..Self::default()
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            operation_timeout: Duration::from_secs(5),
            call_timeout: Duration::from_secs(5),
            recovery_timeout: Duration::from_secs(1),
            currency: "USD".to_string(),
        }
    }
}
