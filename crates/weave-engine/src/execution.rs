//! The context threaded through every `load`/`compute`/hook call and
//! every nested recursion (§5 of the design notes: "the engine does
//! not impose its own timeouts; it threads the caller-provided context
//! through every task").

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Clone)]
pub struct ExecutionContext {
    pub run_id: Uuid,
    cancellation: CancellationToken,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// A derived context sharing this run's identity but with a child
    /// cancellation token, used for the parallel phase's fan-out so a
    /// single failing task can cancel its siblings without affecting
    /// the parent scope.
    pub fn child(&self) -> Self {
        Self {
            run_id: self.run_id,
            cancellation: self.cancellation.child_token(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}
