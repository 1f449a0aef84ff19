//! The plan-level cancellation handle.

use tokio_util::sync::CancellationToken;

/// A handle a caller holds to cancel an in-flight `execute_plan` call.
///
/// Cloning shares the same underlying signal: the caller keeps one
/// clone, the Executor keeps another, and `cancel()` on either side is
/// visible to both.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(CancellationToken);

impl CancelHandle {
    /// A handle that has not been cancelled.
    pub fn new() -> Self {
        Self(CancellationToken::new())
    }

    /// Signal cancellation. The Executor stops scheduling further
    /// steps and marks in-flight steps cancelled at their next I/O
    /// boundary; it does not force-kill in-flight remote calls.
    pub fn cancel(&self) {
        self.0.cancel();
    }

    /// Whether cancellation has been signalled.
    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }
}
