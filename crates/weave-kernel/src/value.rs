//! Outcome cells the engine back-writes into plan fields.
//!
//! `PlanResult` wraps an async task handle (`cte.Result`); `PlanSyncResult`
//! wraps an already-available outcome (`cte.SyncResult`). Both expose a
//! single `outcome()` accessor so downstream computers can read an
//! earlier component's output regardless of which phase produced it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::warn;

/// A type-erased outcome: either the computed value or the error the
/// computer returned.
pub type Outcome = Result<Arc<dyn std::any::Any + Send + Sync>, String>;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Back-written into a `Result`-marked field. Wraps a task handle whose
/// completion downstream readers can await; in the sequential phase
/// the handle is constructed already-complete, in the parallel phase
/// it resolves once the spawned task finishes.
#[derive(Clone)]
pub struct PlanResult {
    cell: Arc<OnceCell<Outcome>>,
}

impl PlanResult {
    /// Wraps a future that will eventually produce the outcome. Used
    /// by the parallel phase, where the field is installed before the
    /// task has actually run.
    pub fn pending(fut: BoxFuture<Outcome>) -> Self {
        let cell: Arc<OnceCell<Outcome>> = Arc::new(OnceCell::new());
        let cell_clone = cell.clone();
        tokio::spawn(async move {
            let outcome = fut.await;
            if cell_clone.set(outcome).is_err() {
                warn!("plan result cell was already resolved; dropping duplicate outcome");
            }
        });
        Self { cell }
    }

    /// Wraps an outcome that is already known. Used by the sequential
    /// phase, which computes synchronously before back-writing.
    pub fn completed(outcome: Outcome) -> Self {
        let cell = Arc::new(OnceCell::new());
        let _ = cell.set(outcome);
        Self { cell }
    }

    /// Returns a not-yet-resolved handle paired with the slot used to
    /// resolve it. Used by the parallel phase: the computer's future
    /// there borrows the plan non-statically (it reads sibling fields
    /// through `&P`), so it can't be handed to `tokio::spawn` the way
    /// `pending` requires; the engine instead drives that future
    /// itself (via `FuturesUnordered`) and resolves the slot in place.
    pub fn handle() -> (Self, OutcomeSlot) {
        let cell: Arc<OnceCell<Outcome>> = Arc::new(OnceCell::new());
        (Self { cell: cell.clone() }, OutcomeSlot { cell })
    }

    /// Awaits and returns the outcome. Blocks the caller until the
    /// underlying task completes if it hasn't already.
    pub async fn outcome(&self) -> Outcome {
        self.cell.get_or_init(|| async { Err("plan result never completed".to_string()) }).await.clone()
    }
}

/// The writable half of a handle produced by [`PlanResult::handle`].
pub struct OutcomeSlot {
    cell: Arc<OnceCell<Outcome>>,
}

impl OutcomeSlot {
    pub fn resolve(self, outcome: Outcome) {
        let _ = self.cell.set(outcome);
    }
}

/// Back-written into a `SyncResult`-marked field. Always already
/// resolved — sequential plans only.
#[derive(Clone)]
pub struct PlanSyncResult {
    outcome: Outcome,
}

impl PlanSyncResult {
    pub fn new(outcome: Outcome) -> Self {
        Self { outcome }
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completed_result_is_immediately_readable() {
        let value: Arc<dyn std::any::Any + Send + Sync> = Arc::new(3i32);
        let result = PlanResult::completed(Ok(value));
        let outcome = result.outcome().await.unwrap();
        assert_eq!(*outcome.downcast_ref::<i32>().unwrap(), 3);
    }

    #[tokio::test]
    async fn pending_result_resolves_after_task_completes() {
        let result = PlanResult::pending(Box::pin(async {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            let value: Arc<dyn std::any::Any + Send + Sync> = Arc::new(7i32);
            Ok(value)
        }));

        let outcome = result.outcome().await.unwrap();
        assert_eq!(*outcome.downcast_ref::<i32>().unwrap(), 7);
    }

    #[test]
    fn sync_result_holds_outcome_directly() {
        let value: Arc<dyn std::any::Any + Send + Sync> = Arc::new(9i32);
        let sync = PlanSyncResult::new(Ok(value));
        let outcome = sync.outcome().unwrap();
        assert_eq!(*outcome.downcast_ref::<i32>().unwrap(), 9);
    }
}
