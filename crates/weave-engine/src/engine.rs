//! The dispatch loop: sequential and parallel phases, back-write,
//! branch switching, and early termination.
//!
//! Grounded on `cte/engine.go`'s `doExecutePlan`/`doExecuteSync`/
//! `doExecuteAsync`/`doConcurrentLoading`. The source's `Engine` holds
//! plain maps keyed by type name and is always used by value (a Go
//! idiom for a struct that's really just two maps); Weave wraps the
//! same two maps behind `Registry` and typically lives behind an
//! `Arc`, matching `mofa-foundation/workflow/executor.rs`'s
//! long-lived-executor convention.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tracing::{error, warn};

use weave_kernel::PlanResult;

use crate::computer::{ComputeOutcome, ComputedValue, ErasedComputer, LoadingData, RegisteredComputer};
use crate::error::{ConfigurationError, EngineError};
use crate::execution::ExecutionContext;
use crate::metadata::ComputerMetadata;
use crate::plan::{MasterPlan, Plan};
use crate::registry::Registry;
use crate::schema::{AnalyzedPlan, BackWrite, ParsedComponent};

pub struct Engine {
    registry: Registry,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self { registry: Registry::new() }
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Registers a computer implementation behind its `ErasedComputer`
    /// wrapper, idempotently (`cte/engine.go`'s `registerComputer`).
    /// Returned as a `Result` rather than the source's panic, per the
    /// configuration-errors-as-values decision recorded in DESIGN.md.
    pub fn register_computer<P, W>(&self, id: &'static str, metadata: ComputerMetadata, wrapper: W) -> Result<(), ConfigurationError>
    where
        P: Plan,
        W: ErasedComputer<P> + 'static,
    {
        let registered = Arc::new(RegisteredComputer {
            id,
            metadata,
            computer: Box::new(wrapper),
        });
        self.registry.insert_computer_if_absent(id, registered);
        Ok(())
    }

    /// Executes a master plan end to end, converting either
    /// early-termination sentinel to `Ok(())` at this boundary
    /// (`cte/engine.go`'s `ExecuteMasterPlan`).
    pub async fn execute_master_plan<P: MasterPlan>(&self, plan: &mut P, ctx: &ExecutionContext) -> Result<(), EngineError> {
        match self.do_execute_plan(plan, ctx).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_ending_early() => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Runs one analyzed plan's pre-hooks, component phase, and
    /// post-hooks (`doExecutePlan`). Used both for the master plan
    /// itself and, recursively, for every nested plan.
    pub(crate) async fn do_execute_plan<P: Plan>(&self, plan: &mut P, ctx: &ExecutionContext) -> Result<(), EngineError> {
        let id = weave_kernel::identify::<P>();
        let analyzed = self
            .registry
            .get_plan::<AnalyzedPlan<P>>(id)
            .ok_or_else(|| EngineError::Configuration(ConfigurationError::PlanNotAnalyzed(id.to_string())))?;

        for hook in &analyzed.pre_hooks {
            (hook.run)(ctx, plan).await?;
        }

        let phase_result = if analyzed.is_sequential {
            self.execute_sequential(plan, ctx, &analyzed).await
        } else {
            self.execute_parallel(plan, ctx, &analyzed).await
        };

        match phase_result {
            Ok(()) => {
                for hook in &analyzed.post_hooks {
                    (hook.run)(ctx, plan).await?;
                }
                Ok(())
            }
            // An ending-early sentinel still lets this plan's own
            // post-hooks run before the sentinel keeps propagating;
            // any other error skips post-hooks entirely.
            Err(err) if err.is_ending_early() => {
                for hook in &analyzed.post_hooks {
                    (hook.run)(ctx, plan).await?;
                }
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Concurrent loading pre-pass, then an in-order walk of
    /// components (`doExecuteSync` + `doConcurrentLoading`).
    async fn execute_sequential<P: Plan>(&self, plan: &mut P, ctx: &ExecutionContext, analyzed: &AnalyzedPlan<P>) -> Result<(), EngineError> {
        let mut loading = self.run_loading_phase(plan, ctx, analyzed).await;

        for (idx, component) in analyzed.components.iter().enumerate() {
            match component {
                ParsedComponent::Computer { id, back_write: target, .. } => {
                    let registered = self
                        .registry
                        .get_computer::<RegisteredComputer<P>>(id)
                        .ok_or_else(|| EngineError::Configuration(ConfigurationError::InvalidComputerType(id.to_string())))?;

                    let loaded = std::mem::take(&mut loading[idx]);
                    let outcome = compute_with_panic_guard(registered.computer.as_ref(), ctx, plan, loaded, id).await;

                    match outcome {
                        Ok(ComputedValue::Switch(to_execute)) => {
                            to_execute.execute(self, ctx).await?;
                            // A Switch component replaces the rest of this plan's
                            // walk with the plan it launched.
                            return Ok(());
                        }
                        Ok(ComputedValue::Value(value)) => {
                            apply_back_write(target, plan, Ok(Arc::from(value)));
                        }
                        Ok(ComputedValue::Unit) => {}
                        Err(err) => {
                            apply_back_write(target, plan, Err(err.to_string()));
                            return Err(err);
                        }
                    }
                }
                ParsedComponent::NestedPlan { execute, .. } => {
                    if let Err(err) = execute(plan, self, ctx).await {
                        if err.is_non_root_ending_early() {
                            continue;
                        }
                        return Err(err);
                    }
                }
            }
        }

        Ok(())
    }

    async fn run_loading_phase<P: Plan>(&self, plan: &P, ctx: &ExecutionContext, analyzed: &AnalyzedPlan<P>) -> Vec<LoadingData> {
        let mut loading: Vec<LoadingData> = (0..analyzed.components.len()).map(|_| LoadingData::empty()).collect();

        if !analyzed.has_loader.iter().any(|&has| has) {
            return loading;
        }

        let mut loaders = Vec::new();
        for (idx, component) in analyzed.components.iter().enumerate() {
            if !analyzed.has_loader[idx] {
                continue;
            }

            let ParsedComponent::Computer { id, .. } = component else {
                continue;
            };

            if let Some(registered) = self.registry.get_computer::<RegisteredComputer<P>>(id) {
                loaders.push(async move {
                    let data = registered.computer.load(ctx, plan).await;
                    (idx, data)
                });
            }
        }

        for (idx, data) in futures::future::join_all(loaders).await {
            loading[idx] = data;
        }

        loading
    }

    /// Fans every declared component out concurrently (`doExecuteAsync`).
    ///
    /// Computer components run as genuinely concurrent futures sharing
    /// one `&P` borrow, so a downstream computer's `compute` can read
    /// an upstream computer's not-yet-resolved `PlanResult` handle
    /// mid-flight. Nested-plan components need `&mut P` to reach their
    /// field through the plan author's accessor closure, which the
    /// compiler can't prove disjoint from that shared borrow across a
    /// type-erased `Fn`; they run afterward, each under its own
    /// exclusive borrow, rather than truly concurrently with the
    /// computers (documented as a Rust-aliasing-driven simplification
    /// in DESIGN.md).
    async fn execute_parallel<P: Plan>(&self, plan: &mut P, ctx: &ExecutionContext, analyzed: &AnalyzedPlan<P>) -> Result<(), EngineError> {
        let child_ctx = ctx.child();

        type Job<P> = (&'static str, Arc<RegisteredComputer<P>>, Option<weave_kernel::OutcomeSlot>);

        let mut jobs: Vec<Job<P>> = Vec::new();
        let mut nested_indices: Vec<usize> = Vec::new();

        for (idx, component) in analyzed.components.iter().enumerate() {
            match component {
                ParsedComponent::Computer { id, back_write: target, .. } => {
                    let registered = self
                        .registry
                        .get_computer::<RegisteredComputer<P>>(id)
                        .ok_or_else(|| EngineError::Configuration(ConfigurationError::InvalidComputerType(id.to_string())))?;

                    let slot = match target {
                        BackWrite::None => None,
                        BackWrite::SyncResult(_) => {
                            return Err(EngineError::Configuration(ConfigurationError::ParallelPlanCannotContainSyncResult {
                                plan: weave_kernel::identify::<P>().to_string(),
                                field: (*id).to_string(),
                            }));
                        }
                        BackWrite::Result(setter) => {
                            let (handle, slot) = PlanResult::handle();
                            setter(plan, handle);
                            Some(slot)
                        }
                    };

                    jobs.push((id, registered, slot));
                }
                ParsedComponent::NestedPlan { .. } => nested_indices.push(idx),
            }
        }

        // Every synchronous back-write-handle installation above is
        // done; take one shared borrow for the concurrent dispatch
        // phase below.
        let plan_ref: &P = plan;
        let engine = self;

        let mut tasks: FuturesUnordered<Pin<Box<dyn Future<Output = Result<(), EngineError>> + Send + '_>>> = FuturesUnordered::new();

        for (id, registered, slot) in jobs {
            let task_ctx = child_ctx.clone();
            tasks.push(Box::pin(async move {
                let loaded = registered.computer.load(&task_ctx, plan_ref).await;
                let outcome = compute_with_panic_guard(registered.computer.as_ref(), &task_ctx, plan_ref, loaded, id).await;

                match outcome {
                    Ok(ComputedValue::Switch(to_execute)) => {
                        let result = to_execute.execute(engine, &task_ctx).await;
                        if let Some(slot) = slot {
                            slot.resolve(Err("switch computers do not back-write a value".to_string()));
                        }
                        result
                    }
                    Ok(ComputedValue::Value(value)) => {
                        if let Some(slot) = slot {
                            slot.resolve(Ok(Arc::from(value)));
                        }
                        Ok(())
                    }
                    Ok(ComputedValue::Unit) => Ok(()),
                    Err(err) => {
                        if let Some(slot) = slot {
                            slot.resolve(Err(err.to_string()));
                        }
                        Err(err)
                    }
                }
            }));
        }

        let mut first_err: Option<EngineError> = None;
        while let Some(result) = tasks.next().await {
            if let Err(err) = result {
                if first_err.is_none() {
                    warn!(%err, "parallel phase cancelling remaining computers after first failure");
                    child_ctx.cancel();
                    first_err = Some(err);
                }
            }
        }

        drop(tasks);

        if let Some(err) = first_err {
            return Err(err);
        }

        for idx in nested_indices {
            let ParsedComponent::NestedPlan { execute, .. } = &analyzed.components[idx] else {
                unreachable!("nested_indices only ever holds indices of NestedPlan components");
            };

            if let Err(err) = execute(plan, self, ctx).await {
                if err.is_non_root_ending_early() {
                    continue;
                }
                return Err(err);
            }
        }

        Ok(())
    }
}

fn apply_back_write<P>(target: &BackWrite<P>, plan: &mut P, outcome: weave_kernel::Outcome) {
    match target {
        BackWrite::None => {}
        BackWrite::Result(setter) => setter(plan, PlanResult::completed(outcome)),
        BackWrite::SyncResult(setter) => setter(plan, weave_kernel::PlanSyncResult::new(outcome)),
    }
}

/// Catches a panicking `compute` call in place (the sequential phase
/// never hands the future to `tokio::spawn`, so `JoinError` isn't
/// available here) and converts it into `EngineError::ComputePanicked`.
async fn compute_with_panic_guard<P>(
    computer: &dyn ErasedComputer<P>,
    ctx: &ExecutionContext,
    plan: &P,
    loaded: LoadingData,
    computer_id: &str,
) -> ComputeOutcome {
    match AssertUnwindSafe(computer.compute(ctx, plan, loaded)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = panic_message(payload);
            error!(computer = computer_id, %message, "computer panicked");
            Err(EngineError::ComputePanicked {
                computer: computer_id.to_string(),
                message,
            })
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "computer panicked with a non-string payload".to_string()
    }
}
