//! Pre- and post-execution hooks (`cte.Pre`/`cte.Post`).

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::execution::ExecutionContext;
use crate::metadata::HookMetadata;
use crate::plan::Plan;

#[async_trait]
pub trait PreHook<P: Plan>: Send + Sync + Default + 'static {
    async fn pre_execute(&self, ctx: &ExecutionContext, plan: &P) -> Result<(), EngineError>;
    fn metadata() -> HookMetadata;
}

#[async_trait]
pub trait PostHook<P: Plan>: Send + Sync + Default + 'static {
    async fn post_execute(&self, ctx: &ExecutionContext, plan: &P) -> Result<(), EngineError>;
    fn metadata() -> HookMetadata;
}

/// A registered hook, type-erased over the plan type `P` it was built
/// against so the engine's `AnalyzedPlan` can stay non-generic.
pub struct RegisteredHook<P> {
    pub id: &'static str,
    pub metadata: HookMetadata,
    pub run: Box<
        dyn for<'a> Fn(
                &'a ExecutionContext,
                &'a P,
            ) -> crate::plan::BoxFuture<'a, Result<(), EngineError>>
            + Send
            + Sync,
    >,
}

impl<P: Plan> RegisteredHook<P> {
    pub fn from_pre<H: PreHook<P>>() -> Self {
        let hook = Arc::new(H::default());
        Self {
            id: weave_kernel::identify::<H>(),
            metadata: H::metadata(),
            run: Box::new(move |ctx, plan| {
                let hook = hook.clone();
                Box::pin(async move { hook.pre_execute(ctx, plan).await })
            }),
        }
    }

    pub fn from_post<H: PostHook<P>>() -> Self {
        let hook = Arc::new(H::default());
        Self {
            id: weave_kernel::identify::<H>(),
            metadata: H::metadata(),
            run: Box::new(move |ctx, plan| {
                let hook = hook.clone();
                Box::pin(async move { hook.post_execute(ctx, plan).await })
            }),
        }
    }
}
