//! The six declared computer capability shapes
//! (`cte/computer.go`'s `ImpureComputer`/`SideEffectComputer`/
//! `SwitchComputer`, each with or without a loader) collapsed into
//! three traits with a default no-op `load`, unified behind one
//! object-safe `ErasedComputer<P>` dispatch shape per plan type `P`.

use std::any::Any;

use async_trait::async_trait;

use crate::engine::Engine;
use crate::error::EngineError;
use crate::execution::ExecutionContext;
use crate::metadata::ComputerMetadata;
use crate::plan::{BoxFuture, MasterPlan};

pub type LoadedAny = Box<dyn Any + Send + Sync>;

/// Result of a computer's (optional) loader: a loaded value, or an
/// error captured per-slot without aborting the concurrent loading
/// phase (§5).
#[derive(Default)]
pub struct LoadingData {
    pub data: Option<LoadedAny>,
    pub err: Option<EngineError>,
}

impl LoadingData {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn ok(data: LoadedAny) -> Self {
        Self { data: Some(data), err: None }
    }

    pub fn failed(err: EngineError) -> Self {
        Self { data: None, err: Some(err) }
    }
}

/// What a computer produced, type-erased over the three shapes.
pub enum ComputedValue {
    Value(Box<dyn Any + Send + Sync>),
    Unit,
    Switch(ToExecutePlan),
}

pub type ComputeOutcome = Result<ComputedValue, EngineError>;

/// Carries a replacement master plan returned by a `Switch` computer.
/// The engine observes this after `compute` returns and executes the
/// replacement immediately in place of continuing the current plan
/// (§4.5, branch switching).
pub struct ToExecutePlan {
    run: Box<dyn for<'a> FnOnce(&'a Engine, &'a ExecutionContext) -> BoxFuture<'a, Result<(), EngineError>> + Send>,
}

impl ToExecutePlan {
    pub async fn execute(self, engine: &Engine, ctx: &ExecutionContext) -> Result<(), EngineError> {
        (self.run)(engine, ctx).await
    }
}

/// A computer producing a value, back-written into a `Result`/`SyncResult` field.
#[async_trait]
pub trait ImpureComputer: Send + Sync + Default + 'static {
    type Plan: MasterPlan;

    async fn load(&self, _ctx: &ExecutionContext, _plan: &Self::Plan) -> LoadingData {
        LoadingData::empty()
    }

    /// Override to `true` alongside a real `load` implementation so
    /// the sequential phase includes this computer in its concurrent
    /// loading pre-pass.
    fn has_loader() -> bool {
        false
    }

    async fn compute(
        &self,
        ctx: &ExecutionContext,
        plan: &Self::Plan,
        loaded: LoadingData,
    ) -> Result<Box<dyn Any + Send + Sync>, EngineError>;

    fn metadata() -> ComputerMetadata;
}

/// A computer performing effects with no bound outcome, used for
/// `SideEffect`/`SyncSideEffect` fields.
#[async_trait]
pub trait EffectComputer: Send + Sync + Default + 'static {
    type Plan: MasterPlan;

    async fn load(&self, _ctx: &ExecutionContext, _plan: &Self::Plan) -> LoadingData {
        LoadingData::empty()
    }

    fn has_loader() -> bool {
        false
    }

    async fn compute(&self, ctx: &ExecutionContext, plan: &Self::Plan, loaded: LoadingData) -> Result<(), EngineError>;

    fn metadata() -> ComputerMetadata;
}

/// A computer that delegates the remainder of execution to a replacement plan.
#[async_trait]
pub trait SwitchComputer: Send + Sync + Default + 'static {
    type Plan: MasterPlan;
    type Replacement: MasterPlan;

    async fn load(&self, _ctx: &ExecutionContext, _plan: &Self::Plan) -> LoadingData {
        LoadingData::empty()
    }

    fn has_loader() -> bool {
        false
    }

    async fn switch(
        &self,
        ctx: &ExecutionContext,
        plan: &Self::Plan,
        loaded: LoadingData,
    ) -> Result<Self::Replacement, EngineError>;

    fn metadata() -> ComputerMetadata;
}

/// The uniform dispatch shape `cte/computer.go` calls `delegatingComputer`.
#[async_trait]
pub trait ErasedComputer<P>: Send + Sync {
    async fn load(&self, ctx: &ExecutionContext, plan: &P) -> LoadingData;
    async fn compute(&self, ctx: &ExecutionContext, plan: &P, loaded: LoadingData) -> ComputeOutcome;
    fn has_loader(&self) -> bool;
}

pub struct ImpureWrapper<C>(pub C);

#[async_trait]
impl<C: ImpureComputer> ErasedComputer<C::Plan> for ImpureWrapper<C> {
    async fn load(&self, ctx: &ExecutionContext, plan: &C::Plan) -> LoadingData {
        self.0.load(ctx, plan).await
    }

    async fn compute(&self, ctx: &ExecutionContext, plan: &C::Plan, loaded: LoadingData) -> ComputeOutcome {
        self.0.compute(ctx, plan, loaded).await.map(ComputedValue::Value)
    }

    fn has_loader(&self) -> bool {
        C::has_loader()
    }
}

pub struct EffectWrapper<C>(pub C);

#[async_trait]
impl<C: EffectComputer> ErasedComputer<C::Plan> for EffectWrapper<C> {
    async fn load(&self, ctx: &ExecutionContext, plan: &C::Plan) -> LoadingData {
        self.0.load(ctx, plan).await
    }

    async fn compute(&self, ctx: &ExecutionContext, plan: &C::Plan, loaded: LoadingData) -> ComputeOutcome {
        self.0.compute(ctx, plan, loaded).await.map(|_| ComputedValue::Unit)
    }

    fn has_loader(&self) -> bool {
        C::has_loader()
    }
}

pub struct SwitchWrapper<C>(pub C);

#[async_trait]
impl<C: SwitchComputer> ErasedComputer<C::Plan> for SwitchWrapper<C> {
    async fn load(&self, ctx: &ExecutionContext, plan: &C::Plan) -> LoadingData {
        self.0.load(ctx, plan).await
    }

    async fn compute(&self, ctx: &ExecutionContext, plan: &C::Plan, loaded: LoadingData) -> ComputeOutcome {
        let replacement = self.0.switch(ctx, plan, loaded).await?;

        Ok(ComputedValue::Switch(ToExecutePlan {
            run: Box::new(move |engine, ctx| {
                let mut replacement = replacement;
                Box::pin(async move { engine.execute_master_plan(&mut replacement, ctx).await })
            }),
        }))
    }

    fn has_loader(&self) -> bool {
        C::has_loader()
    }
}

/// A computer instantiated and wrapped behind `ErasedComputer<P>`, together with its metadata.
pub struct RegisteredComputer<P> {
    pub id: &'static str,
    pub metadata: ComputerMetadata,
    pub computer: Box<dyn ErasedComputer<P>>,
}
