//! `PlanSchemaBuilder`: the registration-style API spec.md's design
//! notes (§9) sanction in place of Go's runtime field reflection.
//! Plan authors list their pre-hooks, components, and post-hooks in
//! the exact order they must run; that call order is the schedule.

use std::sync::Arc;

use weave_kernel::{PlanResult, PlanSyncResult};

use crate::computer::{EffectComputer, EffectWrapper, ImpureComputer, ImpureWrapper, SwitchComputer, SwitchWrapper};
use crate::engine::Engine;
use crate::error::ConfigurationError;
use crate::hook::{PostHook, PreHook, RegisteredHook};
use crate::metadata::ComputerMetadata;
use crate::plan::{BoxFuture, Plan};
use crate::validate::ComponentStack;

/// A component parsed from one call on the builder.
pub enum ParsedComponent<P> {
    Computer {
        id: &'static str,
        metadata: ComputerMetadata,
        is_sync_result: bool,
        back_write: BackWrite<P>,
    },
    NestedPlan {
        id: &'static str,
        #[allow(clippy::type_complexity)]
        execute: Box<
            dyn for<'a> Fn(&'a mut P, &'a Engine, &'a crate::execution::ExecutionContext) -> BoxFuture<'a, Result<(), crate::error::EngineError>>
                + Send
                + Sync,
        >,
        /// Recurses the completeness validator into the nested plan's
        /// own analyzed schema, reusing the root plan's method catalog
        /// (`cte/validator_completeness.go` rebuilds nothing per
        /// level; neither does this).
        validate: Box<dyn Fn(&Engine, &weave_kernel::MethodCatalog, &mut ComponentStack) -> Result<(), ConfigurationError> + Send + Sync>,
    },
}

/// Back-write behavior for a computer component. `None` for
/// SideEffect/SyncSideEffect fields, which the engine never touches.
pub enum BackWrite<P> {
    None,
    Result(Box<dyn Fn(&mut P, PlanResult) + Send + Sync>),
    SyncResult(Box<dyn Fn(&mut P, PlanSyncResult) + Send + Sync>),
}

/// The finished, immutable schedule for a plan type (`cte.analyzedPlan`).
pub struct AnalyzedPlan<P> {
    pub is_master_plan: bool,
    pub is_sequential: bool,
    pub components: Vec<ParsedComponent<P>>,
    /// Parallel-indexed with `components`: `true` at index `i` means
    /// component `i`'s registered computer has a non-trivial loader.
    pub has_loader: Vec<bool>,
    pub pre_hooks: Vec<RegisteredHook<P>>,
    pub post_hooks: Vec<RegisteredHook<P>>,
}

impl<P> std::fmt::Debug for AnalyzedPlan<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzedPlan")
            .field("is_master_plan", &self.is_master_plan)
            .field("is_sequential", &self.is_sequential)
            .field("components_len", &self.components.len())
            .field("has_loader", &self.has_loader)
            .field("pre_hooks_len", &self.pre_hooks.len())
            .field("post_hooks_len", &self.post_hooks.len())
            .finish()
    }
}

/// Builds an `AnalyzedPlan<P>` by accumulating components in
/// declaration order. Every `Engine::analyze_plan::<P>()` call
/// constructs exactly one of these via `P`'s `Schema::build_schema`.
pub struct PlanSchemaBuilder<'e, P: Plan> {
    engine: &'e Engine,
    is_sequential: bool,
    is_master_plan: bool,
    pre_hooks: Vec<RegisteredHook<P>>,
    post_hooks: Vec<RegisteredHook<P>>,
    components: Vec<ParsedComponent<P>>,
    has_loader: Vec<bool>,
}

impl<'e, P: Plan> PlanSchemaBuilder<'e, P> {
    pub fn new(engine: &'e Engine, is_sequential: bool, is_master_plan: bool) -> Self {
        Self {
            engine,
            is_sequential,
            is_master_plan,
            pre_hooks: Vec::new(),
            post_hooks: Vec::new(),
            components: Vec::new(),
            has_loader: Vec::new(),
        }
    }

    pub fn pre_hook<H: PreHook<P>>(mut self) -> Self {
        self.pre_hooks.push(RegisteredHook::from_pre::<H>());
        self
    }

    pub fn post_hook<H: PostHook<P>>(mut self) -> Self {
        self.post_hooks.push(RegisteredHook::from_post::<H>());
        self
    }

    /// Registers a nested plan, recursively analyzing it (idempotent)
    /// and recording an accessor the engine uses to recurse into it at
    /// execution time.
    pub fn nested_plan<NP>(mut self, accessor: impl Fn(&mut P) -> &mut NP + Send + Sync + 'static) -> Result<Self, ConfigurationError>
    where
        NP: crate::analyzer::Schema,
    {
        self.engine.analyze_plan::<NP>()?;

        let id = weave_kernel::identify::<NP>();
        self.components.push(ParsedComponent::NestedPlan {
            id,
            execute: Box::new(move |parent, engine, ctx| {
                let nested = accessor(parent);
                Box::pin(async move { engine.do_execute_plan(nested, ctx).await })
            }),
            validate: Box::new(|engine, root_catalog, stack| engine.validate_plan::<NP>(root_catalog, stack)),
        });
        self.has_loader.push(false);

        Ok(self)
    }

    pub fn result<C>(mut self, setter: impl Fn(&mut P, PlanResult) + Send + Sync + 'static) -> Result<Self, ConfigurationError>
    where
        C: ImpureComputer<Plan = P>,
    {
        let id = self.register_impure::<C>()?;
        self.components.push(ParsedComponent::Computer {
            id,
            metadata: C::metadata(),
            is_sync_result: false,
            back_write: BackWrite::Result(Box::new(setter)),
        });
        self.has_loader.push(C::has_loader());
        Ok(self)
    }

    pub fn sync_result<C>(mut self, setter: impl Fn(&mut P, PlanSyncResult) + Send + Sync + 'static) -> Result<Self, ConfigurationError>
    where
        C: ImpureComputer<Plan = P>,
    {
        if !self.is_sequential {
            return Err(ConfigurationError::ParallelPlanCannotContainSyncResult {
                plan: weave_kernel::identify::<P>().to_string(),
                field: weave_kernel::identify::<C>().to_string(),
            });
        }

        let id = self.register_impure::<C>()?;
        self.components.push(ParsedComponent::Computer {
            id,
            metadata: C::metadata(),
            is_sync_result: true,
            back_write: BackWrite::SyncResult(Box::new(setter)),
        });
        self.has_loader.push(C::has_loader());
        Ok(self)
    }

    pub fn side_effect<C>(mut self) -> Result<Self, ConfigurationError>
    where
        C: EffectComputer<Plan = P>,
    {
        let id = self.register_effect::<C>()?;
        self.components.push(ParsedComponent::Computer {
            id,
            metadata: C::metadata(),
            is_sync_result: false,
            back_write: BackWrite::None,
        });
        self.has_loader.push(C::has_loader());
        Ok(self)
    }

    pub fn sync_side_effect<C>(mut self) -> Result<Self, ConfigurationError>
    where
        C: EffectComputer<Plan = P>,
    {
        if !self.is_sequential {
            return Err(ConfigurationError::ParallelPlanCannotContainSyncSideEffect {
                plan: weave_kernel::identify::<P>().to_string(),
                field: weave_kernel::identify::<C>().to_string(),
            });
        }

        let id = self.register_effect::<C>()?;
        self.components.push(ParsedComponent::Computer {
            id,
            metadata: C::metadata(),
            is_sync_result: false,
            back_write: BackWrite::None,
        });
        self.has_loader.push(C::has_loader());
        Ok(self)
    }

    /// Registers a branch-switching computer. A `Switch` component
    /// never back-writes a field: its outcome is to replace the rest
    /// of execution with another master plan (§4.5).
    pub fn switch<C>(mut self) -> Result<Self, ConfigurationError>
    where
        C: SwitchComputer<Plan = P>,
    {
        let id = weave_kernel::identify::<C>();
        self.engine
            .register_computer::<P, _>(id, C::metadata(), SwitchWrapper(C::default()))?;

        self.components.push(ParsedComponent::Computer {
            id,
            metadata: C::metadata(),
            is_sync_result: false,
            back_write: BackWrite::None,
        });
        self.has_loader.push(C::has_loader());
        Ok(self)
    }

    fn register_impure<C: ImpureComputer<Plan = P>>(&self) -> Result<&'static str, ConfigurationError> {
        let id = weave_kernel::identify::<C>();
        self.engine
            .register_computer::<P, _>(id, C::metadata(), ImpureWrapper(C::default()))?;
        Ok(id)
    }

    fn register_effect<C: EffectComputer<Plan = P>>(&self) -> Result<&'static str, ConfigurationError> {
        let id = weave_kernel::identify::<C>();
        self.engine
            .register_computer::<P, _>(id, C::metadata(), EffectWrapper(C::default()))?;
        Ok(id)
    }

    pub fn build(self) -> Arc<AnalyzedPlan<P>> {
        Arc::new(AnalyzedPlan {
            is_master_plan: self.is_master_plan,
            is_sequential: self.is_sequential,
            components: self.components,
            has_loader: self.has_loader,
            pre_hooks: self.pre_hooks,
            post_hooks: self.post_hooks,
        })
    }
}
