//! Registration entry points. `cte/engine.go`'s `AnalyzePlan` walks a
//! plan's fields via reflection; `Schema::build_schema` is the
//! registration-style replacement spec.md's design notes (§9)
//! describe, with the plan author listing components explicitly.

use std::sync::Arc;

use weave_kernel::{MethodCatalog, MethodSignature};

use crate::engine::Engine;
use crate::error::ConfigurationError;
use crate::plan::Plan;
use crate::schema::{AnalyzedPlan, PlanSchemaBuilder};

/// A plan type that knows how to build its own schedule. Kept
/// separate from `Plan` because building a schema needs a fresh,
/// default-constructed instance (mirroring `reflect.New` in the
/// source), while `Plan::is_sequential` is an instance method queried
/// at execution time against the caller's actual plan value.
pub trait Schema: Plan + Default + Sized + 'static {
    /// Whether this plan type can be run at the top level via
    /// `Engine::execute_master_plan`. The source derives this from a
    /// `MasterPlan` type assertion at registration time; Rust has no
    /// runtime type-assertion equivalent, so plan authors declare it.
    const IS_MASTER_PLAN: bool;

    fn build_schema(engine: &Engine) -> Result<PlanSchemaBuilder<'_, Self>, ConfigurationError>;

    /// Catalogs hoisted into this plan's method catalog, in place of
    /// the source's anonymous struct embedding. Most plans declare no
    /// composition and override only `own_methods`.
    fn composes_from() -> Vec<MethodCatalog> {
        Vec::new()
    }

    /// Methods this plan type itself exposes to satisfy computers' and
    /// hooks' `inout` contracts (getters backing `Result`/`SyncResult`
    /// fields, typically).
    fn own_methods() -> Vec<MethodSignature> {
        Vec::new()
    }

    /// The completeness validator builds this once per master plan and
    /// reuses it for every site in the schema tree, exactly as
    /// `cte/validator_completeness.go`'s `structDisassembler` is built
    /// once per validation run rather than per nested plan.
    fn method_catalog() -> MethodCatalog {
        let id = weave_kernel::identify::<Self>();
        MethodCatalog::build(id, &[id], Self::composes_from(), Self::own_methods())
    }
}

impl Engine {
    /// Idempotent registration (Universal Property 1): builds and
    /// caches `P`'s `AnalyzedPlan`, transitively registering every
    /// nested plan and computer `P`'s schema declares.
    pub fn analyze_plan<P: Schema>(&self) -> Result<Arc<AnalyzedPlan<P>>, ConfigurationError> {
        let id = weave_kernel::identify::<P>();

        if let Some(existing) = self.registry().get_plan::<AnalyzedPlan<P>>(id) {
            return Ok(existing);
        }

        let builder = P::build_schema(self)?;
        let analyzed = builder.build();
        self.registry().insert_plan_if_absent(id, analyzed.clone());

        if P::IS_MASTER_PLAN {
            self.registry()
                .insert_master_plan_validator_if_absent(id, Arc::new(|engine: &Engine| engine.validate_plan::<P>(&P::method_catalog(), &mut Vec::new())));
        }

        Ok(analyzed)
    }
}
