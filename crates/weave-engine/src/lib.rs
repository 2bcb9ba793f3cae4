//! Declarative plan execution: register components against a plan
//! type, validate the registration statically, then run it.
//!
//! Built on top of `weave-kernel`'s identity, method-catalog, and
//! outcome-cell primitives. See `DESIGN.md` for how each module here
//! maps back to `cte/*.go`.

mod analyzer;
mod computer;
mod engine;
mod error;
mod execution;
mod hook;
mod metadata;
mod plan;
mod registry;
mod schema;
mod validate;

pub use analyzer::Schema;
pub use computer::{
    ComputeOutcome, ComputedValue, EffectComputer, EffectWrapper, ErasedComputer, ImpureComputer, ImpureWrapper, LoadedAny, LoadingData,
    RegisteredComputer, SwitchComputer, SwitchWrapper, ToExecutePlan,
};
pub use engine::Engine;
pub use error::{ConfigurationError, EngineError};
pub use execution::ExecutionContext;
pub use hook::{PostHook, PreHook, RegisteredHook};
pub use metadata::{ComputerMetadata, HookMetadata};
pub use plan::{BoxFuture, MasterPlan, Plan};
pub use schema::{AnalyzedPlan, BackWrite, ParsedComponent, PlanSchemaBuilder};
pub use validate::ComponentStack;
