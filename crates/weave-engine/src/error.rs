//! Error vocabulary, split into configuration-time and execution-time
//! families exactly as the design calls for (§7): configuration errors
//! surface from `analyze_plan`/`verify_configurations`, execution
//! errors from `execute_master_plan`.

use thiserror::Error;
use weave_kernel::method::{MethodOrigin, MethodSignature};

/// Raised while registering plans/computers or while validating a
/// master plan's completeness (`cte/errors.go`'s configuration-time
/// vocabulary). Returned as `Result`, never panicked, so application
/// startup code can report it gracefully.
#[derive(Debug, Error, Clone)]
pub enum ConfigurationError {
    #[error("{0} is not a computer")]
    InvalidComputerType(String),

    #[error("metadata is missing for {0}")]
    MetadataMissing(String),

    #[error("metadata is nil for {0}")]
    NilMetadata(String),

    #[error("computer metadata is missing in {0}")]
    ComputerMetaMissing(String),

    #[error("inout metadata is missing in {0}")]
    InoutMetaMissing(String),

    #[error("{0} requires mutable access to be registered as a plan")]
    PlanRequiresMutableHandle(String),

    #[error("{0} has not been analyzed yet; call Engine::analyze_plan on it first")]
    PlanNotAnalyzed(String),

    #[error("{plan} has a nested plan {nested} that must be boxed to satisfy its accessor")]
    NestedPlanCannotBeBoxed { plan: String, nested: String },

    #[error("{plan} is a parallel plan and cannot contain a SyncResult field ({field})")]
    ParallelPlanCannotContainSyncResult { plan: String, field: String },

    #[error("{plan} is a parallel plan and cannot contain a SyncSideEffect field ({field})")]
    ParallelPlanCannotContainSyncSideEffect { plan: String, field: String },

    #[error("{0} is not a recognized computer key type")]
    UnknownComputerKeyType(String),

    #[error(
        "{plan_type} does not implement the required in-out interface, problem found: {problem}. Component stack: {stack}"
    )]
    PlanNotMeetingInoutRequirements {
        plan_type: String,
        problem: String,
        stack: String,
    },

    #[error("missing method: [{0}]")]
    PlanMissingMethod(MethodSignature),

    #[error("required method: [{required}], found ambiguous methods at: [{}]", origins.iter().map(|o| o.to_string()).collect::<Vec<_>>().join("; "))]
    PlanHavingAmbiguousMethods {
        required: MethodSignature,
        origins: Vec<MethodOrigin>,
    },

    #[error("required method: [{required}], found method with mismatched signature: [{found}]")]
    PlanHavingMethodButSignatureMismatched {
        required: MethodSignature,
        found: MethodSignature,
    },

    #[error("required method provided more than once by the same plan: [{method}], at: [{}]", origins.iter().map(|o| o.to_string()).collect::<Vec<_>>().join("; "))]
    PlanHavingSameMethodRegisteredMoreThanOnce {
        method: MethodSignature,
        origins: Vec<MethodOrigin>,
    },
}

/// Raised while executing a master plan (`cte/errors.go`'s
/// execution-time vocabulary plus the two early-termination sentinels,
/// represented here as distinct enum variants rather than
/// value-compared sentinel errors per the design notes, §9).
#[derive(Debug, Error, Clone)]
pub enum EngineError {
    #[error("plan execution ending early")]
    PlanExecutionEndingEarly,

    #[error("plan execution ending early from root")]
    RootPlanExecutionEndingEarly,

    #[error("panic while executing computer {computer}: {message}")]
    ComputePanicked { computer: String, message: String },

    #[error("hook {hook} failed: {message}")]
    HookFailed { hook: String, message: String },

    #[error("computer {computer} failed: {message}")]
    ComputerFailed { computer: String, message: String },

    #[error("nested plan {plan} failed: {message}")]
    NestedPlanFailed { plan: String, message: String },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl EngineError {
    /// `cte/utilities.go`'s `swallowErrPlanExecutionEndingEarly`: both
    /// sentinel kinds convert to a successful return at the
    /// master-plan boundary.
    pub fn is_ending_early(&self) -> bool {
        matches!(
            self,
            EngineError::PlanExecutionEndingEarly | EngineError::RootPlanExecutionEndingEarly
        )
    }

    /// Only the non-root sentinel is swallowed by a nested plan's
    /// immediate parent; the root variant propagates upward.
    pub fn is_non_root_ending_early(&self) -> bool {
        matches!(self, EngineError::PlanExecutionEndingEarly)
    }
}
