//! Metadata every computer and hook must advertise: the `inout`
//! contract the validator checks against the plan's method catalog
//! (`cte/metadata.go`'s `CTEMetadata()` struct, `key`/`computer`/`inout`
//! fields).

use serde::Serialize;
use weave_kernel::MethodSignature;

/// Metadata attached to a registered computer. Serializable so an
/// embedding application can dump a plan's full component contract for
/// diagnostics without walking the registry by hand.
#[derive(Debug, Clone, Serialize)]
pub struct ComputerMetadata {
    /// Stable identifier of the computer implementation.
    pub computer_id: &'static str,
    /// The input/output methods the plan must expose for this
    /// computer to run against it.
    pub inout: Vec<MethodSignature>,
}

/// Metadata attached to a pre- or post-hook.
#[derive(Debug, Clone, Serialize)]
pub struct HookMetadata {
    pub hook_id: &'static str,
    pub inout: Vec<MethodSignature>,
}
