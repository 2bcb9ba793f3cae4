//! Reflection-free identity, value, and method-catalog primitives for
//! the plan execution engine. `weave-engine` builds the analyzer,
//! dispatch runtime, and completeness validator on top of these types.

pub mod identity;
pub mod method;
pub mod value;

#[cfg(feature = "config")]
pub mod config;

pub use identity::identify;
pub use method::{MethodCatalog, MethodOrigin, MethodSignature, Resolution};
pub use value::{Outcome, OutcomeSlot, PlanResult, PlanSyncResult};
