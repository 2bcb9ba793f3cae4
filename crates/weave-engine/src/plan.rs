//! Plan and master-plan capability traits.
//!
//! Go expresses these as `IsSequentialCTEPlan() bool` and
//! `Execute(ctx) error` on the plan's method set. Weave keeps the same
//! two capabilities; unlike the source, a plan's schema is generic
//! over its concrete type (`schema.rs`), so the engine never needs to
//! recover `P` from a type-erased handle at execution time — only its
//! top-level registries (`registry.rs`) type-erase, and they downcast
//! at call sites that already know `P` statically.

use std::future::Future;
use std::pin::Pin;

/// A declared composite of steps. Implementors are always handled
/// through a mutable reference; `weave-kernel`'s identity helpers key
/// the engine's registries off `P`'s type identifier.
pub trait Plan: Send + Sync + 'static {
    /// Sequential plans run a concurrent loading pre-pass then walk
    /// components one at a time; parallel plans fan every component
    /// out concurrently. See `engine.rs`.
    fn is_sequential(&self) -> bool;
}

/// A plan that can be run at the top level via `Engine::execute_master_plan`.
pub trait MasterPlan: Plan {}

/// Convenience alias used throughout the engine for boxed futures
/// returned from type-erased closures.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
