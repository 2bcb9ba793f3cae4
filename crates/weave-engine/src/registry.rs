//! Process-wide (here: engine-instance-wide) maps of analyzed plans
//! and registered computers (`cte/engine.go`'s `Engine` struct). Both
//! maps are filled during registration and read-only during
//! execution; a long-lived `Engine` is typically held behind an `Arc`
//! by the embedding application (teacher convention, see
//! `mofa-foundation/workflow/executor.rs`'s `ExecutorConfig`).

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::engine::Engine;
use crate::error::ConfigurationError;

/// A type-erased entry point into `Engine::validate_plan::<P>`, stashed
/// at `analyze_plan` time for every plan registered as a master plan
/// so `Engine::verify_configurations` can walk each one without
/// needing `P` named at the call site.
pub type MasterPlanValidator = Arc<dyn Fn(&Engine) -> Result<(), ConfigurationError> + Send + Sync>;

#[derive(Default)]
pub struct Registry {
    plans: RwLock<HashMap<&'static str, Arc<dyn Any + Send + Sync>>>,
    computers: RwLock<HashMap<&'static str, Arc<dyn Any + Send + Sync>>>,
    master_plan_validators: RwLock<HashMap<&'static str, MasterPlanValidator>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_plan<T: Send + Sync + 'static>(&self, id: &str) -> Option<Arc<T>> {
        self.plans
            .read()
            .expect("plan registry lock poisoned")
            .get(id)
            .and_then(|entry| entry.clone().downcast::<T>().ok())
    }

    /// Inserts if absent; returns `true` if this call performed the
    /// insertion (idempotent registration, Universal Property 1).
    pub fn insert_plan_if_absent<T: Send + Sync + 'static>(&self, id: &'static str, value: Arc<T>) -> bool {
        let mut plans = self.plans.write().expect("plan registry lock poisoned");
        if plans.contains_key(id) {
            return false;
        }
        plans.insert(id, value as Arc<dyn Any + Send + Sync>);
        true
    }

    pub fn is_plan_registered(&self, id: &str) -> bool {
        self.plans.read().expect("plan registry lock poisoned").contains_key(id)
    }

    pub fn get_computer<T: Send + Sync + 'static>(&self, id: &str) -> Option<Arc<T>> {
        self.computers
            .read()
            .expect("computer registry lock poisoned")
            .get(id)
            .and_then(|entry| entry.clone().downcast::<T>().ok())
    }

    pub fn insert_computer_if_absent<T: Send + Sync + 'static>(&self, id: &'static str, value: Arc<T>) -> bool {
        let mut computers = self.computers.write().expect("computer registry lock poisoned");
        if computers.contains_key(id) {
            return false;
        }
        computers.insert(id, value as Arc<dyn Any + Send + Sync>);
        true
    }

    pub fn is_computer_registered(&self, id: &str) -> bool {
        self.computers.read().expect("computer registry lock poisoned").contains_key(id)
    }

    pub fn insert_master_plan_validator_if_absent(&self, id: &'static str, validator: MasterPlanValidator) {
        let mut validators = self.master_plan_validators.write().expect("validator registry lock poisoned");
        validators.entry(id).or_insert(validator);
    }

    pub fn master_plan_validators(&self) -> Vec<MasterPlanValidator> {
        self.master_plan_validators
            .read()
            .expect("validator registry lock poisoned")
            .values()
            .cloned()
            .collect()
    }
}
