//! Static completeness validation: before any master plan runs, check
//! that every hook and computer's declared `inout` contract is
//! satisfiable by the plan's own method catalog.
//!
//! Grounded on `cte/validator_completeness.go`. The source builds one
//! `structDisassembler` per validation run and reuses it at every
//! depth of the schema tree; here the equivalent `MethodCatalog` is
//! built once, by `Schema::method_catalog`, and threaded through the
//! recursive walk unchanged.

use weave_kernel::method::{MethodSignature, Resolution};
use weave_kernel::MethodCatalog;

use crate::analyzer::Schema;
use crate::engine::Engine;
use crate::error::ConfigurationError;
use crate::schema::ParsedComponent;

/// Root-to-site identifier path, attached to every validation failure
/// for diagnostics (`cte.componentStack`).
pub type ComponentStack = Vec<&'static str>;

impl Engine {
    /// Validates every plan registered as a master plan
    /// (`cte/engine.go`'s `VerifyConfigurations`). Stops at the first
    /// failure encountered, in registration order.
    pub fn verify_configurations(&self) -> Result<(), ConfigurationError> {
        for validator in self.registry().master_plan_validators() {
            validator(self)?;
        }
        Ok(())
    }

    /// Depth-first walk of `P`'s analyzed schema: every pre-hook, then
    /// every component (recursing into nested plans), then every
    /// post-hook, checking each against `root_catalog`.
    pub fn validate_plan<P: Schema>(&self, root_catalog: &MethodCatalog, stack: &mut ComponentStack) -> Result<(), ConfigurationError> {
        let plan_type = weave_kernel::identify::<P>();
        let analyzed = self
            .registry()
            .get_plan::<crate::schema::AnalyzedPlan<P>>(plan_type)
            .ok_or_else(|| ConfigurationError::PlanNotAnalyzed(plan_type.to_string()))?;

        stack.push(plan_type);

        for hook in &analyzed.pre_hooks {
            check_inout(&hook.metadata.inout, root_catalog, plan_type, stack, hook.id)?;
        }

        for component in &analyzed.components {
            match component {
                ParsedComponent::Computer { id, metadata, .. } => {
                    check_inout(&metadata.inout, root_catalog, plan_type, stack, id)?;
                }
                ParsedComponent::NestedPlan { validate, .. } => {
                    validate(self, root_catalog, stack)?;
                }
            }
        }

        for hook in &analyzed.post_hooks {
            check_inout(&hook.metadata.inout, root_catalog, plan_type, stack, hook.id)?;
        }

        stack.pop();

        Ok(())
    }
}

/// Checks every required method in `required` against `catalog`,
/// returning the first failure wrapped as `PlanNotMeetingInoutRequirements`
/// with `component_id` appended to the reported stack
/// (`verifyComponentCompleteness` + `isInterfaceSatisfied`, folded
/// into one pass since Rust has no interface method set to iterate —
/// `required` already enumerates it).
fn check_inout(
    required: &[MethodSignature],
    catalog: &MethodCatalog,
    plan_type: &str,
    stack: &ComponentStack,
    component_id: &'static str,
) -> Result<(), ConfigurationError> {
    for method in required {
        let problem = match catalog.resolve(method) {
            Resolution::Satisfied => continue,
            Resolution::Missing => ConfigurationError::PlanMissingMethod(method.clone()),
            Resolution::Ambiguous(origins) => ConfigurationError::PlanHavingAmbiguousMethods {
                required: method.clone(),
                origins: origins.into_iter().cloned().collect(),
            },
            Resolution::SignatureMismatch(found) => ConfigurationError::PlanHavingMethodButSignatureMismatched {
                required: method.clone(),
                found: found.clone(),
            },
            Resolution::DuplicateRegistration(origins) => ConfigurationError::PlanHavingSameMethodRegisteredMoreThanOnce {
                method: method.clone(),
                origins: origins.into_iter().cloned().collect(),
            },
        };

        let mut full_stack = stack.clone();
        full_stack.push(component_id);

        return Err(ConfigurationError::PlanNotMeetingInoutRequirements {
            plan_type: plan_type.to_string(),
            problem: problem.to_string(),
            stack: full_stack.join(" > "),
        });
    }

    Ok(())
}
