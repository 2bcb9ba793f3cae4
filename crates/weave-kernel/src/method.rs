//! Method catalog construction with composition-hoisting and
//! ambiguity detection.
//!
//! Go builds this by walking anonymous embedded struct fields at
//! runtime. Without field reflection, a plan type instead declares an
//! explicit `composes_from()` list of the catalogs it is built from;
//! `MethodCatalog::build` folds those together with the plan's own
//! declared methods using the same hoist/ambiguity rule the source
//! framework uses (`cte/reflect.go`).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single method's shape, receiver elided — mirrors `cte.method`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSignature {
    pub name: &'static str,
    pub args: Vec<&'static str>,
    pub outputs: Vec<&'static str>,
}

impl MethodSignature {
    pub fn new(name: &'static str, args: Vec<&'static str>, outputs: Vec<&'static str>) -> Self {
        Self { name, args, outputs }
    }

    fn has_same_shape(&self, other: &MethodSignature) -> bool {
        self.name == other.name && self.args == other.args && self.outputs == other.outputs
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args.join(","))?;
        match self.outputs.len() {
            0 => Ok(()),
            1 => write!(f, " {}", self.outputs[0]),
            _ => write!(f, " ({})", self.outputs.join(",")),
        }
    }
}

/// Where a recorded method signature was declared: an owner identifier
/// plus the component stack active when it was folded into the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodOrigin {
    pub owner: String,
    #[serde(borrow)]
    pub component_stack: Vec<&'static str>,
}

impl fmt::Display for MethodOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.owner, self.component_stack.join(" > "))
    }
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    signature: MethodSignature,
    origins: Vec<MethodOrigin>,
    /// distinct owners that declared this exact signature directly
    /// (i.e. not already hoisted from further down the tree)
    distinct_owners: Vec<String>,
    hoisted_on_plan: bool,
}

/// The transitive set of methods a plan type exposes, with origin
/// tracking, built from an explicit composition list instead of
/// runtime embedding.
#[derive(Debug, Clone, Default)]
pub struct MethodCatalog {
    /// name -> every signature recorded under that name (normally one,
    /// more than one means an ambiguous declaration)
    by_name: HashMap<&'static str, Vec<CatalogEntry>>,
}

impl MethodCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds the catalog for `owner`, folding in every catalog listed
    /// in `composes_from` (depth-first, matching the source's embedded
    /// field walk) before `own_methods` (the plan's own declared
    /// methods), so that a plan-level declaration can hoist over
    /// anything reachable through composition.
    pub fn build(
        owner: &str,
        component_stack: &[&'static str],
        composes_from: Vec<MethodCatalog>,
        own_methods: Vec<MethodSignature>,
    ) -> Self {
        let mut catalog = MethodCatalog::empty();

        for composed in composes_from {
            catalog.absorb(composed);
        }

        for method in own_methods {
            catalog.record_own(owner, component_stack, method);
        }

        catalog
    }

    /// Folds another catalog's entries into this one as hoisted
    /// methods: a name contributed by two distinct composed owners is
    /// ambiguous unless a later direct declaration on `owner` collapses
    /// it (handled in `record_own`).
    fn absorb(&mut self, other: MethodCatalog) {
        for (name, entries) in other.by_name {
            let bucket = self.by_name.entry(name).or_default();
            for entry in entries {
                if let Some(existing) = bucket
                    .iter_mut()
                    .find(|e| e.signature.has_same_shape(&entry.signature))
                {
                    existing.origins.extend(entry.origins);
                    for owner in entry.distinct_owners {
                        if !existing.distinct_owners.contains(&owner) {
                            existing.distinct_owners.push(owner);
                        }
                    }
                } else {
                    bucket.push(entry);
                }
            }
        }
    }

    /// Records a method declared directly on `owner`. If the same
    /// signature is already present via composition, this is a hoist:
    /// the plan's own declaration collapses any ambiguity among
    /// composed ancestors and becomes the sole recorded contributor.
    fn record_own(&mut self, owner: &str, component_stack: &[&'static str], method: MethodSignature) {
        let bucket = self.by_name.entry(method.name).or_default();

        if let Some(existing) = bucket
            .iter_mut()
            .find(|e| e.signature.has_same_shape(&method))
        {
            existing.hoisted_on_plan = true;
            existing.distinct_owners = vec![owner.to_string()];
            existing.origins.push(MethodOrigin {
                owner: owner.to_string(),
                component_stack: component_stack.to_vec(),
            });
            return;
        }

        bucket.push(CatalogEntry {
            signature: method,
            origins: vec![MethodOrigin {
                owner: owner.to_string(),
                component_stack: component_stack.to_vec(),
            }],
            distinct_owners: vec![owner.to_string()],
            hoisted_on_plan: false,
        });
    }

    /// Every recorded entry for `name`; `None` if the name was never
    /// recorded at all.
    fn entries_for(&self, name: &str) -> Option<&[CatalogEntry]> {
        self.by_name.get(name).map(|v| v.as_slice())
    }

    /// Resolves a required method against the catalog, following the
    /// exact precedence order `cte/validator_completeness.go` uses.
    pub fn resolve(&self, required: &MethodSignature) -> Resolution<'_> {
        let Some(entries) = self.entries_for(required.name) else {
            return Resolution::Missing;
        };

        if entries.len() > 1 {
            let origins: Vec<&MethodOrigin> = entries.iter().flat_map(|e| &e.origins).collect();
            return Resolution::Ambiguous(origins);
        }

        let entry = &entries[0];

        if !entry.signature.has_same_shape(required) {
            return Resolution::SignatureMismatch(&entry.signature);
        }

        if entry.is_available_more_than_once() {
            return Resolution::DuplicateRegistration(entry.origins.iter().collect());
        }

        Resolution::Satisfied
    }
}

impl CatalogEntry {
    /// "Available more than once": two or more distinct owners
    /// contribute this exact signature and no direct plan declaration
    /// hoisted over them.
    fn is_available_more_than_once(&self) -> bool {
        !self.hoisted_on_plan && self.distinct_owners.len() > 1
    }
}

/// Outcome of resolving one required method against a catalog.
#[derive(Debug)]
pub enum Resolution<'a> {
    Satisfied,
    Missing,
    Ambiguous(Vec<&'a MethodOrigin>),
    SignatureMismatch(&'a MethodSignature),
    DuplicateRegistration(Vec<&'a MethodOrigin>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(name: &'static str) -> MethodSignature {
        MethodSignature::new(name, vec![], vec!["i32"])
    }

    #[test]
    fn direct_declaration_resolves() {
        let catalog = MethodCatalog::build("Plan", &["Plan"], vec![], vec![sig("GetA")]);
        assert!(matches!(catalog.resolve(&sig("GetA")), Resolution::Satisfied));
    }

    #[test]
    fn missing_method_is_reported() {
        let catalog = MethodCatalog::build("Plan", &["Plan"], vec![], vec![]);
        assert!(matches!(catalog.resolve(&sig("GetA")), Resolution::Missing));
    }

    #[test]
    fn two_composed_owners_are_ambiguous() {
        let left = MethodCatalog::build("Left", &["Plan", "Left"], vec![], vec![sig("GetX")]);
        let right = MethodCatalog::build("Right", &["Plan", "Right"], vec![], vec![sig("GetX")]);
        let catalog = MethodCatalog::build("Plan", &["Plan"], vec![left, right], vec![]);

        assert!(matches!(catalog.resolve(&sig("GetX")), Resolution::Ambiguous(_)));
    }

    #[test]
    fn plan_level_declaration_hoists_over_ambiguity() {
        let left = MethodCatalog::build("Left", &["Plan", "Left"], vec![], vec![sig("GetX")]);
        let right = MethodCatalog::build("Right", &["Plan", "Right"], vec![], vec![sig("GetX")]);
        let catalog = MethodCatalog::build("Plan", &["Plan"], vec![left, right], vec![sig("GetX")]);

        assert!(matches!(catalog.resolve(&sig("GetX")), Resolution::Satisfied));
    }

    #[test]
    fn signature_mismatch_is_reported() {
        let catalog = MethodCatalog::build(
            "Plan",
            &["Plan"],
            vec![],
            vec![MethodSignature::new("GetA", vec![], vec!["f64"])],
        );
        assert!(matches!(
            catalog.resolve(&sig("GetA")),
            Resolution::SignatureMismatch(_)
        ));
    }
}
