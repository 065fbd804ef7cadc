use serde::Serialize;

use crate::error::FocusLockError;

use super::{
    clause::{TrafficClause, templates},
    layer::EnforcementLayer,
    toggle::{ToggleKey, ToggleSelection},
};

/// Clauses compiled for one enforcement layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClauseGroup {
    pub layer: EnforcementLayer,
    /// Toggles that contributed at least one clause, in declared order
    pub toggles: Vec<ToggleKey>,
    /// Contributing clauses in declared toggle order, without duplicates
    pub clauses: Vec<TrafficClause>,
}

impl ClauseGroup {
    /// Combined traffic expression for the layer.
    ///
    /// A single clause is passed through untouched; several are OR-ed inside
    /// one pair of parentheses.
    pub fn expression(&self) -> String {
        combine_or(&self.clauses)
    }
}

/// Compiler output: one group per layer that received clauses, in layer order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CompiledPolicy {
    pub groups: Vec<ClauseGroup>,
}

impl CompiledPolicy {
    pub fn layers(&self) -> Vec<EnforcementLayer> {
        self.groups.iter().map(|group| group.layer).collect()
    }

    pub fn group(&self, layer: EnforcementLayer) -> Option<&ClauseGroup> {
        self.groups.iter().find(|group| group.layer == layer)
    }
}

/// Compile a toggle selection into per-layer clause groups
///
/// Unknown toggle keys contribute nothing and are not an error, so clients
/// shipping newer toggles keep working against an older table. A selection
/// with no enabled key, or one whose enabled keys are all unknown, would
/// produce a rule that blocks nothing and is rejected with
/// [`FocusLockError::NoSelection`].
///
/// # Examples
/// ```
/// use focuslock::policy::{compile, EnforcementLayer, ToggleKey, ToggleSelection};
///
/// let selection = ToggleSelection::with_keys([ToggleKey::InstagramReels]);
/// let compiled = compile(&selection).unwrap();
/// assert_eq!(compiled.layers(), vec![EnforcementLayer::Http]);
/// ```
pub fn compile(selection: &ToggleSelection) -> Result<CompiledPolicy, FocusLockError> {
    if !selection.any_enabled() {
        return Err(FocusLockError::NoSelection);
    }

    let enabled = selection.enabled_keys();
    let mut groups = Vec::new();

    for layer in EnforcementLayer::ALL {
        let mut group = ClauseGroup {
            layer,
            toggles: Vec::new(),
            clauses: Vec::new(),
        };

        for key in &enabled {
            let mut contributed = false;
            for clause in templates(*key, layer) {
                contributed = true;
                if !group.clauses.contains(&clause) {
                    group.clauses.push(clause);
                }
            }
            if contributed {
                group.toggles.push(*key);
            }
        }

        if !group.clauses.is_empty() {
            groups.push(group);
        }
    }

    if groups.is_empty() {
        return Err(FocusLockError::NoSelection);
    }

    Ok(CompiledPolicy { groups })
}

fn combine_or(clauses: &[TrafficClause]) -> String {
    match clauses {
        [single] => single.as_str().to_string(),
        _ => {
            let joined = clauses
                .iter()
                .map(TrafficClause::as_str)
                .collect::<Vec<_>>()
                .join(" or ");
            format!("({joined})")
        }
    }
}
