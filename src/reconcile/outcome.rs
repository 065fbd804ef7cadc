use serde::Serialize;

use crate::{
    error::FocusLockError,
    policy::EnforcementLayer,
    store::{AccessPolicy, GatewayRule},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileAction {
    Created,
    Updated,
}

/// Result of an identity access policy upsert
#[derive(Debug, Clone, Serialize)]
pub struct AccessOutcome {
    pub action: ReconcileAction,
    pub policy: AccessPolicy,
}

/// What happened to one layer of a block policy
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LayerStatus {
    Created {
        rule: GatewayRule,
    },
    Failed {
        error: String,
        details: Vec<String>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerOutcome {
    pub layer: EnforcementLayer,
    pub rule_name: String,
    #[serde(flatten)]
    pub status: LayerStatus,
}

impl LayerOutcome {
    pub fn created(layer: EnforcementLayer, rule_name: String, rule: GatewayRule) -> Self {
        Self {
            layer,
            rule_name,
            status: LayerStatus::Created { rule },
        }
    }

    pub fn failed(layer: EnforcementLayer, rule_name: String, err: &FocusLockError) -> Self {
        Self {
            layer,
            rule_name,
            status: LayerStatus::Failed {
                error: err.to_string(),
                details: err.details(),
            },
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self.status, LayerStatus::Created { .. })
    }
}

/// Per-layer outcomes of one block policy submission, in layer order.
///
/// A report is returned even when some layers failed; inspect it before
/// assuming the submission took effect.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct BlockReport {
    pub outcomes: Vec<LayerOutcome>,
}

impl BlockReport {
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_created()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.failed_count() == 0
    }

    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.failed_count() == self.outcomes.len()
    }

    /// Turn any failed layer into [`FocusLockError::PartialFailure`]
    pub fn ensure_complete(&self) -> Result<(), FocusLockError> {
        match self.failed_count() {
            0 => Ok(()),
            failed => Err(FocusLockError::PartialFailure {
                failed,
                total: self.outcomes.len(),
            }),
        }
    }
}
