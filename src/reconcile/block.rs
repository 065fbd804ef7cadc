use std::sync::Arc;

use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    error::FocusLockError,
    policy::{
        ClauseGroup, ToggleSelection,
        clause::identity_clause,
        compile,
    },
    store::{GatewayAction, GatewayRule, GatewayRuleBody},
};

use super::{BlockReport, LayerOutcome, LayerStatus, Reconciler, normalize_email};

/// Random name for a fire-and-forget block rule; never looked up again
fn block_rule_name(group: &ClauseGroup) -> String {
    format!("focuslock-{}-{}", group.layer, Uuid::new_v4())
}

fn block_rule_body(group: &ClauseGroup, identity: Option<&str>) -> GatewayRuleBody {
    let toggles = group
        .toggles
        .iter()
        .map(|key| key.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let description = match identity {
        Some(email) => format!("Blocks {toggles} at the {} layer for {email}", group.layer),
        None => format!("Blocks {toggles} at the {} layer", group.layer),
    };

    GatewayRuleBody {
        name: block_rule_name(group),
        description,
        action: GatewayAction::Block,
        enabled: true,
        filters: group.layer.filters().iter().map(|f| f.to_string()).collect(),
        traffic: group.expression(),
        identity: identity.map(identity_clause).unwrap_or_default(),
    }
}

/// Upstream create call for one layer, aborted when the caller stops waiting.
///
/// Dropping a bare `JoinHandle` detaches its task; this aborts it instead.
struct LayerTask(JoinHandle<Result<GatewayRule, FocusLockError>>);

impl Drop for LayerTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl Reconciler {
    /// Create one block rule per enforcement layer the selection compiles to.
    ///
    /// Compilation and identity validation fail the whole call. After that
    /// every layer is attempted independently: a failed layer is recorded in
    /// its outcome and never stops the others. Outcomes come back in layer
    /// order regardless of which upstream call finishes first.
    ///
    /// Dropping the returned future (for example when `with_deadline` fires)
    /// aborts every layer that has not finished yet.
    pub async fn apply_block_policy(
        &self,
        selection: &ToggleSelection,
        identity: Option<&str>,
    ) -> Result<BlockReport, FocusLockError> {
        let identity = identity.map(normalize_email).transpose()?;
        let compiled = compile(selection)?;

        let pending: Vec<_> = compiled
            .groups
            .iter()
            .map(|group| {
                let body = block_rule_body(group, identity);
                let store = Arc::clone(&self.store);
                let request = body.clone();
                let task =
                    LayerTask(tokio::spawn(async move { store.create_gateway_rule(&request).await }));
                (group.layer, body, task)
            })
            .collect();

        let mut report = BlockReport::default();
        for (layer, body, mut task) in pending {
            let outcome = match (&mut task.0).await {
                Ok(Ok(rule)) => {
                    log::info!("Created {} block rule '{}' ({})", layer, body.name, rule.id);
                    LayerOutcome::created(layer, body.name, rule)
                }
                Ok(Err(err)) => {
                    log::warn!("Failed to create {} block rule '{}': {}", layer, body.name, err);
                    LayerOutcome::failed(layer, body.name, &err)
                }
                Err(join_err) => {
                    log::warn!("{} block rule task did not finish: {}", layer, join_err);
                    LayerOutcome {
                        layer,
                        rule_name: body.name,
                        status: LayerStatus::Failed {
                            error: format!("block rule task did not finish: {join_err}"),
                            details: Vec::new(),
                        },
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        Ok(report)
    }
}
