pub mod access;
pub mod block;
pub mod outcome;

use std::{sync::Arc, time::Duration};

use crate::{error::FocusLockError, store::AccessScope, store::PolicyStore};

pub use access::access_policy_name;
pub use outcome::{AccessOutcome, BlockReport, LayerOutcome, LayerStatus, ReconcileAction};

/// Drives create-or-update decisions against the upstream policy store.
///
/// The store carries the account binding and credentials; the reconciler
/// itself holds no state between calls.
///
/// Lookups and writes are not atomic upstream. Two concurrent submissions for
/// the same email can both miss the lookup and both create; the duplicate
/// shares the deterministic name and the next submission updates one of them.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn PolicyStore>,
    default_scope: AccessScope,
}

impl Reconciler {
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self {
            store,
            default_scope: AccessScope::Account,
        }
    }

    /// Access application used when a request does not name one
    pub fn with_default_application(mut self, application_id: Option<&str>) -> Self {
        self.default_scope = AccessScope::from_application(application_id);
        self
    }

    fn scope_for(&self, application_id: Option<&str>) -> AccessScope {
        match AccessScope::from_application(application_id) {
            AccessScope::Account => self.default_scope.clone(),
            scope => scope,
        }
    }
}

/// Run one reconciliation call under a caller-side deadline
pub async fn with_deadline<T, F>(limit: Duration, call: F) -> Result<T, FocusLockError>
where
    F: Future<Output = Result<T, FocusLockError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| FocusLockError::Timeout {
            seconds: limit.as_secs(),
        })?
}

/// Trimmed email, or a validation error when nothing is left
pub(crate) fn normalize_email(email: &str) -> Result<&str, FocusLockError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(FocusLockError::validation("email", "must not be empty"));
    }
    Ok(trimmed)
}
