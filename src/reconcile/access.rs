use crate::{
    error::FocusLockError,
    store::{AccessPolicyBody, AccessRule, Decision},
};

use super::{AccessOutcome, Reconciler, ReconcileAction, normalize_email};

/// Deterministic access policy name; the idempotency key for lookups
pub fn access_policy_name(email: &str) -> String {
    format!("Access Policy for {email}")
}

impl Reconciler {
    /// Create or update the allow policy for one email.
    ///
    /// Looks the policy up by its deterministic name in the target collection
    /// and updates it in place when found; otherwise creates it. Upstream
    /// failures are returned as-is without retrying.
    pub async fn upsert_access_policy(
        &self,
        application_id: Option<&str>,
        email: &str,
    ) -> Result<AccessOutcome, FocusLockError> {
        let email = normalize_email(email)?;
        let scope = self.scope_for(application_id);
        let name = access_policy_name(email);
        let body = AccessPolicyBody {
            decision: Decision::Allow,
            name: name.clone(),
            include: vec![AccessRule::Email {
                email: email.to_string(),
            }],
        };

        let existing = self.store.list_access_policies(&scope).await?;

        // Duplicates can exist after a lost race; the first match wins.
        match existing.iter().find(|policy| policy.name == name) {
            Some(found) => {
                log::info!("Updating access policy '{}' ({})", name, found.id);
                let policy = self
                    .store
                    .update_access_policy(&scope, &found.id, &body)
                    .await?;
                Ok(AccessOutcome {
                    action: ReconcileAction::Updated,
                    policy,
                })
            }
            None => {
                log::info!("Creating access policy '{}'", name);
                let policy = self.store.create_access_policy(&scope, &body).await?;
                Ok(AccessOutcome {
                    action: ReconcileAction::Created,
                    policy,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use mockall::predicate::eq;

    use super::*;
    use crate::store::{AccessPolicy, AccessScope, client::MockPolicyStore};

    fn policy(id: &str, name: &str) -> AccessPolicy {
        AccessPolicy {
            id: id.to_string(),
            name: name.to_string(),
            decision: Decision::Allow,
            include: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn name_is_deterministic() {
        assert_eq!(
            access_policy_name("user@example.com"),
            "Access Policy for user@example.com"
        );
    }

    #[tokio::test]
    async fn test_creates_when_no_policy_has_the_name() {
        let mut store = MockPolicyStore::new();
        store
            .expect_list_access_policies()
            .with(eq(AccessScope::Account))
            .times(1)
            .returning(|_| Ok(vec![policy("other", "Access Policy for someone@else.com")]));
        store
            .expect_create_access_policy()
            .times(1)
            .withf(|scope, body| {
                *scope == AccessScope::Account
                    && body.name == "Access Policy for user@example.com"
                    && body.decision == Decision::Allow
                    && body.include
                        == vec![AccessRule::Email {
                            email: "user@example.com".to_string(),
                        }]
            })
            .returning(|_, body| Ok(policy("new-id", &body.name)));
        store.expect_update_access_policy().times(0);

        let reconciler = Reconciler::new(Arc::new(store));
        let outcome = reconciler
            .upsert_access_policy(None, " user@example.com ")
            .await
            .unwrap();

        assert_eq!(outcome.action, ReconcileAction::Created);
        assert_eq!(outcome.policy.id, "new-id");
    }

    #[tokio::test]
    async fn test_updates_existing_policy_by_id() {
        let mut store = MockPolicyStore::new();
        store
            .expect_list_access_policies()
            .returning(|_| Ok(vec![policy("p-42", "Access Policy for user@example.com")]));
        store
            .expect_update_access_policy()
            .times(1)
            .withf(|_, id, body| id == "p-42" && body.name == "Access Policy for user@example.com")
            .returning(|_, id, body| Ok(policy(id, &body.name)));
        store.expect_create_access_policy().times(0);

        let reconciler = Reconciler::new(Arc::new(store));
        let outcome = reconciler
            .upsert_access_policy(None, "user@example.com")
            .await
            .unwrap();

        assert_eq!(outcome.action, ReconcileAction::Updated);
        assert_eq!(outcome.policy.id, "p-42");
    }

    #[tokio::test]
    async fn test_second_submission_converges_on_same_name() {
        // Store state shared between the list and create expectations
        let stored: Arc<Mutex<Vec<AccessPolicy>>> = Arc::new(Mutex::new(Vec::new()));

        let mut store = MockPolicyStore::new();
        let listed = Arc::clone(&stored);
        store
            .expect_list_access_policies()
            .times(2)
            .returning(move |_| Ok(listed.lock().unwrap().clone()));
        let created = Arc::clone(&stored);
        store
            .expect_create_access_policy()
            .times(1)
            .returning(move |_, body| {
                let new = policy("p-1", &body.name);
                created.lock().unwrap().push(new.clone());
                Ok(new)
            });
        store
            .expect_update_access_policy()
            .times(1)
            .returning(|_, id, body| Ok(policy(id, &body.name)));

        let reconciler = Reconciler::new(Arc::new(store));
        let first = reconciler
            .upsert_access_policy(None, "user@example.com")
            .await
            .unwrap();
        let second = reconciler
            .upsert_access_policy(None, "user@example.com")
            .await
            .unwrap();

        assert_eq!(first.action, ReconcileAction::Created);
        assert_eq!(second.action, ReconcileAction::Updated);
        assert_eq!(first.policy.name, second.policy.name);
        assert_eq!(second.policy.id, "p-1");
    }

    #[tokio::test]
    async fn test_empty_email_fails_before_any_upstream_call() {
        let mut store = MockPolicyStore::new();
        store.expect_list_access_policies().times(0);
        store.expect_create_access_policy().times(0);
        store.expect_update_access_policy().times(0);

        let reconciler = Reconciler::new(Arc::new(store));
        let err = reconciler.upsert_access_policy(None, "").await.unwrap_err();
        assert!(matches!(err, FocusLockError::Validation { field: "email", .. }));
    }

    #[tokio::test]
    async fn test_upstream_failure_surfaces_without_retry() {
        let mut store = MockPolicyStore::new();
        store.expect_list_access_policies().times(1).returning(|_| {
            Err(FocusLockError::UpstreamRejected {
                operation: "list access policies",
                status: 403,
                details: vec!["10000: Authentication error".to_string()],
            })
        });
        store.expect_create_access_policy().times(0);

        let reconciler = Reconciler::new(Arc::new(store));
        let err = reconciler
            .upsert_access_policy(None, "user@example.com")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FocusLockError::UpstreamRejected { status: 403, .. }
        ));
    }

    #[tokio::test]
    async fn test_application_scope_is_used_for_lookup_and_write() {
        let app = AccessScope::Application("app-7".to_string());
        let mut store = MockPolicyStore::new();
        store
            .expect_list_access_policies()
            .with(eq(app.clone()))
            .returning(|_| Ok(Vec::new()));
        store
            .expect_create_access_policy()
            .withf(move |scope, _| *scope == app)
            .returning(|_, body| Ok(policy("p", &body.name)));

        let reconciler = Reconciler::new(Arc::new(store));
        let outcome = reconciler
            .upsert_access_policy(Some("app-7"), "user@example.com")
            .await
            .unwrap();
        assert_eq!(outcome.action, ReconcileAction::Created);
    }
}
