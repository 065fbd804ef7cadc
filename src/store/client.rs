use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

#[cfg(test)]
use mockall::automock;

use super::model::{
    AccessPolicy, AccessPolicyBody, AccessScope, ApiEnvelope, ApiMessage, GatewayRule,
    GatewayRuleBody, ResultInfo,
};
use crate::error::FocusLockError;

pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";
const PAGE_SIZE: u32 = 50;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upstream policy store abstraction for testing
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PolicyStore: Send + Sync + 'static {
    /// Every access policy in the given collection
    async fn list_access_policies(
        &self,
        scope: &AccessScope,
    ) -> Result<Vec<AccessPolicy>, FocusLockError>;

    async fn create_access_policy(
        &self,
        scope: &AccessScope,
        body: &AccessPolicyBody,
    ) -> Result<AccessPolicy, FocusLockError>;

    async fn update_access_policy(
        &self,
        scope: &AccessScope,
        id: &str,
        body: &AccessPolicyBody,
    ) -> Result<AccessPolicy, FocusLockError>;

    async fn create_gateway_rule(
        &self,
        body: &GatewayRuleBody,
    ) -> Result<GatewayRule, FocusLockError>;
}

/// Production store backed by the Cloudflare v4 REST API.
///
/// Account id and API token are handed in explicitly; nothing is read from
/// the process environment here.
pub struct CloudflareStore {
    http: Client,
    api_base: String,
    account_id: String,
    api_token: String,
}

impl CloudflareStore {
    pub fn new(
        account_id: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Result<Self, FocusLockError> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|source| FocusLockError::UpstreamRequest {
                operation: "build http client",
                source,
            })?;

        Ok(Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            account_id: account_id.into(),
            api_token: api_token.into(),
        })
    }

    /// Point the client at a different API root (trailing slashes are dropped)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn access_policies_url(&self, scope: &AccessScope) -> String {
        match scope {
            AccessScope::Account => {
                format!("{}/accounts/{}/access/policies", self.api_base, self.account_id)
            }
            AccessScope::Application(app) => format!(
                "{}/accounts/{}/access/apps/{}/policies",
                self.api_base, self.account_id, app
            ),
        }
    }

    fn gateway_rules_url(&self) -> String {
        format!("{}/accounts/{}/gateway/rules", self.api_base, self.account_id)
    }

    /// Send an authenticated request and unwrap the response envelope
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<(T, Option<ResultInfo>), FocusLockError> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|source| FocusLockError::UpstreamRequest { operation, source })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|source| FocusLockError::UpstreamRequest { operation, source })?;

        let envelope: ApiEnvelope<T> = serde_json::from_slice(&bytes).map_err(|err| {
            rejected(
                operation,
                status,
                vec![format!("unreadable response body: {err}")],
            )
        })?;

        if !status.is_success() || !envelope.success {
            let details = envelope.errors.iter().map(ApiMessage::to_string).collect();
            return Err(rejected(operation, status, details));
        }

        match envelope.result {
            Some(result) => Ok((result, envelope.result_info)),
            None => Err(rejected(
                operation,
                status,
                vec!["response carried no result".to_string()],
            )),
        }
    }
}

fn rejected(operation: &'static str, status: StatusCode, details: Vec<String>) -> FocusLockError {
    FocusLockError::UpstreamRejected {
        operation,
        status: status.as_u16(),
        details,
    }
}

#[async_trait]
impl PolicyStore for CloudflareStore {
    async fn list_access_policies(
        &self,
        scope: &AccessScope,
    ) -> Result<Vec<AccessPolicy>, FocusLockError> {
        let url = self.access_policies_url(scope);
        let mut policies = Vec::new();
        let mut page: u32 = 1;

        loop {
            log::debug!("GET {url} (page {page})");
            let request = self
                .http
                .get(&url)
                .query(&[("page", page), ("per_page", PAGE_SIZE)]);
            let (batch, info): (Vec<AccessPolicy>, _) =
                self.execute("list access policies", request).await?;

            let fetched = batch.len();
            policies.extend(batch);

            let more = match info.and_then(|info| info.total_pages) {
                Some(total_pages) => page < total_pages,
                None => fetched >= PAGE_SIZE as usize,
            };
            if !more || fetched == 0 {
                break;
            }
            page += 1;
        }

        Ok(policies)
    }

    async fn create_access_policy(
        &self,
        scope: &AccessScope,
        body: &AccessPolicyBody,
    ) -> Result<AccessPolicy, FocusLockError> {
        let url = self.access_policies_url(scope);
        log::debug!("POST {url}");
        let request = self.http.post(&url).json(body);
        let (policy, _) = self.execute("create access policy", request).await?;
        Ok(policy)
    }

    async fn update_access_policy(
        &self,
        scope: &AccessScope,
        id: &str,
        body: &AccessPolicyBody,
    ) -> Result<AccessPolicy, FocusLockError> {
        let url = format!("{}/{}", self.access_policies_url(scope), id);
        log::debug!("PUT {url}");
        let request = self.http.put(&url).json(body);
        let (policy, _) = self.execute("update access policy", request).await?;
        Ok(policy)
    }

    async fn create_gateway_rule(
        &self,
        body: &GatewayRuleBody,
    ) -> Result<GatewayRule, FocusLockError> {
        let url = self.gateway_rules_url();
        log::debug!("POST {url}");
        let request = self.http.post(&url).json(body);
        let (rule, _) = self.execute("create gateway rule", request).await?;
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        Json, Router,
        extract::{Path, Query},
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::{get, post, put},
    };
    use serde_json::{Value, json};

    use super::*;
    use crate::store::model::{AccessRule, Decision, GatewayAction};

    const ACCOUNT: &str = "acc-1";
    const TOKEN: &str = "test-token";

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            == Some("Bearer test-token")
    }

    fn policy_json(id: &str, name: &str) -> Value {
        json!({ "id": id, "name": name, "decision": "allow", "include": [] })
    }

    /// In-process stand-in for the Cloudflare API
    fn fake_upstream() -> Router {
        Router::new()
            .route(
                "/accounts/acc-1/access/policies",
                get(
                    |headers: HeaderMap, Query(query): Query<HashMap<String, String>>| async move {
                        if !authorized(&headers) {
                            return (
                                AxumStatus::FORBIDDEN,
                                Json(json!({
                                    "success": false,
                                    "errors": [{ "code": 10000, "message": "Authentication error" }],
                                    "result": null
                                })),
                            );
                        }
                        let page = query.get("page").map(String::as_str).unwrap_or("1");
                        let result = match page {
                            "1" => vec![policy_json("p1", "Access Policy for a@example.com")],
                            _ => vec![policy_json("p2", "Access Policy for b@example.com")],
                        };
                        (
                            AxumStatus::OK,
                            Json(json!({
                                "success": true,
                                "errors": [],
                                "result": result,
                                "result_info": { "page": page.parse::<u32>().unwrap(), "total_pages": 2 }
                            })),
                        )
                    },
                ),
            )
            .route(
                "/accounts/acc-1/access/apps/:app/policies/:id",
                put(
                    |Path((app, id)): Path<(String, String)>, Json(body): Json<Value>| async move {
                        assert_eq!(app, "app-1");
                        Json(json!({
                            "success": true,
                            "errors": [],
                            "result": {
                                "id": id,
                                "name": body["name"],
                                "decision": body["decision"],
                                "include": body["include"]
                            }
                        }))
                    },
                ),
            )
            .route(
                "/accounts/acc-1/gateway/rules",
                post(|Json(body): Json<Value>| async move {
                    if body["traffic"].as_str().unwrap_or_default().is_empty() {
                        return (
                            AxumStatus::BAD_REQUEST,
                            Json(json!({
                                "success": false,
                                "errors": [{ "code": 2001, "message": "traffic is required" }],
                                "result": null
                            })),
                        );
                    }
                    let mut rule = body.clone();
                    rule["id"] = json!("rule-1");
                    (
                        AxumStatus::OK,
                        Json(json!({ "success": true, "errors": [], "result": rule })),
                    )
                }),
            )
    }

    async fn spawn_fake_upstream() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, fake_upstream()).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn block_body(traffic: &str) -> GatewayRuleBody {
        GatewayRuleBody {
            name: "rule".to_string(),
            description: String::new(),
            action: GatewayAction::Block,
            enabled: true,
            filters: vec!["l4".to_string()],
            traffic: traffic.to_string(),
            identity: String::new(),
        }
    }

    #[tokio::test]
    async fn test_list_follows_pagination() {
        let base = spawn_fake_upstream().await;
        let store = CloudflareStore::new(ACCOUNT, TOKEN)
            .unwrap()
            .with_api_base(base);

        let policies = store
            .list_access_policies(&AccessScope::Account)
            .await
            .unwrap();
        let ids: Vec<&str> = policies.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_rejected_request_carries_upstream_errors() {
        let base = spawn_fake_upstream().await;
        let store = CloudflareStore::new(ACCOUNT, "wrong-token")
            .unwrap()
            .with_api_base(base);

        let err = store
            .list_access_policies(&AccessScope::Account)
            .await
            .unwrap_err();
        match err {
            FocusLockError::UpstreamRejected {
                status, details, ..
            } => {
                assert_eq!(status, 403);
                assert_eq!(details, vec!["10000: Authentication error"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_targets_application_collection() {
        let base = spawn_fake_upstream().await;
        let store = CloudflareStore::new(ACCOUNT, TOKEN)
            .unwrap()
            .with_api_base(base);
        let body = AccessPolicyBody {
            decision: Decision::Allow,
            name: "Access Policy for a@example.com".to_string(),
            include: vec![AccessRule::Email {
                email: "a@example.com".to_string(),
            }],
        };

        let policy = store
            .update_access_policy(&AccessScope::Application("app-1".to_string()), "p9", &body)
            .await
            .unwrap();
        assert_eq!(policy.id, "p9");
        assert_eq!(policy.name, "Access Policy for a@example.com");
    }

    #[tokio::test]
    async fn test_create_gateway_rule_round_trips_body() {
        let base = spawn_fake_upstream().await;
        let store = CloudflareStore::new(ACCOUNT, TOKEN)
            .unwrap()
            .with_api_base(base);

        let rule = store
            .create_gateway_rule(&block_body(r#"any(net.sni.domains[*] == "tiktok.com")"#))
            .await
            .unwrap();
        assert_eq!(rule.id, "rule-1");
        assert_eq!(rule.action, GatewayAction::Block);
        assert_eq!(rule.filters, vec!["l4"]);

        let err = store.create_gateway_rule(&block_body("")).await.unwrap_err();
        assert!(matches!(
            err,
            FocusLockError::UpstreamRejected { status: 400, .. }
        ));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_request_error() {
        let store = CloudflareStore::new(ACCOUNT, TOKEN)
            .unwrap()
            .with_api_base("http://127.0.0.1:1");
        let err = store.create_gateway_rule(&block_body("x")).await.unwrap_err();
        assert!(matches!(err, FocusLockError::UpstreamRequest { .. }));
    }
}
