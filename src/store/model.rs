use std::fmt;

use serde::{Deserialize, Serialize};

/// Which access-policy collection an operation targets
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AccessScope {
    /// Reusable policies owned by the account
    #[default]
    Account,
    /// Policies attached to one Access application
    Application(String),
}

impl AccessScope {
    pub fn from_application(application_id: Option<&str>) -> Self {
        match application_id.map(str::trim) {
            Some(id) if !id.is_empty() => AccessScope::Application(id.to_string()),
            _ => AccessScope::Account,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny,
    NonIdentity,
    Bypass,
}

/// Include/exclude selector of an access policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessRule {
    Email { email: String },
}

/// Body sent on access policy create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessPolicyBody {
    pub decision: Decision,
    pub name: String,
    pub include: Vec<AccessRule>,
}

/// Access policy as returned by the upstream store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessPolicy {
    pub id: String,
    pub name: String,
    pub decision: Decision,
    /// Kept loosely typed: existing policies may use selectors this crate never writes
    #[serde(default)]
    pub include: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayAction {
    Allow,
    Block,
}

/// Body sent when creating a gateway filtering rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayRuleBody {
    pub name: String,
    pub description: String,
    pub action: GatewayAction,
    pub enabled: bool,
    pub filters: Vec<String>,
    pub traffic: String,
    /// Empty string when the rule applies to the whole account
    pub identity: String,
}

/// Gateway rule as returned by the upstream store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayRule {
    pub id: String,
    pub name: String,
    pub action: GatewayAction,
    pub enabled: bool,
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default)]
    pub traffic: String,
    #[serde(default)]
    pub identity: String,
}

/// Response envelope shared by every Cloudflare v4 endpoint
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    pub result: Option<T>,
    pub result_info: Option<ResultInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: i64,
    pub message: String,
}

impl fmt::Display for ApiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ResultInfo {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: Option<u32>,
}
