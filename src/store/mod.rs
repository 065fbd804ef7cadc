pub mod client;
pub mod model;

pub use client::{CloudflareStore, DEFAULT_API_BASE, PolicyStore};
pub use model::{
    AccessPolicy, AccessPolicyBody, AccessRule, AccessScope, Decision, GatewayAction, GatewayRule,
    GatewayRuleBody,
};
