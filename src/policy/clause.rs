use std::fmt;

use serde::Serialize;

use super::{layer::EnforcementLayer, toggle::ToggleKey};

/// One atomic match condition in the upstream filter language.
///
/// Only constructible inside this crate, so request data never becomes
/// filter syntax.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TrafficClause(String);

impl TrafficClause {
    pub(crate) fn new(expression: impl Into<String>) -> Self {
        Self(expression.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrafficClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// (toggle, layer, clauses) rows, listed in declared toggle order
const CLAUSE_TABLE: &[(ToggleKey, EnforcementLayer, &[&str])] = &[
    (
        ToggleKey::YoutubeShorts,
        EnforcementLayer::Http,
        &[r#"any(http.request.domains[*] == "youtube.com")"#],
    ),
    (
        ToggleKey::InstagramReels,
        EnforcementLayer::Http,
        &[r#"any(http.request.domains[*] == "instagram.com")"#],
    ),
    (
        ToggleKey::Tiktok,
        EnforcementLayer::Network,
        &[
            r#"any(net.sni.domains[*] == "tiktok.com")"#,
            r#"any(net.sni.domains[*] == "tiktokcdn.com")"#,
        ],
    ),
    (
        ToggleKey::SocialMediaGeneral,
        EnforcementLayer::Http,
        &[r#"any(http.request.uri.content_category[*] in {149})"#],
    ),
];

/// Clause templates registered for a toggle at a layer; empty when none
pub fn templates(key: ToggleKey, layer: EnforcementLayer) -> impl Iterator<Item = TrafficClause> {
    CLAUSE_TABLE
        .iter()
        .filter(move |(k, l, _)| *k == key && *l == layer)
        .flat_map(|(_, _, clauses)| clauses.iter().copied().map(TrafficClause::new))
}

/// Quote a value for use as a string literal inside a filter expression
pub(crate) fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Identity expression that scopes a gateway rule to one user
pub(crate) fn identity_clause(email: &str) -> String {
    format!("identity.email == {}", quote_literal(email))
}
