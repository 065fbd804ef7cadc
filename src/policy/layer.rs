use std::fmt;

use serde::{Deserialize, Serialize};

/// Enforcement point a block rule is installed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnforcementLayer {
    /// L4 network filter, matches on TLS SNI
    Network,
    /// HTTP filter, matches on request domain and content category
    Http,
}

impl EnforcementLayer {
    /// Every block layer in declared order
    pub const ALL: [EnforcementLayer; 2] = [EnforcementLayer::Network, EnforcementLayer::Http];

    /// Gateway filter set the upstream store expects for rules at this layer
    pub fn filters(&self) -> &'static [&'static str] {
        match self {
            EnforcementLayer::Network => &["l4"],
            EnforcementLayer::Http => &["http"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnforcementLayer::Network => "network",
            EnforcementLayer::Http => "http",
        }
    }
}

impl fmt::Display for EnforcementLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
