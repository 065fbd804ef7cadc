use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Blockable category the user can switch on or off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToggleKey {
    YoutubeShorts,
    InstagramReels,
    Tiktok,
    SocialMediaGeneral,
}

impl ToggleKey {
    /// Every known key in declared order. Compilation walks this order.
    pub const ALL: [ToggleKey; 4] = [
        ToggleKey::YoutubeShorts,
        ToggleKey::InstagramReels,
        ToggleKey::Tiktok,
        ToggleKey::SocialMediaGeneral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleKey::YoutubeShorts => "youtubeShorts",
            ToggleKey::InstagramReels => "instagramReels",
            ToggleKey::Tiktok => "tiktok",
            ToggleKey::SocialMediaGeneral => "socialMediaGeneral",
        }
    }
}

impl fmt::Display for ToggleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToggleKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToggleKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown toggle '{s}'"))
    }
}

/// Per-request toggle state as submitted by the client.
///
/// Keys stay as raw strings so that toggles this build does not know about
/// can be carried through and ignored by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToggleSelection {
    toggles: HashMap<String, bool>,
}

impl ToggleSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the given known keys
    pub fn with_keys<I: IntoIterator<Item = ToggleKey>>(keys: I) -> Self {
        let mut selection = Self::new();
        for key in keys {
            selection.set(key.as_str(), true);
        }
        selection
    }

    pub fn set(&mut self, key: impl Into<String>, enabled: bool) {
        self.toggles.insert(key.into(), enabled);
    }

    pub fn is_enabled(&self, key: ToggleKey) -> bool {
        self.toggles.get(key.as_str()).copied().unwrap_or(false)
    }

    /// True when at least one entry, known or not, is switched on
    pub fn any_enabled(&self) -> bool {
        self.toggles.values().any(|enabled| *enabled)
    }

    /// Known keys switched on, in declared order
    pub fn enabled_keys(&self) -> Vec<ToggleKey> {
        ToggleKey::ALL
            .into_iter()
            .filter(|key| self.is_enabled(*key))
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for ToggleSelection {
    fn from_iter<T: IntoIterator<Item = (K, bool)>>(iter: T) -> Self {
        let mut selection = Self::new();
        for (key, enabled) in iter {
            selection.set(key, enabled);
        }
        selection
    }
}
