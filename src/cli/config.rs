use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::FocusLockError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub cloudflare: CloudflareConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct CloudflareConfig {
    pub account_id: Option<String>,
    /// Prefer CLOUDFLARE_API_TOKEN over storing the token on disk
    pub api_token: Option<String>,
    /// Access application used when a request does not name one
    pub application_id: Option<String>,
    pub api_base: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Deadline for one reconciliation call, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ConfigFile {
    /// Load configuration file
    pub fn load(path: &Path) -> Result<Self, FocusLockError> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| FocusLockError::ConfigParse {
            path: PathBuf::from(path),
            source,
        })
    }
}
