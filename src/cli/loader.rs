use std::{fmt, sync::Arc, time::Duration};

use crate::error::FocusLockError;
use crate::policy::{ToggleKey, ToggleSelection};
use crate::reconcile::Reconciler;
use crate::store::{CloudflareStore, DEFAULT_API_BASE};

use super::args::{Args, Command};
use super::config::ConfigFile;

/// Upstream credentials and scope, fully resolved
#[derive(Clone, PartialEq, Eq)]
pub struct CloudflareSettings {
    pub account_id: String,
    pub api_token: String,
    pub application_id: Option<String>,
    pub api_base: String,
}

impl fmt::Debug for CloudflareSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudflareSettings")
            .field("account_id", &self.account_id)
            .field("api_token", &"<redacted>")
            .field("application_id", &self.application_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub cloudflare: CloudflareSettings,
    pub server: ServerSettings,
}

impl Settings {
    /// Build a reconciler wired to the configured Cloudflare account
    pub fn reconciler(&self) -> Result<Reconciler, FocusLockError> {
        let store = CloudflareStore::new(
            self.cloudflare.account_id.clone(),
            self.cloudflare.api_token.clone(),
        )?
        .with_api_base(self.cloudflare.api_base.clone());
        Ok(Reconciler::new(Arc::new(store))
            .with_default_application(self.cloudflare.application_id.as_deref()))
    }
}

/// Merge settings from command line arguments, environment and config file
pub struct SettingsLoader;

impl SettingsLoader {
    /// Flags and environment (both surfaced through `Args`) win over the file
    pub fn load(args: &Args) -> Result<Settings, FocusLockError> {
        let config = match args.config.as_ref() {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };

        let account_id = first_present(args.account_id.clone(), config.cloudflare.account_id)
            .ok_or(FocusLockError::MissingSetting {
                name: "account_id",
                env: "CLOUDFLARE_ACCOUNT_ID",
            })?;
        let api_token = first_present(args.api_token.clone(), config.cloudflare.api_token)
            .ok_or(FocusLockError::MissingSetting {
                name: "api_token",
                env: "CLOUDFLARE_API_TOKEN",
            })?;
        let application_id =
            first_present(args.application_id.clone(), config.cloudflare.application_id);
        let api_base = first_present(args.api_base.clone(), config.cloudflare.api_base)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        if config.server.request_timeout_secs == 0 {
            return Err(FocusLockError::validation(
                "request_timeout_secs",
                "must be at least 1 second",
            ));
        }
        let mut server = ServerSettings {
            host: config.server.host,
            port: config.server.port,
            request_timeout: Duration::from_secs(config.server.request_timeout_secs),
        };
        if let Command::Serve { host, port } = &args.command {
            if let Some(host) = host {
                server.host = host.clone();
            }
            if let Some(port) = port {
                server.port = *port;
            }
        }

        Ok(Settings {
            cloudflare: CloudflareSettings {
                account_id,
                api_token,
                application_id,
                api_base,
            },
            server,
        })
    }
}

/// Non-blank value from the higher-precedence source, else the lower one
fn first_present(preferred: Option<String>, fallback: Option<String>) -> Option<String> {
    preferred
        .into_iter()
        .chain(fallback)
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// Build a selection from `--toggle` entries.
///
/// Unknown names are kept (the compiler ignores them) but reported so a typo
/// on the command line does not go unnoticed.
pub fn toggle_selection(entries: &[String]) -> ToggleSelection {
    let mut selection = ToggleSelection::new();
    for raw in entries {
        let name = raw.trim();
        if name.is_empty() {
            continue;
        }
        if name.parse::<ToggleKey>().is_err() {
            log::warn!("Ignoring unknown toggle '{}'", name);
        }
        selection.set(name, true);
    }
    selection
}
