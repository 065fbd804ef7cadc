pub mod args;
pub mod commands;
pub mod config;
pub mod loader;

pub use args::{Args, Command};
pub use commands::run;
pub use config::{CloudflareConfig, ConfigFile, ServerConfig};
pub use loader::{CloudflareSettings, ServerSettings, Settings, SettingsLoader};
