use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Turn distraction-blocking toggles into Cloudflare Zero Trust policies"
)]
pub struct Args {
    /// Path to configuration file (TOML)
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Cloudflare account that owns the policies
    #[arg(long, env = "CLOUDFLARE_ACCOUNT_ID", global = true)]
    pub account_id: Option<String>,

    /// API token with Zero Trust edit permissions
    #[arg(long, env = "CLOUDFLARE_API_TOKEN", hide_env_values = true, global = true)]
    pub api_token: Option<String>,

    /// Access application whose policy collection is used by default
    #[arg(long, env = "CLOUDFLARE_APPLICATION_ID", global = true)]
    pub application_id: Option<String>,

    /// Override the Cloudflare API root
    #[arg(long, value_name = "URL", global = true)]
    pub api_base: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve the policy API over HTTP
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },

    /// Create or update the allow policy for an email
    Access {
        #[arg(long)]
        email: String,
    },

    /// Create block rules for the selected categories
    Block {
        /// Bind the rules to this user; omit to block account-wide
        #[arg(long)]
        email: Option<String>,

        /// Categories to block (e.g. tiktok,instagramReels)
        #[arg(long = "toggle", value_delimiter = ',', required = true)]
        toggles: Vec<String>,
    },

    /// Print the compiled traffic expressions without contacting Cloudflare
    Compile {
        #[arg(long = "toggle", value_delimiter = ',', required = true)]
        toggles: Vec<String>,
    },
}
