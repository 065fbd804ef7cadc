use std::{net::SocketAddr, time::Duration};

use crate::error::FocusLockError;
use crate::policy::compile;
use crate::reconcile::{Reconciler, with_deadline};
use crate::server::{self, AppState};

use super::args::{Args, Command};
use super::loader::{SettingsLoader, toggle_selection};

/// Execute the parsed command line
pub async fn run(args: Args) -> Result<(), FocusLockError> {
    if let Command::Compile { toggles } = &args.command {
        print!("{}", compile_preview(toggles)?);
        return Ok(());
    }

    let settings = SettingsLoader::load(&args)?;
    let reconciler = settings.reconciler()?;
    let deadline = settings.server.request_timeout;

    match args.command {
        Command::Serve { .. } => {
            let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
                .parse()
                .map_err(|err| FocusLockError::validation("server address", format!("{err}")))?;
            let state = AppState {
                reconciler,
                request_timeout: deadline,
            };
            server::serve(addr, state).await
        }
        Command::Access { email } => {
            println!("{}", access(&reconciler, deadline, &email).await?);
            Ok(())
        }
        Command::Block { email, toggles } => {
            let (printed, result) = block(&reconciler, deadline, email.as_deref(), &toggles).await?;
            println!("{printed}");
            result
        }
        Command::Compile { .. } => Ok(()),
    }
}

/// Per-layer filters and traffic expressions, one block per layer
fn compile_preview(toggles: &[String]) -> Result<String, FocusLockError> {
    let compiled = compile(&toggle_selection(toggles))?;
    let mut out = String::new();
    for group in &compiled.groups {
        out.push_str(&format!("[{}] filters={:?}\n", group.layer, group.layer.filters()));
        out.push_str(&format!("{}\n", group.expression()));
    }
    Ok(out)
}

async fn access(
    reconciler: &Reconciler,
    deadline: Duration,
    email: &str,
) -> Result<String, FocusLockError> {
    let outcome = with_deadline(deadline, reconciler.upsert_access_policy(None, email)).await?;
    Ok(serde_json::to_string_pretty(&outcome)?)
}

/// Pretty report plus the exit result: any failed layer fails the command
async fn block(
    reconciler: &Reconciler,
    deadline: Duration,
    email: Option<&str>,
    toggles: &[String],
) -> Result<(String, Result<(), FocusLockError>), FocusLockError> {
    let selection = toggle_selection(toggles);
    let report = with_deadline(deadline, reconciler.apply_block_policy(&selection, email)).await?;
    let printed = serde_json::to_string_pretty(&report)?;
    Ok((printed, report.ensure_complete()))
}
