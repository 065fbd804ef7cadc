pub mod response;
pub mod routes;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use tokio::net::TcpListener;

use crate::{error::FocusLockError, reconcile::Reconciler};

pub use routes::router;

/// Shared, read-only state handed to every request
pub struct AppState {
    pub reconciler: Reconciler,
    /// Deadline wrapped around each reconciliation call
    pub request_timeout: Duration,
}

/// Bind and serve the HTTP API until the process is stopped
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), FocusLockError> {
    let listener = TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(Arc::new(state))).await?;
    Ok(())
}
