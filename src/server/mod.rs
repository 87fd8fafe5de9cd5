//! HTTP server exposing the study state machine as JSON.

pub mod routes;

use crate::{Result, Study};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the application router.
pub fn router(study: Arc<Study>) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::session_routes())
        .with_state(study)
        .layer(TraceLayer::new_for_http())
}

/// Serve `study` on `bind_addr` until the process is stopped.
///
/// # Errors
///
/// Returns error if the address cannot be bound or the server fails
pub async fn run(study: Arc<Study>, bind_addr: &str) -> Result<()> {
    let app = router(study);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("  Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
