mod http;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use tokio_util::sync::CancellationToken;

use roster_api::StudentStore;

pub use http::save_student;

#[derive(Clone)]
pub(crate) struct AppState {
    store: Arc<dyn StudentStore>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiServerError {
    #[error("bind api {addr}: {source}")]
    Bind { addr: String, source: std::io::Error },

    #[error("axum serve: {0}")]
    Serve(std::io::Error),
}

/// Router with the single save route. Bodies larger than `body_limit`
/// bytes are turned away by the handler like any other bad input.
pub fn router(store: Arc<dyn StudentStore>, body_limit: usize) -> Router {
    Router::new()
        .route("/api/save", post(http::handle_save))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(AppState { store })
}

/// Student save API server. Returns once `shutdown` fires and in-flight
/// requests have drained.
pub async fn run(
    listen: &str,
    store: Arc<dyn StudentStore>,
    body_limit: usize,
    shutdown: CancellationToken,
) -> Result<(), ApiServerError> {
    let app = router(store, body_limit);

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|source| ApiServerError::Bind { addr: listen.to_string(), source })?;

    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "api server listening");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(ApiServerError::Serve)?;

    Ok(())
}
