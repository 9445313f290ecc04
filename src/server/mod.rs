//! HTTP intake server: the application endpoint, the legacy JSON endpoint
//! and the static site.

mod error;
mod form;
mod handlers;
mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;

pub use error::{ApiError, ApiResult};
pub use form::{CandidaturaForm, DadosPayload, PhotoPart, ValidCandidatura};
pub use state::AppState;

/// Largest request body accepted, photo included
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Build the router with all middleware layers.
///
/// `GET /` answers with `index.html` from the public directory; any other
/// unmatched path is looked up there too.
pub fn router(state: AppState) -> Router {
    let public_dir = state.config.public_dir.clone();

    Router::new()
        .route("/api/candidatura", post(handlers::submit_candidatura))
        .route("/api/dados", post(handlers::save_dados))
        .route_service("/", ServeFile::new(public_dir.join("index.html")))
        .fallback_service(ServeDir::new(public_dir))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        // handler panics become the generic 500 body
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl-C or SIGTERM
pub async fn serve(config: AppConfig) -> crate::error::Result<()> {
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let addr = config.bind_addr();
    let app = router(AppState::from_config(config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "candidatura server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl-C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
