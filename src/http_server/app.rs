use std::sync::Arc;

use axum::{Router, routing::get};
use color_eyre::eyre::{Context, eyre};
use tokio::sync::mpsc;

use crate::http_server::{http_routes::callback::spotify_callback, state::AppState};

pub const DEFAULT_CALLBACK_PORT: u16 = 8888;

pub fn router(spotify_codes: mpsc::Sender<String>) -> Router {
    let app_state = Arc::new(AppState { spotify_codes });

    Router::new()
        .route("/callback", get(spotify_callback))
        .with_state(app_state)
}

/// Serve the OAuth callback until the process exits.
pub async fn start(port: u16, spotify_codes: mpsc::Sender<String>) -> color_eyre::Result<()> {
    let app = router(spotify_codes);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .wrap_err_with(|| eyre!("Failed to bind to port {}", port))?;
    log::info!("Callback server listening on port {}", port);
    axum::serve(listener, app)
        .await
        .wrap_err("Failed to start HTTP server")?;

    Ok(())
}
