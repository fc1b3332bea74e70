use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use color_eyre::eyre::eyre;
use serde::Deserialize;
use tokio::sync::mpsc::error::TrySendError;

use crate::http_server::{error::Report, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// Spotify redirects here after the user approved (or denied) access.
pub async fn spotify_callback(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<impl IntoResponse, Report> {
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        let reason = params.error.unwrap_or_else(|| "missing code".to_string());
        log::warn!("Spotify authorization failed: {}", reason);
        return Ok((
            StatusCode::BAD_REQUEST,
            format!("Spotify authorization failed: {}", reason),
        ));
    };

    // Never wait on the channel, a code arriving while one is pending is refused.
    match app_state.spotify_codes.try_send(code) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            log::warn!("Ignoring Spotify authorization code, one is already pending");
            return Ok((
                StatusCode::CONFLICT,
                "An authorization code is already pending.".to_string(),
            ));
        }
        Err(TrySendError::Closed(_)) => {
            return Err(eyre!("Spotify authenticator is no longer waiting for a code").into());
        }
    }

    log::info!("Received Spotify authorization code");
    Ok((
        StatusCode::OK,
        "Authorization complete, you can close this window.".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    fn state() -> (Arc<AppState>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(1);
        (Arc::new(AppState { spotify_codes: tx }), rx)
    }

    #[tokio::test]
    async fn test_code_is_forwarded() {
        let (app_state, mut rx) = state();
        let params = CallbackParams {
            code: Some("AQD1".into()),
            error: None,
        };

        let response = spotify_callback(State(app_state), Query(params))
            .await
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(rx.recv().await.as_deref(), Some("AQD1"));
    }

    #[tokio::test]
    async fn test_denied_authorization() {
        let (app_state, mut rx) = state();
        let params = CallbackParams {
            code: None,
            error: Some("access_denied".into()),
        };

        let response = spotify_callback(State(app_state), Query(params))
            .await
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_second_code_while_one_is_pending() {
        let (app_state, mut rx) = state();
        let first = CallbackParams {
            code: Some("AQD1".into()),
            error: None,
        };
        let second = CallbackParams {
            code: Some("AQD2".into()),
            error: None,
        };

        spotify_callback(State(app_state.clone()), Query(first))
            .await
            .unwrap();
        let response = spotify_callback(State(app_state), Query(second))
            .await
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(rx.recv().await.as_deref(), Some("AQD1"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_channel_is_an_error() {
        let (app_state, rx) = state();
        drop(rx);
        let params = CallbackParams {
            code: Some("AQD1".into()),
            error: None,
        };

        let result = spotify_callback(State(app_state), Query(params)).await;
        assert!(result.is_err());
    }
}
