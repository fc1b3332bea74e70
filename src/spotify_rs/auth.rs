use std::path::PathBuf;
use std::time::Duration;

use color_eyre::{
    Result,
    eyre::{Context, OptionExt},
};
use tokio::sync::{Mutex, mpsc};

use crate::spotify_rs::types::{CachedToken, SpotifyTokenResponse};

const SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

pub const SPOTIFY_SCOPES: &str = "playlist-read-private playlist-read-collaborative user-library-read";

/// Url the user opens to grant access; Spotify redirects back to
/// `redirect_uri` with `?code=`.
pub fn authorize_url(client_id: &str, redirect_uri: &str) -> String {
    format!(
        "{}?client_id={}&response_type=code&redirect_uri={}&scope={}",
        SPOTIFY_AUTH_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(SPOTIFY_SCOPES)
    )
}

#[derive(Debug, thiserror::Error)]
pub enum ExchangeCodeForTokenError {
    #[error("Invalid code: {reason}")]
    InvalidCode { reason: String },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response")]
    FailedToParseResponse(reqwest::Error),
}

/// Exchange authorization code for access token
/// https://developer.spotify.com/documentation/web-api/tutorials/code-flow
pub async fn exchange_code_for_token(
    client: &reqwest::Client,
    client_id: &str,
    client_secret: &str,
    code: &str,
    // Must equal the redirect uri of the authorize request
    redirect_uri: &str,
) -> Result<SpotifyTokenResponse, ExchangeCodeForTokenError> {
    let params = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", redirect_uri),
    ];

    let response = client
        .post(SPOTIFY_TOKEN_URL)
        .form(&params)
        .basic_auth(client_id, Some(client_secret))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(ExchangeCodeForTokenError::FailedToSendRequest)?;

    if !response.status().is_success() {
        return Err(ExchangeCodeForTokenError::InvalidCode {
            reason: response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error text".to_string()),
        });
    }

    response
        .json()
        .await
        .map_err(ExchangeCodeForTokenError::FailedToParseResponse)
}

#[derive(Debug, thiserror::Error)]
pub enum RefreshTokenError {
    #[error("Invalid refresh token: {reason}")]
    InvalidRefreshToken { reason: String },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(reqwest::Error),
}

/// Refresh an access token using a refresh token
pub async fn refresh_access_token(
    client: &reqwest::Client,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<SpotifyTokenResponse, RefreshTokenError> {
    let params = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
    ];

    let response = client
        .post(SPOTIFY_TOKEN_URL)
        .form(&params)
        .basic_auth(client_id, Some(client_secret))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(RefreshTokenError::FailedToSendRequest)?;

    if !response.status().is_success() {
        return Err(RefreshTokenError::InvalidRefreshToken {
            reason: response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error text".to_string()),
        });
    }

    response
        .json()
        .await
        .map_err(RefreshTokenError::FailedToParseResponse)
}

/// Token file that survives restarts.
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `Ok(None)` when nothing was cached yet or the file is unreadable json.
    pub fn load(&self) -> Result<Option<CachedToken>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        match serde_json::from_str(&contents) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                log::warn!(
                    "Ignoring corrupt Spotify token cache {}: {}",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    pub fn save(&self, token: &CachedToken) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(token)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Hands out valid access tokens, refreshing or re-authorizing as needed.
///
/// Authorization codes arrive on `codes`, fed by the callback server.
pub struct SpotifyAuthenticator {
    client: reqwest::Client,
    credentials: SpotifyCredentials,
    cache: TokenCache,
    token: Mutex<Option<CachedToken>>,
    codes: Mutex<mpsc::Receiver<String>>,
}

impl SpotifyAuthenticator {
    pub fn new(
        client: reqwest::Client,
        credentials: SpotifyCredentials,
        cache: TokenCache,
        codes: mpsc::Receiver<String>,
    ) -> Self {
        Self {
            client,
            credentials,
            cache,
            token: Mutex::new(None),
            codes: Mutex::new(codes),
        }
    }

    pub async fn access_token(&self) -> Result<String> {
        let mut current = self.token.lock().await;
        let now = chrono::Utc::now().timestamp();

        if current.is_none() {
            *current = self.cache.load()?;
        }

        if let Some(token) = current.as_ref().filter(|t| t.is_valid_at(now)) {
            return Ok(token.access_token.clone());
        }

        let previous_refresh = current.as_ref().and_then(|t| t.refresh_token.clone());
        let fresh = match previous_refresh {
            Some(refresh_token) => match self.refresh(&refresh_token, now).await {
                Ok(token) => token,
                Err(e) => {
                    log::warn!("Spotify token refresh failed, authorizing again: {}", e);
                    self.authorize(now).await?
                }
            },
            None => self.authorize(now).await?,
        };

        self.cache.save(&fresh)?;
        let access_token = fresh.access_token.clone();
        *current = Some(fresh);
        Ok(access_token)
    }

    async fn refresh(
        &self,
        refresh_token: &str,
        now: i64,
    ) -> Result<CachedToken, RefreshTokenError> {
        log::debug!("Refreshing Spotify access token");
        let response = refresh_access_token(
            &self.client,
            &self.credentials.client_id,
            &self.credentials.client_secret,
            refresh_token,
        )
        .await?;
        Ok(CachedToken::from_response(
            response,
            Some(refresh_token.to_string()),
            now,
        ))
    }

    async fn authorize(&self, now: i64) -> Result<CachedToken> {
        let url = authorize_url(&self.credentials.client_id, &self.credentials.redirect_uri);
        log::info!("Spotify authorization required, open this url in a browser:");
        println!("{}", url);

        let code = self
            .codes
            .lock()
            .await
            .recv()
            .await
            .ok_or_eyre("Spotify callback server stopped before a code arrived")?;

        let response = exchange_code_for_token(
            &self.client,
            &self.credentials.client_id,
            &self.credentials.client_secret,
            &code,
            &self.credentials.redirect_uri,
        )
        .await
        .wrap_err("Failed to exchange Spotify authorization code")?;

        log::info!("Spotify authorization complete");
        Ok(CachedToken::from_response(response, None, now))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_authorize_url() {
        let url = authorize_url("test_client_id", "http://localhost:8888/callback");

        assert!(url.starts_with(SPOTIFY_AUTH_URL));
        assert!(url.contains("client_id=test_client_id"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8888%2Fcallback"));
        assert!(url.contains("scope=playlist-read-private%20playlist-read-collaborative"));
    }

    #[test]
    fn test_token_cache_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = TokenCache::new(dir.path().join("cache").join("spotify_token.json"));
        assert_eq!(cache.load().unwrap(), None);

        let token = CachedToken {
            access_token: "abc".into(),
            refresh_token: Some("def".into()),
            expires_at: 42,
        };
        cache.save(&token).unwrap();

        assert_eq!(cache.load().unwrap(), Some(token));
    }

    #[test]
    fn test_corrupt_token_cache_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spotify_token.json");
        std::fs::write(&path, "not json").unwrap();

        assert_eq!(TokenCache::new(path).load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_cached_token_is_used_without_network() {
        let dir = TempDir::new().unwrap();
        let cache = TokenCache::new(dir.path().join("spotify_token.json"));
        cache
            .save(&CachedToken {
                access_token: "still-good".into(),
                refresh_token: None,
                expires_at: chrono::Utc::now().timestamp() + 3600,
            })
            .unwrap();

        let (_tx, rx) = mpsc::channel(1);
        let auth = SpotifyAuthenticator::new(
            reqwest::Client::new(),
            SpotifyCredentials {
                client_id: "id".into(),
                client_secret: "secret".into(),
                redirect_uri: "http://localhost:8888/callback".into(),
            },
            cache,
            rx,
        );

        assert_eq!(auth.access_token().await.unwrap(), "still-good");
    }
}
