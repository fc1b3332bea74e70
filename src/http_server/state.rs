use tokio::sync::mpsc;

pub struct AppState {
    /// Authorization codes for the Spotify authenticator.
    pub spotify_codes: mpsc::Sender<String>,
}
