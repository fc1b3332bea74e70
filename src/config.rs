use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::builder::BoolishValueParser;
use color_eyre::{
    Result,
    eyre::{Context, OptionExt},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::deezer_rs::source::parse_playlist_ids;
use crate::http_server::app::DEFAULT_CALLBACK_PORT;
use crate::services::sync::{MissingTracksWriter, SyncPolicy, WriteMode};
use crate::spotify_rs::auth::SpotifyCredentials;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Missing-track csv files and the token cache live here.
    pub data_dir: String,
    pub plex: PlexConfig,
    pub spotify: SpotifyConfig,
    pub deezer: DeezerConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlexConfig {
    pub url: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeezerConfig {
    pub user_id: Option<String>,
    pub playlist_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub write_missing_as_csv: bool,
    pub append_service_suffix: bool,
    pub add_playlist_poster: bool,
    pub add_playlist_description: bool,
    pub append_instead_of_sync: bool,
    pub seconds_to_wait: u64,
    pub min_match_count: usize,
    /// How an existing playlist is updated, `append_instead_of_sync` wins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_mode: Option<WriteMode>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: "/data".to_string(),
            plex: PlexConfig::default(),
            spotify: SpotifyConfig::default(),
            deezer: DeezerConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            write_missing_as_csv: false,
            append_service_suffix: true,
            add_playlist_poster: true,
            add_playlist_description: true,
            append_instead_of_sync: false,
            seconds_to_wait: 43200,
            min_match_count: 1,
            write_mode: None,
        }
    }
}

/// Command line and environment settings. Anything set here wins over the
/// config file.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigOverrides {
    /// Plex server url, e.g. http://192.168.1.2:32400
    #[arg(long, env = "PLEX_URL", global = true)]
    pub plex_url: Option<String>,

    /// Plex authentication token
    #[arg(long, env = "PLEX_TOKEN", global = true, hide_env_values = true)]
    pub plex_token: Option<String>,

    #[arg(long, env = "SPOTIFY_CLIENT_ID", global = true)]
    pub spotify_client_id: Option<String>,

    #[arg(
        long,
        env = "SPOTIFY_CLIENT_SECRET",
        global = true,
        hide_env_values = true
    )]
    pub spotify_client_secret: Option<String>,

    #[arg(long, env = "SPOTIFY_REDIRECT_URI", global = true)]
    pub spotify_redirect_uri: Option<String>,

    /// Deezer user whose public playlists are synced
    #[arg(long, env = "DEEZER_USER_ID", global = true)]
    pub deezer_user_id: Option<String>,

    /// Whitespace separated Deezer playlist ids to sync
    #[arg(long, env = "DEEZER_PLAYLIST_ID", global = true)]
    pub deezer_playlist_id: Option<String>,

    #[arg(
        long,
        env = "WRITE_MISSING_AS_CSV",
        global = true,
        value_parser = BoolishValueParser::new()
    )]
    pub write_missing_as_csv: Option<bool>,

    #[arg(
        long,
        env = "APPEND_SERVICE_SUFFIX",
        global = true,
        value_parser = BoolishValueParser::new()
    )]
    pub append_service_suffix: Option<bool>,

    #[arg(
        long,
        env = "ADD_PLAYLIST_POSTER",
        global = true,
        value_parser = BoolishValueParser::new()
    )]
    pub add_playlist_poster: Option<bool>,

    #[arg(
        long,
        env = "ADD_PLAYLIST_DESCRIPTION",
        global = true,
        value_parser = BoolishValueParser::new()
    )]
    pub add_playlist_description: Option<bool>,

    #[arg(
        long,
        env = "APPEND_INSTEAD_OF_SYNC",
        global = true,
        value_parser = BoolishValueParser::new()
    )]
    pub append_instead_of_sync: Option<bool>,

    /// Seconds between two sync runs
    #[arg(long, env = "SECONDS_TO_WAIT", global = true)]
    pub seconds_to_wait: Option<u64>,

    /// Playlists with fewer matched tracks are left untouched
    #[arg(long, env = "MIN_MATCH_COUNT", global = true)]
    pub min_match_count: Option<usize>,

    /// How existing Plex playlists are updated
    #[arg(long, env = "WRITE_MODE", global = true, value_enum)]
    pub write_mode: Option<WriteMode>,

    #[arg(long, env = "DATA_DIR", global = true)]
    pub data_dir: Option<String>,
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("plex-playlist-sync").join("config.toml"))
    }

    /// Load `path`, else the default config file when it exists, else the
    /// built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Create a default config file, if it doesn't exist
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or_eyre("No config directory on this platform")?;
        Self::write_default(&path)?;
        Ok(path)
    }

    fn write_default(path: &Path) -> Result<()> {
        if path.exists() {
            log::info!("Config file already exists at {}", path.display());
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(&Self::default())?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        fn set<T>(target: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *target = value;
            }
        }

        set(&mut self.data_dir, overrides.data_dir);
        set(&mut self.plex.url, overrides.plex_url.map(Some));
        set(&mut self.plex.token, overrides.plex_token.map(Some));
        set(
            &mut self.spotify.client_id,
            overrides.spotify_client_id.map(Some),
        );
        set(
            &mut self.spotify.client_secret,
            overrides.spotify_client_secret.map(Some),
        );
        set(
            &mut self.spotify.redirect_uri,
            overrides.spotify_redirect_uri.map(Some),
        );
        set(&mut self.deezer.user_id, overrides.deezer_user_id.map(Some));
        set(
            &mut self.deezer.playlist_ids,
            overrides.deezer_playlist_id.as_deref().map(parse_playlist_ids),
        );
        set(
            &mut self.sync.write_missing_as_csv,
            overrides.write_missing_as_csv,
        );
        set(
            &mut self.sync.append_service_suffix,
            overrides.append_service_suffix,
        );
        set(
            &mut self.sync.add_playlist_poster,
            overrides.add_playlist_poster,
        );
        set(
            &mut self.sync.add_playlist_description,
            overrides.add_playlist_description,
        );
        set(
            &mut self.sync.append_instead_of_sync,
            overrides.append_instead_of_sync,
        );
        set(&mut self.sync.seconds_to_wait, overrides.seconds_to_wait);
        set(&mut self.sync.min_match_count, overrides.min_match_count);
        set(&mut self.sync.write_mode, overrides.write_mode.map(Some));
        self
    }

    pub fn plex_url(&self) -> Result<Url> {
        let raw = self
            .plex
            .url
            .as_deref()
            .ok_or_eyre("PLEX_URL is not set")?;
        Url::parse(raw).with_context(|| format!("Invalid PLEX_URL: {}", raw))
    }

    pub fn plex_token(&self) -> Result<&str> {
        self.plex
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_eyre("PLEX_TOKEN is not set")
    }

    /// `None` unless both client id and secret are configured.
    pub fn spotify_credentials(&self) -> Option<SpotifyCredentials> {
        let client_id = self.spotify.client_id.clone().filter(|s| !s.is_empty())?;
        let client_secret = self
            .spotify
            .client_secret
            .clone()
            .filter(|s| !s.is_empty())?;
        let redirect_uri = self
            .spotify
            .redirect_uri
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}/callback", DEFAULT_CALLBACK_PORT));
        Some(SpotifyCredentials {
            client_id,
            client_secret,
            redirect_uri,
        })
    }

    pub fn deezer_enabled(&self) -> bool {
        self.deezer.user_id.is_some() || !self.deezer.playlist_ids.is_empty()
    }

    pub fn sync_policy(&self) -> SyncPolicy {
        SyncPolicy {
            write_mode: if self.sync.append_instead_of_sync {
                WriteMode::Append
            } else {
                self.sync.write_mode.unwrap_or_default()
            },
            min_match_count: self.sync.min_match_count,
            sync_description: self.sync.add_playlist_description,
            sync_artwork: self.sync.add_playlist_poster,
        }
    }

    pub fn wait_interval(&self) -> Duration {
        Duration::from_secs(self.sync.seconds_to_wait)
    }

    /// Expand ~ to home directory
    fn expand_path(&self, path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    pub fn data_path(&self) -> PathBuf {
        self.expand_path(&self.data_dir)
    }

    pub fn spotify_token_path(&self) -> PathBuf {
        self.data_path().join("cache").join("spotify_token.json")
    }

    pub fn missing_tracks_writer(&self) -> Option<MissingTracksWriter> {
        self.sync
            .write_missing_as_csv
            .then(|| MissingTracksWriter::new(self.data_path()))
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use tempfile::TempDir;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        overrides: ConfigOverrides,
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            data_dir = "/srv/pps"

            [plex]
            url = "http://plex:32400"

            [sync]
            min_match_count = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, "/srv/pps");
        assert_eq!(config.plex.url.as_deref(), Some("http://plex:32400"));
        assert_eq!(config.sync.min_match_count, 5);
        assert_eq!(config.sync.seconds_to_wait, 43200);
        assert!(config.sync.append_service_suffix);
        assert!(!config.sync.write_missing_as_csv);
    }

    #[test]
    fn test_overrides_win() {
        let cli = TestCli::try_parse_from([
            "test",
            "--plex-token",
            "secret",
            "--append-instead-of-sync",
            "1",
            "--add-playlist-poster",
            "0",
            "--deezer-playlist-id",
            "11 22",
        ])
        .unwrap();

        let mut file_config = Config::default();
        file_config.plex.token = Some("from-file".into());
        file_config.plex.url = Some("http://plex:32400".into());
        let config = file_config.with_overrides(cli.overrides);

        assert_eq!(config.plex_token().unwrap(), "secret");
        assert_eq!(config.plex.url.as_deref(), Some("http://plex:32400"));
        assert!(config.sync.append_instead_of_sync);
        assert!(!config.sync.add_playlist_poster);
        assert_eq!(config.deezer.playlist_ids, vec!["11", "22"]);
        assert!(config.deezer_enabled());
    }

    #[test]
    fn test_sync_policy() {
        let mut config = Config::default();
        assert_eq!(config.sync_policy(), SyncPolicy::default());

        config.sync.append_instead_of_sync = true;
        config.sync.add_playlist_description = false;
        config.sync.min_match_count = 3;
        let policy = config.sync_policy();

        assert_eq!(policy.write_mode, WriteMode::Append);
        assert!(!policy.sync_description);
        assert!(policy.sync_artwork);
        assert_eq!(policy.min_match_count, 3);
    }

    #[test]
    fn test_write_mode_setting() {
        let config: Config = toml::from_str(
            r#"
            [sync]
            write_mode = "recreate"
            "#,
        )
        .unwrap();
        assert_eq!(config.sync_policy().write_mode, WriteMode::Recreate);

        let cli = TestCli::try_parse_from(["test", "--write-mode", "append"]).unwrap();
        let config = config.with_overrides(cli.overrides);
        assert_eq!(config.sync_policy().write_mode, WriteMode::Append);

        let mut config = Config::default();
        config.sync.write_mode = Some(WriteMode::Recreate);
        config.sync.append_instead_of_sync = true;
        assert_eq!(config.sync_policy().write_mode, WriteMode::Append);
    }

    #[test]
    fn test_spotify_credentials_need_id_and_secret() {
        let mut config = Config::default();
        config.spotify.client_id = Some("id".into());
        assert!(config.spotify_credentials().is_none());

        config.spotify.client_secret = Some("secret".into());
        let credentials = config.spotify_credentials().unwrap();
        assert_eq!(credentials.redirect_uri, "http://localhost:8888/callback");
    }

    #[test]
    fn test_missing_plex_settings_are_errors() {
        let config = Config::default();
        assert!(config.plex_url().is_err());
        assert!(config.plex_token().is_err());
        assert!(config.missing_tracks_writer().is_none());
    }

    #[test]
    fn test_write_default_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plex-playlist-sync").join("config.toml");

        Config::write_default(&path).unwrap();
        let loaded = Config::load(Some(&path)).unwrap();

        assert_eq!(loaded, Config::default());
    }
}
