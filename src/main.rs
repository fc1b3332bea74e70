mod config;
mod deezer_rs;
mod error;
mod http_server;
mod logging;
mod matching;
mod plex_rs;
mod ports;
mod services;
mod spotify_rs;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context};
use tokio::sync::mpsc;

use crate::{
    config::{Config, ConfigOverrides},
    deezer_rs::DeezerSource,
    logging::setup_logging,
    ports::{plex::PlexCatalog, source::PlaylistSource},
    services::{
        plex::PlexHttpAdapter,
        retry::{RetryPolicy, RetryingCatalog, wait_for_connection},
        sync::{SyncSettings, sync_source},
    },
    spotify_rs::{
        SpotifySource,
        auth::{SpotifyAuthenticator, TokenCache},
    },
};

/// Delay between two Plex connection checks while the server is down.
const CONNECTION_RETRY_DELAY: Duration = Duration::from_secs(90);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "PLEX_PLAYLIST_SYNC_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Console log level
    #[arg(long, default_value = "info", global = true, env = "LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// File log level
    #[arg(long, default_value = "debug", global = true)]
    log_file_level: log::LevelFilter,

    /// Path to log file
    #[arg(long, env = "PLEX_PLAYLIST_SYNC_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sync all playlists, then again every SECONDS_TO_WAIT seconds
    Run {
        /// Port of the Spotify authorization callback server
        #[arg(
            long,
            default_value_t = http_server::app::DEFAULT_CALLBACK_PORT,
            env = "CALLBACK_PORT"
        )]
        callback_port: u16,
    },
    /// Sync all playlists once and exit
    Sync {
        /// Port of the Spotify authorization callback server
        #[arg(
            long,
            default_value_t = http_server::app::DEFAULT_CALLBACK_PORT,
            env = "CALLBACK_PORT"
        )]
        callback_port: u16,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_logging(args.log_level, args.log_file.clone(), args.log_file_level)?;

    log::debug!("Plex playlist sync starting");

    let (callback_port, run_forever) = match args.command {
        Commands::Config(config_commands) => {
            match config_commands {
                ConfigCommands::CreateDefault => {
                    log::debug!("Creating default config");
                    let path = Config::create_default()?;
                    log::info!("Default config created at {}", path.display());
                }
                ConfigCommands::Path => match Config::config_path() {
                    Some(path) => println!("{}", path.display()),
                    None => println!("No default config path found"),
                },
            }
            return Ok(());
        }
        Commands::Run { callback_port } => (callback_port, true),
        Commands::Sync { callback_port } => (callback_port, false),
    };

    log::debug!("Loading configuration");
    let config = Config::load(args.config.as_deref())
        .with_context(|| "Failed to load plex-playlist-sync config")?
        .with_overrides(args.overrides);

    let catalog = RetryingCatalog::new(
        PlexHttpAdapter::new(config.plex_url()?, config.plex_token()?.to_string()),
        RetryPolicy::default(),
    );
    let sources = connect_sources(&config, callback_port);
    if sources.is_empty() {
        log::warn!("No streaming service configured, nothing to sync");
    }

    let settings = SyncSettings {
        policy: config.sync_policy(),
        missing_tracks: config.missing_tracks_writer(),
    };

    loop {
        sync_pass(&catalog, &sources, &settings).await?;

        if !run_forever {
            return Ok(());
        }

        let wait = config.wait_interval();
        log::info!(
            "Next sync in {} at {}",
            humantime::format_duration(wait),
            humantime::format_rfc3339_seconds(SystemTime::now() + wait)
        );
        tokio::time::sleep(wait).await;
    }
}

/// Build a source for every configured streaming service.
fn connect_sources(config: &Config, callback_port: u16) -> Vec<Box<dyn PlaylistSource>> {
    let client = reqwest::Client::new();
    let mut sources: Vec<Box<dyn PlaylistSource>> = Vec::new();

    match config.spotify_credentials() {
        Some(credentials) => {
            let (codes_tx, codes_rx) = mpsc::channel(1);
            tokio::spawn(async move {
                if let Err(e) = http_server::app::start(callback_port, codes_tx).await {
                    log::error!("Spotify callback server stopped: {:?}", e);
                }
            });

            let auth = SpotifyAuthenticator::new(
                client.clone(),
                credentials,
                TokenCache::new(config.spotify_token_path()),
                codes_rx,
            );
            sources.push(Box::new(SpotifySource::new(
                client.clone(),
                auth,
                config.sync.append_service_suffix,
            )));
        }
        None => log::info!("Spotify credentials not set, skipping Spotify"),
    }

    if config.deezer_enabled() {
        sources.push(Box::new(DeezerSource::new(
            client,
            config.deezer.user_id.clone(),
            config.deezer.playlist_ids.clone(),
            config.sync.append_service_suffix,
        )));
    } else {
        log::info!("Deezer user id and playlist ids not set, skipping Deezer");
    }

    sources
}

/// One sync of every source. A source that fails is skipped for this pass;
/// only an unusable Plex server ends it early.
async fn sync_pass(
    catalog: &dyn PlexCatalog,
    sources: &[Box<dyn PlaylistSource>],
    settings: &SyncSettings,
) -> Result<()> {
    let machine_identifier = wait_for_connection(catalog, CONNECTION_RETRY_DELAY)
        .await
        .wrap_err("Failed to connect to the Plex server")?;
    log::info!("Connected to Plex server {}", machine_identifier);

    for source in sources {
        let service = source.service_name();
        match sync_source(source.as_ref(), catalog, settings).await {
            Ok(_) => log::info!("{} playlist sync complete", service),
            Err(e) => log::error!("Could not sync {} playlists: {:?}", service, e),
        }
    }

    Ok(())
}
