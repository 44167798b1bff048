use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use avatar::renderer::AvatarError;
use avatar::sheet::{CharacterDefinition, SheetError};
use canvas::consts::{FIT_PADDING, SNAPSHOT_VERSION};
use canvas::persist::PersistError;
use clap::{Parser, Subcommand};
use oasis::config::{ConfigError, StoreConfig, env_parse};
use oasis::error::ErrorCode;
use oasis::report::{AvatarReport, MapReport, fit_map, simulate_playback};
use oasis::store::{FileStore, HttpRemote, OfflineRemote, RemoteStore, StoreError, SyncTicket, SyncedStore};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

const DEFAULT_SYNC_WAIT_SECS: u64 = 15;
const PREVIEW_STEP_MS: f64 = 1000.0 / 60.0;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("cannot read {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Map(#[from] PersistError),
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error(transparent)]
    Avatar(#[from] AvatarError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("no animation named {0:?}")]
    UnknownAnimation(String),
}

#[derive(Parser, Debug)]
#[command(name = "oasis", about = "Inspect and sync Oasis maps and characters")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a saved map.
    Inspect { file: PathBuf },
    /// Print the camera that frames a saved map in a viewport.
    Fit {
        file: PathBuf,
        #[arg(long)]
        width: f64,
        #[arg(long)]
        height: f64,
        #[arg(long, default_value_t = FIT_PADDING)]
        padding: f64,
    },
    /// Validate a character and show what it loads into.
    Avatar {
        file: PathBuf,
        /// Simulate a preview of this animation.
        #[arg(long)]
        play: Option<String>,
        #[arg(long, default_value_t = 1000.0)]
        duration_ms: f64,
    },
    /// Save a JSON document locally and sync it.
    Push { collection: String, id: String, file: PathBuf },
    /// Delete a document locally and remotely.
    Delete { collection: String, id: String },
    /// Mark a stored document active.
    Activate { collection: String, id: String },
    /// List stored ids; the active one is starred.
    List { collection: String },
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command).await {
        eprintln!("error[{}]: {e}", cli_error_code(&e));
        std::process::exit(1);
    }
}

async fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Inspect { file } => {
            let report = MapReport::from_json(&read(&file)?, SNAPSHOT_VERSION)?;
            println!("{report}");
        }
        Command::Fit { file, width, height, padding } => {
            match fit_map(&read(&file)?, SNAPSHOT_VERSION, width, height, padding)? {
                Some(camera) => println!("{}", serde_json::to_string_pretty(&camera)?),
                None => println!("map is empty; nothing to fit"),
            }
        }
        Command::Avatar { file, play, duration_ms } => {
            let character = CharacterDefinition::from_json(&read(&file)?)?;
            println!("{}", AvatarReport::load(&character)?);
            if let Some(name) = play {
                let frames = simulate_playback(&character, &name, duration_ms, PREVIEW_STEP_MS)
                    .ok_or(CliError::UnknownAnimation(name))?;
                let frames: Vec<String> = frames.iter().map(u32::to_string).collect();
                println!("preview   {}", frames.join(" "));
            }
        }
        Command::Push { collection, id, file } => {
            let value: Value = serde_json::from_str(&read(&file)?)?;
            let store = open_store()?;
            let ticket = store.save(&collection, &id, &value)?;
            println!("saved {collection}/{id}");
            report_sync(ticket).await;
        }
        Command::Delete { collection, id } => {
            let store = open_store()?;
            let ticket = store.delete(&collection, &id)?;
            println!("deleted {collection}/{id}");
            report_sync(ticket).await;
        }
        Command::Activate { collection, id } => {
            let store = open_store()?;
            let ticket = store.set_active(&collection, &id)?;
            println!("activated {collection}/{id}");
            report_sync(ticket).await;
        }
        Command::List { collection } => {
            let store = open_store()?;
            let active = store.active(&collection)?;
            for id in store.list(&collection)? {
                let marker = if active.as_deref() == Some(id.as_str()) { "*" } else { " " };
                println!("{marker} {id}");
            }
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_path_buf(), source })
}

fn open_store() -> Result<SyncedStore<FileStore, dyn RemoteStore>, CliError> {
    let config = StoreConfig::from_env()?;
    let remote: Arc<dyn RemoteStore> = match &config.api_url {
        Some(url) => Arc::new(HttpRemote::new(url, config.api_timeout)?),
        None => Arc::new(OfflineRemote),
    };
    tracing::debug!(data_dir = %config.data_dir.display(), remote = remote.name(), "store opened");
    Ok(SyncedStore::new(FileStore::new(config.data_dir), remote))
}

/// Wait a bounded time for the remote sync. Its failure never fails the command.
async fn report_sync(ticket: SyncTicket) {
    let wait = Duration::from_secs(env_parse("OASIS_SYNC_WAIT_SECS", DEFAULT_SYNC_WAIT_SECS));
    match tokio::time::timeout(wait, ticket.wait()).await {
        Ok(Ok(())) => println!("synced"),
        Ok(Err(e)) => println!("sync failed [{}]: {e}; local copy kept", e.error_code()),
        Err(_) => println!("sync still pending after {}s; local copy kept", wait.as_secs()),
    }
}

fn cli_error_code(err: &CliError) -> &'static str {
    match err {
        CliError::Read { .. } => "E_READ",
        CliError::Config(e) => e.error_code(),
        CliError::Store(e) => e.error_code(),
        CliError::Map(e) => canvas::error::ErrorCode::error_code(e),
        CliError::Sheet(e) => avatar::error::ErrorCode::error_code(e),
        CliError::Avatar(e) => avatar::error::ErrorCode::error_code(e),
        CliError::InvalidJson(_) => "E_INVALID_JSON",
        CliError::UnknownAnimation(_) => "E_ANIMATION_UNKNOWN",
    }
}
