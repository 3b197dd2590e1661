//! castcall - backend for the book-to-film casting game
//!
//! Serves the game's AI-backed endpoints, or looks up actor fees from the
//! command line.

use std::process;
use std::sync::Arc;

use clap::Parser;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use castcall::cache::ActorFeeCache;
use castcall::cli::{Cli, CliError, Command, Settings, StoreSettings};
use castcall::clock::{Clock, SystemClock};
use castcall::genai::{ClientConfig, ReqwestTransport, ResilientClient};
use castcall::server::{build_router, AppState};
use castcall::store::{DocumentStore, FileStore, MemoryStore};

/// Installs the stderr log subscriber, honouring `RUST_LOG`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the document store selected in settings
fn build_store(
    settings: &Settings,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn DocumentStore>, CliError> {
    match &settings.store {
        StoreSettings::Memory => Ok(Arc::new(MemoryStore::with_clock(clock))),
        StoreSettings::File(dir) => {
            let store = match dir {
                Some(dir) => FileStore::with_dir(dir.clone()),
                None => FileStore::new().ok_or(CliError::NoStoreDir)?,
            };
            info!(root = %store.root().display(), "Using file document store");
            Ok(Arc::new(store.with_clock(clock)))
        }
    }
}

/// Looks up every actor concurrently and prints one JSON line each
///
/// Returns whether all lookups succeeded.
async fn run_fee(actors: &[String], cache: &ActorFeeCache, client: &ResilientClient) -> bool {
    let lookups = actors.iter().map(|actor| async move {
        let result = cache.get_or_fetch(actor, client).await;
        (actor, result)
    });

    let mut all_ok = true;
    for (actor, result) in futures::future::join_all(lookups).await {
        match result {
            Ok(fee) => println!(
                "{}",
                json!({ "actorName": actor, "fee": fee.fee, "popularity": fee.popularity })
            ),
            Err(e) => {
                all_ok = false;
                eprintln!("error: {}: {}", actor, e);
            }
        }
    }
    all_ok
}

async fn run(settings: Settings) -> Result<bool, Box<dyn std::error::Error>> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = build_store(&settings, clock.clone())?;

    let client = ResilientClient::new(
        Arc::new(ReqwestTransport::new()),
        ClientConfig {
            api_base: settings.api_base.clone(),
            api_key: settings.api_key.clone(),
            default_model: settings.model.clone(),
        },
    );
    let fee_cache = ActorFeeCache::new(store, clock, settings.app_id.clone());

    match settings.command {
        Command::Serve { bind } => {
            let router = build_router(AppState { client, fee_cache });
            let listener = tokio::net::TcpListener::bind(bind).await?;
            info!(%bind, model = %settings.model, "Listening");
            axum::serve(listener, router).await?;
            Ok(true)
        }
        Command::Fee { actors } => Ok(run_fee(&actors, &fee_cache, &client).await),
    }
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let settings = match Settings::from_cli(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(2);
        }
    };

    match run(settings).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}
