mod app;
mod config;
mod error;
mod logging;
mod model;
mod runtime;
mod storage;
mod ui;
mod worker;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::mpsc;
use tracing::{debug, info, warn};

use app::{App, ThemeMode};
use config::{parse_args, Config};
use logging::init as init_logging;
use model::{seed_airports, Airport};
use runtime::{init_terminal, restore_terminal, run_app, StoreChannels};
use storage::{load_seed_file, AirportStore, FavoriteStore, MatchMode};
use worker::{spawn_store_worker, Stores};

fn main() -> Result<()> {
    let config = parse_args()?;
    let _log_guard = init_logging(&config);
    info!("airport-tui starting");
    debug!("config path: {}", config.config_path.display());

    let stores = open_stores(&config)?;
    let match_mode = stores.match_mode;

    let (req_tx, req_rx) = mpsc::channel();
    let (res_tx, res_rx) = mpsc::channel();
    let worker = spawn_store_worker(stores, req_rx, res_tx);

    let mut terminal = init_terminal()?;
    let res = run_app(
        &mut terminal,
        App::new(ThemeMode::from_str(&config.theme), match_mode),
        StoreChannels { req_tx, res_rx },
    );
    restore_terminal(&mut terminal)?;

    if worker.join().is_err() {
        warn!("store worker panicked");
    }

    if let Err(err) = res {
        warn!("runtime error: {err}");
        eprintln!("{err}");
    }

    info!("airport-tui exited");
    Ok(())
}

/// Opens both stores and applies the start-of-session reset.
fn open_stores(config: &Config) -> Result<Stores> {
    let mut airports = AirportStore::open(&config.db_path)
        .with_context(|| format!("Failed to open airports in {}", config.db_path.display()))?;
    let favorites = FavoriteStore::open(&config.db_path)
        .with_context(|| format!("Failed to open favorites in {}", config.db_path.display()))?;

    if config.reset_on_start {
        favorites.clear_all().context("Failed to clear favorites")?;
        airports
            .reseed(&seed_list(config)?)
            .context("Failed to seed airports")?;
    } else if airports.count()? == 0 {
        airports
            .reseed(&seed_list(config)?)
            .context("Failed to seed airports")?;
    }

    let codes: Vec<String> = airports.all()?.into_iter().map(|a| a.code).collect();
    debug!("airports ready: {}", codes.join(","));

    Ok(Stores {
        airports,
        favorites,
        match_mode: MatchMode::from_case_sensitive(config.case_sensitive),
    })
}

fn seed_list(config: &Config) -> Result<Vec<Airport>> {
    if config.seed_file.trim().is_empty() {
        return Ok(seed_airports());
    }
    let path = PathBuf::from(config.seed_file.trim());
    let airports = load_seed_file(&path)?;
    info!("loaded {} airports from {}", airports.len(), path.display());
    Ok(airports)
}
