use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::model::ListRow;
use crate::storage::{AirportStore, FavoriteStore, MatchMode};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreRequest {
    Search { generation: u64, query: String },
    Favorites { generation: u64 },
    AddFavorite { origin: String, destination: String },
    ClearFavorites,
}

impl StoreRequest {
    fn generation(&self) -> Option<u64> {
        match self {
            StoreRequest::Search { generation, .. } | StoreRequest::Favorites { generation } => {
                Some(*generation)
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreMessage {
    Rows { generation: u64, rows: Vec<ListRow> },
    FavoriteAdded { origin: String, destination: String },
    FavoritesCleared(usize),
    Error { generation: Option<u64>, message: String },
}

pub struct Stores {
    pub airports: AirportStore,
    pub favorites: FavoriteStore,
    pub match_mode: MatchMode,
}

/// Runs every store operation on a dedicated thread. The thread exits when
/// the request sender is dropped.
pub fn spawn_store_worker(
    stores: Stores,
    rx: Receiver<StoreRequest>,
    tx: Sender<StoreMessage>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        info!("store worker started");
        while let Ok(first) = rx.recv() {
            let mut batch = vec![first];
            batch.extend(rx.try_iter());
            for request in drop_superseded(batch) {
                let reply = handle(&stores, request);
                if tx.send(reply).is_err() {
                    debug!("store worker: ui receiver gone");
                    return;
                }
            }
        }
        info!("store worker stopped");
    })
}

/// Keeps only the newest list request in a batch; writes keep their order.
fn drop_superseded(batch: Vec<StoreRequest>) -> Vec<StoreRequest> {
    let newest = batch.iter().filter_map(StoreRequest::generation).max();
    batch
        .into_iter()
        .filter(|req| match req.generation() {
            Some(generation) => {
                let keep = Some(generation) == newest;
                if !keep {
                    debug!("skipping superseded request generation={generation}");
                }
                keep
            }
            None => true,
        })
        .collect()
}

fn handle(stores: &Stores, request: StoreRequest) -> StoreMessage {
    match request {
        StoreRequest::Search { generation, query } => {
            match stores.airports.search(&query, stores.match_mode) {
                Ok(airports) => StoreMessage::Rows {
                    generation,
                    rows: airports.iter().map(ListRow::from).collect(),
                },
                Err(err) => {
                    warn!("airport search failed: {err}");
                    StoreMessage::Error {
                        generation: Some(generation),
                        message: err.to_string(),
                    }
                }
            }
        }
        StoreRequest::Favorites { generation } => match stores.favorites.list_all() {
            Ok(favorites) => StoreMessage::Rows {
                generation,
                rows: favorites.iter().map(ListRow::from).collect(),
            },
            Err(err) => {
                warn!("favorite listing failed: {err}");
                StoreMessage::Error {
                    generation: Some(generation),
                    message: err.to_string(),
                }
            }
        },
        StoreRequest::AddFavorite {
            origin,
            destination,
        } => match stores.favorites.insert(&origin, &destination) {
            Ok(favorite) => {
                debug!("favorite stored id={}", favorite.id);
                StoreMessage::FavoriteAdded {
                    origin,
                    destination,
                }
            }
            Err(err) => {
                warn!("favorite insert failed: {err}");
                StoreMessage::Error {
                    generation: None,
                    message: err.to_string(),
                }
            }
        },
        StoreRequest::ClearFavorites => match stores.favorites.clear_all() {
            Ok(removed) => StoreMessage::FavoritesCleared(removed),
            Err(err) => {
                warn!("favorite clear failed: {err}");
                StoreMessage::Error {
                    generation: None,
                    message: err.to_string(),
                }
            }
        },
    }
}
