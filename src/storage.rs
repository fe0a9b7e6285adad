use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::model::{Airport, Favorite};

const CREATE_AIRPORT_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS airport (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL,
    name TEXT NOT NULL,
    passengers INTEGER NOT NULL DEFAULT 0
)
";

const CREATE_FAVORITE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS favorite (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    destination_code TEXT NOT NULL,
    origin_code TEXT NOT NULL
)
";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchMode {
    /// ASCII case folding via `LIKE`.
    IgnoreCase,
    CaseSensitive,
}

impl MatchMode {
    pub fn from_case_sensitive(case_sensitive: bool) -> Self {
        if case_sensitive {
            MatchMode::CaseSensitive
        } else {
            MatchMode::IgnoreCase
        }
    }
}

fn open_connection(path: &Path) -> StoreResult<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| StoreError::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    debug!("opening database at {}", path.display());
    Connection::open(path).map_err(|source| StoreError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn open_memory() -> StoreResult<Connection> {
    Connection::open_in_memory().map_err(|source| StoreError::Open {
        path: PathBuf::from(":memory:"),
        source,
    })
}

/// Escapes `LIKE` metacharacters so the query only ever matches literally.
fn escape_like(query: &str) -> String {
    let mut out = String::with_capacity(query.len() + 2);
    for ch in query.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[derive(Debug)]
pub struct AirportStore {
    conn: Connection,
}

impl AirportStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::with_connection(open_connection(path)?)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(open_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(CREATE_AIRPORT_TABLE)?;
        Ok(Self { conn })
    }

    /// Replaces the whole table with `airports` in a single transaction.
    pub fn reseed(&mut self, airports: &[Airport]) -> StoreResult<usize> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM airport", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO airport (code, name, passengers) VALUES (?1, ?2, ?3)",
            )?;
            for airport in airports {
                stmt.execute(params![airport.code, airport.name, airport.passengers])?;
            }
        }
        tx.commit()?;
        info!(
            "airport table reseeded: removed {removed}, inserted {}",
            airports.len()
        );
        Ok(airports.len())
    }

    pub fn count(&self) -> StoreResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM airport", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    pub fn all(&self) -> StoreResult<Vec<Airport>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, code, name, passengers FROM airport ORDER BY id")?;
        let airports = stmt
            .query_map([], row_to_airport)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(airports)
    }

    /// Airports whose code or name contains `query`. An empty query matches
    /// every row.
    pub fn search(&self, query: &str, mode: MatchMode) -> StoreResult<Vec<Airport>> {
        let airports = match mode {
            MatchMode::IgnoreCase => {
                let pattern = format!("%{}%", escape_like(query));
                let mut stmt = self.conn.prepare(
                    r"
                    SELECT id, code, name, passengers FROM airport
                    WHERE code LIKE ?1 ESCAPE '\' OR name LIKE ?1 ESCAPE '\'
                    ORDER BY id
                    ",
                )?;
                let rows = stmt
                    .query_map([pattern], row_to_airport)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
            MatchMode::CaseSensitive => {
                let mut stmt = self.conn.prepare(
                    r"
                    SELECT id, code, name, passengers FROM airport
                    WHERE instr(code, ?1) > 0 OR instr(name, ?1) > 0
                    ORDER BY id
                    ",
                )?;
                let rows = stmt
                    .query_map([query], row_to_airport)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
        };
        debug!("airport search {:?} matched {}", query, airports.len());
        Ok(airports)
    }
}

fn row_to_airport(row: &Row<'_>) -> rusqlite::Result<Airport> {
    Ok(Airport {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        passengers: row.get(3)?,
    })
}

#[derive(Debug)]
pub struct FavoriteStore {
    conn: Connection,
}

impl FavoriteStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::with_connection(open_connection(path)?)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(open_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(CREATE_FAVORITE_TABLE)?;
        Ok(Self { conn })
    }

    /// Appends a favorite. Duplicates are kept.
    pub fn insert(&self, origin: &str, destination: &str) -> StoreResult<Favorite> {
        self.conn.execute(
            "INSERT INTO favorite (destination_code, origin_code) VALUES (?1, ?2)",
            params![destination, origin],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("favorite {id} saved: {origin} -> {destination}");
        Ok(Favorite {
            id,
            destination: destination.to_string(),
            origin: origin.to_string(),
        })
    }

    pub fn list_all(&self) -> StoreResult<Vec<Favorite>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, destination_code, origin_code FROM favorite ORDER BY id")?;
        let favorites = stmt
            .query_map([], |row| {
                Ok(Favorite {
                    id: row.get(0)?,
                    destination: row.get(1)?,
                    origin: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(favorites)
    }

    pub fn clear_all(&self) -> StoreResult<usize> {
        let removed = self.conn.execute("DELETE FROM favorite", [])?;
        info!("favorites cleared: {removed}");
        Ok(removed)
    }
}

#[derive(Debug, Default, Deserialize)]
struct SeedFile {
    #[serde(default)]
    airport: Vec<Airport>,
}

pub fn load_seed_file(path: &Path) -> Result<Vec<Airport>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
    let file: SeedFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse seed file: {}", path.display()))?;
    Ok(file.airport)
}
