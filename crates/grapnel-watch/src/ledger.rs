//! Persistent record of transfers created from watched torrent files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::sync::OnceCell;

use crate::error::{WatchError, WatchResult};

/// Default ledger file name, created in the working directory.
pub const DEFAULT_LEDGER_FILE: &str = "grapnel.db";

const CREATE_TORRENTS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS torrents (
        transfer_id TEXT PRIMARY KEY,
        origin TEXT NOT NULL
    )
";

const UPSERT_TRANSFER: &str = r"
    INSERT INTO torrents (transfer_id, origin)
    VALUES ($1, $2)
    ON CONFLICT (transfer_id) DO UPDATE SET origin = excluded.origin
";

const SELECT_TRANSFER: &str = r"SELECT transfer_id FROM torrents WHERE transfer_id = $1";

/// Database-backed ledger of uploaded transfers.
///
/// Each record maps a transfer id to the directory, relative to the
/// watched root, that its torrent file was picked up from.
#[derive(Debug, Clone)]
pub struct UploadLedger {
    pool: SqlitePool,
}

impl UploadLedger {
    /// Open the ledger at `path`, creating the file and schema on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema
    /// cannot be applied.
    pub async fn open(path: &Path) -> WatchResult<Self> {
        const OPERATION: &str = "ledger_open";
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|source| WatchError::database(OPERATION, source))?;
        Self::initialise(pool).await
    }

    /// Open a transient in-memory ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema
    /// cannot be applied.
    pub async fn open_in_memory() -> WatchResult<Self> {
        const OPERATION: &str = "ledger_open";
        // A single connection keeps every query on the same in-memory
        // database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|source| WatchError::database(OPERATION, source))?;
        Self::initialise(pool).await
    }

    async fn initialise(pool: SqlitePool) -> WatchResult<Self> {
        const OPERATION: &str = "ledger_init";
        sqlx::query(CREATE_TORRENTS_TABLE)
            .execute(&pool)
            .await
            .map_err(|source| WatchError::database(OPERATION, source))?;
        Ok(Self { pool })
    }

    /// Record that `transfer_id` was created from a torrent file found
    /// under `origin`. Recording the same transfer again replaces the
    /// stored origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn record_upload(&self, transfer_id: &str, origin: &str) -> WatchResult<()> {
        const OPERATION: &str = "ledger_record";
        sqlx::query(UPSERT_TRANSFER)
            .bind(transfer_id)
            .bind(origin)
            .execute(&self.pool)
            .await
            .map_err(|source| WatchError::database(OPERATION, source))?;
        Ok(())
    }

    /// Report whether `transfer_id` has been recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    pub async fn contains(&self, transfer_id: &str) -> WatchResult<bool> {
        const OPERATION: &str = "ledger_lookup";
        let row = sqlx::query(SELECT_TRANSFER)
            .bind(transfer_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|source| WatchError::database(OPERATION, source))?;
        Ok(row.is_some())
    }
}

/// Lazily opened, shareable handle to an [`UploadLedger`].
///
/// The database file is only created once a caller actually needs the
/// ledger; clones share the opened instance.
#[derive(Debug, Clone)]
pub struct LedgerHandle {
    path: PathBuf,
    ledger: Arc<OnceCell<UploadLedger>>,
}

impl LedgerHandle {
    /// Build a handle for the ledger at `path` without opening it.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ledger: Arc::new(OnceCell::new()),
        }
    }

    /// Open the ledger on first use and return it.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be opened.
    pub async fn get(&self) -> WatchResult<&UploadLedger> {
        self.ledger
            .get_or_try_init(|| UploadLedger::open(&self.path))
            .await
    }
}
