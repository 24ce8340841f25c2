//! SQLite persistence adapter.
//!
//! Two tables: a key-value table holding the JSON-encoded settings and
//! ledger (last write wins), and an append-only trade history log.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

use crate::domain::error::TradewindError;
use crate::domain::ledger::{Ledger, Trade};
use crate::domain::settings::LiveSettings;
use crate::ports::store_port::StorePort;

const SETTINGS_KEY: &str = "settings";
const LEDGER_KEY: &str = "ledger";

pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TradewindError> {
        let manager = SqliteConnectionManager::file(path.as_ref());
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .map_err(|e| TradewindError::Store {
                reason: format!("failed to open {}: {}", path.as_ref().display(), e),
            })?;

        let store = SqliteStore { pool };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(
        &self,
    ) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, TradewindError> {
        self.pool.get().map_err(|e| TradewindError::Store {
            reason: format!("connection pool: {e}"),
        })
    }

    fn init_schema(&self) -> Result<(), TradewindError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS session_state (
                     key TEXT PRIMARY KEY,
                     value TEXT NOT NULL
                 );
                 CREATE TABLE IF NOT EXISTS trade_history (
                     id INTEGER PRIMARY KEY AUTOINCREMENT,
                     recorded_at TEXT NOT NULL,
                     trade TEXT NOT NULL
                 );",
            )
            .map_err(store_err)
    }

    fn get_value(&self, key: &str) -> Result<Option<String>, TradewindError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT value FROM session_state WHERE key = ?1")
            .map_err(store_err)?;
        let mut rows = stmt
            .query_map([key], |row| row.get::<_, String>(0))
            .map_err(store_err)?;
        match rows.next() {
            Some(value) => Ok(Some(value.map_err(store_err)?)),
            None => Ok(None),
        }
    }

    fn put_value(&self, key: &str, value: &str) -> Result<(), TradewindError> {
        self.conn()?
            .execute(
                "INSERT INTO session_state (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                [key, value],
            )
            .map(|_| ())
            .map_err(store_err)
    }
}

impl StorePort for SqliteStore {
    fn load_settings(&self) -> Result<Option<LiveSettings>, TradewindError> {
        self.get_value(SETTINGS_KEY)?
            .map(|json| serde_json::from_str(&json).map_err(store_err))
            .transpose()
    }

    fn save_settings(&self, settings: &LiveSettings) -> Result<(), TradewindError> {
        let json = serde_json::to_string(settings).map_err(store_err)?;
        self.put_value(SETTINGS_KEY, &json)
    }

    fn load_ledger(&self) -> Result<Option<Ledger>, TradewindError> {
        self.get_value(LEDGER_KEY)?
            .map(|json| serde_json::from_str(&json).map_err(store_err))
            .transpose()
    }

    fn save_ledger(&self, ledger: &Ledger) -> Result<(), TradewindError> {
        let json = serde_json::to_string(ledger).map_err(store_err)?;
        self.put_value(LEDGER_KEY, &json)
    }

    fn append_trade(&self, trade: &Trade) -> Result<(), TradewindError> {
        let json = serde_json::to_string(trade).map_err(store_err)?;
        self.conn()?
            .execute(
                "INSERT INTO trade_history (recorded_at, trade) VALUES (?1, ?2)",
                [trade.timestamp.to_rfc3339().as_str(), json.as_str()],
            )
            .map(|_| ())
            .map_err(store_err)
    }

    fn load_trade_history(&self) -> Result<Vec<Trade>, TradewindError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT trade FROM trade_history ORDER BY id")
            .map_err(store_err)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(store_err)?;

        let mut trades = Vec::new();
        for row in rows {
            let json = row.map_err(store_err)?;
            trades.push(serde_json::from_str(&json).map_err(store_err)?);
        }
        Ok(trades)
    }
}

fn store_err<E: std::fmt::Display>(e: E) -> TradewindError {
    TradewindError::Store {
        reason: e.to_string(),
    }
}
