use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// A trade as stored in the trades table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TradeRecord {
    pub id: i64,
    pub timestamp: String,
    pub symbol: String,
    pub signal: String,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub quantity: i64,
    pub pnl: Option<f64>,
    pub confidence: f64,
    pub strategy: Option<String>,
    pub status: String,
    pub created_at: Option<String>,
}

/// Fields required to open a trade; exit price and P&L are filled in
/// at close time.
#[derive(Debug, Clone)]
pub struct NewTrade {
    pub symbol: String,
    pub signal: String,
    pub entry_price: f64,
    pub quantity: i64,
    pub confidence: f64,
    pub strategy: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TradeStats {
    pub total_trades: i64,
    pub wins: i64,
    pub losses: i64,
    pub win_rate: f64,
    pub total_pnl: f64,
}

/// SQLite-backed trade history.
#[derive(Clone)]
pub struct TradeHistory {
    pool: SqlitePool,
}

impl TradeHistory {
    pub async fn new(database_url: &str) -> Result<Self> {
        let file_path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);
        let is_memory = file_path.contains(":memory:");
        if !is_memory {
            if let Some(parent) = std::path::Path::new(file_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("creating database directory {}", parent.display())
                    })?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("parsing database url {database_url}"))?
            .create_if_missing(true);

        // an in-memory database exists per connection, so the pool must
        // not hand out a second one
        let pool = SqlitePoolOptions::new()
            .max_connections(if is_memory { 1 } else { 5 })
            .connect_with(options)
            .await
            .context("connecting to trade database")?;

        let history = Self { pool };
        history.init_schema().await?;
        Ok(history)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                symbol TEXT NOT NULL,
                signal TEXT NOT NULL,
                entry_price REAL NOT NULL,
                exit_price REAL,
                quantity INTEGER NOT NULL,
                pnl REAL,
                confidence REAL NOT NULL,
                strategy TEXT,
                status TEXT NOT NULL DEFAULT 'OPEN',
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("creating trades table")?;
        Ok(())
    }

    /// Record a freshly opened trade, returning its row id.
    pub async fn log_trade(&self, trade: &NewTrade) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO trades
            (timestamp, symbol, signal, entry_price, quantity, confidence, strategy, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, 'OPEN')
            "#,
        )
        .bind(Utc::now().to_rfc3339())
        .bind(&trade.symbol)
        .bind(&trade.signal)
        .bind(trade.entry_price)
        .bind(trade.quantity)
        .bind(trade.confidence)
        .bind(&trade.strategy)
        .execute(&self.pool)
        .await
        .context("inserting trade")?;

        Ok(result.last_insert_rowid())
    }

    /// Mark a trade closed with its exit price and realized P&L.
    /// Returns false when the id does not exist.
    pub async fn close_trade(&self, trade_id: i64, exit_price: f64, pnl: f64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE trades SET exit_price = ?, pnl = ?, status = 'CLOSED' WHERE id = ?",
        )
        .bind(exit_price)
        .bind(pnl)
        .bind(trade_id)
        .execute(&self.pool)
        .await
        .context("closing trade")?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn open_trades(&self) -> Result<Vec<TradeRecord>> {
        let trades = sqlx::query_as::<_, TradeRecord>(
            "SELECT * FROM trades WHERE status = 'OPEN' ORDER BY timestamp DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("fetching open trades")?;
        Ok(trades)
    }

    pub async fn trades_for(&self, symbol: &str, limit: i64) -> Result<Vec<TradeRecord>> {
        let trades = sqlx::query_as::<_, TradeRecord>(
            "SELECT * FROM trades WHERE symbol = ? ORDER BY timestamp DESC LIMIT ?",
        )
        .bind(symbol)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("fetching trades for symbol")?;
        Ok(trades)
    }

    pub async fn stats(&self) -> Result<TradeStats> {
        let total_trades: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trades")
            .fetch_one(&self.pool)
            .await
            .context("counting trades")?;
        let wins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trades WHERE pnl > 0")
            .fetch_one(&self.pool)
            .await
            .context("counting wins")?;
        let losses: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trades WHERE pnl < 0")
            .fetch_one(&self.pool)
            .await
            .context("counting losses")?;
        let total_pnl: f64 = sqlx::query_scalar("SELECT COALESCE(SUM(pnl), 0.0) FROM trades")
            .fetch_one(&self.pool)
            .await
            .context("summing pnl")?;

        Ok(TradeStats {
            total_trades,
            wins,
            losses,
            win_rate: if total_trades > 0 {
                wins as f64 / total_trades as f64
            } else {
                0.0
            },
            total_pnl,
        })
    }
}
