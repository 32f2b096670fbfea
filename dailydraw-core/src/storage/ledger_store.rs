use crate::error::{CoreError, Result};
use crate::types::{GameId, LedgerEntry, PlayerId, SharedPool};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

/// Player balances and the per-game shared pool
pub struct LedgerStore<'a> {
    conn: &'a Connection,
}

impl<'a> LedgerStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn append_entry(&self, entry: &LedgerEntry) -> Result<()> {
        self.conn.execute(
            "INSERT INTO ledger_entries (game_id, player_id, amount, year, reason, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.game_id.0,
                entry.player_id.0,
                entry.amount,
                entry.year,
                entry.reason,
                Utc::now().timestamp(),
            ],
        )?;

        tracing::info!(
            "Ledger {:+} for player {} in game {}, reason: {}",
            entry.amount,
            entry.player_id,
            entry.game_id,
            entry.reason
        );
        Ok(())
    }

    pub fn balance(&self, game_id: GameId, player_id: PlayerId) -> Result<i64> {
        let balance: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM ledger_entries
             WHERE game_id = ?1 AND player_id = ?2",
            params![game_id.0, player_id.0],
            |row| row.get(0),
        )?;

        tracing::debug!(
            "Balance of player {} in game {}: {}",
            player_id,
            game_id,
            balance
        );
        Ok(balance)
    }

    /// All players with ledger activity in a game, highest balance first
    pub fn balances(&self, game_id: GameId) -> Result<Vec<(PlayerId, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT player_id, SUM(amount) AS total FROM ledger_entries
             WHERE game_id = ?1 GROUP BY player_id ORDER BY total DESC, player_id ASC",
        )?;

        let rows = stmt.query_map(params![game_id.0], |row| {
            Ok((PlayerId(row.get(0)?), row.get::<_, i64>(1)?))
        })?;

        let mut balances = Vec::new();
        for row in rows {
            balances.push(row?);
        }

        Ok(balances)
    }

    pub fn get_or_create_pool(&self, game_id: GameId) -> Result<SharedPool> {
        let created = self.conn.execute(
            "INSERT OR IGNORE INTO shared_pools (game_id, balance, updated_at) VALUES (?1, 0, ?2)",
            params![game_id.0, Utc::now().timestamp()],
        )?;

        if created > 0 {
            tracing::info!("Created shared pool for game {}", game_id);
        }

        let pool = self.conn.query_row(
            "SELECT balance, updated_at FROM shared_pools WHERE game_id = ?1",
            params![game_id.0],
            |row| {
                Ok(SharedPool {
                    game_id,
                    balance: row.get(0)?,
                    updated_at: DateTime::from_timestamp(row.get(1)?, 0).unwrap_or_else(Utc::now),
                })
            },
        )?;

        Ok(pool)
    }

    pub fn increase_pool(&self, game_id: GameId, amount: i64) -> Result<()> {
        if amount < 0 {
            return Err(CoreError::internal(format!(
                "Shared pool cannot be decreased (amount {})",
                amount
            )));
        }

        self.conn.execute(
            "INSERT INTO shared_pools (game_id, balance, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(game_id) DO UPDATE SET
                balance = balance + excluded.balance,
                updated_at = excluded.updated_at",
            params![game_id.0, amount, Utc::now().timestamp()],
        )?;

        tracing::info!("Added {} to shared pool of game {}", amount, game_id);
        Ok(())
    }
}
