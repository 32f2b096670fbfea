use crate::error::Result;
use crate::types::{DateKey, GameId, OddsPurchase, PlayerId};
use chrono::Utc;
use rusqlite::{params, Connection};

pub struct PurchaseStore<'a> {
    conn: &'a Connection,
}

impl<'a> PurchaseStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// One purchase per buyer per effective day; a repeat violates the
    /// table's unique key
    pub fn insert_odds(&self, purchase: &OddsPurchase) -> Result<()> {
        self.conn.execute(
            "INSERT INTO odds_purchases
             (game_id, buyer_id, target_id, price, year, day, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                purchase.game_id.0,
                purchase.buyer.0,
                purchase.target.0,
                purchase.price,
                purchase.date_key.year,
                purchase.date_key.day,
                Utc::now().timestamp(),
            ],
        )?;

        tracing::info!(
            "Recorded double odds bought by {} for {} in game {} on {}",
            purchase.buyer,
            purchase.target,
            purchase.game_id,
            purchase.date_key
        );
        Ok(())
    }

    pub fn odds_exists(&self, game_id: GameId, buyer: PlayerId, date_key: DateKey) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM odds_purchases
             WHERE game_id = ?1 AND buyer_id = ?2 AND year = ?3 AND day = ?4",
            params![game_id.0, buyer.0, date_key.year, date_key.day],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }
}
