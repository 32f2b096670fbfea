use crate::error::Result;
use crate::types::{DateKey, GameId, PlayerId, TransferRecord};
use chrono::Utc;
use rusqlite::{params, Connection};

pub struct TransferStore<'a> {
    conn: &'a Connection,
}

impl<'a> TransferStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Append a transfer; a second one for the same sender and day violates
    /// the table's unique key
    pub fn insert(&self, record: &TransferRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO transfers
             (game_id, sender_id, recipient_id, amount, fee, year, day, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.game_id.0,
                record.sender.0,
                record.recipient.0,
                record.amount,
                record.fee,
                record.date_key.year,
                record.date_key.day,
                Utc::now().timestamp(),
            ],
        )?;

        tracing::info!(
            "Recorded transfer of {} from {} to {} in game {} on {}",
            record.amount,
            record.sender,
            record.recipient,
            record.game_id,
            record.date_key
        );
        Ok(())
    }

    pub fn exists(&self, game_id: GameId, sender: PlayerId, date_key: DateKey) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM transfers
             WHERE game_id = ?1 AND sender_id = ?2 AND year = ?3 AND day = ?4",
            params![game_id.0, sender.0, date_key.year, date_key.day],
            |row| row.get(0),
        )?;

        tracing::debug!(
            "Player {} has transferred in game {} on {}: {}",
            sender,
            game_id,
            date_key,
            count > 0
        );
        Ok(count > 0)
    }

    pub fn list_for_day(&self, game_id: GameId, date_key: DateKey) -> Result<Vec<TransferRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT sender_id, recipient_id, amount, fee FROM transfers
             WHERE game_id = ?1 AND year = ?2 AND day = ?3 ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![game_id.0, date_key.year, date_key.day], |row| {
            Ok(TransferRecord {
                game_id,
                sender: PlayerId(row.get(0)?),
                recipient: PlayerId(row.get(1)?),
                date_key,
                amount: row.get(2)?,
                fee: row.get(3)?,
            })
        })?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }

        Ok(records)
    }
}
