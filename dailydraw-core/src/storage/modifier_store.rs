use crate::error::Result;
use crate::types::{GameId, PlayerId, PlayerModifierState};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct ModifierStore<'a> {
    conn: &'a Connection,
}

impl<'a> ModifierStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Load the modifier row, creating an empty one on first reference
    pub fn get_or_create(&self, game_id: GameId, player_id: PlayerId) -> Result<PlayerModifierState> {
        let created = self.conn.execute(
            "INSERT OR IGNORE INTO player_modifiers (game_id, player_id, created_at)
             VALUES (?1, ?2, ?3)",
            params![game_id.0, player_id.0, Utc::now().timestamp()],
        )?;

        if created > 0 {
            tracing::info!(
                "Created modifier state for player {} in game {}",
                player_id,
                game_id
            );
        }

        let state = self
            .conn
            .query_row(
                "SELECT protection_from, protection_until, double_odds_from,
                        double_odds_until, protection_bought_on
                 FROM player_modifiers WHERE game_id = ?1 AND player_id = ?2",
                params![game_id.0, player_id.0],
                |row| {
                    Ok(PlayerModifierState {
                        protection_from: parse_date(row.get(0)?, 0, "protection_from")?,
                        protection_until: parse_date(row.get(1)?, 1, "protection_until")?,
                        double_odds_from: parse_date(row.get(2)?, 2, "double_odds_from")?,
                        double_odds_until: parse_date(row.get(3)?, 3, "double_odds_until")?,
                        protection_bought_on: parse_date(row.get(4)?, 4, "protection_bought_on")?,
                    })
                },
            )
            .optional()?;

        Ok(state.unwrap_or_default())
    }

    pub fn set_protection(
        &self,
        game_id: GameId,
        player_id: PlayerId,
        from: Option<NaiveDate>,
        until: Option<NaiveDate>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO player_modifiers
                (game_id, player_id, protection_from, protection_until, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(game_id, player_id) DO UPDATE SET
                protection_from = excluded.protection_from,
                protection_until = excluded.protection_until",
            params![
                game_id.0,
                player_id.0,
                format_date(from),
                format_date(until),
                Utc::now().timestamp(),
            ],
        )?;

        tracing::info!(
            "Set protection for player {} in game {} from {:?} until {:?}",
            player_id,
            game_id,
            from,
            until
        );
        Ok(())
    }

    pub fn set_double_odds(
        &self,
        game_id: GameId,
        player_id: PlayerId,
        from: Option<NaiveDate>,
        until: Option<NaiveDate>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO player_modifiers
                (game_id, player_id, double_odds_from, double_odds_until, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(game_id, player_id) DO UPDATE SET
                double_odds_from = excluded.double_odds_from,
                double_odds_until = excluded.double_odds_until",
            params![
                game_id.0,
                player_id.0,
                format_date(from),
                format_date(until),
                Utc::now().timestamp(),
            ],
        )?;

        tracing::info!(
            "Set double odds for player {} in game {} from {:?} until {:?}",
            player_id,
            game_id,
            from,
            until
        );
        Ok(())
    }

    pub fn record_protection_purchase(
        &self,
        game_id: GameId,
        player_id: PlayerId,
        on: NaiveDate,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO player_modifiers (game_id, player_id, protection_bought_on, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(game_id, player_id) DO UPDATE SET
                protection_bought_on = excluded.protection_bought_on",
            params![
                game_id.0,
                player_id.0,
                format_date(Some(on)),
                Utc::now().timestamp(),
            ],
        )?;

        Ok(())
    }
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn parse_date(
    value: Option<String>,
    column: usize,
    name: &str,
) -> rusqlite::Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|_| {
                rusqlite::Error::InvalidColumnType(
                    column,
                    name.to_string(),
                    rusqlite::types::Type::Text,
                )
            })
        })
        .transpose()
}
