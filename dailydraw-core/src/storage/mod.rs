pub mod ledger_store;
pub mod modifier_store;
pub mod purchase_store;
pub mod transfer_store;
pub mod unit_of_work;

pub use ledger_store::LedgerStore;
pub use modifier_store::ModifierStore;
pub use purchase_store::PurchaseStore;
pub use transfer_store::TransferStore;
pub use unit_of_work::{Mutation, UnitOfWork};

use crate::error::{CoreError, Result};
use crate::types::{DateKey, GameId, PlayerId, PlayerModifierState, SharedPool, TransferRecord};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::Connection;
use std::path::Path;

/// Persistence boundary the game engines read from and commit to
pub trait GameStore {
    /// Modifier state of a player, created empty on first reference
    fn modifiers(&self, game_id: GameId, player_id: PlayerId) -> Result<PlayerModifierState>;

    /// Shared pool of a game, created with a zero balance on first reference
    fn shared_pool(&self, game_id: GameId) -> Result<SharedPool>;

    fn transfer_exists(&self, game_id: GameId, sender: PlayerId, date_key: DateKey)
        -> Result<bool>;

    /// Whether `buyer` already bought double odds effective on `date_key`
    fn odds_purchase_exists(&self, game_id: GameId, buyer: PlayerId, date_key: DateKey)
        -> Result<bool>;

    fn balance(&self, game_id: GameId, player_id: PlayerId) -> Result<i64>;

    /// Apply every mutation of `work`, or none of them
    fn commit(&self, work: UnitOfWork) -> Result<()>;
}

pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    pub fn open(db_path: &Path) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CoreError::internal(format!("Failed to create directory: {}", e)))?;
        }

        Self::with_connection(Connection::open(db_path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let storage = Self {
            conn: Mutex::new(conn),
        };

        storage.init_schema()?;
        Ok(storage)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        // Balance ledger, one signed row per movement
        conn.execute(
            "CREATE TABLE IF NOT EXISTS ledger_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                game_id INTEGER NOT NULL,
                player_id INTEGER NOT NULL,
                amount INTEGER NOT NULL,
                year INTEGER NOT NULL,
                reason TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_ledger_player
             ON ledger_entries (game_id, player_id)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS player_modifiers (
                game_id INTEGER NOT NULL,
                player_id INTEGER NOT NULL,
                protection_from TEXT,
                protection_until TEXT,
                double_odds_from TEXT,
                double_odds_until TEXT,
                protection_bought_on TEXT,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (game_id, player_id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS shared_pools (
                game_id INTEGER PRIMARY KEY,
                balance INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        // Cooldown records, one per sender per day
        conn.execute(
            "CREATE TABLE IF NOT EXISTS transfers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                game_id INTEGER NOT NULL,
                sender_id INTEGER NOT NULL,
                recipient_id INTEGER NOT NULL,
                amount INTEGER NOT NULL,
                fee INTEGER NOT NULL,
                year INTEGER NOT NULL,
                day INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE (game_id, sender_id, year, day)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS odds_purchases (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                game_id INTEGER NOT NULL,
                buyer_id INTEGER NOT NULL,
                target_id INTEGER NOT NULL,
                price INTEGER NOT NULL,
                year INTEGER NOT NULL,
                day INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE (game_id, buyer_id, year, day)
            )",
            [],
        )?;

        Ok(())
    }

    pub fn get_connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    pub fn balances(&self, game_id: GameId) -> Result<Vec<(PlayerId, i64)>> {
        let conn = self.get_connection();
        LedgerStore::new(&conn).balances(game_id)
    }

    pub fn transfers_on(&self, game_id: GameId, date_key: DateKey) -> Result<Vec<TransferRecord>> {
        let conn = self.get_connection();
        TransferStore::new(&conn).list_for_day(game_id, date_key)
    }
}

impl GameStore for Storage {
    fn modifiers(&self, game_id: GameId, player_id: PlayerId) -> Result<PlayerModifierState> {
        let conn = self.get_connection();
        ModifierStore::new(&conn).get_or_create(game_id, player_id)
    }

    fn shared_pool(&self, game_id: GameId) -> Result<SharedPool> {
        let conn = self.get_connection();
        LedgerStore::new(&conn).get_or_create_pool(game_id)
    }

    fn transfer_exists(
        &self,
        game_id: GameId,
        sender: PlayerId,
        date_key: DateKey,
    ) -> Result<bool> {
        let conn = self.get_connection();
        TransferStore::new(&conn).exists(game_id, sender, date_key)
    }

    fn odds_purchase_exists(
        &self,
        game_id: GameId,
        buyer: PlayerId,
        date_key: DateKey,
    ) -> Result<bool> {
        let conn = self.get_connection();
        PurchaseStore::new(&conn).odds_exists(game_id, buyer, date_key)
    }

    fn balance(&self, game_id: GameId, player_id: PlayerId) -> Result<i64> {
        let conn = self.get_connection();
        LedgerStore::new(&conn).balance(game_id, player_id)
    }

    fn commit(&self, work: UnitOfWork) -> Result<()> {
        if work.is_empty() {
            return Ok(());
        }

        let mut conn = self.get_connection();
        let tx = conn.transaction()?;
        let count = work.len();

        for mutation in work {
            match mutation {
                Mutation::Ledger(entry) => LedgerStore::new(&tx).append_entry(&entry)?,
                Mutation::IncreasePool { game_id, amount } => {
                    LedgerStore::new(&tx).increase_pool(game_id, amount)?
                }
                Mutation::RecordTransfer(record) => TransferStore::new(&tx).insert(&record)?,
                Mutation::SetProtection {
                    game_id,
                    player_id,
                    from,
                    until,
                } => ModifierStore::new(&tx).set_protection(game_id, player_id, from, until)?,
                Mutation::SetDoubleOdds {
                    game_id,
                    player_id,
                    from,
                    until,
                } => ModifierStore::new(&tx).set_double_odds(game_id, player_id, from, until)?,
                Mutation::RecordProtectionPurchase {
                    game_id,
                    player_id,
                    on,
                } => ModifierStore::new(&tx).record_protection_purchase(game_id, player_id, on)?,
                Mutation::RecordOddsPurchase(purchase) => {
                    PurchaseStore::new(&tx).insert_odds(&purchase)?
                }
            }
        }

        // dropping an uncommitted transaction rolls it back
        tx.commit()?;
        tracing::debug!("Committed {} mutations", count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LedgerEntry, OddsPurchase};
    use chrono::NaiveDate;
    use tempfile::tempdir;

    const GAME: GameId = GameId(1);

    fn credit(player: i64, amount: i64) -> Mutation {
        Mutation::Ledger(LedgerEntry {
            game_id: GAME,
            player_id: PlayerId(player),
            amount,
            year: 2025,
            reason: "grant".to_string(),
        })
    }

    #[test]
    fn test_open_creates_database() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("data").join("dailydraw.db");

        let storage = Storage::open(&db_path).unwrap();
        storage.commit(vec![credit(1, 10)].into()).unwrap();
        drop(storage);

        let reopened = Storage::open(&db_path).unwrap();
        assert_eq!(reopened.balance(GAME, PlayerId(1)).unwrap(), 10);
    }

    #[test]
    fn test_modifiers_created_lazily() {
        let storage = Storage::in_memory().unwrap();

        let state = storage.modifiers(GAME, PlayerId(7)).unwrap();
        assert_eq!(state, PlayerModifierState::default());

        let until = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        storage
            .commit(
                vec![Mutation::SetDoubleOdds {
                    game_id: GAME,
                    player_id: PlayerId(7),
                    from: None,
                    until: Some(until),
                }]
                .into(),
            )
            .unwrap();

        let state = storage.modifiers(GAME, PlayerId(7)).unwrap();
        assert_eq!(state.double_odds_until, Some(until));
        assert_eq!(state.protection_until, None);

        // recording a purchase leaves the windows untouched
        let bought = NaiveDate::from_ymd_opt(2025, 2, 20).unwrap();
        storage
            .commit(
                vec![Mutation::RecordProtectionPurchase {
                    game_id: GAME,
                    player_id: PlayerId(7),
                    on: bought,
                }]
                .into(),
            )
            .unwrap();

        let state = storage.modifiers(GAME, PlayerId(7)).unwrap();
        assert_eq!(state.protection_bought_on, Some(bought));
        assert_eq!(state.double_odds_until, Some(until));

        // modifier state is per game
        let other = storage.modifiers(GameId(2), PlayerId(7)).unwrap();
        assert_eq!(other, PlayerModifierState::default());
    }

    #[test]
    fn test_shared_pool_accumulates() {
        let storage = Storage::in_memory().unwrap();
        assert_eq!(storage.shared_pool(GAME).unwrap().balance, 0);

        storage
            .commit(
                vec![
                    Mutation::IncreasePool {
                        game_id: GAME,
                        amount: 3,
                    },
                    Mutation::IncreasePool {
                        game_id: GAME,
                        amount: 4,
                    },
                ]
                .into(),
            )
            .unwrap();

        assert_eq!(storage.shared_pool(GAME).unwrap().balance, 7);
    }

    #[test]
    fn test_failed_commit_applies_nothing() {
        let storage = Storage::in_memory().unwrap();
        let record = TransferRecord {
            game_id: GAME,
            sender: PlayerId(1),
            recipient: PlayerId(2),
            date_key: DateKey::new(2025, 40),
            amount: 10,
            fee: 1,
        };
        storage
            .commit(vec![Mutation::RecordTransfer(record.clone())].into())
            .unwrap();

        // second record for the same sender and day breaks the unique key
        let result = storage.commit(
            vec![
                credit(2, 9),
                Mutation::IncreasePool {
                    game_id: GAME,
                    amount: 1,
                },
                Mutation::RecordTransfer(record),
            ]
            .into(),
        );

        assert!(result.is_err());
        assert_eq!(storage.balance(GAME, PlayerId(2)).unwrap(), 0);
        assert_eq!(storage.shared_pool(GAME).unwrap().balance, 0);
        assert!(storage
            .transfer_exists(GAME, PlayerId(1), DateKey::new(2025, 40))
            .unwrap());
        assert!(!storage
            .transfer_exists(GAME, PlayerId(1), DateKey::new(2025, 41))
            .unwrap());
    }

    #[test]
    fn test_odds_purchase_once_per_buyer_per_day() {
        let storage = Storage::in_memory().unwrap();
        let purchase = OddsPurchase {
            game_id: GAME,
            buyer: PlayerId(1),
            target: PlayerId(2),
            date_key: DateKey::new(2025, 100),
            price: 8,
        };

        assert!(!storage
            .odds_purchase_exists(GAME, PlayerId(1), purchase.date_key)
            .unwrap());
        storage
            .commit(vec![Mutation::RecordOddsPurchase(purchase.clone())].into())
            .unwrap();
        assert!(storage
            .odds_purchase_exists(GAME, PlayerId(1), purchase.date_key)
            .unwrap());

        let repeat = OddsPurchase {
            target: PlayerId(3),
            ..purchase
        };
        assert!(storage
            .commit(vec![Mutation::RecordOddsPurchase(repeat)].into())
            .is_err());
    }

    #[test]
    fn test_pool_rejects_decrease() {
        let storage = Storage::in_memory().unwrap();
        let result = storage.commit(
            vec![Mutation::IncreasePool {
                game_id: GAME,
                amount: -5,
            }]
            .into(),
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_balances_sorted() {
        let storage = Storage::in_memory().unwrap();
        storage
            .commit(vec![credit(1, 5), credit(2, 20), credit(1, -2)].into())
            .unwrap();

        assert_eq!(
            storage.balances(GAME).unwrap(),
            vec![(PlayerId(2), 20), (PlayerId(1), 3)]
        );
    }
}
