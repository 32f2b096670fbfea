use crate::types::{GameId, LedgerEntry, OddsPurchase, PlayerId, TransferRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single staged change to game state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    /// Append a signed balance movement
    Ledger(LedgerEntry),
    IncreasePool { game_id: GameId, amount: i64 },
    RecordTransfer(TransferRecord),
    /// Replace the protection window; `until: None` clears it
    SetProtection {
        game_id: GameId,
        player_id: PlayerId,
        from: Option<NaiveDate>,
        until: Option<NaiveDate>,
    },
    SetDoubleOdds {
        game_id: GameId,
        player_id: PlayerId,
        from: Option<NaiveDate>,
        until: Option<NaiveDate>,
    },
    RecordProtectionPurchase {
        game_id: GameId,
        player_id: PlayerId,
        on: NaiveDate,
    },
    RecordOddsPurchase(OddsPurchase),
}

/// Changes produced by one engine call. They are applied together by
/// [`GameStore::commit`](super::GameStore::commit) or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitOfWork {
    mutations: Vec<Mutation>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    pub fn append(&mut self, other: UnitOfWork) {
        self.mutations.extend(other.mutations);
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }
}

impl From<Vec<Mutation>> for UnitOfWork {
    fn from(mutations: Vec<Mutation>) -> Self {
        Self { mutations }
    }
}

impl IntoIterator for UnitOfWork {
    type Item = Mutation;
    type IntoIter = std::vec::IntoIter<Mutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.mutations.into_iter()
    }
}
