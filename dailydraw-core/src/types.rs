use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Game instance identity, one per hosting chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameId(pub i64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub i64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Player as seen by the game; identity and name are owned elsewhere
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Calendar day as (year, day-of-year)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateKey {
    pub year: i32,
    pub day: u32, // 1-366
}

impl DateKey {
    pub fn new(year: i32, day: u32) -> Self {
        Self { year, day }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            day: date.ordinal(),
        }
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.year, self.day)
    }
}

/// Per-game, per-player modifier state. A modifier is active from its
/// `*_from` day (or immediately when unset) through its `*_until` day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerModifierState {
    pub protection_from: Option<NaiveDate>,
    pub protection_until: Option<NaiveDate>,
    pub double_odds_from: Option<NaiveDate>,
    pub double_odds_until: Option<NaiveDate>,
    /// Last day protection was bought, for the purchase cooldown
    pub protection_bought_on: Option<NaiveDate>,
}

fn window_covers(from: Option<NaiveDate>, until: Option<NaiveDate>, date: NaiveDate) -> bool {
    from.map_or(true, |from| from <= date) && until.map_or(false, |until| until >= date)
}

impl PlayerModifierState {
    pub fn is_protected_on(&self, date: NaiveDate) -> bool {
        window_covers(self.protection_from, self.protection_until, date)
    }

    pub fn has_double_odds_on(&self, date: NaiveDate) -> bool {
        window_covers(self.double_odds_from, self.double_odds_until, date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedPool {
    pub game_id: GameId,
    pub balance: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub game_id: GameId,
    pub sender: PlayerId,
    pub recipient: PlayerId,
    pub date_key: DateKey,
    pub amount: i64,
    pub fee: i64,
}

/// Double odds bought by `buyer` for `target`, effective on `date_key`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OddsPurchase {
    pub game_id: GameId,
    pub buyer: PlayerId,
    pub target: PlayerId,
    pub date_key: DateKey,
    pub price: i64,
}

/// Signed balance movement; negative amounts are debits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub amount: i64,
    pub year: i32,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_key_from_date() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(DateKey::from_date(date), DateKey::new(2024, 366));

        let date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        assert_eq!(DateKey::from(date), DateKey::new(2025, 32));
    }

    #[test]
    fn test_modifier_dates_are_inclusive() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let state = PlayerModifierState {
            protection_until: Some(today),
            double_odds_until: today.pred_opt(),
            ..Default::default()
        };

        assert!(state.is_protected_on(today));
        assert!(!state.is_protected_on(today.succ_opt().unwrap()));
        assert!(!state.has_double_odds_on(today));
        assert!(!PlayerModifierState::default().is_protected_on(today));
    }

    #[test]
    fn test_modifier_window_starts_on_from_day() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let tomorrow = today.succ_opt().unwrap();
        let state = PlayerModifierState {
            protection_from: Some(tomorrow),
            protection_until: Some(tomorrow),
            double_odds_from: Some(tomorrow),
            double_odds_until: Some(tomorrow),
            protection_bought_on: Some(today),
        };

        assert!(!state.is_protected_on(today));
        assert!(state.is_protected_on(tomorrow));
        assert!(!state.has_double_odds_on(today));
        assert!(state.has_double_odds_on(tomorrow));
        assert!(!state.has_double_odds_on(tomorrow.succ_opt().unwrap()));
    }
}
