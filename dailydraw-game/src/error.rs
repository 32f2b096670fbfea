use chrono::NaiveDate;
use dailydraw_core::{DateKey, PlayerId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("dailydraw core error: {0}")]
    Core(#[from] dailydraw_core::CoreError),

    #[error("Amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("No eligible players for the draw")]
    NoEligiblePlayers,

    #[error("Cannot transfer to yourself")]
    SelfTransfer,

    #[error("Amount {amount} is below the minimum transfer of {minimum}")]
    BelowMinimum { amount: i64, minimum: i64 },

    #[error("Insufficient balance: need {needed}, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },

    #[error("Player {player} is already protected on {date}")]
    AlreadyProtected { player: PlayerId, date: NaiveDate },

    #[error("Protection can be bought again from {available_on}")]
    ProtectionCooldown { available_on: NaiveDate },

    #[error("Player {buyer} already bought double odds for {date_key}")]
    AlreadyPurchased { buyer: PlayerId, date_key: DateKey },
}

impl GameError {
    /// Errors caused by malformed arguments rather than by game state or
    /// the store
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            GameError::InvalidAmount(_)
                | GameError::NoEligiblePlayers
                | GameError::SelfTransfer
                | GameError::BelowMinimum { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_classification() {
        assert!(GameError::InvalidAmount(-5).is_invalid_argument());
        assert!(GameError::SelfTransfer.is_invalid_argument());
        assert!(GameError::BelowMinimum {
            amount: 1,
            minimum: 2
        }
        .is_invalid_argument());

        assert!(!GameError::InsufficientFunds {
            needed: 10,
            available: 3
        }
        .is_invalid_argument());
        assert!(!GameError::Core(dailydraw_core::CoreError::internal("boom")).is_invalid_argument());
    }
}
