use crate::{GameError, Result};
use dailydraw_core::{
    DateKey, GameConfig, GameId, GameStore, LedgerEntry, Mutation, PlayerId, RateCache,
    TransferRecord, UnitOfWork,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Ok,
    AlreadyTransferredToday,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Ok => "ok",
            TransferStatus::AlreadyTransferredToday => "already_transferred_today",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCheck {
    pub allowed: bool,
    pub reason: TransferStatus,
}

/// Quantities of a staged transfer, for confirmation and display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub amount_sent: i64,
    pub amount_received: i64,
    pub fee: i64,
}

pub struct TransferEngine<'a, S: GameStore + ?Sized> {
    store: &'a S,
    rates: &'a RateCache,
    game_id: GameId,
    min_fee: i64,
    min_transfer: i64,
}

impl<'a, S: GameStore + ?Sized> TransferEngine<'a, S> {
    pub fn new(store: &'a S, rates: &'a RateCache, config: &GameConfig, game_id: GameId) -> Self {
        Self {
            store,
            rates,
            game_id,
            min_fee: config.min_fee,
            min_transfer: config.min_transfer,
        }
    }

    pub fn min_transfer(&self) -> i64 {
        self.min_transfer
    }

    /// Fee for moving `amount`: the current percentage of it, truncated,
    /// but never below the minimum fee
    pub fn fee_for(&self, amount: i64) -> Result<i64> {
        if amount <= 0 {
            return Err(GameError::InvalidAmount(amount));
        }

        let percent = self.rates.get_rate();
        let raw = fee_in_basis_points(amount, percent);
        let fee = raw.max(self.min_fee);

        tracing::debug!(
            "Fee for {}: {} (rate: {}%, raw: {})",
            amount,
            fee,
            percent,
            raw
        );
        Ok(fee)
    }

    /// One transfer per sender per day
    pub fn can_transfer(&self, sender: PlayerId, date_key: DateKey) -> Result<TransferCheck> {
        if self.store.transfer_exists(self.game_id, sender, date_key)? {
            return Ok(TransferCheck {
                allowed: false,
                reason: TransferStatus::AlreadyTransferredToday,
            });
        }

        Ok(TransferCheck {
            allowed: true,
            reason: TransferStatus::Ok,
        })
    }

    pub fn balance(&self, player_id: PlayerId) -> Result<i64> {
        Ok(self.store.balance(self.game_id, player_id)?)
    }

    pub fn can_afford(&self, player_id: PlayerId, amount: i64) -> Result<bool> {
        Ok(self.balance(player_id)? >= amount)
    }

    pub fn pool_balance(&self) -> Result<i64> {
        Ok(self.store.shared_pool(self.game_id)?.balance)
    }

    /// Stage moving `amount` from `sender` to `recipient`, with the fee
    /// routed to the shared pool. The daily cooldown is left to the caller
    /// (see [`can_transfer`](Self::can_transfer)).
    pub fn execute_transfer(
        &self,
        sender: PlayerId,
        recipient: PlayerId,
        amount: i64,
        date_key: DateKey,
    ) -> Result<(TransferReceipt, UnitOfWork)> {
        if sender == recipient {
            return Err(GameError::SelfTransfer);
        }

        if amount < self.min_transfer {
            return Err(GameError::BelowMinimum {
                amount,
                minimum: self.min_transfer,
            });
        }

        // a rate above 100% must not leave the recipient with a negative amount
        let fee = self.fee_for(amount)?.min(amount);
        let amount_received = amount - fee;

        tracing::info!(
            "Staging transfer in game {}: sender={}, recipient={}, amount={}, fee={}, received={}",
            self.game_id,
            sender,
            recipient,
            amount,
            fee,
            amount_received
        );

        let mut work = UnitOfWork::new();
        work.push(Mutation::Ledger(LedgerEntry {
            game_id: self.game_id,
            player_id: sender,
            amount: -amount,
            year: date_key.year,
            reason: format!("transfer_to_{}", recipient),
        }));
        if amount_received > 0 {
            work.push(Mutation::Ledger(LedgerEntry {
                game_id: self.game_id,
                player_id: recipient,
                amount: amount_received,
                year: date_key.year,
                reason: format!("transfer_from_{}", sender),
            }));
        }
        work.push(Mutation::IncreasePool {
            game_id: self.game_id,
            amount: fee,
        });
        work.push(Mutation::RecordTransfer(TransferRecord {
            game_id: self.game_id,
            sender,
            recipient,
            date_key,
            amount,
            fee,
        }));

        let receipt = TransferReceipt {
            amount_sent: amount,
            amount_received,
            fee,
        };

        Ok((receipt, work))
    }

    /// Stage an administrative credit to a player's balance
    pub fn grant(&self, player_id: PlayerId, amount: i64, year: i32) -> Result<UnitOfWork> {
        if amount <= 0 {
            return Err(GameError::InvalidAmount(amount));
        }

        tracing::info!(
            "Staging grant of {} to player {} in game {}",
            amount,
            player_id,
            self.game_id
        );

        Ok(vec![Mutation::Ledger(LedgerEntry {
            game_id: self.game_id,
            player_id,
            amount,
            year,
            reason: "grant".to_string(),
        })]
        .into())
    }
}

/// `amount * percent / 100` truncated, computed on the rate in whole basis
/// points so two-decimal rates are exact
fn fee_in_basis_points(amount: i64, percent: f64) -> i64 {
    let basis_points = (percent * 100.0).round() as i128;
    let raw = (amount as i128 * basis_points) / 10_000;
    raw.clamp(0, i64::MAX as i128) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use dailydraw_core::{FixedRate, RateError, RateProvider, Storage};
    use std::time::Duration;

    const GAME: GameId = GameId(1);
    const ALICE: PlayerId = PlayerId(1);
    const BOB: PlayerId = PlayerId(2);

    struct Unavailable;

    impl RateProvider for Unavailable {
        fn fetch_rate(&self) -> std::result::Result<f64, RateError> {
            Err(RateError::NotFound)
        }
    }

    fn rates(percent: f64) -> RateCache {
        RateCache::new(Box::new(FixedRate(percent)), Duration::from_secs(3600), 10.0)
    }

    fn today() -> DateKey {
        DateKey::new(2025, 120)
    }

    #[test]
    fn test_fee_examples_at_21_percent() {
        let storage = Storage::in_memory().unwrap();
        let rates = rates(21.0);
        let engine = TransferEngine::new(&storage, &rates, &GameConfig::default(), GAME);

        assert_eq!(engine.fee_for(10).unwrap(), 2);
        assert_eq!(engine.fee_for(8).unwrap(), 1);
        assert_eq!(engine.fee_for(3).unwrap(), 1);
        assert_eq!(engine.fee_for(1000).unwrap(), 210);
    }

    #[test]
    fn test_fee_is_exact_for_two_decimal_rates() {
        let storage = Storage::in_memory().unwrap();
        let rates = rates(4.56);
        let engine = TransferEngine::new(&storage, &rates, &GameConfig::default(), GAME);

        // 2500 * 4.56% is exactly 114
        assert_eq!(engine.fee_for(2500).unwrap(), 114);
        assert_eq!(fee_in_basis_points(2500, 4.56), 114);
        assert_eq!(fee_in_basis_points(1000, 16.50), 165);
        assert_eq!(fee_in_basis_points(199, 21.0), 41);
    }

    #[test]
    fn test_fee_is_monotonic_and_at_least_minimum() {
        let storage = Storage::in_memory().unwrap();
        let config = GameConfig::default();

        for percent in [0.5, 10.0, 16.5, 21.0, 99.0] {
            let rates = rates(percent);
            let engine = TransferEngine::new(&storage, &rates, &config, GAME);

            let mut previous = 0;
            for amount in 1..=2_000 {
                let fee = engine.fee_for(amount).unwrap();
                assert!(fee >= config.min_fee);
                assert!(fee >= previous, "fee dropped at {} for {}%", amount, percent);
                previous = fee;
            }
        }
    }

    #[test]
    fn test_fee_rejects_non_positive_amount() {
        let storage = Storage::in_memory().unwrap();
        let rates = rates(21.0);
        let engine = TransferEngine::new(&storage, &rates, &GameConfig::default(), GAME);

        assert!(matches!(engine.fee_for(0), Err(GameError::InvalidAmount(0))));
        assert!(matches!(engine.fee_for(-5), Err(GameError::InvalidAmount(-5))));
    }

    #[test]
    fn test_fee_uses_fallback_rate_when_provider_fails() {
        let storage = Storage::in_memory().unwrap();
        let rates = RateCache::new(Box::new(Unavailable), Duration::from_secs(3600), 10.0);
        let engine = TransferEngine::new(&storage, &rates, &GameConfig::default(), GAME);

        assert_eq!(engine.fee_for(100).unwrap(), 10);
        assert_eq!(engine.fee_for(25).unwrap(), 2);
    }

    #[test]
    fn test_transfer_moves_value_and_fee() {
        let storage = Storage::in_memory().unwrap();
        let rates = rates(20.0);
        let engine = TransferEngine::new(&storage, &rates, &GameConfig::default(), GAME);
        storage.commit(engine.grant(ALICE, 100, 2025).unwrap()).unwrap();
        let pool_before = engine.pool_balance().unwrap();

        let (receipt, work) = engine.execute_transfer(ALICE, BOB, 50, today()).unwrap();
        assert_eq!(
            receipt,
            TransferReceipt {
                amount_sent: 50,
                amount_received: 40,
                fee: 10,
            }
        );

        // nothing is visible before commit
        assert_eq!(engine.balance(BOB).unwrap(), 0);
        storage.commit(work).unwrap();

        assert_eq!(engine.balance(ALICE).unwrap(), 50);
        assert_eq!(engine.balance(BOB).unwrap(), 40);
        assert_eq!(engine.pool_balance().unwrap(), pool_before + 10);
    }

    #[test]
    fn test_self_transfer_is_rejected() {
        let storage = Storage::in_memory().unwrap();
        let rates = rates(20.0);
        let engine = TransferEngine::new(&storage, &rates, &GameConfig::default(), GAME);

        let result = engine.execute_transfer(ALICE, ALICE, 50, today());
        assert!(matches!(result, Err(GameError::SelfTransfer)));

        // self-transfer is reported even when the amount is also too small
        let result = engine.execute_transfer(ALICE, ALICE, 1, today());
        assert!(matches!(result, Err(GameError::SelfTransfer)));
    }

    #[test]
    fn test_below_minimum_is_rejected() {
        let storage = Storage::in_memory().unwrap();
        let rates = rates(20.0);
        let engine = TransferEngine::new(&storage, &rates, &GameConfig::default(), GAME);

        for amount in [1, 0, -10] {
            let result = engine.execute_transfer(ALICE, BOB, amount, today());
            assert!(matches!(
                result,
                Err(GameError::BelowMinimum { minimum: 2, .. })
            ));
        }

        let (receipt, _) = engine.execute_transfer(ALICE, BOB, 2, today()).unwrap();
        assert_eq!(receipt.fee, 1);
        assert_eq!(receipt.amount_received, 1);
    }

    #[test]
    fn test_cooldown_after_transfer() {
        let storage = Storage::in_memory().unwrap();
        let rates = rates(20.0);
        let engine = TransferEngine::new(&storage, &rates, &GameConfig::default(), GAME);

        let check = engine.can_transfer(ALICE, today()).unwrap();
        assert!(check.allowed);
        assert_eq!(check.reason, TransferStatus::Ok);

        let (_, work) = engine.execute_transfer(ALICE, BOB, 10, today()).unwrap();
        storage.commit(work).unwrap();

        let check = engine.can_transfer(ALICE, today()).unwrap();
        assert!(!check.allowed);
        assert_eq!(check.reason.as_str(), "already_transferred_today");

        // other senders and other days are unaffected
        assert!(engine.can_transfer(BOB, today()).unwrap().allowed);
        assert!(engine
            .can_transfer(ALICE, DateKey::new(2025, 121))
            .unwrap()
            .allowed);
    }

    #[test]
    fn test_engine_does_not_enforce_cooldown() {
        let storage = Storage::in_memory().unwrap();
        let rates = rates(20.0);
        let engine = TransferEngine::new(&storage, &rates, &GameConfig::default(), GAME);

        let (_, work) = engine.execute_transfer(ALICE, BOB, 10, today()).unwrap();
        storage.commit(work).unwrap();

        // staging succeeds; the store refuses the duplicate record as a whole
        let (_, work) = engine.execute_transfer(ALICE, BOB, 10, today()).unwrap();
        assert!(storage.commit(work).is_err());
        assert_eq!(engine.balance(BOB).unwrap(), 8);
        assert_eq!(engine.pool_balance().unwrap(), 2);
    }

    #[test]
    fn test_fee_capped_at_amount() {
        let storage = Storage::in_memory().unwrap();
        let rates = rates(150.0);
        let engine = TransferEngine::new(&storage, &rates, &GameConfig::default(), GAME);

        let (receipt, work) = engine.execute_transfer(ALICE, BOB, 4, today()).unwrap();
        assert_eq!(receipt.fee, 4);
        assert_eq!(receipt.amount_received, 0);
        // no zero credit is staged
        assert_eq!(work.len(), 3);
    }

    #[test]
    fn test_can_afford() {
        let storage = Storage::in_memory().unwrap();
        let rates = rates(20.0);
        let engine = TransferEngine::new(&storage, &rates, &GameConfig::default(), GAME);
        storage.commit(engine.grant(ALICE, 30, 2025).unwrap()).unwrap();

        assert!(engine.can_afford(ALICE, 30).unwrap());
        assert!(!engine.can_afford(ALICE, 31).unwrap());
        assert!(engine.grant(ALICE, 0, 2025).is_err());
    }
}
