use crate::{GameError, Result};
use chrono::{Datelike, Duration, NaiveDate};
use dailydraw_core::{
    CoreError, DateKey, GameConfig, GameId, GameStore, LedgerEntry, Mutation, OddsPurchase,
    PlayerId, UnitOfWork,
};
use serde::{Deserialize, Serialize};

/// What a purchase cost and the day its modifier takes effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub price: i64,
    pub effective_on: NaiveDate,
}

/// Sells protection and double odds. Purchases made today take effect
/// tomorrow.
pub struct ShopEngine<'a, S: GameStore + ?Sized> {
    store: &'a S,
    game_id: GameId,
    protection_price: i64,
    double_odds_price: i64,
    cooldown_days: i64,
}

impl<'a, S: GameStore + ?Sized> ShopEngine<'a, S> {
    pub fn new(store: &'a S, config: &GameConfig, game_id: GameId) -> Self {
        Self {
            store,
            game_id,
            protection_price: config.protection_price,
            double_odds_price: config.double_odds_price,
            cooldown_days: config.protection_cooldown_days,
        }
    }

    /// Stage a protection purchase for `player_id`, effective the day after
    /// `today`. Refused when the player cannot pay, is already protected on
    /// that day, or bought protection within the cooldown.
    pub fn buy_protection(
        &self,
        player_id: PlayerId,
        today: NaiveDate,
    ) -> Result<(PurchaseReceipt, UnitOfWork)> {
        self.ensure_affordable(player_id, self.protection_price)?;

        let effective_on = next_day(today)?;
        let state = self.store.modifiers(self.game_id, player_id)?;

        if state.is_protected_on(effective_on) {
            return Err(GameError::AlreadyProtected {
                player: player_id,
                date: effective_on,
            });
        }

        if let Some(bought_on) = state.protection_bought_on {
            let available_on = bought_on + Duration::days(self.cooldown_days);
            if today < available_on {
                tracing::debug!(
                    "Player {} bought protection on {}, cooldown until {}",
                    player_id,
                    bought_on,
                    available_on
                );
                return Err(GameError::ProtectionCooldown { available_on });
            }
        }

        let (from, until) = extend_window(
            state.protection_from,
            state.protection_until,
            state.is_protected_on(today),
            effective_on,
        );

        tracing::info!(
            "Staging protection purchase by player {} in game {} for {}",
            player_id,
            self.game_id,
            effective_on
        );

        let mut work = UnitOfWork::new();
        work.push(self.debit(player_id, self.protection_price, today, "shop_protection".to_string()));
        work.push(Mutation::SetProtection {
            game_id: self.game_id,
            player_id,
            from,
            until: Some(until),
        });
        work.push(Mutation::RecordProtectionPurchase {
            game_id: self.game_id,
            player_id,
            on: today,
        });

        let receipt = PurchaseReceipt {
            price: self.protection_price,
            effective_on,
        };
        Ok((receipt, work))
    }

    /// Stage double odds bought by `buyer` for `target` (possibly
    /// themselves), effective the day after `today`. A buyer gets one
    /// purchase per effective day; several buyers may back the same target.
    pub fn buy_double_odds(
        &self,
        buyer: PlayerId,
        target: PlayerId,
        today: NaiveDate,
    ) -> Result<(PurchaseReceipt, UnitOfWork)> {
        self.ensure_affordable(buyer, self.double_odds_price)?;

        let effective_on = next_day(today)?;
        let date_key = DateKey::from(effective_on);

        if self.store.odds_purchase_exists(self.game_id, buyer, date_key)? {
            return Err(GameError::AlreadyPurchased { buyer, date_key });
        }

        let state = self.store.modifiers(self.game_id, target)?;

        tracing::info!(
            "Staging double odds bought by {} for {} in game {} on {}",
            buyer,
            target,
            self.game_id,
            effective_on
        );

        let mut work = UnitOfWork::new();
        work.push(self.debit(
            buyer,
            self.double_odds_price,
            today,
            format!("shop_double_odds_for_{}", target),
        ));

        if !state.has_double_odds_on(effective_on) {
            let (from, until) = extend_window(
                state.double_odds_from,
                state.double_odds_until,
                state.has_double_odds_on(today),
                effective_on,
            );
            work.push(Mutation::SetDoubleOdds {
                game_id: self.game_id,
                player_id: target,
                from,
                until: Some(until),
            });
        }

        work.push(Mutation::RecordOddsPurchase(OddsPurchase {
            game_id: self.game_id,
            buyer,
            target,
            date_key,
            price: self.double_odds_price,
        }));

        let receipt = PurchaseReceipt {
            price: self.double_odds_price,
            effective_on,
        };
        Ok((receipt, work))
    }

    fn ensure_affordable(&self, player_id: PlayerId, price: i64) -> Result<()> {
        let available = self.store.balance(self.game_id, player_id)?;
        if available < price {
            return Err(GameError::InsufficientFunds {
                needed: price,
                available,
            });
        }
        Ok(())
    }

    fn debit(&self, player_id: PlayerId, price: i64, today: NaiveDate, reason: String) -> Mutation {
        Mutation::Ledger(LedgerEntry {
            game_id: self.game_id,
            player_id,
            amount: -price,
            year: today.year(),
            reason,
        })
    }
}

fn next_day(today: NaiveDate) -> Result<NaiveDate> {
    today
        .succ_opt()
        .ok_or_else(|| GameError::Core(CoreError::internal(format!("No day after {}", today))))
}

/// Window covering `effective_on`. A window still running today is
/// stretched to it, anything else is replaced by that single day.
fn extend_window(
    from: Option<NaiveDate>,
    until: Option<NaiveDate>,
    active_today: bool,
    effective_on: NaiveDate,
) -> (Option<NaiveDate>, NaiveDate) {
    if active_today {
        (from, until.map_or(effective_on, |until| until.max(effective_on)))
    } else {
        (Some(effective_on), effective_on)
    }
}
