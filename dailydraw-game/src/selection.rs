use crate::draw::Draw;
use crate::{GameError, Result};
use chrono::{Datelike, NaiveDate};
use dailydraw_core::{GameId, GameStore, LedgerEntry, Mutation, Player, PlayerId, UnitOfWork};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Result of one winner selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionOutcome {
    pub winner: Option<Player>,
    /// The first draw hit a protected player and a reselection happened
    pub had_protection_triggered: bool,
    pub had_double_odds: bool,
    pub all_protected: bool,
    pub protected_player: Option<Player>,
}

/// Weighted draw pool and protection partition for one round
#[derive(Debug, Clone, Default)]
pub struct SelectionPool {
    pub entries: Vec<Player>,
    pub protected: Vec<Player>,
    pub unprotected: Vec<Player>,
    pub double_odds: HashSet<PlayerId>,
}

impl SelectionPool {
    pub fn entries_for(&self, player_id: PlayerId) -> usize {
        self.entries.iter().filter(|p| p.id == player_id).count()
    }

    pub fn is_protected(&self, player_id: PlayerId) -> bool {
        self.protected.iter().any(|p| p.id == player_id)
    }
}

/// Protection does not apply on the last day of the calendar year
pub fn protection_enabled_on(date: NaiveDate) -> bool {
    !(date.month() == 12 && date.day() == 31)
}

pub struct SelectionEngine<'a, S: GameStore + ?Sized> {
    store: &'a S,
    game_id: GameId,
}

impl<'a, S: GameStore + ?Sized> SelectionEngine<'a, S> {
    pub fn new(store: &'a S, game_id: GameId) -> Self {
        Self { store, game_id }
    }

    /// Build the draw pool: double-odds players enter twice. With protection
    /// disabled every player lands in the unprotected set.
    pub fn pool(
        &self,
        players: &[Player],
        reference_date: NaiveDate,
        protection_enabled: bool,
    ) -> Result<SelectionPool> {
        let mut pool = SelectionPool::default();
        let mut seen = HashSet::new();

        for player in players {
            if !seen.insert(player.id) {
                continue;
            }

            let state = self.store.modifiers(self.game_id, player.id)?;

            if state.has_double_odds_on(reference_date) {
                pool.entries.push(player.clone());
                pool.entries.push(player.clone());
                pool.double_odds.insert(player.id);
                tracing::debug!("Player {} has double odds on {}", player, reference_date);
            } else {
                pool.entries.push(player.clone());
            }

            if protection_enabled && state.is_protected_on(reference_date) {
                tracing::debug!("Player {} is protected on {}", player, reference_date);
                pool.protected.push(player.clone());
            } else {
                pool.unprotected.push(player.clone());
            }
        }

        tracing::debug!(
            "Selection pool for game {}: {} entries, {} unprotected, {} protected, {} with double odds",
            self.game_id,
            pool.entries.len(),
            pool.unprotected.len(),
            pool.protected.len(),
            pool.double_odds.len()
        );

        Ok(pool)
    }

    /// Pick the round's winner, redrawing once from the unprotected players
    /// when the first draw lands on a protected one
    pub fn select_winner<D: Draw + ?Sized>(
        &self,
        players: &[Player],
        reference_date: NaiveDate,
        protection_enabled: bool,
        draw: &mut D,
    ) -> Result<SelectionOutcome> {
        if players.is_empty() {
            return Err(GameError::NoEligiblePlayers);
        }

        let pool = self.pool(players, reference_date, protection_enabled)?;

        if protection_enabled && pool.unprotected.is_empty() {
            tracing::warn!("All players are protected in game {}", self.game_id);
            return Ok(SelectionOutcome {
                all_protected: true,
                ..SelectionOutcome::default()
            });
        }

        let drawn = pool.entries[draw.pick(pool.entries.len())].clone();
        tracing::info!("Drew {} in game {}", drawn, self.game_id);

        if !protection_enabled || !pool.is_protected(drawn.id) {
            return Ok(SelectionOutcome {
                had_double_odds: pool.double_odds.contains(&drawn.id),
                winner: Some(drawn),
                ..SelectionOutcome::default()
            });
        }

        tracing::info!("Drawn player {} is protected, reselecting", drawn);
        let winner = pool.unprotected[draw.pick(pool.unprotected.len())].clone();
        tracing::info!("Reselected winner {} in game {}", winner, self.game_id);

        Ok(SelectionOutcome {
            had_double_odds: pool.double_odds.contains(&winner.id),
            winner: Some(winner),
            had_protection_triggered: true,
            all_protected: false,
            protected_player: Some(drawn),
        })
    }

    pub fn is_double_odds_active(&self, player_id: PlayerId, reference_date: NaiveDate) -> Result<bool> {
        let state = self.store.modifiers(self.game_id, player_id)?;
        Ok(state.has_double_odds_on(reference_date))
    }

    pub fn is_protected(&self, player_id: PlayerId, reference_date: NaiveDate) -> Result<bool> {
        let state = self.store.modifiers(self.game_id, player_id)?;
        Ok(state.is_protected_on(reference_date))
    }

    /// Stage removal of a player's double odds. Stages nothing when the
    /// modifier is not active on `reference_date`.
    pub fn clear_double_odds(&self, player_id: PlayerId, reference_date: NaiveDate) -> Result<UnitOfWork> {
        let mut work = UnitOfWork::new();

        if self.is_double_odds_active(player_id, reference_date)? {
            tracing::info!(
                "Clearing double odds of player {} in game {}",
                player_id,
                self.game_id
            );
            work.push(Mutation::SetDoubleOdds {
                game_id: self.game_id,
                player_id,
                from: None,
                until: None,
            });
        }

        Ok(work)
    }

    /// Stage the round's payouts: `reward` to the winner and, when the
    /// first draw hit a protected player, the same to that player. The
    /// winner's double odds are spent.
    pub fn settle_round(
        &self,
        outcome: &SelectionOutcome,
        reference_date: NaiveDate,
        reward: i64,
    ) -> Result<UnitOfWork> {
        let mut work = UnitOfWork::new();

        let winner = match &outcome.winner {
            Some(winner) => winner,
            None => return Ok(work),
        };

        if reward > 0 {
            work.push(self.credit(winner.id, reward, reference_date, "round_win"));

            if let Some(protected) = &outcome.protected_player {
                tracing::info!(
                    "Protection saved player {} in game {}, crediting {}",
                    protected,
                    self.game_id,
                    reward
                );
                work.push(self.credit(protected.id, reward, reference_date, "protection_save"));
            }
        }

        work.append(self.clear_double_odds(winner.id, reference_date)?);

        tracing::info!(
            "Settled round in game {} for winner {} ({} mutations)",
            self.game_id,
            winner,
            work.len()
        );
        Ok(work)
    }

    fn credit(&self, player_id: PlayerId, amount: i64, reference_date: NaiveDate, reason: &str) -> Mutation {
        Mutation::Ledger(LedgerEntry {
            game_id: self.game_id,
            player_id,
            amount,
            year: reference_date.year(),
            reason: reason.to_string(),
        })
    }

    pub fn grant_protection(&self, player_id: PlayerId, until: NaiveDate) -> UnitOfWork {
        vec![Mutation::SetProtection {
            game_id: self.game_id,
            player_id,
            from: None,
            until: Some(until),
        }]
        .into()
    }

    pub fn grant_double_odds(&self, player_id: PlayerId, until: NaiveDate) -> UnitOfWork {
        vec![Mutation::SetDoubleOdds {
            game_id: self.game_id,
            player_id,
            from: None,
            until: Some(until),
        }]
        .into()
    }
}
