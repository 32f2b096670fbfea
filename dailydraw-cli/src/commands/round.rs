use super::today;
use crate::config::Context;
use anyhow::{anyhow, Context as _};
use chrono::NaiveDate;
use dailydraw_core::{GameStore, Player, PlayerId};
use dailydraw_game::{protection_enabled_on, RandomDraw};

/// `42` or `42:alice`
fn parse_player(arg: &str) -> anyhow::Result<Player> {
    let (id, name) = match arg.split_once(':') {
        Some((id, name)) => (id, name.to_string()),
        None => (arg, arg.to_string()),
    };

    let id: i64 = id
        .trim()
        .parse()
        .with_context(|| format!("Invalid player id in '{}'", arg))?;

    Ok(Player::new(PlayerId(id), name))
}

pub fn protect(ctx: &Context, player: i64, until: NaiveDate) -> anyhow::Result<()> {
    let work = ctx.selection().grant_protection(PlayerId(player), until);
    ctx.storage.commit(work)?;

    println!("Player {} is protected until {}", player, until);
    Ok(())
}

pub fn double_odds(ctx: &Context, player: i64, until: NaiveDate) -> anyhow::Result<()> {
    let work = ctx.selection().grant_double_odds(PlayerId(player), until);
    ctx.storage.commit(work)?;

    println!("Player {} has double odds until {}", player, until);
    Ok(())
}

pub fn draw(ctx: &Context, players: &[String], date: Option<NaiveDate>) -> anyhow::Result<()> {
    let players = players
        .iter()
        .map(|arg| parse_player(arg))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let date = date.unwrap_or_else(today);
    let protection_enabled = protection_enabled_on(date);
    if !protection_enabled {
        println!("Protection does not apply on the last day of the year");
    }

    let engine = ctx.selection();
    let outcome = engine.select_winner(
        &players,
        date,
        protection_enabled,
        &mut RandomDraw::from_entropy(),
    )?;

    if outcome.all_protected {
        println!("Every player is protected today, no winner");
        return Ok(());
    }

    let winner = outcome
        .winner
        .as_ref()
        .ok_or_else(|| anyhow!("Draw finished without a winner"))?;

    let reward = ctx.config.coins_per_win;
    let work = engine.settle_round(&outcome, date, reward)?;
    ctx.storage.commit(work)?;

    if let Some(protected) = &outcome.protected_player {
        println!("{} was drawn but is protected, drawing again", protected.name);
        println!("  {} earns {} coins for the save", protected.name, reward);
    }

    println!("Winner of {}: {} (+{} coins)", date, winner, reward);
    if outcome.had_double_odds {
        println!("  (won with double odds)");
    }

    Ok(())
}

pub fn status(ctx: &Context, player: i64, date: Option<NaiveDate>) -> anyhow::Result<()> {
    let date = date.unwrap_or_else(today);
    let engine = ctx.selection();
    let player_id = PlayerId(player);

    let protected = engine.is_protected(player_id, date)?;
    let doubled = engine.is_double_odds_active(player_id, date)?;

    println!("Player {} on {}", player, date);
    println!("  Protected: {}", if protected { "yes" } else { "no" });
    println!("  Double odds: {}", if doubled { "yes" } else { "no" });
    if protected && !protection_enabled_on(date) {
        println!("  (protection does not apply on the last day of the year)");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_player() {
        assert_eq!(
            parse_player("42:alice").unwrap(),
            Player::new(PlayerId(42), "alice")
        );
        assert_eq!(parse_player("7").unwrap(), Player::new(PlayerId(7), "7"));
        assert!(parse_player("bob").is_err());
    }
}
