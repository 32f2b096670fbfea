use super::today;
use crate::config::Context;
use anyhow::bail;
use chrono::{Datelike, NaiveDate};
use comfy_table::{presets::UTF8_FULL, Table};
use dailydraw_core::{DateKey, GameStore, PlayerId};

pub fn show_rate(ctx: &Context) -> anyhow::Result<()> {
    let rate = ctx.rates.get_rate();

    println!("Fee rate: {}%", rate);
    match ctx.rates.cached() {
        Some(entry) => println!(
            "  Fetched at: {}",
            entry.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => println!("  Source unavailable, using fallback"),
    }

    Ok(())
}

pub fn show_fee(ctx: &Context, amount: i64) -> anyhow::Result<()> {
    let engine = ctx.transfers();
    let fee = engine.fee_for(amount)?;

    println!("Transferring {} coins costs a fee of {}", amount, fee);
    println!("  Recipient gets: {}", (amount - fee).max(0));
    if amount < engine.min_transfer() {
        println!("  Below the minimum transfer of {} coins", engine.min_transfer());
    }

    Ok(())
}

pub fn grant(ctx: &Context, player: i64, amount: i64) -> anyhow::Result<()> {
    let engine = ctx.transfers();
    let work = engine.grant(PlayerId(player), amount, today().year())?;
    ctx.storage.commit(work)?;

    println!(
        "Granted {} coins to player {}, balance now {}",
        amount,
        player,
        engine.balance(PlayerId(player))?
    );

    Ok(())
}

pub fn show_balances(ctx: &Context, players: &[i64]) -> anyhow::Result<()> {
    let engine = ctx.transfers();

    let balances = if players.is_empty() {
        ctx.storage.balances(ctx.game_id)?
    } else {
        players
            .iter()
            .map(|&id| -> anyhow::Result<(PlayerId, i64)> {
                Ok((PlayerId(id), engine.balance(PlayerId(id))?))
            })
            .collect::<anyhow::Result<Vec<_>>>()?
    };

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Player", "Balance"]);

    for (player_id, balance) in balances {
        table.add_row(vec![player_id.to_string(), balance.to_string()]);
    }

    let pool = ctx.storage.shared_pool(ctx.game_id)?;
    println!("{}", table);
    println!(
        "Shared pool: {} coins (updated {})",
        pool.balance,
        pool.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    Ok(())
}

pub fn transfer(
    ctx: &Context,
    from: i64,
    to: i64,
    amount: i64,
    date: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let date_key = DateKey::from(date.unwrap_or_else(today));
    let engine = ctx.transfers();
    let (sender, recipient) = (PlayerId(from), PlayerId(to));

    let check = engine.can_transfer(sender, date_key)?;
    if !check.allowed {
        bail!(
            "Player {} cannot transfer again today ({})",
            sender,
            check.reason.as_str()
        );
    }

    if !engine.can_afford(sender, amount)? {
        bail!(
            "Insufficient balance: need {} coins, have {} coins",
            amount,
            engine.balance(sender)?
        );
    }

    let (receipt, work) = engine.execute_transfer(sender, recipient, amount, date_key)?;
    ctx.storage.commit(work)?;

    println!("Transfer complete");
    println!("  Sent: {} coins", receipt.amount_sent);
    println!("  Received by {}: {} coins", recipient, receipt.amount_received);
    println!("  Fee to shared pool: {} coins", receipt.fee);
    println!("  Shared pool now holds {} coins", engine.pool_balance()?);

    Ok(())
}

pub fn list_transfers(ctx: &Context, date: Option<NaiveDate>) -> anyhow::Result<()> {
    let date_key = DateKey::from(date.unwrap_or_else(today));
    let records = ctx.storage.transfers_on(ctx.game_id, date_key)?;

    if records.is_empty() {
        println!("No transfers on {}", date_key);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["From", "To", "Amount", "Fee"]);

    for record in records {
        table.add_row(vec![
            record.sender.to_string(),
            record.recipient.to_string(),
            record.amount.to_string(),
            record.fee.to_string(),
        ]);
    }

    println!("{}", table);
    Ok(())
}
