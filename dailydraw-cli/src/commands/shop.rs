use super::today;
use crate::config::Context;
use dailydraw_core::{GameStore, PlayerId};

pub fn buy_protection(ctx: &Context, player: i64) -> anyhow::Result<()> {
    let (receipt, work) = ctx.shop().buy_protection(PlayerId(player), today())?;
    ctx.storage.commit(work)?;

    println!("Player {} bought protection for {} coins", player, receipt.price);
    println!("  Protected on: {}", receipt.effective_on);

    Ok(())
}

pub fn buy_double_odds(ctx: &Context, buyer: i64, target: Option<i64>) -> anyhow::Result<()> {
    let target = target.unwrap_or(buyer);
    let (receipt, work) = ctx
        .shop()
        .buy_double_odds(PlayerId(buyer), PlayerId(target), today())?;
    ctx.storage.commit(work)?;

    println!(
        "Player {} bought double odds for player {} ({} coins)",
        buyer, target, receipt.price
    );
    println!("  Active on: {}", receipt.effective_on);

    Ok(())
}
