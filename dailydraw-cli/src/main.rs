mod commands;
mod config;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dailydraw_core::GameId;
use dailydraw_game::GameError;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dailydraw")]
#[command(about = "Daily prize draw with protection, double odds and fee-bearing transfers")]
#[command(version)]
struct Cli {
    /// Data directory for the game database and config.json
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Game (chat) to operate on
    #[arg(short, long, global = true, default_value_t = 1)]
    game: i64,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current fee percentage
    Rate,
    /// Show the fee for an amount
    Fee {
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
    /// Credit coins to a player
    Grant {
        player: i64,
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
    /// Show balances and the shared pool
    Balance {
        /// Players to show (all with activity when omitted)
        players: Vec<i64>,
    },
    /// Transfer coins to another player, once per day
    Transfer {
        from: i64,
        to: i64,
        #[arg(allow_negative_numbers = true)]
        amount: i64,
        /// Day of the transfer (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List transfers made on a day
    Transfers {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Protect a player from winning until a date (inclusive)
    Protect {
        player: i64,
        until: NaiveDate,
    },
    /// Give a player double odds until a date (inclusive)
    DoubleOdds {
        player: i64,
        until: NaiveDate,
    },
    /// Buy protection for tomorrow
    BuyProtection {
        player: i64,
    },
    /// Buy double odds for tomorrow, for yourself or another player
    BuyDoubleOdds {
        buyer: i64,
        /// Player who gets the double odds (defaults to the buyer)
        target: Option<i64>,
    },
    /// Show a player's active modifiers
    Status {
        player: i64,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Draw the winner of a round
    Draw {
        /// Eligible players as `id` or `id:name`
        #[arg(required = true)]
        players: Vec<String>,
        /// Round date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "dailydraw={},dailydraw_core={},dailydraw_game={}",
            log_level, log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<GameError>() {
            Some(GameError::BelowMinimum { amount, minimum }) => {
                eprintln!("Error: {} coins is too little to transfer", amount);
                eprintln!("Minimum transfer: {} coins", minimum);
            }
            Some(GameError::InsufficientFunds { needed, available }) => {
                eprintln!("Error: Not enough coins");
                eprintln!("Need {} coins, have {} coins", needed, available);
            }
            Some(GameError::ProtectionCooldown { available_on }) => {
                eprintln!("Error: Protection is on cooldown");
                eprintln!("Available again on {}", available_on);
            }
            Some(err) if err.is_invalid_argument() => {
                eprintln!("Invalid input: {}", err);
            }
            _ => {
                eprintln!("Error: {:#}", e);
            }
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let data_dir = cli.data_dir.unwrap_or_else(config::default_data_dir);
    let ctx = config::Context::open(&data_dir, GameId(cli.game))?;

    match cli.command {
        Commands::Rate => commands::show_rate(&ctx),
        Commands::Fee { amount } => commands::show_fee(&ctx, amount),
        Commands::Grant { player, amount } => commands::grant(&ctx, player, amount),
        Commands::Balance { players } => commands::show_balances(&ctx, &players),
        Commands::Transfer {
            from,
            to,
            amount,
            date,
        } => commands::transfer(&ctx, from, to, amount, date),
        Commands::Transfers { date } => commands::list_transfers(&ctx, date),
        Commands::Protect { player, until } => commands::protect(&ctx, player, until),
        Commands::DoubleOdds { player, until } => commands::double_odds(&ctx, player, until),
        Commands::BuyProtection { player } => commands::buy_protection(&ctx, player),
        Commands::BuyDoubleOdds { buyer, target } => commands::buy_double_odds(&ctx, buyer, target),
        Commands::Status { player, date } => commands::status(&ctx, player, date),
        Commands::Draw { players, date } => commands::draw(&ctx, &players, date),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_amounts_reach_the_engine() {
        let cli = Cli::try_parse_from(["dailydraw", "fee", "-5"]).unwrap();
        assert!(matches!(cli.command, Commands::Fee { amount: -5 }));

        let cli = Cli::try_parse_from(["dailydraw", "transfer", "1", "2", "-10"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Transfer {
                from: 1,
                to: 2,
                amount: -10,
                date: None
            }
        ));

        let cli = Cli::try_parse_from(["dailydraw", "grant", "3", "-1"]).unwrap();
        assert!(matches!(cli.command, Commands::Grant { player: 3, amount: -1 }));
    }

    #[test]
    fn test_double_odds_target_is_optional() {
        let cli = Cli::try_parse_from(["dailydraw", "buy-double-odds", "4"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::BuyDoubleOdds {
                buyer: 4,
                target: None
            }
        ));
    }
}
