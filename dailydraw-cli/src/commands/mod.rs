pub mod economy;
pub mod round;
pub mod shop;

pub use economy::{grant, list_transfers, show_balances, show_fee, show_rate, transfer};
pub use round::{double_odds, draw, protect, status};
pub use shop::{buy_double_odds, buy_protection};

use chrono::{Local, NaiveDate};

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
