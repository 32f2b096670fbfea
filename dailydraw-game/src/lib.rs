//! Rules of the daily prize draw
//!
//! [`SelectionEngine`] picks a round's winner honoring protection and double
//! odds and settles its payouts; [`ShopEngine`] sells those modifiers;
//! [`TransferEngine`] moves value between players with a fee priced by the
//! [`RateCache`](dailydraw_core::RateCache). The engines only read from the
//! store directly and hand their changes back as a
//! [`UnitOfWork`](dailydraw_core::UnitOfWork) for the caller to commit.

pub mod draw;
pub mod error;
pub mod selection;
pub mod shop;
pub mod transfer;

pub use draw::{Draw, RandomDraw, ScriptedDraw};
pub use error::{GameError, Result};
pub use selection::{protection_enabled_on, SelectionEngine, SelectionOutcome, SelectionPool};
pub use shop::{PurchaseReceipt, ShopEngine};
pub use transfer::{TransferCheck, TransferEngine, TransferReceipt, TransferStatus};
