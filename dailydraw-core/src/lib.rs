//! dailydraw core - shared types, persistence and the fee rate source
//!
//! This crate holds everything the game engines need from the outside world:
//! the SQLite-backed [`Storage`] behind the [`GameStore`] boundary, the
//! [`UnitOfWork`] that engines stage their changes into, and the
//! [`RateCache`] that prices transfer fees.

pub mod config;
pub mod error;
pub mod rate;
pub mod storage;
pub mod types;

pub use config::GameConfig;
pub use error::{CoreError, RateError, Result};
pub use rate::{FixedRate, HttpRateProvider, RateCache, RateCacheEntry, RateProvider};
pub use storage::{GameStore, Mutation, Storage, UnitOfWork};
pub use types::{
    DateKey, GameId, LedgerEntry, OddsPurchase, Player, PlayerId, PlayerModifierState,
    SharedPool, TransferRecord,
};
