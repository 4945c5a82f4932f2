//! # Domain Models
//!
//! Canonical types for watchlists, instruments, users, and market snapshots.
//!
//! Wire JSON uses camelCase field names (`tradingSymbol`, `referencePrice`)
//! and upper-case enum values (`NSE`, `CUSTOM`).
//!
//! | Type | Description |
//! |------|-------------|
//! | [`User`] | Registered user profile |
//! | [`Watchlist`] | Named collection of instruments |
//! | [`Instrument`] | Tracked symbol with reference and last price |
//! | [`InstrumentSummary`] | Search hit |
//! | [`MarketIndex`] | Benchmark snapshot |
//! | [`ReferencePrice`] | Market or custom baseline for a new instrument |
//! | [`TradingSymbol`] | Validated ticker |
//! | [`UtcDateTime`] | UTC timestamp |

mod ids;
mod models;
mod reference;
mod symbol;
mod timestamp;

pub use ids::{InstrumentId, UserId, WatchlistId};
pub use models::{
    Exchange, Instrument, InstrumentSummary, MarketIndex, MarketStatus, ReferenceType,
    SearchPage, User, Watchlist,
};
pub use reference::{CustomPrice, NewInstrument, ReferencePrice};
pub use symbol::TradingSymbol;
pub use timestamp::UtcDateTime;
