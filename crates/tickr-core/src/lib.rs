//! Core contracts for tickr.
//!
//! This crate contains:
//! - Canonical domain models and validation
//! - Derived price-change metrics
//! - The backend gateway contract with REST and in-memory implementations
//! - Session, watchlist, search, and market-status services
//! - Environment configuration

pub mod config;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod http_client;
pub mod market;
pub mod metrics;
pub mod search;
pub mod session;
pub mod watchlists;

pub use config::{ConfigError, TickrConfig};
pub use domain::{
    CustomPrice, Exchange, Instrument, InstrumentId, InstrumentSummary, MarketIndex,
    MarketStatus, NewInstrument, ReferencePrice, ReferenceType, SearchPage, TradingSymbol, User,
    UserId, UtcDateTime, Watchlist, WatchlistId,
};
pub use envelope::{ApiEnvelope, ApiErrorBody};
pub use error::ValidationError;
pub use gateway::{
    AuthGrant, Credentials, Gateway, GatewayError, GatewayErrorKind, GatewayFuture,
    MemoryGateway, Registration, RestGateway, SearchQuery, DEFAULT_API_URL,
};
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use market::{MarketStatusHandle, MarketStatusPoller, MarketStatusState};
pub use metrics::{format_price, InstrumentRow, PriceChange};
pub use search::{InstrumentSearch, SearchConfig};
pub use session::{
    FileTokenStore, MemoryTokenStore, RestoreOutcome, Session, SessionError, StoredSession,
    TokenStore,
};
pub use watchlists::{InstrumentSpec, WatchlistError, WatchlistManager};
