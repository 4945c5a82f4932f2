//! Remote data gateway contract.
//!
//! Every watchlist, session, and market operation reaches the backend through
//! [`Gateway`]. Two implementations are provided:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`RestGateway`] | REST client over an injectable [`HttpClient`](crate::HttpClient) |
//! | [`MemoryGateway`] | In-process backend for offline mode and tests |
//!
//! Authenticated calls on the REST gateway read the bearer token from a
//! [`TokenStore`](crate::TokenStore) on every request.

mod memory;
mod rest;

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{
    Instrument, InstrumentId, MarketIndex, MarketStatus, NewInstrument, SearchPage, User,
    UtcDateTime, ValidationError, Watchlist, WatchlistId,
};

pub use memory::MemoryGateway;
pub use rest::{RestGateway, DEFAULT_API_URL};

/// Boxed future returned by gateway operations.
pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, GatewayError>> + Send + 'a>>;

/// Gateway error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// Missing, expired, or rejected credentials.
    Unauthorized,
    NotFound,
    /// The backend refused the request (4xx other than 401/403/404).
    Rejected,
    /// Transport failure or 5xx.
    Unavailable,
    /// The response body did not match the expected shape.
    Decode,
}

/// Structured error surfaced to the caller as a transient notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    kind: GatewayErrorKind,
    message: String,
    status: Option<u16>,
}

impl GatewayError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::with_kind(GatewayErrorKind::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_kind(GatewayErrorKind::NotFound, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::with_kind(GatewayErrorKind::Rejected, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::with_kind(GatewayErrorKind::Unavailable, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::with_kind(GatewayErrorKind::Decode, message)
    }

    /// Classifies a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let kind = match status {
            401 | 403 => GatewayErrorKind::Unauthorized,
            404 => GatewayErrorKind::NotFound,
            400..=499 => GatewayErrorKind::Rejected,
            _ => GatewayErrorKind::Unavailable,
        };
        Self {
            kind,
            message: message.into(),
            status: Some(status),
        }
    }

    fn with_kind(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub const fn kind(&self) -> GatewayErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            GatewayErrorKind::Unauthorized => "gateway.unauthorized",
            GatewayErrorKind::NotFound => "gateway.not_found",
            GatewayErrorKind::Rejected => "gateway.rejected",
            GatewayErrorKind::Unavailable => "gateway.unavailable",
            GatewayErrorKind::Decode => "gateway.decode",
        }
    }
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for GatewayError {}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Successful authentication response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthGrant {
    pub token: String,
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<UtcDateTime>,
}

/// Parameters of `GET /instruments/search`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub page: usize,
    pub size: usize,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, page: usize, size: usize) -> Result<Self, ValidationError> {
        let query = query.into().trim().to_ascii_uppercase();
        if query.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }
        if size == 0 {
            return Err(ValidationError::InvalidPageSize);
        }
        Ok(Self { query, page, size })
    }
}

/// Remote backend contract.
pub trait Gateway: Send + Sync {
    fn login<'a>(&'a self, credentials: &'a Credentials) -> GatewayFuture<'a, AuthGrant>;

    fn register<'a>(&'a self, registration: &'a Registration) -> GatewayFuture<'a, AuthGrant>;

    fn current_user(&self) -> GatewayFuture<'_, User>;

    fn list_watchlists(&self) -> GatewayFuture<'_, Vec<Watchlist>>;

    fn create_watchlist<'a>(&'a self, name: &'a str) -> GatewayFuture<'a, Watchlist>;

    fn rename_watchlist<'a>(
        &'a self,
        id: &'a WatchlistId,
        name: &'a str,
    ) -> GatewayFuture<'a, Watchlist>;

    fn delete_watchlist<'a>(&'a self, id: &'a WatchlistId) -> GatewayFuture<'a, ()>;

    fn list_instruments<'a>(&'a self, watchlist_id: &'a WatchlistId)
        -> GatewayFuture<'a, Vec<Instrument>>;

    fn add_instrument<'a>(
        &'a self,
        watchlist_id: &'a WatchlistId,
        instrument: &'a NewInstrument,
    ) -> GatewayFuture<'a, Instrument>;

    fn remove_instrument<'a>(
        &'a self,
        watchlist_id: &'a WatchlistId,
        instrument_id: &'a InstrumentId,
    ) -> GatewayFuture<'a, ()>;

    fn search_instruments<'a>(&'a self, query: &'a SearchQuery) -> GatewayFuture<'a, SearchPage>;

    fn market_indices(&self) -> GatewayFuture<'_, Vec<MarketIndex>>;

    fn market_status(&self) -> GatewayFuture<'_, MarketStatus>;
}
