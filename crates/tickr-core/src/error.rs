use thiserror::Error;

/// Validation errors raised before any gateway call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("trading symbol cannot be empty")]
    EmptySymbol,
    #[error("trading symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("trading symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("trading symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid exchange '{value}', expected one of NSE, BSE, CRYPTO")]
    InvalidExchange { value: String },
    #[error("invalid reference type '{value}', expected MARKET or CUSTOM")]
    InvalidReferenceType { value: String },

    #[error("timestamp is not valid RFC3339: '{value}'")]
    InvalidTimestamp { value: String },

    #[error("identifier cannot be empty")]
    EmptyId,

    #[error("watchlist name cannot be empty")]
    EmptyWatchlistName,
    #[error("a watchlist named '{name}' already exists")]
    DuplicateWatchlistName { name: String },
    #[error("watchlist '{id}' does not exist")]
    UnknownWatchlist { id: String },
    #[error("instrument '{id}' is not in watchlist '{watchlist_id}'")]
    UnknownInstrument { id: String, watchlist_id: String },

    #[error("please enter a custom reference price")]
    CustomPriceRequired,
    #[error("custom reference price must be a finite number greater than zero: '{value}'")]
    InvalidCustomPrice { value: String },
    #[error("no instrument matches ticker '{symbol}'")]
    UnresolvedSymbol { symbol: String },

    #[error("email address is invalid")]
    InvalidEmail,
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("name cannot be empty")]
    EmptyName,

    #[error("search page size must be greater than zero")]
    InvalidPageSize,
}
