use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::metrics::PriceChange;
use crate::{InstrumentId, TradingSymbol, UserId, UtcDateTime, ValidationError, WatchlistId};

/// Market an instrument trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Exchange {
    Nse,
    Bse,
    Crypto,
}

impl Exchange {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nse => "NSE",
            Self::Bse => "BSE",
            Self::Crypto => "CRYPTO",
        }
    }

    /// Currency prefix used when rendering prices listed on this market.
    pub const fn currency_symbol(self) -> &'static str {
        match self {
            Self::Crypto => "$",
            Self::Nse | Self::Bse => "₹",
        }
    }
}

impl Display for Exchange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "NSE" => Ok(Self::Nse),
            "BSE" => Ok(Self::Bse),
            "CRYPTO" => Ok(Self::Crypto),
            _ => Err(ValidationError::InvalidExchange {
                value: value.to_owned(),
            }),
        }
    }
}

/// How an instrument's baseline price was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceType {
    Market,
    Custom,
}

impl ReferenceType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Market => "MARKET",
            Self::Custom => "CUSTOM",
        }
    }
}

impl Display for ReferenceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "MARKET" => Ok(Self::Market),
            "CUSTOM" => Ok(Self::Custom),
            _ => Err(ValidationError::InvalidReferenceType {
                value: value.to_owned(),
            }),
        }
    }
}

/// Registered user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Instrument tracked inside a watchlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub id: InstrumentId,
    pub trading_symbol: TradingSymbol,
    pub name: String,
    pub exchange: Exchange,
    pub reference_type: ReferenceType,
    pub reference_price: f64,
    #[serde(alias = "currentPrice")]
    pub last_price: f64,
    pub added_at: UtcDateTime,
}

impl Instrument {
    /// Change of the last price against the reference price.
    pub fn change(&self) -> PriceChange {
        PriceChange::between(self.reference_price, self.last_price)
    }
}

/// Named, user-owned ordered collection of instruments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Watchlist {
    pub id: WatchlistId,
    pub name: String,
    #[serde(default)]
    pub instruments: Vec<Instrument>,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}

impl Watchlist {
    pub fn instrument(&self, id: &InstrumentId) -> Option<&Instrument> {
        self.instruments.iter().find(|instrument| &instrument.id == id)
    }
}

/// Lightweight search hit returned by instrument search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentSummary {
    pub trading_symbol: TradingSymbol,
    pub name: String,
    pub exchange: Exchange,
    #[serde(alias = "currentPrice")]
    pub last_price: f64,
}

/// One bounded page of search hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub content: Vec<InstrumentSummary>,
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub size: usize,
    #[serde(default)]
    pub total_elements: usize,
}

/// Read-only benchmark snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketIndex {
    pub instrument_name: String,
    #[serde(default)]
    pub exchange: String,
    pub last_price: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl MarketIndex {
    /// Change of the last price against the previous close.
    pub fn change(&self) -> PriceChange {
        PriceChange::between(self.close, self.last_price)
    }
}

/// Whether the market is currently open for trading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStatus {
    pub open: bool,
}
