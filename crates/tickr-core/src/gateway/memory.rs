use std::collections::BTreeMap;
use std::future::ready;
use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use super::{
    AuthGrant, Credentials, Gateway, GatewayError, GatewayFuture, Registration, SearchQuery,
};
use crate::{
    Exchange, Instrument, InstrumentId, InstrumentSummary, MarketIndex, MarketStatus,
    NewInstrument, SearchPage, TradingSymbol, User, UserId, UtcDateTime, Watchlist, WatchlistId,
};

#[derive(Debug)]
struct MemoryState {
    user: Option<User>,
    watchlists: Vec<Watchlist>,
    catalog: Vec<InstrumentSummary>,
    indices: Vec<MarketIndex>,
    status: MarketStatus,
    outage: Option<String>,
    calls: BTreeMap<&'static str, usize>,
}

/// In-process backend with the same observable contract as the REST API.
///
/// Any well-formed credentials are accepted, mirroring the demo login flow.
#[derive(Debug)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::with_catalog(default_catalog())
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: Vec<InstrumentSummary>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                user: None,
                watchlists: Vec::new(),
                catalog,
                indices: default_indices(),
                status: MarketStatus { open: true },
                outage: None,
                calls: BTreeMap::new(),
            }),
        }
    }

    /// Treats `user` as signed in, e.g. after restoring a persisted session.
    pub fn sign_in(&self, user: User) {
        self.lock().user = Some(user);
    }

    /// Makes every call fail as unavailable until cleared with `None`.
    pub fn set_outage(&self, message: Option<&str>) {
        self.lock().outage = message.map(str::to_owned);
    }

    pub fn set_market_status(&self, status: MarketStatus) {
        self.lock().status = status;
    }

    /// Moves the live price of `symbol` in the catalog and in every watchlist.
    pub fn set_last_price(&self, symbol: &TradingSymbol, price: f64) {
        let mut state = self.lock();
        for hit in state
            .catalog
            .iter_mut()
            .filter(|hit| &hit.trading_symbol == symbol)
        {
            hit.last_price = price;
        }
        for instrument in state
            .watchlists
            .iter_mut()
            .flat_map(|watchlist| watchlist.instruments.iter_mut())
            .filter(|instrument| &instrument.trading_symbol == symbol)
        {
            instrument.last_price = price;
        }
    }

    /// Number of times `operation` (e.g. `"search_instruments"`) was invoked.
    pub fn calls(&self, operation: &str) -> usize {
        self.lock().calls.get(operation).copied().unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn call<T>(
        &self,
        operation: &'static str,
        handler: impl FnOnce(&mut MemoryState) -> Result<T, GatewayError>,
    ) -> Result<T, GatewayError> {
        let mut state = self.lock();
        *state.calls.entry(operation).or_insert(0) += 1;
        if let Some(message) = &state.outage {
            return Err(GatewayError::unavailable(message.clone()));
        }
        handler(&mut state)
    }
}

impl MemoryState {
    fn require_user(&self) -> Result<&User, GatewayError> {
        self.user
            .as_ref()
            .ok_or_else(|| GatewayError::unauthorized("not logged in"))
    }

    fn watchlist_mut(&mut self, id: &WatchlistId) -> Result<&mut Watchlist, GatewayError> {
        self.watchlists
            .iter_mut()
            .find(|watchlist| &watchlist.id == id)
            .ok_or_else(|| GatewayError::not_found(format!("watchlist '{id}' not found")))
    }

    fn ensure_unique_name(&self, name: &str, except: Option<&WatchlistId>) -> Result<(), GatewayError> {
        let taken = self.watchlists.iter().any(|watchlist| {
            Some(&watchlist.id) != except && watchlist.name.eq_ignore_ascii_case(name)
        });
        if taken {
            return Err(GatewayError::from_status(
                409,
                format!("watchlist '{name}' already exists"),
            ));
        }
        Ok(())
    }

    fn grant(&mut self, name: String, email: &str) -> AuthGrant {
        let user = User {
            id: UserId::parse("1").unwrap_or_else(|_| UserId::generate()),
            name,
            email: email.to_owned(),
            avatar: None,
        };
        self.user = Some(user.clone());
        AuthGrant {
            token: format!("offline-{}", Uuid::new_v4().simple()),
            user,
            expires_at: None,
        }
    }
}

impl Gateway for MemoryGateway {
    fn login<'a>(&'a self, credentials: &'a Credentials) -> GatewayFuture<'a, AuthGrant> {
        let result = self.call("login", |state| {
            let name = credentials
                .email
                .split('@')
                .next()
                .unwrap_or_default()
                .to_owned();
            Ok(state.grant(name, &credentials.email))
        });
        Box::pin(ready(result))
    }

    fn register<'a>(&'a self, registration: &'a Registration) -> GatewayFuture<'a, AuthGrant> {
        let result = self.call("register", |state| {
            Ok(state.grant(registration.name.clone(), &registration.email))
        });
        Box::pin(ready(result))
    }

    fn current_user(&self) -> GatewayFuture<'_, User> {
        let result = self.call("current_user", |state| state.require_user().cloned());
        Box::pin(ready(result))
    }

    fn list_watchlists(&self) -> GatewayFuture<'_, Vec<Watchlist>> {
        let result = self.call("list_watchlists", |state| {
            state.require_user()?;
            Ok(state.watchlists.clone())
        });
        Box::pin(ready(result))
    }

    fn create_watchlist<'a>(&'a self, name: &'a str) -> GatewayFuture<'a, Watchlist> {
        let result = self.call("create_watchlist", |state| {
            state.require_user()?;
            let name = name.trim();
            if name.is_empty() {
                return Err(GatewayError::from_status(400, "watchlist name is required"));
            }
            state.ensure_unique_name(name, None)?;

            let now = UtcDateTime::now();
            let watchlist = Watchlist {
                id: WatchlistId::generate(),
                name: name.to_owned(),
                instruments: Vec::new(),
                created_at: now,
                updated_at: now,
            };
            state.watchlists.push(watchlist.clone());
            Ok(watchlist)
        });
        Box::pin(ready(result))
    }

    fn rename_watchlist<'a>(
        &'a self,
        id: &'a WatchlistId,
        name: &'a str,
    ) -> GatewayFuture<'a, Watchlist> {
        let result = self.call("rename_watchlist", |state| {
            state.require_user()?;
            let name = name.trim();
            if name.is_empty() {
                return Err(GatewayError::from_status(400, "watchlist name is required"));
            }
            state.ensure_unique_name(name, Some(id))?;

            let watchlist = state.watchlist_mut(id)?;
            watchlist.name = name.to_owned();
            watchlist.updated_at = UtcDateTime::now();
            Ok(watchlist.clone())
        });
        Box::pin(ready(result))
    }

    fn delete_watchlist<'a>(&'a self, id: &'a WatchlistId) -> GatewayFuture<'a, ()> {
        let result = self.call("delete_watchlist", |state| {
            state.require_user()?;
            let before = state.watchlists.len();
            state.watchlists.retain(|watchlist| &watchlist.id != id);
            if state.watchlists.len() == before {
                return Err(GatewayError::not_found(format!("watchlist '{id}' not found")));
            }
            Ok(())
        });
        Box::pin(ready(result))
    }

    fn list_instruments<'a>(
        &'a self,
        watchlist_id: &'a WatchlistId,
    ) -> GatewayFuture<'a, Vec<Instrument>> {
        let result = self.call("list_instruments", |state| {
            state.require_user()?;
            Ok(state.watchlist_mut(watchlist_id)?.instruments.clone())
        });
        Box::pin(ready(result))
    }

    fn add_instrument<'a>(
        &'a self,
        watchlist_id: &'a WatchlistId,
        instrument: &'a NewInstrument,
    ) -> GatewayFuture<'a, Instrument> {
        let result = self.call("add_instrument", |state| {
            state.require_user()?;
            if !instrument.reference_price.is_finite() || instrument.reference_price <= 0.0 {
                return Err(GatewayError::from_status(
                    400,
                    "reference price must be greater than zero",
                ));
            }

            let watchlist = state.watchlist_mut(watchlist_id)?;
            let now = UtcDateTime::now();
            let added = Instrument {
                id: InstrumentId::generate(),
                trading_symbol: instrument.trading_symbol.clone(),
                name: instrument.name.clone(),
                exchange: instrument.exchange,
                reference_type: instrument.reference_type,
                reference_price: instrument.reference_price,
                last_price: instrument.last_price,
                added_at: now,
            };
            watchlist.instruments.push(added.clone());
            watchlist.updated_at = now;
            Ok(added)
        });
        Box::pin(ready(result))
    }

    fn remove_instrument<'a>(
        &'a self,
        watchlist_id: &'a WatchlistId,
        instrument_id: &'a InstrumentId,
    ) -> GatewayFuture<'a, ()> {
        let result = self.call("remove_instrument", |state| {
            state.require_user()?;
            let watchlist = state.watchlist_mut(watchlist_id)?;
            let before = watchlist.instruments.len();
            watchlist
                .instruments
                .retain(|instrument| &instrument.id != instrument_id);
            if watchlist.instruments.len() == before {
                return Err(GatewayError::not_found(format!(
                    "instrument '{instrument_id}' not found"
                )));
            }
            watchlist.updated_at = UtcDateTime::now();
            Ok(())
        });
        Box::pin(ready(result))
    }

    fn search_instruments<'a>(&'a self, query: &'a SearchQuery) -> GatewayFuture<'a, SearchPage> {
        let result = self.call("search_instruments", |state| {
            state.require_user()?;
            let needle = query.query.to_ascii_uppercase();
            let matches = state
                .catalog
                .iter()
                .filter(|hit| {
                    hit.trading_symbol.as_str().contains(&needle)
                        || hit.name.to_ascii_uppercase().contains(&needle)
                })
                .cloned()
                .collect::<Vec<_>>();

            let total_elements = matches.len();
            let content = matches
                .into_iter()
                .skip(query.page.saturating_mul(query.size))
                .take(query.size)
                .collect();
            Ok(SearchPage {
                content,
                page: query.page,
                size: query.size,
                total_elements,
            })
        });
        Box::pin(ready(result))
    }

    fn market_indices(&self) -> GatewayFuture<'_, Vec<MarketIndex>> {
        let result = self.call("market_indices", |state| {
            state.require_user()?;
            Ok(state.indices.clone())
        });
        Box::pin(ready(result))
    }

    fn market_status(&self) -> GatewayFuture<'_, MarketStatus> {
        let result = self.call("market_status", |state| {
            state.require_user()?;
            Ok(state.status)
        });
        Box::pin(ready(result))
    }
}

fn summary(symbol: &str, name: &str, exchange: Exchange, last_price: f64) -> Option<InstrumentSummary> {
    TradingSymbol::parse(symbol)
        .ok()
        .map(|trading_symbol| InstrumentSummary {
            trading_symbol,
            name: name.to_owned(),
            exchange,
            last_price,
        })
}

fn default_catalog() -> Vec<InstrumentSummary> {
    [
        ("RELIANCE", "Reliance Industries Ltd", Exchange::Nse, 2_950.40),
        ("RELIANCE", "Reliance Industries Ltd", Exchange::Bse, 2_951.10),
        ("TCS", "Tata Consultancy Services Ltd", Exchange::Nse, 3_850.15),
        ("INFY", "Infosys Ltd", Exchange::Nse, 1_520.30),
        ("HDFCBANK", "HDFC Bank Ltd", Exchange::Nse, 1_650.75),
        ("TATAMOTORS", "Tata Motors Ltd", Exchange::Nse, 980.50),
        ("SBIN", "State Bank of India", Exchange::Bse, 820.35),
        ("M&M", "Mahindra & Mahindra Ltd", Exchange::Nse, 2_710.00),
        ("BTC", "Bitcoin", Exchange::Crypto, 64_250.00),
        ("ETH", "Ethereum", Exchange::Crypto, 3_120.55),
        ("SOL", "Solana", Exchange::Crypto, 148.20),
    ]
    .into_iter()
    .filter_map(|(symbol, name, exchange, price)| summary(symbol, name, exchange, price))
    .collect()
}

fn default_indices() -> Vec<MarketIndex> {
    [
        ("NIFTY 50", 24_780.25, 156.40),
        ("SENSEX", 81_542.30, -234.15),
        ("BANK NIFTY", 52_156.85, 423.60),
    ]
    .into_iter()
    .map(|(name, last_price, change)| {
        let close: f64 = last_price - change;
        MarketIndex {
            instrument_name: name.to_owned(),
            exchange: String::from(if name == "SENSEX" { "BSE" } else { "NSE" }),
            last_price,
            open: close,
            high: last_price.max(close),
            low: last_price.min(close),
            close,
        }
    })
    .collect()
}
