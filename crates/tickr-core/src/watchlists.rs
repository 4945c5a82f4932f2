//! Watchlist collection manager.
//!
//! Every mutation is confirmed by the gateway before local state changes; the
//! manager then refetches so the cached collection always mirrors the backend.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::gateway::{Gateway, GatewayError, SearchQuery};
use crate::metrics::InstrumentRow;
use crate::{
    Instrument, InstrumentId, InstrumentSummary, NewInstrument, ReferencePrice, ReferenceType,
    TradingSymbol, ValidationError, Watchlist, WatchlistId,
};

pub const DEFAULT_RESOLVE_PAGE_SIZE: usize = 10;

#[derive(Debug, Error)]
pub enum WatchlistError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Ticker plus baseline choice for an instrument that is not yet resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSpec {
    pub symbol: TradingSymbol,
    pub reference: ReferencePrice,
}

impl InstrumentSpec {
    pub fn new(symbol: TradingSymbol, reference: ReferencePrice) -> Self {
        Self { symbol, reference }
    }

    /// Builds from raw form fields. The ticker is upper-cased.
    pub fn parse(
        symbol: &str,
        reference_type: ReferenceType,
        custom_price: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let symbol = TradingSymbol::parse(&symbol.trim().to_ascii_uppercase())?;
        let reference = ReferencePrice::from_input(reference_type, custom_price)?;
        Ok(Self { symbol, reference })
    }
}

pub struct WatchlistManager {
    gateway: Arc<dyn Gateway>,
    watchlists: Vec<Watchlist>,
    selected: Option<WatchlistId>,
    resolve_page_size: usize,
}

impl WatchlistManager {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            watchlists: Vec::new(),
            selected: None,
            resolve_page_size: DEFAULT_RESOLVE_PAGE_SIZE,
        }
    }

    /// Page size used when resolving a ticker through search.
    pub fn with_resolve_page_size(mut self, size: usize) -> Self {
        self.resolve_page_size = size.max(1);
        self
    }

    pub async fn refresh(&mut self) -> Result<&[Watchlist], WatchlistError> {
        let watchlists = self.gateway.list_watchlists().await?;
        debug!(count = watchlists.len(), "watchlists fetched");
        self.watchlists = watchlists;
        self.reconcile_selection();
        Ok(&self.watchlists)
    }

    /// Creates a watchlist and selects it.
    pub async fn create(&mut self, name: &str) -> Result<Watchlist, WatchlistError> {
        let name = self.validate_name(name, None)?;
        let created = self.gateway.create_watchlist(&name).await?;
        info!(id = %created.id, name = %created.name, "watchlist created");

        self.refresh().await?;
        if self.watchlist(&created.id).is_some() {
            self.selected = Some(created.id.clone());
        }
        Ok(created)
    }

    pub async fn rename(
        &mut self,
        id: &WatchlistId,
        new_name: &str,
    ) -> Result<Watchlist, WatchlistError> {
        self.require(id)?;
        let name = self.validate_name(new_name, Some(id))?;
        let renamed = self.gateway.rename_watchlist(id, &name).await?;
        info!(id = %renamed.id, name = %renamed.name, "watchlist renamed");

        self.refresh().await?;
        Ok(renamed)
    }

    /// Deletes a watchlist. A deleted selection falls back to the first remaining one.
    pub async fn delete(&mut self, id: &WatchlistId) -> Result<(), WatchlistError> {
        self.require(id)?;
        self.gateway.delete_watchlist(id).await?;
        info!(%id, "watchlist deleted");

        self.refresh().await?;
        Ok(())
    }

    /// Resolves the ticker through search (exact symbol match) and adds it.
    pub async fn add_instrument(
        &mut self,
        watchlist_id: &WatchlistId,
        spec: &InstrumentSpec,
    ) -> Result<Instrument, WatchlistError> {
        self.require(watchlist_id)?;
        let summary = self.resolve(&spec.symbol).await?;
        self.add_resolved(watchlist_id, &summary, spec.reference)
            .await
    }

    /// Adds an already resolved search hit.
    pub async fn add_resolved(
        &mut self,
        watchlist_id: &WatchlistId,
        summary: &InstrumentSummary,
        reference: ReferencePrice,
    ) -> Result<Instrument, WatchlistError> {
        self.require(watchlist_id)?;
        let payload = NewInstrument::from_summary(summary, reference);
        let added = self.gateway.add_instrument(watchlist_id, &payload).await?;
        info!(
            watchlist = %watchlist_id,
            symbol = %added.trading_symbol,
            reference_type = %added.reference_type,
            reference_price = added.reference_price,
            "instrument added"
        );

        self.reload_instruments(watchlist_id).await?;
        Ok(added)
    }

    pub async fn remove_instrument(
        &mut self,
        watchlist_id: &WatchlistId,
        instrument_id: &InstrumentId,
    ) -> Result<(), WatchlistError> {
        let watchlist = self.require(watchlist_id)?;
        if watchlist.instrument(instrument_id).is_none() {
            return Err(ValidationError::UnknownInstrument {
                id: instrument_id.to_string(),
                watchlist_id: watchlist_id.to_string(),
            }
            .into());
        }

        self.gateway
            .remove_instrument(watchlist_id, instrument_id)
            .await?;
        info!(watchlist = %watchlist_id, instrument = %instrument_id, "instrument removed");

        self.reload_instruments(watchlist_id).await?;
        Ok(())
    }

    /// Refetches the collection, then the instruments of one watchlist, so
    /// its record (`updated_at`) and its rows both mirror the backend.
    pub async fn reload_instruments(
        &mut self,
        watchlist_id: &WatchlistId,
    ) -> Result<&[Instrument], WatchlistError> {
        self.refresh().await?;
        let instruments = self.gateway.list_instruments(watchlist_id).await?;
        let watchlist = self
            .watchlists
            .iter_mut()
            .find(|watchlist| &watchlist.id == watchlist_id)
            .ok_or_else(|| ValidationError::UnknownWatchlist {
                id: watchlist_id.to_string(),
            })?;
        watchlist.instruments = instruments;
        Ok(&watchlist.instruments)
    }

    pub fn select(&mut self, id: &WatchlistId) -> Result<&Watchlist, ValidationError> {
        self.require(id)?;
        self.selected = Some(id.clone());
        self.require(id)
    }

    pub fn selected(&self) -> Option<&Watchlist> {
        self.selected.as_ref().and_then(|id| self.watchlist(id))
    }

    pub fn selected_id(&self) -> Option<&WatchlistId> {
        self.selected.as_ref()
    }

    pub fn watchlists(&self) -> &[Watchlist] {
        &self.watchlists
    }

    pub fn watchlist(&self, id: &WatchlistId) -> Option<&Watchlist> {
        self.watchlists.iter().find(|watchlist| &watchlist.id == id)
    }

    /// Looks a watchlist up by name, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Option<&Watchlist> {
        let name = name.trim();
        self.watchlists
            .iter()
            .find(|watchlist| watchlist.name.eq_ignore_ascii_case(name))
    }

    /// Instruments of a watchlist with change metrics computed now.
    pub fn rows(&self, id: &WatchlistId) -> Option<Vec<InstrumentRow>> {
        self.watchlist(id)
            .map(|watchlist| watchlist.instruments.iter().map(InstrumentRow::new).collect())
    }

    async fn resolve(&self, symbol: &TradingSymbol) -> Result<InstrumentSummary, WatchlistError> {
        let query = SearchQuery::new(symbol.as_str(), 0, self.resolve_page_size)?;
        let page = self.gateway.search_instruments(&query).await?;
        page.content
            .into_iter()
            .find(|hit| &hit.trading_symbol == symbol)
            .ok_or_else(|| {
                ValidationError::UnresolvedSymbol {
                    symbol: symbol.to_string(),
                }
                .into()
            })
    }

    fn require(&self, id: &WatchlistId) -> Result<&Watchlist, ValidationError> {
        self.watchlist(id)
            .ok_or_else(|| ValidationError::UnknownWatchlist { id: id.to_string() })
    }

    fn validate_name(
        &self,
        name: &str,
        except: Option<&WatchlistId>,
    ) -> Result<String, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyWatchlistName);
        }
        let duplicate = self.watchlists.iter().any(|watchlist| {
            Some(&watchlist.id) != except && watchlist.name.eq_ignore_ascii_case(name)
        });
        if duplicate {
            return Err(ValidationError::DuplicateWatchlistName {
                name: name.to_owned(),
            });
        }
        Ok(name.to_owned())
    }

    fn reconcile_selection(&mut self) {
        let still_present = self
            .selected
            .as_ref()
            .is_some_and(|id| self.watchlist(id).is_some());
        if !still_present {
            self.selected = self.watchlists.first().map(|watchlist| watchlist.id.clone());
        }
    }
}
