use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::{
    AuthGrant, Credentials, Gateway, GatewayError, GatewayFuture, Registration, SearchQuery,
};
use crate::envelope::{decode_data, error_message};
use crate::http_client::{HttpAuth, HttpClient, HttpMethod, HttpRequest, HttpResponse};
use crate::session::TokenStore;
use crate::{
    Instrument, InstrumentId, MarketIndex, MarketStatus, NewInstrument, ReqwestHttpClient,
    SearchPage, User, Watchlist, WatchlistId,
};

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1";

#[derive(Serialize)]
struct WatchlistName<'a> {
    name: &'a str,
}

/// REST backend client. Success bodies are `{ "data": ... }`, failures `{ "message": ... }`.
#[derive(Clone)]
pub struct RestGateway {
    base_url: String,
    http_client: Arc<dyn HttpClient>,
    tokens: Arc<dyn TokenStore>,
    timeout_ms: u64,
}

impl RestGateway {
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenStore>) -> Self {
        Self::with_http_client(base_url, tokens, Arc::new(ReqwestHttpClient::new()))
    }

    pub fn with_http_client(
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenStore>,
        http_client: Arc<dyn HttpClient>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            base_url,
            http_client,
            tokens,
            timeout_ms: 3_000,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, method: HttpMethod, path: &str) -> Result<HttpRequest, GatewayError> {
        let token = self
            .tokens
            .bearer_token()
            .ok_or_else(|| GatewayError::unauthorized("not logged in or session expired"))?;
        Ok(HttpRequest::new(method, self.url(path))
            .with_auth(&HttpAuth::BearerToken(token))
            .with_timeout_ms(self.timeout_ms))
    }

    fn anonymous(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, self.url(path)).with_timeout_ms(self.timeout_ms)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, GatewayError> {
        let method = request.method;
        let url = request.url.clone();
        let timeout_ms = request.timeout_ms;
        let started = Instant::now();

        let response = self.http_client.execute(request).await.map_err(|error| {
            warn!(%method, %url, error = %error, "gateway transport error");
            if error.is_timeout() {
                GatewayError::unavailable(format!("request timed out after {timeout_ms} ms"))
            } else {
                GatewayError::unavailable(format!("transport error: {}", error.message()))
            }
        })?;

        debug!(
            %method,
            %url,
            status = response.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "gateway call"
        );

        if response.is_success() {
            return Ok(response);
        }

        let message = error_message(&response.body)
            .unwrap_or_else(|| format!("backend returned status {}", response.status));
        Err(GatewayError::from_status(response.status, message))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, GatewayError> {
        let response = self.send(request).await?;
        decode_data(&response.body)
            .map_err(|error| GatewayError::decode(format!("unexpected response body: {error}")))
    }

    async fn fetch_json<B, T>(&self, request: HttpRequest, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let request = request
            .with_json(body)
            .map_err(|error| GatewayError::decode(format!("failed to encode request: {error}")))?;
        self.fetch(request).await
    }
}

impl Gateway for RestGateway {
    fn login<'a>(&'a self, credentials: &'a Credentials) -> GatewayFuture<'a, AuthGrant> {
        Box::pin(async move {
            let request = self.anonymous(HttpMethod::Post, "/auth/login");
            self.fetch_json(request, credentials).await
        })
    }

    fn register<'a>(&'a self, registration: &'a Registration) -> GatewayFuture<'a, AuthGrant> {
        Box::pin(async move {
            let request = self.anonymous(HttpMethod::Post, "/auth/register");
            self.fetch_json(request, registration).await
        })
    }

    fn current_user(&self) -> GatewayFuture<'_, User> {
        Box::pin(async move {
            let request = self.authorized(HttpMethod::Get, "/user/")?;
            self.fetch(request).await
        })
    }

    fn list_watchlists(&self) -> GatewayFuture<'_, Vec<Watchlist>> {
        Box::pin(async move {
            let request = self.authorized(HttpMethod::Get, "/watchlists")?;
            self.fetch(request).await
        })
    }

    fn create_watchlist<'a>(&'a self, name: &'a str) -> GatewayFuture<'a, Watchlist> {
        Box::pin(async move {
            let request = self.authorized(HttpMethod::Post, "/watchlists")?;
            self.fetch_json(request, &WatchlistName { name }).await
        })
    }

    fn rename_watchlist<'a>(
        &'a self,
        id: &'a WatchlistId,
        name: &'a str,
    ) -> GatewayFuture<'a, Watchlist> {
        Box::pin(async move {
            let path = format!("/watchlists/{}", urlencoding::encode(id.as_str()));
            let request = self.authorized(HttpMethod::Put, &path)?;
            self.fetch_json(request, &WatchlistName { name }).await
        })
    }

    fn delete_watchlist<'a>(&'a self, id: &'a WatchlistId) -> GatewayFuture<'a, ()> {
        Box::pin(async move {
            let path = format!("/watchlists/{}", urlencoding::encode(id.as_str()));
            let request = self.authorized(HttpMethod::Delete, &path)?;
            self.send(request).await.map(|_| ())
        })
    }

    fn list_instruments<'a>(
        &'a self,
        watchlist_id: &'a WatchlistId,
    ) -> GatewayFuture<'a, Vec<Instrument>> {
        Box::pin(async move {
            let path = format!(
                "/watchlists/{}/instruments",
                urlencoding::encode(watchlist_id.as_str())
            );
            let request = self.authorized(HttpMethod::Get, &path)?;
            self.fetch(request).await
        })
    }

    fn add_instrument<'a>(
        &'a self,
        watchlist_id: &'a WatchlistId,
        instrument: &'a NewInstrument,
    ) -> GatewayFuture<'a, Instrument> {
        Box::pin(async move {
            let path = format!(
                "/watchlists/{}/instruments",
                urlencoding::encode(watchlist_id.as_str())
            );
            let request = self.authorized(HttpMethod::Post, &path)?;
            self.fetch_json(request, instrument).await
        })
    }

    fn remove_instrument<'a>(
        &'a self,
        watchlist_id: &'a WatchlistId,
        instrument_id: &'a InstrumentId,
    ) -> GatewayFuture<'a, ()> {
        Box::pin(async move {
            let path = format!(
                "/watchlists/{}/instruments/{}",
                urlencoding::encode(watchlist_id.as_str()),
                urlencoding::encode(instrument_id.as_str())
            );
            let request = self.authorized(HttpMethod::Delete, &path)?;
            self.send(request).await.map(|_| ())
        })
    }

    fn search_instruments<'a>(&'a self, query: &'a SearchQuery) -> GatewayFuture<'a, SearchPage> {
        Box::pin(async move {
            let path = format!(
                "/instruments/search?query={}&page={}&size={}",
                urlencoding::encode(&query.query),
                query.page,
                query.size
            );
            let request = self.authorized(HttpMethod::Get, &path)?;
            self.fetch(request).await
        })
    }

    fn market_indices(&self) -> GatewayFuture<'_, Vec<MarketIndex>> {
        Box::pin(async move {
            let request = self.authorized(HttpMethod::Get, "/market/indices")?;
            self.fetch(request).await
        })
    }

    fn market_status(&self) -> GatewayFuture<'_, MarketStatus> {
        Box::pin(async move {
            let request = self.authorized(HttpMethod::Get, "/market/status")?;
            self.fetch(request).await
        })
    }
}
