//! Contract tests for the REST gateway
//!
//! A scripted transport records every request so the tests can check paths,
//! methods, headers, and bodies, and replays canned backend responses.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tickr_core::{
    ApiEnvelope, Credentials, Exchange, Gateway, GatewayErrorKind, HttpClient, HttpError, HttpMethod,
    HttpRequest, HttpResponse, InstrumentId, MemoryTokenStore, NewInstrument, ReferenceType,
    RestGateway, SearchQuery, StoredSession, TokenStore, TradingSymbol, User, UserId,
    UtcDateTime, WatchlistId,
};

const BASE_URL: &str = "http://localhost:8080/api/v1";

#[derive(Default)]
struct ScriptedHttpClient {
    responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    fn replying(responses: Vec<Result<HttpResponse, HttpError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.requests.lock().expect("lock").push(request);
        let response = self
            .responses
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Err(HttpError::new("no scripted response")));
        Box::pin(async move { response })
    }
}

fn ok(data: Value) -> Result<HttpResponse, HttpError> {
    let body = serde_json::to_string(&ApiEnvelope::new(data)).expect("encode envelope");
    Ok(HttpResponse::ok_json(body))
}

fn signed_in_store() -> Arc<MemoryTokenStore> {
    let store = Arc::new(MemoryTokenStore::new());
    let issued_at = UtcDateTime::now();
    store
        .save(&StoredSession {
            token: String::from("jwt-123"),
            user: User {
                id: UserId::parse("1").expect("id"),
                name: String::from("Arjun Sharma"),
                email: String::from("arjun@tickr.io"),
                avatar: None,
            },
            issued_at,
            expires_at: issued_at.plus(std::time::Duration::from_secs(3_600)),
        })
        .expect("save");
    store
}

fn gateway(http: Arc<ScriptedHttpClient>, store: Arc<MemoryTokenStore>) -> RestGateway {
    RestGateway::with_http_client(format!("{BASE_URL}/"), store, http)
}

fn watchlist_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "instruments": [],
        "createdAt": "2024-03-01T09:15:00Z",
        "updatedAt": "2024-03-01T09:15:00Z"
    })
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn login_posts_credentials_without_bearer_token() {
    // Given: A backend that grants a token
    let http = ScriptedHttpClient::replying(vec![ok(json!({
        "token": "jwt-abc",
        "user": { "id": 7, "name": "Arjun Sharma", "email": "arjun@tickr.io" }
    }))]);
    let gateway = gateway(http.clone(), Arc::new(MemoryTokenStore::new()));

    // When: The user logs in
    let grant = gateway
        .login(&Credentials {
            email: String::from("arjun@tickr.io"),
            password: String::from("secret1"),
        })
        .await
        .expect("login");

    // Then: Credentials were posted as JSON to /auth/login and the numeric id was accepted
    assert_eq!(grant.token, "jwt-abc");
    assert_eq!(grant.user.id.as_str(), "7");
    let requests = http.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, HttpMethod::Post);
    assert_eq!(requests[0].url, format!("{BASE_URL}/auth/login"));
    assert!(!requests[0].headers.contains_key("authorization"));
    let body: Value = serde_json::from_str(requests[0].body.as_deref().expect("body"))
        .expect("json body");
    assert_eq!(body, json!({ "email": "arjun@tickr.io", "password": "secret1" }));
}

#[tokio::test]
async fn authenticated_call_without_session_is_refused_locally() {
    // Given: No stored session
    let http = ScriptedHttpClient::replying(Vec::new());
    let gateway = gateway(http.clone(), Arc::new(MemoryTokenStore::new()));

    // When: Watchlists are requested
    let error = gateway.list_watchlists().await.expect_err("must fail");

    // Then: Nothing was sent
    assert_eq!(error.kind(), GatewayErrorKind::Unauthorized);
    assert!(http.requests().is_empty());
}

#[tokio::test]
async fn current_user_sends_bearer_token_from_store() {
    let http = ScriptedHttpClient::replying(vec![ok(json!({
        "id": "1", "name": "Arjun Sharma", "email": "arjun@tickr.io"
    }))]);
    let gateway = gateway(http.clone(), signed_in_store());

    let user = gateway.current_user().await.expect("user");

    assert_eq!(user.name, "Arjun Sharma");
    let request = &http.requests()[0];
    assert_eq!(request.url, format!("{BASE_URL}/user/"));
    assert_eq!(
        request.headers.get("authorization").map(String::as_str),
        Some("Bearer jwt-123")
    );
}

// =============================================================================
// Watchlists and instruments
// =============================================================================

#[tokio::test]
async fn watchlist_mutations_use_documented_routes() {
    // Given: Scripted responses for create, rename, and delete
    let http = ScriptedHttpClient::replying(vec![
        ok(watchlist_json("w1", "Tech")),
        ok(watchlist_json("w1", "Technology")),
        Ok(HttpResponse::new(204, "")),
    ]);
    let gateway = gateway(http.clone(), signed_in_store());
    let id = WatchlistId::parse("w1").expect("id");

    // When: A watchlist is created, renamed, and deleted
    let created = gateway.create_watchlist("Tech").await.expect("create");
    let renamed = gateway.rename_watchlist(&id, "Technology").await.expect("rename");
    gateway.delete_watchlist(&id).await.expect("delete");

    // Then: Each call hit its route and the empty 204 body was accepted
    assert_eq!(created.name, "Tech");
    assert_eq!(renamed.name, "Technology");
    let calls = http
        .requests()
        .into_iter()
        .map(|request| (request.method, request.url, request.body))
        .collect::<Vec<_>>();
    assert_eq!(
        calls,
        vec![
            (
                HttpMethod::Post,
                format!("{BASE_URL}/watchlists"),
                Some(String::from(r#"{"name":"Tech"}"#))
            ),
            (
                HttpMethod::Put,
                format!("{BASE_URL}/watchlists/w1"),
                Some(String::from(r#"{"name":"Technology"}"#))
            ),
            (HttpMethod::Delete, format!("{BASE_URL}/watchlists/w1"), None),
        ]
    );
}

#[tokio::test]
async fn add_instrument_posts_camel_case_payload() {
    let http = ScriptedHttpClient::replying(vec![ok(json!({
        "id": "i9",
        "tradingSymbol": "M&M",
        "name": "Mahindra & Mahindra Ltd",
        "exchange": "NSE",
        "referenceType": "CUSTOM",
        "referencePrice": 2500.0,
        "currentPrice": 2710.0,
        "addedAt": "2024-03-01T09:15:00Z"
    }))]);
    let gateway = gateway(http.clone(), signed_in_store());
    let watchlist_id = WatchlistId::parse("w1").expect("id");
    let payload = NewInstrument {
        trading_symbol: TradingSymbol::parse("M&M").expect("symbol"),
        name: String::from("Mahindra & Mahindra Ltd"),
        exchange: Exchange::Nse,
        reference_type: ReferenceType::Custom,
        reference_price: 2_500.0,
        last_price: 2_710.0,
    };

    let added = gateway
        .add_instrument(&watchlist_id, &payload)
        .await
        .expect("add");

    assert_eq!(added.last_price, 2_710.0);
    assert!(added.change().is_positive);
    let request = &http.requests()[0];
    assert_eq!(request.url, format!("{BASE_URL}/watchlists/w1/instruments"));
    let body: Value =
        serde_json::from_str(request.body.as_deref().expect("body")).expect("json body");
    assert_eq!(body["tradingSymbol"], "M&M");
    assert_eq!(body["referenceType"], "CUSTOM");
    assert_eq!(body["referencePrice"], 2500.0);
}

#[tokio::test]
async fn remove_instrument_encodes_both_ids() {
    let http = ScriptedHttpClient::replying(vec![Ok(HttpResponse::new(200, "{}"))]);
    let gateway = gateway(http.clone(), signed_in_store());

    gateway
        .remove_instrument(
            &WatchlistId::parse("w 1").expect("id"),
            &InstrumentId::parse("i/2").expect("id"),
        )
        .await
        .expect("remove");

    let request = &http.requests()[0];
    assert_eq!(request.method, HttpMethod::Delete);
    assert_eq!(request.url, format!("{BASE_URL}/watchlists/w%201/instruments/i%2F2"));
}

#[tokio::test]
async fn search_sends_paged_query() {
    let http = ScriptedHttpClient::replying(vec![ok(json!({
        "content": [
            { "tradingSymbol": "RELIANCE", "name": "Reliance Industries Ltd", "exchange": "NSE", "lastPrice": 2950.4 }
        ],
        "page": 0,
        "size": 10,
        "totalElements": 1
    }))]);
    let gateway = gateway(http.clone(), signed_in_store());

    let page = gateway
        .search_instruments(&SearchQuery::new("m&m ltd", 0, 10).expect("query"))
        .await
        .expect("search");

    assert_eq!(page.total_elements, 1);
    assert_eq!(page.content[0].exchange, Exchange::Nse);
    assert_eq!(
        http.requests()[0].url,
        format!("{BASE_URL}/instruments/search?query=M%26M%20LTD&page=0&size=10")
    );
}

// =============================================================================
// Error mapping
// =============================================================================

#[tokio::test]
async fn rejected_request_carries_server_message() {
    let http = ScriptedHttpClient::replying(vec![Ok(HttpResponse::new(
        409,
        r#"{"message":"Watchlist name already taken"}"#,
    ))]);
    let gateway = gateway(http, signed_in_store());

    let error = gateway.create_watchlist("Tech").await.expect_err("must fail");

    assert_eq!(error.kind(), GatewayErrorKind::Rejected);
    assert_eq!(error.status(), Some(409));
    assert_eq!(error.message(), "Watchlist name already taken");
}

#[tokio::test]
async fn server_error_without_message_is_unavailable() {
    let http = ScriptedHttpClient::replying(vec![Ok(HttpResponse::new(
        502,
        "<html>bad gateway</html>",
    ))]);
    let gateway = gateway(http, signed_in_store());

    let error = gateway.market_status().await.expect_err("must fail");

    assert_eq!(error.kind(), GatewayErrorKind::Unavailable);
    assert_eq!(error.message(), "backend returned status 502");
}

#[tokio::test]
async fn transport_failure_is_unavailable() {
    let http = ScriptedHttpClient::replying(vec![
        Err(HttpError::timeout("request timeout")),
        Err(HttpError::new("connection refused")),
    ]);
    let gateway = gateway(http, signed_in_store());

    let timed_out = gateway.market_indices().await.expect_err("must fail");
    assert_eq!(timed_out.kind(), GatewayErrorKind::Unavailable);
    assert_eq!(timed_out.message(), "request timed out after 3000 ms");

    let refused = gateway.market_indices().await.expect_err("must fail");
    assert_eq!(refused.kind(), GatewayErrorKind::Unavailable);
    assert_eq!(refused.message(), "transport error: connection refused");
}

#[tokio::test]
async fn unexpected_body_shape_is_a_decode_error() {
    let http = ScriptedHttpClient::replying(vec![Ok(HttpResponse::ok_json(
        r#"[{"id":"w1"}]"#,
    ))]);
    let gateway = gateway(http, signed_in_store());

    let error = gateway.list_watchlists().await.expect_err("must fail");

    assert_eq!(error.kind(), GatewayErrorKind::Decode);
    assert_eq!(error.code(), "gateway.decode");
}

#[tokio::test]
async fn expired_token_is_not_sent() {
    // Given: A stored session that already expired
    let store = Arc::new(MemoryTokenStore::new());
    let issued_at = UtcDateTime::parse("2024-01-01T00:00:00Z").expect("ts");
    store
        .save(&StoredSession {
            token: String::from("stale"),
            user: User {
                id: UserId::parse("1").expect("id"),
                name: String::from("Arjun Sharma"),
                email: String::from("arjun@tickr.io"),
                avatar: None,
            },
            issued_at,
            expires_at: issued_at.plus(std::time::Duration::from_secs(60)),
        })
        .expect("save");
    let http = ScriptedHttpClient::replying(Vec::new());
    let gateway = gateway(http.clone(), store);

    // When: Market indices are requested
    let error = gateway.market_indices().await.expect_err("must fail");

    // Then: The call is refused before reaching the network
    assert_eq!(error.kind(), GatewayErrorKind::Unauthorized);
    assert!(http.requests().is_empty());
}
