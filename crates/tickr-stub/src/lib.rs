//! Stub user service.
//!
//! Serves a fixed demo profile at exactly `GET /api/user` and answers
//! everything else with `404 {"message":"Not Found"}`, including requests
//! with a query string, `HEAD`, and CORS preflights. Every response allows
//! any origin.

use std::net::SocketAddr;

use axum::extract::State;
use axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use axum::http::{HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use thiserror::Error;
use tickr_core::{ApiErrorBody, User, UserId, ValidationError};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Error)]
pub enum StubError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub fn demo_user() -> Result<User, ValidationError> {
    Ok(User {
        id: UserId::parse("1")?,
        name: String::from("Arjun Sharma"),
        email: String::from("arjun@tickr.io"),
        avatar: None,
    })
}

pub fn router(user: User) -> Router {
    Router::new()
        .route("/api/user", get(current_user).fallback(not_found))
        .fallback(not_found)
        .with_state(user)
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
}

/// Only a bare `GET` matches; axum also routes `HEAD` and query strings here.
async fn current_user(State(user): State<User>, method: Method, uri: Uri) -> Response {
    if method != Method::GET || uri.query().is_some() {
        return not_found().await.into_response();
    }
    Json(user).into_response()
}

async fn not_found() -> (StatusCode, Json<ApiErrorBody>) {
    (StatusCode::NOT_FOUND, Json(ApiErrorBody::not_found()))
}

pub struct StubServer {
    app: Router,
    addr: SocketAddr,
}

impl StubServer {
    pub fn new(addr: SocketAddr) -> Result<Self, StubError> {
        Ok(Self {
            app: router(demo_user()?),
            addr,
        })
    }

    pub async fn run(self) -> Result<(), StubError> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|source| StubError::Bind {
                addr: self.addr,
                source,
            })?;
        info!("stub server listening on {}", self.addr);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("stub server shutting down");
            })
            .await
            .map_err(StubError::Serve)
    }
}
