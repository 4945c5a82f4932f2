//! Session store: current user, bearer token, and their durable persistence.
//!
//! The session is an explicit service. It starts logged out, is initialized
//! with [`Session::restore`], and is torn down with [`Session::logout`].
//! Persistence goes through [`TokenStore`] so the same store can feed bearer
//! tokens to the REST gateway and be swapped for an in-memory one in tests.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::gateway::{AuthGrant, Credentials, Gateway, GatewayError, Registration};
use crate::{User, UtcDateTime, ValidationError};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Session persistence failures.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("persisted session is corrupt: {0}")]
    Corrupt(String),

    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Session record persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub token: String,
    pub user: User,
    pub issued_at: UtcDateTime,
    pub expires_at: UtcDateTime,
}

impl StoredSession {
    /// Builds a record from a grant, falling back to `ttl` when the backend
    /// does not report an expiry.
    pub fn from_grant(grant: AuthGrant, issued_at: UtcDateTime, ttl: Duration) -> Self {
        let expires_at = grant.expires_at.unwrap_or_else(|| issued_at.plus(ttl));
        Self {
            token: grant.token,
            user: grant.user,
            issued_at,
            expires_at,
        }
    }

    pub fn is_expired(&self, now: UtcDateTime) -> bool {
        now >= self.expires_at
    }
}

/// Durable storage for the session record.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<StoredSession>, SessionError>;

    fn save(&self, session: &StoredSession) -> Result<(), SessionError>;

    fn clear(&self) -> Result<(), SessionError>;

    /// Token for authenticated calls. Unreadable or expired records yield `None`.
    fn bearer_token(&self) -> Option<String> {
        match self.load() {
            Ok(Some(session)) if !session.is_expired(UtcDateTime::now()) => Some(session.token),
            Ok(_) => None,
            Err(error) => {
                debug!(%error, "no usable bearer token");
                None
            }
        }
    }
}

/// JSON file token store.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<StoredSession>, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        decode_record(&raw)
    }

    fn save(&self, session: &StoredSession) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let staging = self.path.with_extension("tmp");
        fs::write(&staging, serde_json::to_vec_pretty(session)?)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

/// Process-local token store holding the serialized record.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    raw: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with raw persisted text, valid or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.raw
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<StoredSession>, SessionError> {
        match self.raw() {
            Some(raw) => decode_record(&raw),
            None => Ok(None),
        }
    }

    fn save(&self, session: &StoredSession) -> Result<(), SessionError> {
        let raw = serde_json::to_string(session)?;
        *self.raw.lock().unwrap_or_else(PoisonError::into_inner) = Some(raw);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.raw.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

fn decode_record(raw: &str) -> Result<Option<StoredSession>, SessionError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(raw)
        .map(Some)
        .map_err(|error| SessionError::Corrupt(error.to_string()))
}

/// Result of reading the persisted session at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored,
    Empty,
    /// A record existed but its token had expired; it was discarded.
    Expired,
    /// A record existed but could not be decoded; it was discarded.
    Corrupt,
}

/// Authenticated user session.
pub struct Session {
    gateway: Arc<dyn Gateway>,
    store: Arc<dyn TokenStore>,
    ttl: Duration,
    current: Option<StoredSession>,
    last_error: Option<String>,
}

impl Session {
    pub fn new(gateway: Arc<dyn Gateway>, store: Arc<dyn TokenStore>, ttl: Duration) -> Self {
        Self {
            gateway,
            store,
            ttl,
            current: None,
            last_error: None,
        }
    }

    /// Loads the persisted record, discarding it when corrupt or expired.
    /// Storage failures leave the record in place and report `Empty`.
    pub fn restore(&mut self) -> RestoreOutcome {
        self.current = None;
        match self.store.load() {
            Ok(Some(session)) if session.is_expired(UtcDateTime::now()) => {
                info!(expires_at = %session.expires_at, "discarding expired session");
                self.discard_persisted();
                RestoreOutcome::Expired
            }
            Ok(Some(session)) => {
                debug!(user = %session.user.email, "restored session");
                self.current = Some(session);
                RestoreOutcome::Restored
            }
            Ok(None) => RestoreOutcome::Empty,
            Err(error @ SessionError::Corrupt(_)) => {
                warn!(%error, "discarding unreadable session");
                self.discard_persisted();
                RestoreOutcome::Corrupt
            }
            Err(error) => {
                // The record may still be valid; leave it for the next run.
                warn!(%error, "session storage unavailable, starting logged out");
                RestoreOutcome::Empty
            }
        }
    }

    /// Returns `false` on any failure; the reason is kept in [`Session::last_error`].
    pub async fn login(&mut self, email: &str, password: &str) -> bool {
        self.last_error = None;
        let credentials = match validate_credentials(email, password) {
            Ok(credentials) => credentials,
            Err(error) => return self.fail(error.to_string()),
        };

        let result = self.gateway.login(&credentials).await;
        self.complete(result)
    }

    /// Returns `false` on any failure; the reason is kept in [`Session::last_error`].
    pub async fn register(&mut self, name: &str, email: &str, password: &str) -> bool {
        self.last_error = None;
        let name = name.trim();
        if name.is_empty() {
            return self.fail(ValidationError::EmptyName.to_string());
        }
        let credentials = match validate_credentials(email, password) {
            Ok(credentials) => credentials,
            Err(error) => return self.fail(error.to_string()),
        };

        let registration = Registration {
            name: name.to_owned(),
            email: credentials.email,
            password: credentials.password,
        };
        let result = self.gateway.register(&registration).await;
        self.complete(result)
    }

    pub fn logout(&mut self) {
        if let Some(session) = self.current.take() {
            info!(user = %session.user.email, "logged out");
        }
        self.discard_persisted();
    }

    pub fn user(&self) -> Option<&User> {
        self.current.as_ref().map(|session| &session.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|session| session.token.as_str())
    }

    pub fn expires_at(&self) -> Option<UtcDateTime> {
        self.current.as_ref().map(|session| session.expires_at)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|session| !session.is_expired(UtcDateTime::now()))
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn complete(&mut self, result: Result<AuthGrant, GatewayError>) -> bool {
        let grant = match result {
            Ok(grant) => grant,
            Err(error) => return self.fail(error.message().to_owned()),
        };

        let session = StoredSession::from_grant(grant, UtcDateTime::now(), self.ttl);
        if let Err(error) = self.store.save(&session) {
            return self.fail(format!("could not persist session: {error}"));
        }

        info!(user = %session.user.email, expires_at = %session.expires_at, "authenticated");
        self.current = Some(session);
        true
    }

    fn fail(&mut self, message: String) -> bool {
        warn!(reason = %message, "authentication failed");
        self.last_error = Some(message);
        false
    }

    fn discard_persisted(&self) {
        if let Err(error) = self.store.clear() {
            warn!(%error, "failed to clear persisted session");
        }
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<Credentials, ValidationError> {
    let email = email.trim();
    let valid_email = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !valid_email {
        return Err(ValidationError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }

    Ok(Credentials {
        email: email.to_owned(),
        password: password.to_owned(),
    })
}
