//! Behavior-driven tests for the session store
//!
//! These tests verify login, registration, persistence across restarts, and
//! how stale or damaged session records are handled.

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;
use tickr_core::{
    FileTokenStore, MemoryGateway, MemoryTokenStore, RestoreOutcome, Session, SessionError,
    StoredSession, TokenStore, User, UserId, UtcDateTime,
};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

fn session_with(store: Arc<dyn TokenStore>) -> (Arc<MemoryGateway>, Session) {
    let gateway = Arc::new(MemoryGateway::new());
    let session = Session::new(gateway.clone(), store, DAY);
    (gateway, session)
}

fn stored(expires_at: UtcDateTime) -> StoredSession {
    StoredSession {
        token: String::from("persisted-token"),
        user: User {
            id: UserId::parse("1").expect("id"),
            name: String::from("Arjun Sharma"),
            email: String::from("arjun@tickr.io"),
            avatar: None,
        },
        issued_at: UtcDateTime::parse("2024-01-01T00:00:00Z").expect("ts"),
        expires_at,
    }
}

// =============================================================================
// Login and registration
// =============================================================================

#[tokio::test]
async fn when_user_logs_in_session_is_persisted_and_survives_restart() {
    // Given: A file-backed token store
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("session.json");
    let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&path));
    let (_, mut session) = session_with(store.clone());

    // When: The user logs in
    let ok = session.login("arjun@tickr.io", "secret1").await;

    // Then: The session is active and written to disk
    assert!(ok);
    assert!(session.is_authenticated());
    assert_eq!(session.user().map(|user| user.email.as_str()), Some("arjun@tickr.io"));
    assert!(path.exists());

    // When: The application restarts with the same store
    let (_, mut restarted) = session_with(store);
    let outcome = restarted.restore();

    // Then: The user is still signed in with the same token
    assert_eq!(outcome, RestoreOutcome::Restored);
    assert_eq!(restarted.token(), session.token());
}

#[tokio::test]
async fn when_credentials_are_malformed_login_returns_false_without_network() {
    // Given: A fresh session
    let (gateway, mut session) = session_with(Arc::new(MemoryTokenStore::new()));

    // When: The user submits a short password
    let ok = session.login("arjun@tickr.io", "12345").await;

    // Then: Login fails with a readable reason and the backend was never called
    assert!(!ok);
    assert!(!session.is_authenticated());
    assert_eq!(
        session.last_error(),
        Some("password must be at least 6 characters")
    );
    assert_eq!(gateway.calls("login"), 0);

    // When: The email has no domain part
    let ok = session.login("arjun@", "secret1").await;

    // Then: It is rejected too
    assert!(!ok);
    assert_eq!(session.last_error(), Some("email address is invalid"));
}

#[tokio::test]
async fn when_backend_rejects_login_failure_is_reported_not_raised() {
    // Given: A backend that is down
    let (gateway, mut session) = session_with(Arc::new(MemoryTokenStore::new()));
    gateway.set_outage(Some("Invalid credentials"));

    // When: The user logs in
    let ok = session.login("arjun@tickr.io", "secret1").await;

    // Then: The call returns false and keeps the server message
    assert!(!ok);
    assert_eq!(session.last_error(), Some("Invalid credentials"));
    assert_eq!(session.user(), None);
}

#[tokio::test]
async fn when_user_registers_name_is_required_and_kept() {
    // Given: A fresh session
    let store = Arc::new(MemoryTokenStore::new());
    let (_, mut session) = session_with(store.clone());

    // When: Registering with a blank name
    let blank = session.register("  ", "arjun@tickr.io", "secret1").await;

    // Then: It is rejected
    assert!(!blank);
    assert_eq!(session.last_error(), Some("name cannot be empty"));

    // When: Registering with a real name
    let ok = session
        .register("Arjun Sharma", "arjun@tickr.io", "secret1")
        .await;

    // Then: The profile carries that name and was persisted
    assert!(ok);
    assert_eq!(session.last_error(), None);
    assert_eq!(session.user().map(|user| user.name.as_str()), Some("Arjun Sharma"));
    assert!(store.raw().is_some());
}

#[tokio::test]
async fn when_user_logs_out_persisted_and_memory_state_are_cleared() {
    // Given: A logged-in user
    let store = Arc::new(MemoryTokenStore::new());
    let (_, mut session) = session_with(store.clone());
    assert!(session.login("arjun@tickr.io", "secret1").await);

    // When: They log out
    session.logout();

    // Then: Nothing remains for authenticated calls to use
    assert!(!session.is_authenticated());
    assert_eq!(session.token(), None);
    assert_eq!(store.raw(), None);
    assert_eq!(store.bearer_token(), None);
}

// =============================================================================
// Restore at startup
// =============================================================================

#[test]
fn when_nothing_is_persisted_restore_reports_empty() {
    let (_, mut session) = session_with(Arc::new(MemoryTokenStore::new()));
    assert_eq!(session.restore(), RestoreOutcome::Empty);
    assert!(!session.is_authenticated());
}

#[test]
fn when_persisted_record_is_corrupt_it_is_discarded() {
    // Given: Garbage in the persisted slot
    let store = Arc::new(MemoryTokenStore::with_raw("{\"token\": 42"));
    let (_, mut session) = session_with(store.clone());

    // When: The session is restored
    let outcome = session.restore();

    // Then: The record is dropped and the user is logged out
    assert_eq!(outcome, RestoreOutcome::Corrupt);
    assert_eq!(store.raw(), None);
    assert_eq!(session.user(), None);
}

#[test]
fn when_persisted_token_is_expired_it_is_discarded() {
    // Given: A record that expired a day after issue in 2024
    let store = Arc::new(MemoryTokenStore::new());
    let expired = stored(UtcDateTime::parse("2024-01-02T00:00:00Z").expect("ts"));
    store.save(&expired).expect("save");
    let (_, mut session) = session_with(store.clone());

    // When: The session is restored
    let outcome = session.restore();

    // Then: The stale token is not used
    assert_eq!(outcome, RestoreOutcome::Expired);
    assert_eq!(session.token(), None);
    assert_eq!(store.raw(), None);
}

#[test]
fn when_file_store_holds_a_valid_record_it_is_restored() {
    // Given: A session file written by an earlier run
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("session.json");
    let record = stored(UtcDateTime::now().plus(DAY));
    fs::write(&path, serde_json::to_string(&record).expect("encode")).expect("write");
    let store = Arc::new(FileTokenStore::new(&path));
    let (_, mut session) = session_with(store.clone());

    // When: The session is restored
    let outcome = session.restore();

    // Then: The user and token come back
    assert_eq!(outcome, RestoreOutcome::Restored);
    assert_eq!(session.token(), Some("persisted-token"));
    assert_eq!(store.bearer_token().as_deref(), Some("persisted-token"));
}

#[tokio::test]
async fn when_session_ttl_overflows_the_calendar_login_still_authenticates() {
    // Given: A TTL that reaches far past the last representable date
    let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
    let gateway = Arc::new(MemoryGateway::new());
    let mut session = Session::new(
        gateway,
        store.clone(),
        Duration::from_secs(1_000_000_000_000),
    );

    // When: The user logs in
    let ok = session.login("arjun@tickr.io", "secret1").await;

    // Then: Expiry saturates instead of collapsing to the issue time
    assert!(ok);
    assert!(session.is_authenticated());
    assert!(session.expires_at().expect("expiry") > UtcDateTime::now());
    assert!(store.bearer_token().is_some());
}

/// Store whose reads always fail with an I/O error.
#[derive(Default)]
struct UnreadableStore {
    cleared: AtomicBool,
}

impl TokenStore for UnreadableStore {
    fn load(&self) -> Result<Option<StoredSession>, SessionError> {
        Err(SessionError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "permission denied",
        )))
    }

    fn save(&self, _session: &StoredSession) -> Result<(), SessionError> {
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.cleared.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn when_session_storage_cannot_be_read_record_is_left_in_place() {
    // Given: A store that fails to read
    let store = Arc::new(UnreadableStore::default());
    let (_, mut session) = session_with(store.clone());

    // When: The session is restored
    let outcome = session.restore();

    // Then: The user starts logged out but nothing is deleted
    assert_eq!(outcome, RestoreOutcome::Empty);
    assert_eq!(session.user(), None);
    assert!(!store.cleared.load(Ordering::SeqCst));
}
