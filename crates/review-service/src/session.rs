//! Per-user sessions.
//!
//! Clients carry their session id in the `x-session-id` header. The session
//! remembers when the user last wrote a review, which decides whether their
//! reads must stay on the master store.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{DateTime, Duration, Utc};

use review_core::{stamp_write, Session, SessionId};

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the session id in both directions.
pub const SESSION_HEADER: &str = "x-session-id";

/// Errors raised when persisting a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No room for another live session.
    #[error("session store full: {max} live sessions")]
    Full {
        /// Configured session limit.
        max: usize,
    },
}

/// Storage for session state.
pub trait SessionStore: Send + Sync {
    /// Load a session; unknown or expired sessions come back empty.
    fn load(&self, id: SessionId, now: DateTime<Utc>) -> Session;

    /// Persist a session and refresh its expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be stored.
    fn save(&self, id: SessionId, session: &Session, now: DateTime<Utc>) -> Result<(), SessionError>;
}

struct StoredSession {
    session: Session,
    expires_at: DateTime<Utc>,
}

/// In-memory session store with idle expiry and a size limit.
pub struct MemorySessionStore {
    ttl: Duration,
    max_sessions: usize,
    sessions: RwLock<HashMap<SessionId, StoredSession>>,
}

impl MemorySessionStore {
    /// Create a store whose sessions expire `ttl` after their last save.
    #[must_use]
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            ttl,
            max_sessions,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Number of sessions held, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no sessions are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired sessions and return how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, stored| stored.expires_at > now);
        before - sessions.len()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, id: SessionId, now: DateTime<Utc>) -> Session {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions
            .get(&id)
            .filter(|stored| stored.expires_at > now)
            .map(|stored| stored.session.clone())
            .unwrap_or_default()
    }

    fn save(&self, id: SessionId, session: &Session, now: DateTime<Utc>) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);

        if !sessions.contains_key(&id) && sessions.len() >= self.max_sessions {
            sessions.retain(|_, stored| stored.expires_at > now);
            if sessions.len() >= self.max_sessions {
                return Err(SessionError::Full {
                    max: self.max_sessions,
                });
            }
        }

        sessions.insert(
            id,
            StoredSession {
                session: session.clone(),
                expires_at: now
                    .checked_add_signed(self.ttl)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC),
            },
        );
        Ok(())
    }
}

/// Stamp a successful write into the caller's session.
///
/// Failing to persist the stamp is logged, never surfaced: the write itself
/// already succeeded.
pub fn record_write(store: &dyn SessionStore, id: SessionId, now: DateTime<Utc>) {
    let mut session = store.load(id, now);
    stamp_write(&mut session, now);
    if let Err(e) = store.save(id, &session, now) {
        tracing::warn!(session_id = %id, error = %e, "Failed to persist write stamp");
    }
}

/// The caller's session, resolved from the `x-session-id` header.
#[derive(Debug, Clone, Copy)]
pub struct SessionHandle {
    /// Session id to use for this request.
    pub id: SessionId,
}

impl FromRequestParts<Arc<AppState>> for SessionHandle {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let existing = parts
                .headers
                .get(SESSION_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<SessionId>().ok());

            let id = existing.unwrap_or_else(|| {
                let id = SessionId::generate();
                tracing::debug!(session_id = %id, "Issued new session");
                id
            });

            Ok(SessionHandle { id })
        })
    }
}
