//! Read-your-own-write consistency.
//!
//! After a user writes a review, their session is stamped with the write time.
//! For a configured window afterwards their reads go to the master store, so
//! they see their own review even if the default store (a replica) lags.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Session key holding the time of the user's last successful write.
pub const LAST_WRITE_KEY: &str = "last_write_time";

/// Per-user session state: short-lived key/timestamp pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    values: BTreeMap<String, DateTime<Utc>>,
}

impl Session {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a timestamp by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<DateTime<Utc>> {
        self.values.get(key).copied()
    }

    /// Set a timestamp, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, at: DateTime<Utc>) {
        self.values.insert(key.into(), at);
    }

    /// Time of the last write made through this session.
    #[must_use]
    pub fn last_write_time(&self) -> Option<DateTime<Utc>> {
        self.get(LAST_WRITE_KEY)
    }

    /// Whether the session holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Record a successful write in the caller's session.
pub fn stamp_write(session: &mut Session, now: DateTime<Utc>) {
    session.set(LAST_WRITE_KEY, now);
}

/// Which store a read should consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadTarget {
    /// The authoritative store that receives writes.
    Master,
    /// The possibly stale default store.
    Default,
}

impl ReadTarget {
    /// Database alias of the target.
    #[must_use]
    pub const fn alias(self) -> &'static str {
        match self {
            Self::Master => "reviews",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for ReadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alias())
    }
}

/// How long after a write a user's reads stay bound to the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteBindWindow(Duration);

impl WriteBindWindow {
    /// Window of the given length.
    #[must_use]
    pub const fn new(length: Duration) -> Self {
        Self(length)
    }

    /// Window of `seconds` seconds, saturating at the longest representable
    /// duration.
    #[must_use]
    pub fn from_secs(seconds: i64) -> Self {
        Self(Duration::try_seconds(seconds).unwrap_or(Duration::MAX))
    }

    /// Window length.
    #[must_use]
    pub const fn length(&self) -> Duration {
        self.0
    }

    /// Route a read given the session's last write time.
    ///
    /// A missing write time behaves as infinitely in the past. A write time
    /// in the future (clock skew) still binds to the master.
    #[must_use]
    pub fn route_for_read(&self, last_write: Option<DateTime<Utc>>, now: DateTime<Utc>) -> ReadTarget {
        match last_write {
            Some(written) if now.signed_duration_since(written) <= self.0 => ReadTarget::Master,
            _ => ReadTarget::Default,
        }
    }
}

/// Route a read for `session` under `window`.
#[must_use]
pub fn route_for_read(session: &Session, window: WriteBindWindow, now: DateTime<Utc>) -> ReadTarget {
    window.route_for_read(session.last_write_time(), now)
}
