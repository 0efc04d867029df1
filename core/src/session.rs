//! Session / token lifecycle.
//!
//! `SessionManager` is the only component that reads or writes the
//! `access_token`, `token_type` and `expires_at` storage keys.
//!
//! State machine:
//!
//! ```text
//!              establish (login)
//!   Anonymous ------------------> Authenticated
//!       ^                              |
//!       +------------------------------+
//!        logout | expiry seen by is_authenticated | 401 in the gateway
//! ```
//!
//! `is_authenticated` is a transition, not a query: when it finds an elapsed
//! expiry it clears the session before answering `false`. Use `peek_expiry`
//! for a side-effect-free read. There is no background timer and no refresh
//! transition.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::error::ApiError;
use crate::storage::{KeyValueStore, StorageError};
use crate::types::LoginResponse;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const TOKEN_TYPE_KEY: &str = "token_type";
pub const EXPIRES_AT_KEY: &str = "expires_at";

const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Source of wall-clock time in epoch milliseconds.
pub trait Clock {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Settable clock; clones share the same instant.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Rc<Cell<i64>>);

impl ManualClock {
    pub fn new(now_millis: i64) -> Self {
        Self(Rc::new(Cell::new(now_millis)))
    }

    pub fn set(&self, now_millis: i64) {
        self.0.set(now_millis);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.0.set(self.0.get() + secs * 1000);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.0.get()
    }
}

/// Persisted credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: Option<i64>,
}

impl Session {
    /// Valid iff a token is present and the expiry, if any, lies in the future.
    pub fn is_valid_at(&self, now_millis: i64) -> bool {
        !self.access_token.is_empty() && self.expires_at.map_or(true, |at| now_millis < at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
}

/// Result of a side-effect-free expiry check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    /// No token stored.
    Anonymous,
    /// Token stored without an expiry.
    Unbounded,
    /// Token valid until the given epoch millisecond.
    ValidUntil(i64),
    /// Expiry elapsed, or the stored value is unreadable.
    Expired,
}

pub struct SessionManager {
    store: Box<dyn KeyValueStore>,
    clock: Box<dyn Clock>,
}

impl SessionManager {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self::with_clock(store, SystemClock)
    }

    pub fn with_clock(store: impl KeyValueStore + 'static, clock: impl Clock + 'static) -> Self {
        Self {
            store: Box::new(store),
            clock: Box::new(clock),
        }
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Persist a token grant. This is the Anonymous -> Authenticated edge.
    pub fn establish(&mut self, grant: &LoginResponse) -> Result<Session, ApiError> {
        let token_type = if grant.token_type.trim().is_empty() {
            DEFAULT_TOKEN_TYPE.to_string()
        } else {
            grant.token_type.clone()
        };
        let expires_at = grant.expires_in.map(|secs| {
            self.clock
                .now_millis()
                .saturating_add(secs.saturating_mul(1000))
        });

        if let Err(e) = self.write_grant(&grant.access_token, &token_type, expires_at) {
            // A token without its expiry would read as unbounded.
            self.logout();
            return Err(ApiError::Storage(e.to_string()));
        }

        tracing::info!(?expires_at, "session established");
        Ok(Session {
            access_token: grant.access_token.clone(),
            token_type,
            expires_at,
        })
    }

    fn write_grant(
        &mut self,
        access_token: &str,
        token_type: &str,
        expires_at: Option<i64>,
    ) -> Result<(), StorageError> {
        self.store.set(ACCESS_TOKEN_KEY, access_token)?;
        self.store.set(TOKEN_TYPE_KEY, token_type)?;
        match expires_at {
            Some(at) => self.store.set(EXPIRES_AT_KEY, &at.to_string()),
            None => self.store.remove(EXPIRES_AT_KEY),
        }
    }

    /// Whether the caller is authenticated right now.
    ///
    /// Side effect: an elapsed expiry triggers `logout` before returning
    /// `false` (Authenticated -> Anonymous).
    pub fn is_authenticated(&mut self) -> bool {
        self.enforce_expiry()
    }

    /// Pure expiry check; never touches storage.
    pub fn peek_expiry(&self) -> ExpiryStatus {
        let Some(token) = self.store.get(ACCESS_TOKEN_KEY) else {
            return ExpiryStatus::Anonymous;
        };
        if token.is_empty() {
            return ExpiryStatus::Anonymous;
        }
        match self.store.get(EXPIRES_AT_KEY) {
            None => ExpiryStatus::Unbounded,
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(at) if self.clock.now_millis() < at => ExpiryStatus::ValidUntil(at),
                _ => ExpiryStatus::Expired,
            },
        }
    }

    /// Evict an expired session. Returns whether a valid session remains.
    pub fn enforce_expiry(&mut self) -> bool {
        match self.peek_expiry() {
            ExpiryStatus::Anonymous => false,
            ExpiryStatus::Expired => {
                tracing::warn!("stored session expired, logging out");
                self.logout();
                false
            }
            ExpiryStatus::Unbounded | ExpiryStatus::ValidUntil(_) => true,
        }
    }

    /// Clear every session key. Idempotent; storage failures are logged.
    pub fn logout(&mut self) {
        for key in [ACCESS_TOKEN_KEY, TOKEN_TYPE_KEY, EXPIRES_AT_KEY] {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!(key, error = %e, "failed to clear session key");
            }
        }
        tracing::debug!("session cleared");
    }

    /// Stored access token, without any expiry evaluation.
    pub fn token(&self) -> Option<String> {
        self.store
            .get(ACCESS_TOKEN_KEY)
            .filter(|token| !token.is_empty())
    }

    /// Stored session, without any expiry evaluation.
    pub fn session(&self) -> Option<Session> {
        let access_token = self.token()?;
        let token_type = self
            .store
            .get(TOKEN_TYPE_KEY)
            .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string());
        let expires_at = self
            .store
            .get(EXPIRES_AT_KEY)
            .and_then(|raw| raw.trim().parse().ok());
        Some(Session {
            access_token,
            token_type,
            expires_at,
        })
    }

    pub fn state(&self) -> AuthState {
        match self.peek_expiry() {
            ExpiryStatus::Unbounded | ExpiryStatus::ValidUntil(_) => AuthState::Authenticated,
            ExpiryStatus::Anonymous | ExpiryStatus::Expired => AuthState::Anonymous,
        }
    }
}
