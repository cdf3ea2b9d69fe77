//! The state shared by every route handler.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{Error, auth::DEFAULT_COOKIE_DURATION, db::initialize};

/// The state of the web server.
///
/// Handlers take the parts they need through their own state types, each of
/// which implements [FromRef] for this struct.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Encrypts and signs the auth cookie.
    pub cookie_key: Key,

    /// How long a log-in lasts without any requests.
    pub cookie_duration: Duration,

    /// Canonical timezone name used for "today", e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The ledger database. Each request holds the lock for the duration of
    /// one ledger operation.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create the server state and the ledger tables in `db_connection`, if
    /// they do not exist yet.
    ///
    /// The cookie key is derived from `cookie_secret`, so log-ins survive a
    /// restart as long as the secret stays the same.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derive a 64 byte cookie key from an arbitrary length `secret`.
pub fn create_cookie_key(secret: &str) -> Key {
    Key::from(&Sha512::digest(secret))
}
