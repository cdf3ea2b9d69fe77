//! A personal finance tracker: users register, log in, record transactions,
//! transfer money to each other and view spending statistics.
//!
//! This library provides a REST API that directly serves HTML pages, backed
//! by a SQLite ledger of users, transactions and transfers.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::response::{IntoResponse, Response};
use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod password;
mod routing;
mod statistics;
mod timezone;
mod transaction;
mod transfer;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use database_id::{DatabaseId, TransactionId, TransferId};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::PasswordHash;
pub use routing::build_router;
pub use statistics::{
    CategoryTotal, DateTotal, MonthTotal, Statistics, Summary, aggregate_by_date,
    aggregate_by_month, get_statistics, get_summary,
};
pub use timezone::get_local_offset;
pub use transaction::{
    NewTransaction, Transaction, count_transactions, create_transaction, delete_transaction,
    get_transaction, get_transactions_for_user,
};
pub use transfer::{Transfer, count_transfers, create_transfer, get_transfer};
pub use user::{
    NewUser, User, UserID, authenticate, count_users, get_user_by_id, get_user_by_username,
    register_user, verify_credentials,
};

use crate::{internal_server_error::InternalServerError, not_found::get_404_not_found_response};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A user tried to register with a username that is already taken.
    ///
    /// Usernames are compared exactly, so "alice" and "Alice" are distinct.
    #[error("the username already exists")]
    DuplicateUsername,

    /// No user matched the username and password combination.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// A transfer was requested for zero or a negative amount.
    #[error("transfer amount must be greater than zero")]
    InvalidAmount,

    /// A user ID did not refer to a registered user, e.g. the receiver of a
    /// transfer.
    #[error("the user ID does not refer to a registered user")]
    InvalidUser,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing the date in the cookie or creating the new
    /// expiry date time.
    #[error("could not format or parse an expiry date time: {0}")]
    InvalidDateFormat(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The database could not complete the operation. Nothing from the failed
    /// operation was committed.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                Some(ref desc),
            ) if desc.ends_with("user.username") => Error::DuplicateUsername,
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidUser,
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::StorageUnavailable(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}
