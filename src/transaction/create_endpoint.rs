//! Defines the endpoint for recording a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, endpoints,
    html::form_error,
    internal_server_error::get_internal_server_error_redirect,
    transaction::{NewTransaction, create_transaction},
    user::UserID,
};

pub const INVALID_AMOUNT_ERROR_MSG: &str = "Amount must be a number, e.g. -12.50 or 100.";

/// The state needed to record a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for recording a transaction.
///
/// The amount is kept as text so that a value that is not a number can be
/// reported back to the user instead of failing extraction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// The date of the transaction, stored as entered.
    pub date: String,
    /// The spending category, e.g. "Food".
    pub category: String,
    /// The amount as entered. Negative for money spent.
    pub amount: String,
    /// How the transaction was paid, e.g. "Cash".
    pub payment_method: String,
    /// Optional notes, stored as the description.
    pub notes: Option<String>,
}

/// A route handler for recording a transaction for the logged in user,
/// redirects to the transactions view on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let amount = match form.amount.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() => amount,
        _ => {
            tracing::debug!("Rejected transaction amount {:?}", form.amount);
            return (
                StatusCode::BAD_REQUEST,
                form_error(Some(INVALID_AMOUNT_ERROR_MSG)),
            )
                .into_response();
        }
    };

    let description = form
        .notes
        .map(|notes| notes.trim().to_owned())
        .filter(|notes| !notes.is_empty());
    let transaction = NewTransaction::new(
        user_id,
        form.date.trim(),
        form.category.trim(),
        amount,
        form.payment_method.trim(),
    )
    .description(description);

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return get_internal_server_error_redirect();
        }
    };

    if let Err(error) = create_transaction(transaction, &connection) {
        tracing::error!("could not create transaction: {error}");
        return get_internal_server_error_redirect();
    }

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
