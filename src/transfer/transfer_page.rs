//! The page for sending money to another user and the endpoint that performs the transfer.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, endpoints,
    html::{
        FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base,
        form_error, submit_button,
    },
    internal_server_error::get_internal_server_error_redirect,
    navigation::NavBar,
    transfer::{TRANSFER_CATEGORY, create_transfer},
    user::{UserID, UserSummary, get_other_users},
};

pub const INVALID_AMOUNT_ERROR_MSG: &str = "Transfer amount must be greater than zero.";
pub const AMOUNT_NOT_A_NUMBER_ERROR_MSG: &str = "Transfer amount must be a number.";
pub const INVALID_RECEIVER_ERROR_MSG: &str = "The selected recipient does not exist.";

/// The state needed for the transfer page and endpoint.
#[derive(Debug, Clone)]
pub struct TransferState {
    /// The database connection for listing recipients and recording transfers.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransferState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the transfer form listing every other user as a recipient.
pub async fn get_transfer_page(
    State(state): State<TransferState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let recipients = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_other_users(user_id, &connection)?
    };

    Ok(transfer_view(&recipients).into_response())
}

fn transfer_view(recipients: &[UserSummary]) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSFER_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class=(FORM_CONTAINER_STYLE)
            {
                h1 class="text-xl font-bold my-4" { "Transfer Money" }

                @if recipients.is_empty() {
                    p { "There is nobody to send money to yet." }
                } @else {
                    (transfer_form(recipients))
                }
            }
        }
    );

    base("Transfer", &[], &content)
}

fn transfer_form(recipients: &[UserSummary]) -> Markup {
    html!(
        form
            hx-post=(endpoints::TRANSFER_API)
            hx-target="#form-error"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="receiver_id" class=(FORM_LABEL_STYLE) { "Recipient" }

                select name="receiver_id" id="receiver_id" class=(FORM_TEXT_INPUT_STYLE) required
                {
                    @for recipient in recipients {
                        option value=(recipient.id.as_i64()) { (recipient.username) }
                    }
                }
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    type="number"
                    step="0.01"
                    min="0.01"
                    name="amount"
                    id="amount"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required;
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    type="text"
                    name="description"
                    id="description"
                    placeholder=(TRANSFER_CATEGORY)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div id="form-error" {}

            (submit_button("Send"))
        }
    )
}

/// The form data for a transfer.
#[derive(Debug, Deserialize)]
pub struct TransferForm {
    /// The ID of the user receiving the money.
    pub receiver_id: i64,
    /// The amount to send, as entered. Must parse to a positive number.
    pub amount: String,
    /// Notes for both legs of the transfer. Defaults to the transfer category when blank.
    pub description: Option<String>,
}

/// Send money from the logged in user to the selected recipient, redirects to
/// the transactions view on success.
///
/// A blank description is replaced with "Transfer".
pub async fn create_transfer_endpoint(
    State(state): State<TransferState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransferForm>,
) -> Response {
    let Ok(amount) = form.amount.trim().parse::<f64>() else {
        return (
            StatusCode::BAD_REQUEST,
            form_error(Some(AMOUNT_NOT_A_NUMBER_ERROR_MSG)),
        )
            .into_response();
    };

    let description = form
        .description
        .as_deref()
        .map(str::trim)
        .filter(|description| !description.is_empty())
        .unwrap_or(TRANSFER_CATEGORY);
    let receiver_id = UserID::new(form.receiver_id);

    let result = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)
        .and_then(|connection| {
            create_transfer(user_id, receiver_id, amount, description, &connection)
        });

    match result {
        Ok(_) => (
            HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::InvalidAmount) => (
            StatusCode::BAD_REQUEST,
            form_error(Some(INVALID_AMOUNT_ERROR_MSG)),
        )
            .into_response(),
        Err(Error::InvalidUser) => (
            StatusCode::BAD_REQUEST,
            form_error(Some(INVALID_RECEIVER_ERROR_MSG)),
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Transfer from user {user_id} to user {receiver_id} failed: {error}");
            get_internal_server_error_redirect()
        }
    }
}
