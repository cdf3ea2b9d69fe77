//! Defines the route handler for the page that lists a user's transactions and
//! the form for recording new ones.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState, Error,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_currency, submit_button, text_input,
    },
    navigation::NavBar,
    timezone::local_today,
    transaction::{Transaction, get_transactions_for_user},
    user::UserID,
};

/// The format of the default date in the transaction form, e.g. "2024-03-01".
const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The payment methods offered in the add transaction form.
const PAYMENT_METHODS: [&str; 3] = ["UPI", "Cash", "Card"];

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsViewState {
    /// The database connection for managing transactions.
    db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    local_timezone: String,
}

impl FromRef<AppState> for TransactionsViewState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render the logged in user's transactions and the add transaction form.
pub async fn get_transactions_page(
    State(state): State<TransactionsViewState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_transactions_for_user(user_id, &connection)?
    };

    let today = local_today(&state.local_timezone);

    Ok(transactions_view(&transactions, today).into_response())
}

fn transactions_view(transactions: &[Transaction], today: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let today = today.format(DATE_FORMAT).unwrap_or_default();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Transactions" }

                (transactions_table(transactions))
            }

            section class=(FORM_CONTAINER_STYLE)
            {
                h2 class="text-lg font-bold my-4" { "Add Transaction" }

                (add_transaction_form(&today))
            }
        }
    );

    base("Transactions", &[], &content)
}

fn transactions_table(transactions: &[Transaction]) -> Markup {
    html!(
        div class="w-full overflow-x-auto dark:bg-gray-800"
        {
            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class="px-6 py-3 text-right" { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Payment Method" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Notes" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for transaction in transactions {
                        (transaction_row(transaction))
                    }

                    @if transactions.is_empty() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td colspan="6" class="px-6 py-4 text-center"
                            {
                                "No transactions yet. Add one with the form below."
                            }
                        }
                    }
                }
            }
        }
    )
}

fn transaction_row(transaction: &Transaction) -> Markup {
    let delete_url = format_endpoint(endpoints::DELETE_TRANSACTION, transaction.id);

    html!(
        tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
        {
            td class=(TABLE_CELL_STYLE) { (transaction.date) }
            td class=(TABLE_CELL_STYLE) { (transaction.category) }
            td class="px-6 py-4 text-right" { (format_currency(transaction.amount)) }
            td class=(TABLE_CELL_STYLE) { (transaction.payment_method) }
            td class=(TABLE_CELL_STYLE) { (transaction.description.as_deref().unwrap_or_default()) }
            td class=(TABLE_CELL_STYLE)
            {
                button
                    type="button"
                    hx-post=(delete_url)
                    hx-confirm="Are you sure you want to delete this transaction?"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
    )
}

fn add_transaction_form(today: &str) -> Markup {
    html!(
        form
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-target="#form-error"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="w-full space-y-4 md:space-y-6"
        {
            (text_input("Date", "date", "date", today))
            (text_input("Category", "category", "text", ""))

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    type="number"
                    step="0.01"
                    name="amount"
                    id="amount"
                    placeholder="Negative for spending, e.g. -12.50"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required;
            }

            div
            {
                label for="payment_method" class=(FORM_LABEL_STYLE) { "Payment Method" }

                select name="payment_method" id="payment_method" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for method in PAYMENT_METHODS {
                        option value=(method) { (method) }
                    }
                }
            }

            div
            {
                label for="notes" class=(FORM_LABEL_STYLE) { "Notes" }

                input type="text" name="notes" id="notes" class=(FORM_TEXT_INPUT_STYLE);
            }

            div id="form-error" {}

            (submit_button("Add Transaction"))
        }
    )
}
