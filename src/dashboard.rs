//! The landing page for logged in users: a greeting and their running totals.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{PAGE_CONTAINER_STYLE, base, format_currency, link},
    navigation::NavBar,
    statistics::{Summary, get_summary},
    user::{UserID, get_user_by_id},
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading users and transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display a page with the user's overall, UPI and Cash totals.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let (username, summary) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let user = get_user_by_id(user_id, &connection)?;
        (user.username, get_summary(user_id, &connection)?)
    };

    Ok(dashboard_view(&username, &summary).into_response())
}

fn dashboard_view(username: &str, summary: &Summary) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();
    let cards = [
        ("total", "Total", summary.total),
        ("total-upi", "UPI", summary.total_upi),
        ("total-cash", "Cash", summary.total_cash),
    ];

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-6" { "Welcome, " (username) }

            div class="grid grid-cols-1 md:grid-cols-3 gap-4 w-full max-w-3xl"
            {
                @for (id, label, amount) in cards {
                    div
                        id=(id)
                        class="p-6 bg-white rounded-lg shadow dark:bg-gray-800"
                    {
                        h2 class="text-sm text-gray-500 dark:text-gray-400" { (label) }
                        p class="text-2xl font-semibold" { (format_currency(amount)) }
                    }
                }
            }

            p class="mt-6"
            {
                "Record spending on the "
                (link(endpoints::TRANSACTIONS_VIEW, "transactions page"))
                " or see where it goes on the "
                (link(endpoints::STATISTICS_VIEW, "statistics page"))
                "."
            }
        }
    );

    base("Dashboard", &[], &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        Error,
        db::initialize,
        test_utils::{assert_valid_html, parse_html_document},
        user::{UserID, test_utils::insert_test_user},
    };

    use super::{DashboardState, get_dashboard_page};

    fn get_test_state() -> (DashboardState, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = insert_test_user("alice", &conn);

        (
            DashboardState {
                db_connection: Arc::new(Mutex::new(conn)),
            },
            user_id,
        )
    }

    #[tokio::test]
    async fn dashboard_greets_user_and_shows_totals() {
        let (state, user_id) = get_test_state();

        let response = get_dashboard_page(State(state), Extension(user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let heading = document
            .select(&Selector::parse("h1").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert_eq!(heading.trim(), "Welcome, alice");
        for id in ["total", "total-upi", "total-cash"] {
            let selector = Selector::parse(&format!("div#{id}")).unwrap();
            assert!(document.select(&selector).next().is_some(), "missing card {id}");
        }
    }

    #[tokio::test]
    async fn dashboard_for_deleted_user_is_not_found() {
        let (state, _) = get_test_state();

        let result = get_dashboard_page(State(state), Extension(UserID::new(999))).await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }
}
