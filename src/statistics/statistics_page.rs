//! The statistics page: overall total, totals per category, the top
//! categories and charts of daily and monthly totals.

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
    html::{
        HeadElement, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, format_currency,
    },
    navigation::NavBar,
    statistics::{
        Statistics, aggregate_by_date, aggregate_by_month,
        chart_data::ChartData,
        charts::{StatisticsChart, charts_script, charts_view, totals_bar_chart},
        get_statistics,
    },
    user::UserID,
};

/// The state needed for the statistics page.
#[derive(Debug, Clone)]
pub struct StatisticsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StatisticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display the logged in user's statistics.
pub async fn get_statistics_page(
    State(state): State<StatisticsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let (statistics, daily, monthly) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        (
            get_statistics(user_id, &connection)?,
            aggregate_by_date(user_id, &connection)?,
            aggregate_by_month(user_id, &connection)?,
        )
    };

    let charts = [
        StatisticsChart {
            id: "daily-chart",
            options: totals_bar_chart("Daily Totals", "Total", ChartData::from(daily.as_slice()))
                .to_string(),
        },
        StatisticsChart {
            id: "monthly-chart",
            options: totals_bar_chart(
                "Monthly Totals",
                "Total",
                ChartData::from(monthly.as_slice()),
            )
            .to_string(),
        },
    ];

    Ok(statistics_view(&statistics, &charts).into_response())
}

fn statistics_view(statistics: &Statistics, charts: &[StatisticsChart]) -> Markup {
    let nav_bar = NavBar::new(endpoints::STATISTICS_VIEW).into_html();
    let category_rows: Vec<(&str, f64)> = statistics
        .by_category
        .iter()
        .map(|(category, total)| (category.as_str(), *total))
        .collect();
    let top_rows: Vec<(&str, f64)> = statistics
        .top_categories
        .iter()
        .map(|category_total| (category_total.category.as_str(), category_total.total))
        .collect();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl space-y-6"
            {
                h1 class="text-xl font-bold" { "Statistics" }

                p id="total-expenses" class="text-lg"
                {
                    "Total: " (format_currency(statistics.total_expenses))
                }

                @if statistics.by_category.is_empty() {
                    p { "No transactions yet." }
                } @else {
                    (charts_view(charts))

                    div class="grid grid-cols-1 lg:grid-cols-2 gap-4"
                    {
                        (category_table("By Category", "by-category", &category_rows))
                        (category_table("Top Categories", "top-categories", &top_rows))
                    }
                }
            }
        }
    );

    let head_elements = [
        HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
        charts_script(charts),
    ];

    base("Statistics", &head_elements, &content)
}

fn category_table(title: &str, id: &str, rows: &[(&str, f64)]) -> Markup {
    html!(
        section class="w-full overflow-x-auto dark:bg-gray-800"
        {
            h2 class="text-lg font-semibold mb-2" { (title) }

            table id=(id) class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class="px-6 py-3 text-right" { "Total" }
                    }
                }

                tbody
                {
                    @for (category, total) in rows {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE) { (category) }
                            td class="px-6 py-4 text-right" { (format_currency(*total)) }
                        }
                    }
                }
            }
        }
    )
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use rusqlite::Connection;
    use scraper::{Html, Selector};

    use crate::{
        db::initialize,
        test_utils::{assert_valid_html, parse_html_document},
        transaction::{NewTransaction, create_transaction},
        user::test_utils::insert_test_user,
    };

    use super::{StatisticsState, get_statistics_page};

    fn column_text(document: &Html, table_id: &str) -> Vec<String> {
        let selector = Selector::parse(&format!("table#{table_id} tbody tr td:first-child")).unwrap();
        document
            .select(&selector)
            .map(|cell| cell.text().collect::<String>().trim().to_owned())
            .collect()
    }

    #[tokio::test]
    async fn page_shows_category_tables_and_charts() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let alice = insert_test_user("alice", &conn);
        for (category, amount) in [
            ("Salary", 100.0),
            ("Food", -10.0),
            ("Books", -1.0),
            ("Rent", -50.0),
            ("Gifts", 5.0),
            ("Games", -20.0),
        ] {
            create_transaction(
                NewTransaction::new(alice, "2024-03-01", category, amount, "Cash"),
                &conn,
            )
            .unwrap();
        }
        let state = StatisticsState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = get_statistics_page(State(state), Extension(alice))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert_eq!(
            column_text(&document, "by-category"),
            vec!["Books", "Food", "Games", "Gifts", "Rent", "Salary"]
        );
        assert_eq!(
            column_text(&document, "top-categories"),
            vec!["Salary", "Gifts", "Books", "Food", "Games"]
        );
        for chart_id in ["daily-chart", "monthly-chart"] {
            let selector = Selector::parse(&format!("div#{chart_id}")).unwrap();
            assert!(document.select(&selector).next().is_some(), "missing {chart_id}");
        }
    }

    #[tokio::test]
    async fn page_without_transactions_shows_message() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let alice = insert_test_user("alice", &conn);
        let state = StatisticsState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = get_statistics_page(State(state), Extension(alice))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert!(document.select(&Selector::parse("table").unwrap()).next().is_none());
    }
}
