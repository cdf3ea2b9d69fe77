//! JSON chart data for the daily and monthly spending charts.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::Serialize;
use time::{
    Date, Month, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::{
    AppState, Error,
    statistics::{DateTotal, MonthTotal, aggregate_by_date, aggregate_by_month},
    user::UserID,
};

/// The label used for transactions whose month could not be determined.
pub const UNKNOWN_MONTH_LABEL: &str = "Unknown";

/// e.g. "Mar 2024"
const MONTH_LABEL_FORMAT: &[BorrowedFormatItem] = format_description!("[month repr:short] [year]");

/// Labels and amounts for a chart, in the same order and of the same length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    /// The x-axis labels, e.g. "2024-03-01" or "Mar 2024".
    pub labels: Vec<String>,
    /// The total for each label.
    pub amounts: Vec<f64>,
}

impl From<&[DateTotal]> for ChartData {
    fn from(totals: &[DateTotal]) -> Self {
        Self {
            labels: totals.iter().map(|total| total.date.clone()).collect(),
            amounts: totals.iter().map(|total| total.total).collect(),
        }
    }
}

impl From<&[MonthTotal]> for ChartData {
    fn from(totals: &[MonthTotal]) -> Self {
        Self {
            labels: totals
                .iter()
                .map(|total| format_month_label(total.month.as_deref()))
                .collect(),
            amounts: totals.iter().map(|total| total.total).collect(),
        }
    }
}

/// Turn a "YYYY-MM" month key into a label like "Mar 2024".
///
/// Missing or malformed keys get [UNKNOWN_MONTH_LABEL].
pub fn format_month_label(month: Option<&str>) -> String {
    month
        .and_then(parse_month_key)
        .and_then(|date| date.format(MONTH_LABEL_FORMAT).ok())
        .unwrap_or_else(|| UNKNOWN_MONTH_LABEL.to_owned())
}

fn parse_month_key(key: &str) -> Option<Date> {
    let (year, month) = key.split_once('-')?;
    let year = year.parse().ok()?;
    let month = Month::try_from(month.parse::<u8>().ok()?).ok()?;

    Date::from_calendar_date(year, month, 1).ok()
}

/// The state needed for the chart data endpoints.
#[derive(Debug, Clone)]
pub struct ChartDataState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ChartDataState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The logged in user's totals per date.
pub async fn get_daily_spending_data(
    State(state): State<ChartDataState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<ChartData>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let totals = aggregate_by_date(user_id, &connection)?;

    Ok(Json(ChartData::from(totals.as_slice())))
}

/// The logged in user's totals per month, labelled like "Mar 2024".
pub async fn get_monthly_spending_data(
    State(state): State<ChartDataState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<ChartData>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let totals = aggregate_by_month(user_id, &connection)?;

    Ok(Json(ChartData::from(totals.as_slice())))
}
