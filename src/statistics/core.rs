//! Aggregation queries over a user's transactions.
//!
//! Every query sums the signed amounts, so transfer legs and income count
//! alongside spending.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;

use crate::{Error, user::UserID};

/// How many categories [Statistics::top_categories] holds at most.
pub const TOP_CATEGORY_COUNT: usize = 5;

/// The sum of a user's transactions on one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateTotal {
    /// The date exactly as stored on the transactions.
    pub date: String,
    /// The sum of the amounts on `date`.
    pub total: f64,
}

/// The sum of a user's transactions in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    /// The month as "YYYY-MM", or `None` for transactions whose date does not
    /// start with a calendar date.
    pub month: Option<String>,
    /// The sum of the amounts in `month`.
    pub total: f64,
}

/// The sum of a user's transactions in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// The category as entered on the transactions.
    pub category: String,
    /// The sum of the amounts in the category.
    pub total: f64,
}

/// Summary statistics for a user's transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    /// The sum of all of the user's transaction amounts.
    pub total_expenses: f64,
    /// The sum of the amounts in each category.
    pub by_category: BTreeMap<String, f64>,
    /// Up to [TOP_CATEGORY_COUNT] categories with the largest sums, largest
    /// first. Categories with equal sums are ordered by name.
    pub top_categories: Vec<CategoryTotal>,
}

/// The totals shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    /// The sum of all of the user's transaction amounts.
    pub total: f64,
    /// The sum of the amounts paid with "UPI".
    pub total_upi: f64,
    /// The sum of the amounts paid with "Cash".
    pub total_cash: f64,
}

/// Sum the user's transactions for each distinct date string, ordered by date.
///
/// # Errors
/// This function will return a [Error::StorageUnavailable] if there is an SQL error.
pub fn aggregate_by_date(user_id: UserID, connection: &Connection) -> Result<Vec<DateTotal>, Error> {
    connection
        .prepare(
            "SELECT date, SUM(amount) FROM \"transaction\"
             WHERE user_id = :user_id
             GROUP BY date
             ORDER BY date",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| {
            Ok(DateTotal {
                date: row.get(0)?,
                total: row.get(1)?,
            })
        })?
        .map(|maybe_total| maybe_total.map_err(Error::from))
        .collect()
}

/// Sum the user's transactions for each calendar month, ordered by month.
///
/// Transactions with a date SQLite cannot read are grouped under a `None`
/// month, which sorts first.
///
/// # Errors
/// This function will return a [Error::StorageUnavailable] if there is an SQL error.
pub fn aggregate_by_month(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<MonthTotal>, Error> {
    connection
        .prepare(
            "SELECT strftime('%Y-%m', date) AS month, SUM(amount) FROM \"transaction\"
             WHERE user_id = :user_id
             GROUP BY month
             ORDER BY month",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| {
            Ok(MonthTotal {
                month: row.get(0)?,
                total: row.get(1)?,
            })
        })?
        .map(|maybe_total| maybe_total.map_err(Error::from))
        .collect()
}

/// Get the total, the per category sums and the top categories for the user.
///
/// A user without transactions has a total of zero and no categories.
///
/// # Errors
/// This function will return a [Error::StorageUnavailable] if there is an SQL error.
pub fn get_statistics(user_id: UserID, connection: &Connection) -> Result<Statistics, Error> {
    let total_expenses = connection.query_row(
        "SELECT COALESCE(SUM(amount), 0.0) FROM \"transaction\" WHERE user_id = :user_id",
        &[(":user_id", &user_id.as_i64())],
        |row| row.get(0),
    )?;

    let category_totals: Vec<CategoryTotal> = connection
        .prepare(
            "SELECT category, SUM(amount) AS total FROM \"transaction\"
             WHERE user_id = :user_id
             GROUP BY category
             ORDER BY total DESC, category ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| {
            Ok(CategoryTotal {
                category: row.get(0)?,
                total: row.get(1)?,
            })
        })?
        .collect::<Result<_, _>>()?;

    let by_category = category_totals
        .iter()
        .map(|category_total| (category_total.category.clone(), category_total.total))
        .collect();
    let top_categories = category_totals
        .into_iter()
        .take(TOP_CATEGORY_COUNT)
        .collect();

    Ok(Statistics {
        total_expenses,
        by_category,
        top_categories,
    })
}

/// Get the user's overall, UPI and Cash totals.
///
/// # Errors
/// This function will return a [Error::StorageUnavailable] if there is an SQL error.
pub fn get_summary(user_id: UserID, connection: &Connection) -> Result<Summary, Error> {
    connection
        .query_row(
            "SELECT
                COALESCE(SUM(amount), 0.0),
                COALESCE(SUM(CASE WHEN payment_method = 'UPI' THEN amount END), 0.0),
                COALESCE(SUM(CASE WHEN payment_method = 'Cash' THEN amount END), 0.0)
             FROM \"transaction\" WHERE user_id = :user_id",
            &[(":user_id", &user_id.as_i64())],
            |row| {
                Ok(Summary {
                    total: row.get(0)?,
                    total_upi: row.get(1)?,
                    total_cash: row.get(2)?,
                })
            },
        )
        .map_err(|error| error.into())
}
