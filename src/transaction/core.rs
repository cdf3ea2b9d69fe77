//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::TransactionId, user::UserID};

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [NewTransaction::new].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// The amount of money spent or earned in this transaction.
    ///
    /// Negative amounts are outflows, positive amounts are inflows.
    pub amount: f64,
    /// A free-text label such as "Groceries" or "Salary".
    ///
    /// Transactions created by a transfer use the category "Transfer".
    pub category: String,
    /// When the transaction happened, e.g. "2024-03-01" or "2024-03-01 09:30:00".
    pub date: String,
    /// Optional notes about what the transaction was for.
    pub description: Option<String>,
    /// How the money moved, e.g. "UPI", "Cash" or "Transfer".
    pub payment_method: String,
}

/// The data for a transaction that has not been stored yet.
///
/// # Examples
///
/// ```ignore
/// use crate::transaction::NewTransaction;
///
/// let coffee = NewTransaction::new(user_id, "2025-01-15", "Food", -4.5, "Cash")
///     .description(Some("Flat white".to_owned()));
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct NewTransaction {
    /// The user that will own the transaction.
    pub user_id: UserID,
    /// When the transaction happened.
    ///
    /// This is stored as given. Dates in the form "YYYY-MM-DD" (optionally
    /// followed by a time) are grouped by month in the statistics.
    pub date: String,
    /// A free-text label for the transaction.
    pub category: String,
    /// The monetary amount of the transaction.
    ///
    /// Positive values represent income/credits, negative values represent
    /// expenses/debits.
    ///
    /// # Examples
    /// - `150.00` - Salary deposit
    /// - `-45.99` - Coffee shop purchase
    pub amount: f64,
    /// How the money moved.
    pub payment_method: String,
    /// Optional notes about the transaction.
    pub description: Option<String>,
}

impl NewTransaction {
    /// Create a new transaction without a description.
    pub fn new(
        user_id: UserID,
        date: &str,
        category: &str,
        amount: f64,
        payment_method: &str,
    ) -> Self {
        Self {
            user_id,
            date: date.to_owned(),
            category: category.to_owned(),
            amount,
            payment_method: payment_method.to_owned(),
            description: None,
        }
    }

    /// Set the description for the transaction.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database.
///
/// The caller is responsible for making sure `user_id` refers to the current user.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidUser] if `user_id` does not refer to a registered user,
/// - or [Error::StorageUnavailable] if there is some other SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, amount, category, date, description, payment_method)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, user_id, amount, category, date, description, payment_method",
        )?
        .query_row(
            (
                new_transaction.user_id.as_i64(),
                new_transaction.amount,
                new_transaction.category,
                new_transaction.date,
                new_transaction.description,
                new_transaction.payment_method,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::StorageUnavailable] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, user_id, amount, category, date, description, payment_method
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Get all of the transactions owned by `user_id`, oldest first.
///
/// # Errors
/// This function will return a [Error::StorageUnavailable] there is some SQL error.
pub fn get_transactions_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, amount, category, date, description, payment_method
             FROM \"transaction\" WHERE user_id = :user_id ORDER BY date, id",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

pub(crate) type RowsAffected = usize;

/// Delete the transaction `id` if it is owned by `user_id`.
///
/// Deleting a transaction that does not exist or belongs to another user
/// changes nothing and returns zero rows affected rather than an error.
///
/// # Errors
/// This function will return a [Error::StorageUnavailable] there is some SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = :id AND user_id = :user_id",
        &[(":id", &id), (":user_id", &user_id.as_i64())],
    )?;

    if rows_affected == 0 {
        tracing::debug!("User {user_id} tried to delete missing or unowned transaction {id}");
    }

    Ok(rows_affected)
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::StorageUnavailable] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                date TEXT NOT NULL,
                description TEXT,
                payment_method TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id)
                )",
        (),
    )?;

    // Add composite index used by the per-user aggregations.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let amount = row.get(2)?;
    let category = row.get(3)?;
    let date = row.get(4)?;
    let description = row.get(5)?;
    let payment_method = row.get(6)?;

    Ok(Transaction {
        id,
        user_id,
        amount,
        category,
        date,
        description,
        payment_method,
    })
}

// ============================================================================
// TESTS
// ============================================================================
