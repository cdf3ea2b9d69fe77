//! Transfers move money from one user to another.
//!
//! A transfer is stored as a row in the transfer table plus two transactions,
//! a debit leg on the sender and a credit leg on the receiver. The three rows
//! are written in a single database transaction so that either all of them
//! are visible or none are.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    database_id::TransferId,
    transaction::{NewTransaction, create_transaction},
    user::UserID,
};

/// The category given to both legs of a transfer.
pub const TRANSFER_CATEGORY: &str = "Transfer";
/// The payment method given to both legs of a transfer.
pub const TRANSFER_PAYMENT_METHOD: &str = "Transfer";

/// Format for transfer timestamps, e.g. "2024-03-01 09:30:00".
///
/// Matches the output of SQLite's `datetime('now')` so that transfer legs
/// sort and group alongside other transactions.
const TIMESTAMP_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// A record of money sent from one user to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    /// The ID of the transfer.
    pub id: TransferId,
    /// The user the money was taken from.
    pub sender_id: UserID,
    /// The user the money was given to.
    pub receiver_id: UserID,
    /// How much money was sent. Always greater than zero.
    pub amount: f64,
    /// Text shared by the transfer and both of its legs.
    pub description: Option<String>,
    /// When the transfer was made, in UTC.
    pub date: String,
}

/// Send `amount` from `sender_id` to `receiver_id`.
///
/// Inserts the transfer record, a transaction of `-amount` for the sender and
/// a transaction of `+amount` for the receiver, all sharing `description` and
/// the current UTC time. The writes are committed together; if any of them
/// fails the whole transfer is rolled back.
///
/// No balance is checked, so a transfer may take the sender below zero.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if `amount` is not a finite number greater than zero,
/// - [Error::InvalidUser] if either user ID does not refer to a registered user,
/// - or [Error::StorageUnavailable] if there is some other SQL error.
pub fn create_transfer(
    sender_id: UserID,
    receiver_id: UserID,
    amount: f64,
    description: &str,
    connection: &Connection,
) -> Result<TransferId, Error> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount);
    }

    let timestamp = OffsetDateTime::now_utc()
        .format(TIMESTAMP_FORMAT)
        .map_err(|error| Error::InvalidDateFormat(error.to_string()))?;

    // The transaction rolls back when dropped without being committed, which
    // covers every early return below.
    let transaction = connection.unchecked_transaction()?;

    transaction.execute(
        "INSERT INTO transfer (sender_id, receiver_id, amount, description, date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            sender_id.as_i64(),
            receiver_id.as_i64(),
            amount,
            description,
            &timestamp,
        ),
    )?;
    let transfer_id = transaction.last_insert_rowid();

    for (user_id, leg_amount) in [(sender_id, -amount), (receiver_id, amount)] {
        create_transaction(
            NewTransaction::new(
                user_id,
                &timestamp,
                TRANSFER_CATEGORY,
                leg_amount,
                TRANSFER_PAYMENT_METHOD,
            )
            .description(Some(description.to_owned())),
            &transaction,
        )?;
    }

    transaction.commit()?;

    tracing::info!("User {sender_id} transferred {amount} to user {receiver_id}");

    Ok(transfer_id)
}

/// Retrieve a transfer from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transfer,
/// - or [Error::StorageUnavailable] there is some other SQL error.
pub fn get_transfer(id: TransferId, connection: &Connection) -> Result<Transfer, Error> {
    connection
        .prepare(
            "SELECT id, sender_id, receiver_id, amount, description, date
             FROM transfer WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transfer_row)
        .map_err(|error| error.into())
}

/// Get the total number of transfers in the database.
///
/// # Errors
/// This function will return a [Error::StorageUnavailable] there is some SQL error.
pub fn count_transfers(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM transfer;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Create the transfer table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transfer_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transfer (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sender_id INTEGER NOT NULL,
                receiver_id INTEGER NOT NULL,
                amount REAL NOT NULL CHECK(amount > 0),
                description TEXT,
                date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY(sender_id) REFERENCES user(id),
                FOREIGN KEY(receiver_id) REFERENCES user(id)
                )",
        (),
    )?;

    Ok(())
}

fn map_transfer_row(row: &Row) -> Result<Transfer, rusqlite::Error> {
    Ok(Transfer {
        id: row.get(0)?,
        sender_id: UserID::new(row.get(1)?),
        receiver_id: UserID::new(row.get(2)?),
        amount: row.get(3)?,
        description: row.get(4)?,
        date: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        transaction::{
            NewTransaction, Transaction, count_transactions, create_transaction,
            get_transactions_for_user,
        },
        transfer::{TRANSFER_CATEGORY, count_transfers, create_transfer, get_transfer},
        user::{UserID, test_utils::insert_test_user},
    };

    use super::TRANSFER_PAYMENT_METHOD;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn transfer_creates_one_transfer_and_two_balanced_legs() {
        let conn = get_test_connection();
        let sender = insert_test_user("alice", &conn);
        let receiver = insert_test_user("bob", &conn);

        for amount in [0.01, 1.0, 30.0, 12345.67] {
            let transfers_before = count_transfers(&conn).unwrap();
            let transactions_before = count_transactions(&conn).unwrap();

            create_transfer(sender, receiver, amount, "Rent", &conn).unwrap();

            assert_eq!(count_transfers(&conn).unwrap(), transfers_before + 1);
            assert_eq!(count_transactions(&conn).unwrap(), transactions_before + 2);
        }

        let sender_total: f64 = get_transactions_for_user(sender, &conn)
            .unwrap()
            .iter()
            .map(|transaction| transaction.amount)
            .sum();
        let receiver_total: f64 = get_transactions_for_user(receiver, &conn)
            .unwrap()
            .iter()
            .map(|transaction| transaction.amount)
            .sum();
        assert!((sender_total + receiver_total).abs() < f64::EPSILON * 1e6);
    }

    #[test]
    fn transfer_legs_share_description_and_timestamp() {
        let conn = get_test_connection();
        let sender = insert_test_user("alice", &conn);
        let receiver = insert_test_user("bob", &conn);

        let transfer_id = create_transfer(sender, receiver, 30.0, "Dinner", &conn).unwrap();

        let transfer = get_transfer(transfer_id, &conn).unwrap();
        let debit = single_transaction(sender, &conn);
        let credit = single_transaction(receiver, &conn);

        assert_eq!(transfer.sender_id, sender);
        assert_eq!(transfer.receiver_id, receiver);
        assert_eq!(transfer.amount, 30.0);
        assert_eq!(transfer.description.as_deref(), Some("Dinner"));

        assert_eq!(debit.amount, -30.0);
        assert_eq!(credit.amount, 30.0);
        for leg in [&debit, &credit] {
            assert_eq!(leg.category, TRANSFER_CATEGORY);
            assert_eq!(leg.payment_method, TRANSFER_PAYMENT_METHOD);
            assert_eq!(leg.description.as_deref(), Some("Dinner"));
            assert_eq!(leg.date, transfer.date);
        }
    }

    fn single_transaction(user_id: UserID, conn: &Connection) -> Transaction {
        let mut transactions = get_transactions_for_user(user_id, conn).unwrap();
        assert_eq!(transactions.len(), 1, "want one transaction for user {user_id}");
        transactions.remove(0)
    }

    #[test]
    fn transfer_fails_on_zero_negative_or_non_finite_amount() {
        let conn = get_test_connection();
        let sender = insert_test_user("alice", &conn);
        let receiver = insert_test_user("bob", &conn);

        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let result = create_transfer(sender, receiver, amount, "Transfer", &conn);

            assert_eq!(result, Err(Error::InvalidAmount), "amount {amount}");
        }

        assert_eq!(count_transfers(&conn).unwrap(), 0);
        assert_eq!(count_transactions(&conn).unwrap(), 0);
    }

    #[test]
    fn transfer_to_missing_user_writes_nothing() {
        let conn = get_test_connection();
        let sender = insert_test_user("alice", &conn);

        let result = create_transfer(sender, UserID::new(999), 10.0, "Transfer", &conn);

        assert_eq!(result, Err(Error::InvalidUser));
        assert_eq!(count_transfers(&conn).unwrap(), 0);
        assert_eq!(count_transactions(&conn).unwrap(), 0);
    }

    #[test]
    fn failed_leg_rolls_back_transfer_row() {
        let conn = get_test_connection();
        let sender = insert_test_user("alice", &conn);
        let receiver = insert_test_user("bob", &conn);
        // Make the credit leg fail after the transfer row and debit leg are written.
        conn.execute(
            &format!(
                "CREATE TRIGGER reject_credit BEFORE INSERT ON \"transaction\"
                 WHEN NEW.user_id = {receiver}
                 BEGIN SELECT RAISE(ABORT, 'credit rejected'); END"
            ),
            (),
        )
        .unwrap();

        let result = create_transfer(sender, receiver, 10.0, "Transfer", &conn);

        assert!(matches!(result, Err(Error::StorageUnavailable(_))));
        assert_eq!(count_transfers(&conn).unwrap(), 0);
        assert_eq!(count_transactions(&conn).unwrap(), 0);
    }

    #[test]
    fn transfer_to_self_is_allowed_and_nets_to_zero() {
        let conn = get_test_connection();
        let user = insert_test_user("alice", &conn);

        create_transfer(user, user, 10.0, "Transfer", &conn).unwrap();

        let total: f64 = get_transactions_for_user(user, &conn)
            .unwrap()
            .iter()
            .map(|transaction| transaction.amount)
            .sum();
        assert_eq!(total, 0.0);
    }

    #[test]
    fn transfer_does_not_check_balance() {
        let conn = get_test_connection();
        let sender = insert_test_user("alice", &conn);
        let receiver = insert_test_user("bob", &conn);
        create_transaction(
            NewTransaction::new(sender, "2024-03-01", "Salary", 5.0, "UPI"),
            &conn,
        )
        .unwrap();

        let result = create_transfer(sender, receiver, 50.0, "Transfer", &conn);

        assert!(result.is_ok(), "want Ok, got {result:?}");
    }
}
