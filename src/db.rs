//! Sets up the application database.

use rusqlite::Connection;

use crate::{
    Error, transaction::create_transaction_table, transfer::create_transfer_table,
    user::create_user_table,
};

/// Create the application tables if they do not exist yet.
///
/// Existing tables and their rows are left untouched, so this is safe to call
/// on every start-up. Foreign key enforcement is enabled on `connection`.
///
/// # Errors
/// Returns an error if there is an SQL error. No tables are created if an
/// error is returned.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = connection.unchecked_transaction()?;

    create_user_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_transfer_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
