//! Recording, listing and deleting transactions.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod transactions_page;

pub use core::{
    NewTransaction, Transaction, count_transactions, create_transaction,
    create_transaction_table, delete_transaction, get_transaction, get_transactions_for_user,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use transactions_page::get_transactions_page;
