use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, database_id::TransactionId, endpoints,
    internal_server_error::get_internal_server_error_redirect,
    transaction::delete_transaction, user::UserID,
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting one of the logged in user's transactions,
/// redirects to the transactions view.
///
/// Missing transactions and transactions owned by other users are left alone
/// and the client is redirected as if the delete succeeded.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let result = match state.db_connection.lock() {
        Ok(connection) => delete_transaction(transaction_id, user_id, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return get_internal_server_error_redirect();
        }
    };

    if let Err(error) = result {
        tracing::error!("Could not delete transaction {transaction_id}: {error}");
        return get_internal_server_error_redirect();
    }

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        endpoints,
        test_utils::assert_hx_redirect,
        transaction::{NewTransaction, create_transaction, get_transaction},
        user::test_utils::insert_test_user,
    };

    use super::{DeleteTransactionState, delete_transaction_endpoint};

    #[tokio::test]
    async fn deletes_own_transaction_and_keeps_others() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let alice = insert_test_user("alice", &conn);
        let bob = insert_test_user("bob", &conn);
        let alices = create_transaction(
            NewTransaction::new(alice, "2024-03-01", "Food", -10.0, "Cash"),
            &conn,
        )
        .unwrap();
        let bobs = create_transaction(
            NewTransaction::new(bob, "2024-03-01", "Food", -20.0, "Cash"),
            &conn,
        )
        .unwrap();
        let state = DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        for id in [alices.id, bobs.id, 999] {
            let response = delete_transaction_endpoint(
                State(state.clone()),
                Extension(alice),
                Path(id),
            )
            .await;

            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);
        }

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_transaction(alices.id, &connection), Err(Error::NotFound));
        assert_eq!(get_transaction(bobs.id, &connection), Ok(bobs));
    }
}
