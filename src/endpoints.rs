//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/transactions/{transaction_id}/delete', use [format_endpoint].

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for displaying and adding a user's transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page for sending money to another user.
pub const TRANSFER_VIEW: &str = "/transfer";
/// The page for displaying spending statistics.
pub const STATISTICS_VIEW: &str = "/statistics";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to create users.
pub const USERS: &str = "/api/users";
/// The route to create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to delete a single transaction.
pub const DELETE_TRANSACTION: &str = "/api/transactions/{transaction_id}/delete";
/// The route to send money to another user.
pub const TRANSFER_API: &str = "/api/transfer";
/// The route for chart data of the total amount per day.
pub const DAILY_SPENDING_DATA: &str = "/api/daily_spending_data";
/// The route for chart data of the total amount per month.
pub const MONTHLY_SPENDING_DATA: &str = "/api/monthly_spending_data";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let param_start = endpoint_path.find('{');
    let param_end = endpoint_path.find('}');

    match (param_start, param_end) {
        (Some(start), Some(end)) if start < end => format!(
            "{}{}{}",
            &endpoint_path[..start],
            id,
            &endpoint_path[end + 1..]
        ),
        _ => endpoint_path.to_string(),
    }
}

#[cfg(test)]
mod format_endpoint_tests {
    use super::{DELETE_TRANSACTION, format_endpoint};

    #[test]
    fn replaces_parameter_in_middle() {
        assert_eq!(
            format_endpoint(DELETE_TRANSACTION, 42),
            "/api/transactions/42/delete"
        );
    }

    #[test]
    fn replaces_parameter_at_end() {
        assert_eq!(format_endpoint("/users/{user_id}", 1), "/users/1");
    }

    #[test]
    fn returns_path_without_parameter_unchanged() {
        assert_eq!(format_endpoint("/transactions", 1), "/transactions");
    }
}
