//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! The cookie module handles the lower level cookie auth logic.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{invalidate_auth_cookie, set_auth_cookie},
    endpoints,
    html::{base, link, log_in_register, password_input, submit_button, text_input},
    user::{get_user_by_username, verify_credentials},
};

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Invalid username or password. Please try again.";
const INTERNAL_ERROR_MSG: &str = "An internal error occurred. Please try again later.";

fn log_in_form(username: &str, error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-indicator="#indicator"
            hx-disabled-elt="#username, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (text_input("Username", "username", "text", username))
            (password_input("", error_message))
            (submit_button("Log in"))

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Don't have an account? "
                (link(endpoints::REGISTER_VIEW, "Register here"))
            }
        }
    }
}

/// Display the log-in page.
pub async fn get_log_in_page() -> Response {
    let content = log_in_register("Log in to your account", &log_in_form("", None));
    base("Log In", &[], &content).into_response()
}

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the log-in form.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// The name the user registered with.
    pub username: String,
    /// The plain text password, checked against the stored hash.
    pub password: String,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie set and the client is redirected to the dashboard page.
/// Otherwise, the form is returned with an error message explaining the problem.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    // The lock is released before the password check so bcrypt does not
    // block other requests.
    let user = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)
        .and_then(|connection| get_user_by_username(&user_data.username, &connection));
    let result =
        user.and_then(|user| verify_credentials(user.as_ref(), &user_data.password));

    let user_id = match result {
        Ok(user_id) => user_id,
        Err(Error::InvalidCredentials) => {
            tracing::info!("Failed log-in attempt for \"{}\"", user_data.username);
            return log_in_form(&user_data.username, Some(INVALID_CREDENTIALS_ERROR_MSG))
                .into_response();
        }
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return log_in_form(&user_data.username, Some(INTERNAL_ERROR_MSG)).into_response();
        }
    };

    set_auth_cookie(jar.clone(), user_id, state.cookie_duration)
        .map(|updated_jar| {
            (
                StatusCode::SEE_OTHER,
                HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
                updated_jar,
            )
        })
        .map_err(|err| {
            tracing::error!("Error setting auth cookie: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                invalidate_auth_cookie(jar),
            )
        })
        .into_response()
}
