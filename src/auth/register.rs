//! The registration page and the endpoint for creating users.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, PasswordHash,
    endpoints,
    html::{base, form_error, link, log_in_register, password_input, submit_button, text_input},
    user::{NewUser, register_user},
};

pub const DUPLICATE_USERNAME_ERROR_MSG: &str =
    "Username already exists. Please choose a different one.";

/// The values to refill the form with when it is re-rendered.
#[derive(Default)]
struct RegisterFormValues<'a> {
    username: &'a str,
    email: &'a str,
    phone: &'a str,
}

fn register_form(values: RegisterFormValues, error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#username, #email, #phone, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (text_input("Username", "username", "text", values.username))
            (text_input("Email", "email", "email", values.email))
            (text_input("Phone", "phone", "tel", values.phone))
            (password_input("", None))
            (form_error(error_message))
            (submit_button("Register"))

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Already have an account? "
                (link(endpoints::LOG_IN_VIEW, "Log in here"))
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let form = register_form(RegisterFormValues::default(), None);
    let content = log_in_register("Create an account", &form);
    base("Register", &[], &content).into_response()
}

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegisterState {
    /// The database connection for storing new users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegisterState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The raw data entered by the user in the registration form.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    /// The name to log in with.
    pub username: String,
    /// The user's email address.
    pub email: String,
    /// The user's phone number.
    pub phone: String,
    /// The plain text password, hashed before it is stored.
    pub password: String,
}

/// Create a user from the registration form and redirect to the log-in page.
///
/// If the username is taken, the form is returned with an error message.
pub async fn post_register_user(
    State(state): State<RegisterState>,
    Form(form): Form<RegisterForm>,
) -> Response {
    let values = RegisterFormValues {
        username: &form.username,
        email: &form.email,
        phone: &form.phone,
    };

    let password_hash = match PasswordHash::new(&form.password, PasswordHash::DEFAULT_COST) {
        Ok(password_hash) => password_hash,
        Err(error) => {
            tracing::error!("Could not hash password for new user: {error}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                register_form(values, Some("An internal error occurred. Please try again later.")),
            )
                .into_response();
        }
    };

    let new_user = NewUser {
        username: form.username.clone(),
        email: form.email.clone(),
        phone: form.phone.clone(),
        password_hash,
    };

    let result = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)
        .and_then(|connection| register_user(new_user, &connection));

    match result {
        Ok(_) => (
            HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::DuplicateUsername) => {
            register_form(values, Some(DUPLICATE_USERNAME_ERROR_MSG)).into_response()
        }
        Err(error) => {
            tracing::error!("Could not register user \"{}\": {error}", form.username);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                register_form(values, Some("An internal error occurred. Please try again later.")),
            )
                .into_response()
        }
    }
}
