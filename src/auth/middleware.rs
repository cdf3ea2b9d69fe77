//! Route guards that check the auth cookie and keep active sessions alive.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::Duration;

use crate::{
    AppState,
    auth::cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
    endpoints,
};

/// The state needed by the route guards.
#[derive(Clone)]
pub struct AuthState {
    /// Decrypts the auth cookie.
    pub cookie_key: Key,
    /// How far each authenticated request pushes out the cookie expiry.
    pub cookie_duration: Duration,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
        }
    }
}

impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// How to send an unauthenticated client to the log-in page.
#[derive(Clone, Copy)]
enum LogInRedirect {
    /// A 303 redirect for full page loads.
    Page,
    /// An HX-Redirect header for requests made by HTMX.
    Htmx,
}

impl IntoResponse for LogInRedirect {
    fn into_response(self) -> Response {
        match self {
            LogInRedirect::Page => Redirect::to(endpoints::LOG_IN_VIEW).into_response(),
            LogInRedirect::Htmx => {
                (HxRedirect(endpoints::LOG_IN_VIEW.to_owned()), StatusCode::OK).into_response()
            }
        }
    }
}

async fn guard(state: AuthState, request: Request, next: Next, redirect: LogInRedirect) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Could not read cookie jar: {error:?}");
            return redirect.into_response();
        }
    };
    let user_id = match get_token_from_cookies(&jar) {
        Ok(token) => token.user_id,
        Err(error) => {
            tracing::debug!("Rejected request to {}: {error}", parts.uri.path());
            return redirect.into_response();
        }
    };

    parts.extensions.insert(user_id);
    let response = next.run(Request::from_parts(parts, body)).await;

    let jar = extend_auth_cookie_duration_if_needed(jar.clone(), state.cookie_duration)
        .unwrap_or_else(|error| {
            tracing::error!("Could not extend auth cookie for user {user_id}: {error}");
            jar
        });

    with_set_cookie_headers(response, jar)
}

/// Copy the Set-Cookie headers of `jar` onto `response`.
fn with_set_cookie_headers(response: Response, jar: PrivateCookieJar) -> Response {
    let (mut parts, body) = response.into_parts();
    let jar_response = jar.into_response();

    for value in jar_response.headers().get_all(SET_COOKIE) {
        parts.headers.append(SET_COOKIE, value.to_owned());
    }

    Response::from_parts(parts, body)
}

/// Reject page requests without a valid auth cookie with a redirect to the
/// log-in page.
///
/// Valid requests get the [UserID](crate::UserID) as a request extension, so
/// handlers can take `Extension(user_id): Extension<UserID>`, and a refreshed
/// auth cookie on the response.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    guard(state, request, next, LogInRedirect::Page).await
}

/// [auth_guard] for routes called by HTMX, which need an HX-Redirect header
/// rather than a 303 to leave the page.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    guard(state, request, next, LogInRedirect::Htmx).await
}
