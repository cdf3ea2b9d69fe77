//! Reading and writing the private auth cookie.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::Token, user::UserID};

pub(crate) const COOKIE_TOKEN: &str = "token";
/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(5);

/// Add an auth cookie for `user_id` to the cookie jar that expires `duration`
/// from now.
///
/// # Errors
///
/// Returns [Error::InvalidDateFormat] if the expiry overflows or cannot be
/// formatted.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let expires_at = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or_else(|| Error::InvalidDateFormat(format!("now + {duration} overflows")))?;

    set_token_cookie(jar, Token { user_id, expires_at })
}

/// Overwrite the auth cookie with an expired placeholder so the client drops it.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Get the token from the auth cookie.
///
/// # Errors
///
/// Returns a:
/// - [Error::CookieMissing] if there is no auth cookie,
/// - [Error::InvalidCredentials] if the cookie cannot be parsed or has expired.
pub(crate) fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::CookieMissing)?;
    let token: Token =
        serde_json::from_str(cookie.value_trimmed()).map_err(|_| Error::InvalidCredentials)?;

    if token.is_expired(OffsetDateTime::now_utc()) {
        return Err(Error::InvalidCredentials);
    }

    Ok(token)
}

/// Push the auth cookie expiry out to `duration` from now unless it already
/// expires later than that.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned. Returns the errors
/// of [get_token_from_cookies] and [set_auth_cookie].
pub(crate) fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let token = get_token_from_cookies(&jar)?;
    let new_expiry = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or_else(|| Error::InvalidDateFormat(format!("now + {duration} overflows")))?;

    set_token_cookie(
        jar,
        Token {
            expires_at: max(token.expires_at, new_expiry),
            ..token
        },
    )
}

fn set_token_cookie(jar: PrivateCookieJar, token: Token) -> Result<PrivateCookieJar, Error> {
    let expires_at = token.expires_at;
    let token_json =
        serde_json::to_string(&token).map_err(|error| Error::InvalidDateFormat(error.to_string()))?;

    Ok(jar.add(
        Cookie::build((COOKIE_TOKEN, token_json))
            .expires(expires_at)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    ))
}
