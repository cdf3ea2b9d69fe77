//! Session handling: the auth cookie, the guard for protected routes and the
//! log-in, log-out and registration pages.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod register;
mod token;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
pub use register::{get_register_page, post_register_user};
pub(crate) use token::Token;

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;

#[cfg(test)]
pub use middleware::AuthState;
