//! Cookie based authentication for the JSON API.
//!
//! A signed, encrypted private cookie carries a [Token] with the user's ID
//! and an expiry. The [auth_guard] middleware validates the token on every
//! protected request, injects the [crate::UserId] as a request extension,
//! and slides the expiry forward so active sessions stay logged in.

mod cookie;
mod log_in;
mod middleware;
mod token;

pub use cookie::{
    COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, get_token_from_cookies, invalidate_auth_cookie,
    set_auth_cookie,
};
pub use log_in::{log_in_endpoint, log_out_endpoint};
pub use middleware::auth_guard;
pub use token::Token;
