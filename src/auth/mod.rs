//! Registration, log-in and the cookie based sessions that protect the API.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod register_user;
mod token;
mod user;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::post_log_in;
pub use log_out::post_log_out;
pub use middleware::auth_guard;
pub use password::{PasswordHash, ValidatedPassword};
pub use register_user::register_user;
pub(super) use token::Token;
pub use user::{
    Account, User, UserID, create_user, create_user_table, get_current_user, get_user_by_email,
    get_user_by_id, update_password,
};

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
