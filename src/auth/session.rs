//! Read access to the current session outside of the auth middleware.

use axum_extra::extract::PrivateCookieJar;
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    Error,
    auth::{User, UserID, cookie::get_token_from_cookies, get_user_by_id},
};

/// A signed-in user's session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: UserID,
    pub expires_at: OffsetDateTime,
}

/// The session in `jar`, or `None` if nobody is signed in.
pub fn get_session(jar: &PrivateCookieJar) -> Option<Session> {
    get_token_from_cookies(jar).ok().map(|token| Session {
        user_id: token.user_id,
        expires_at: token.expires_at,
    })
}

/// The user behind the session in `jar`.
///
/// # Errors
///
/// Returns [Error::CookieMissing] or [Error::InvalidCredentials] when there
/// is no valid session and [Error::NotFound] when the session's user no
/// longer exists.
pub fn get_user(jar: &PrivateCookieJar, connection: &Connection) -> Result<User, Error> {
    let token = get_token_from_cookies(jar)?;

    get_user_by_id(token.user_id, connection)
}
