//! Session cookie builders and token extraction.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use http::HeaderMap;
use http::header::AUTHORIZATION;
use time::Duration;

use crate::token::SESSION_TTL_SECS;

/// Cookie name carrying the session token.
pub const KOMIKAI_SESSION: &str = "komikai_session";

fn session_cookie(value: String, max_age: Duration) -> Cookie<'static> {
    Cookie::build((KOMIKAI_SESSION, value))
        .path("/")
        .max_age(max_age)
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .build()
}

/// Set the session cookie on the jar.
///
/// ```
/// use axum_extra::extract::cookie::{CookieJar, SameSite};
/// use komikai_auth_types::cookie::{set_session_cookie, KOMIKAI_SESSION};
///
/// let jar = set_session_cookie(CookieJar::new(), "token_value".to_string());
/// let cookie = jar.get(KOMIKAI_SESSION).unwrap();
/// assert_eq!(cookie.value(), "token_value");
/// assert_eq!(cookie.path(), Some("/"));
/// assert_eq!(cookie.max_age(), Some(time::Duration::seconds(604800)));
/// assert_eq!(cookie.same_site(), Some(SameSite::Strict));
/// assert!(cookie.http_only().unwrap_or(false));
/// assert!(cookie.secure().unwrap_or(false));
/// ```
pub fn set_session_cookie(jar: CookieJar, token: String) -> CookieJar {
    jar.add(session_cookie(token, Duration::seconds(SESSION_TTL_SECS)))
}

/// Clear the session cookie by setting Max-Age to 0.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use komikai_auth_types::cookie::{clear_session_cookie, set_session_cookie, KOMIKAI_SESSION};
///
/// let jar = set_session_cookie(CookieJar::new(), "t".to_string());
/// let jar = clear_session_cookie(jar);
/// let cookie = jar.get(KOMIKAI_SESSION).unwrap();
/// assert_eq!(cookie.value(), "");
/// assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
/// ```
pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    jar.add(session_cookie(String::new(), Duration::ZERO))
}

/// Pull the session token from a request: the `komikai_session` cookie
/// first, then the `Authorization` header (raw or `Bearer `-prefixed).
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(KOMIKAI_SESSION).filter(|c| !c.value().is_empty()) {
        return Some(cookie.value().to_owned());
    }

    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then(|| token.to_owned())
}
