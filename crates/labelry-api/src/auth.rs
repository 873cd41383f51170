//! Caller identity extraction.
//!
//! A request identifies its caller with a session token, either as
//! `Authorization: Bearer <token>` or through the authentication service's
//! session cookie. The token is resolved against the session store on every
//! request; unknown or expired sessions are rejected with 401.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use labelry_core::Caller;

use crate::{ApiError, AppState};

/// Session cookie names, plain and `__Secure-` prefixed.
pub const SESSION_COOKIE_NAMES: [&str; 2] = [
    "better-auth.session_token",
    "__Secure-better-auth.session_token",
];

/// Pull the session token out of request headers.
///
/// The bearer header wins over the cookie. Cookie values are signed as
/// `<token>.<signature>` and may be percent-encoded; only the token part is
/// returned.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = value.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    for cookie_header in headers.get_all(header::COOKIE) {
        let Ok(cookies) = cookie_header.to_str() else {
            continue;
        };
        for pair in cookies.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            if !SESSION_COOKIE_NAMES.contains(&name) {
                continue;
            }
            let Ok(decoded) = urlencoding::decode(value) else {
                continue;
            };
            let token = decoded.split('.').next().unwrap_or_default().trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    None
}

/// Extractor that requires an authenticated caller.
pub struct RequireCaller(pub Caller);

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_session_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        match state.sessions.resolve_caller(&token).await? {
            Some(caller) => Ok(RequireCaller(caller)),
            None => Err(ApiError::Unauthorized(
                "Invalid or expired session".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_bearer_token() {
        let h = headers(&[(header::AUTHORIZATION, "Bearer abc123")]);
        assert_eq!(extract_session_token(&h).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_non_bearer_scheme_ignored() {
        let h = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwdw==")]);
        assert_eq!(extract_session_token(&h), None);
    }

    #[test]
    fn test_signed_cookie_is_unwrapped() {
        let h = headers(&[(
            header::COOKIE,
            "theme=dark; better-auth.session_token=tok42.c2lnbmF0dXJl%3D",
        )]);
        assert_eq!(extract_session_token(&h).as_deref(), Some("tok42"));
    }

    #[test]
    fn test_secure_cookie_name() {
        let h = headers(&[(
            header::COOKIE,
            "__Secure-better-auth.session_token=tok7.sig",
        )]);
        assert_eq!(extract_session_token(&h).as_deref(), Some("tok7"));
    }

    #[test]
    fn test_bearer_preferred_over_cookie() {
        let h = headers(&[
            (header::COOKIE, "better-auth.session_token=cookie.sig"),
            (header::AUTHORIZATION, "Bearer header"),
        ]);
        assert_eq!(extract_session_token(&h).as_deref(), Some("header"));
    }

    #[test]
    fn test_missing_credentials() {
        assert_eq!(extract_session_token(&HeaderMap::new()), None);
        let h = headers(&[(header::AUTHORIZATION, "Bearer   ")]);
        assert_eq!(extract_session_token(&h), None);
    }
}
