//! Shared-password session gate
//!
//! The whole user population shares one service password. A successful
//! login mints an opaque session token held in a server-side set; the
//! cookie carries `<token>.<signature>` where the signature is an
//! HMAC-SHA256 of the token under the configured secret. A cookie passes
//! only when its signature verifies and its token is still in the set.

use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashSet;
use std::sync::Mutex;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Server-side session state plus the credentials it is checked against
pub struct SessionGate {
    password: String,
    secret: String,
    tokens: Mutex<HashSet<String>>,
}

impl SessionGate {
    pub fn new(password: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            secret: secret.into(),
            tokens: Mutex::new(HashSet::new()),
        }
    }

    /// Check the shared password; on match establish a session and return
    /// the cookie value, on mismatch return `None` with no state change
    pub fn login(&self, password: &str) -> Option<String> {
        if password != self.password {
            return None;
        }
        let token = Uuid::new_v4().to_string();
        let value = format!("{}.{}", token, self.sign(&token));
        self.tokens.lock().unwrap().insert(token);
        Some(value)
    }

    /// True iff the cookie value carries a valid signature over a token
    /// that is still established server-side
    pub fn is_authenticated(&self, cookie_value: Option<&str>) -> bool {
        match self.verify(cookie_value) {
            Some(token) => self.tokens.lock().unwrap().contains(&token),
            None => false,
        }
    }

    /// Drop the session referenced by the cookie value, if any
    pub fn logout(&self, cookie_value: Option<&str>) {
        if let Some(token) = self.verify(cookie_value) {
            self.tokens.lock().unwrap().remove(&token);
        }
    }

    fn sign(&self, token: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(token.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    /// Returns the token when the cookie value's signature checks out
    fn verify(&self, cookie_value: Option<&str>) -> Option<String> {
        let (token, signature) = cookie_value?.split_once('.')?;
        if self.sign(token) == signature {
            Some(token.to_string())
        } else {
            None
        }
    }
}

/// Extract the session cookie value from the request headers
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').map(str::trim).find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// `Set-Cookie` value establishing the session cookie
pub fn set_cookie(value: &str) -> String {
    format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly")
}

/// `Set-Cookie` value clearing the session cookie
pub fn clear_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn gate() -> SessionGate {
        SessionGate::new("hunter2", "secret-key")
    }

    #[test]
    fn wrong_password_is_rejected() {
        let gate = gate();
        assert!(gate.login("wrong").is_none());
        assert!(!gate.is_authenticated(None));
    }

    #[test]
    fn login_then_authenticated() {
        let gate = gate();
        let cookie = gate.login("hunter2").unwrap();
        assert!(gate.is_authenticated(Some(&cookie)));
    }

    #[test]
    fn logout_clears_the_session() {
        let gate = gate();
        let cookie = gate.login("hunter2").unwrap();
        gate.logout(Some(&cookie));
        assert!(!gate.is_authenticated(Some(&cookie)));
    }

    #[test]
    fn tampered_cookie_is_rejected() {
        let gate = gate();
        let cookie = gate.login("hunter2").unwrap();

        let mut tampered = cookie.clone();
        tampered.truncate(cookie.len() - 1);
        assert!(!gate.is_authenticated(Some(&tampered)));
        assert!(!gate.is_authenticated(Some("garbage")));
        assert!(!gate.is_authenticated(Some("")));
    }

    #[test]
    fn cookie_signed_under_another_secret_is_rejected() {
        let gate = gate();
        let other = SessionGate::new("hunter2", "different-key");
        let forged = other.login("hunter2").unwrap();
        assert!(!gate.is_authenticated(Some(&forged)));
    }

    #[test]
    fn session_cookie_is_found_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=abc.def; lang=es"),
        );
        assert_eq!(session_cookie(&headers), Some("abc.def".to_string()));
    }

    #[test]
    fn missing_cookie_header_yields_none() {
        let headers = HeaderMap::new();
        assert_eq!(session_cookie(&headers), None);
    }
}
