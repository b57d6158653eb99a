//! Cookie parsing and formatting.
//!
//! Provides the [`Cookie`] attribute model used when emitting `Set-Cookie`
//! headers, and [`parse_cookie_header`] for reading the inbound `Cookie:`
//! header. Signing of the remember token is handled by the auth crate's
//! codec, not here.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};

/// The `SameSite` attribute for cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SameSite {
    /// Cookies are only sent with same-site requests.
    Strict,
    /// Cookies are sent with same-site requests and top-level navigations.
    Lax,
    /// Cookies are sent with all requests (requires `Secure`).
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "Strict"),
            Self::Lax => write!(f, "Lax"),
            Self::None => write!(f, "None"),
        }
    }
}

/// A cookie to be written to an outgoing response.
///
/// # Examples
///
/// ```
/// use login_rs_http::cookies::Cookie;
///
/// let cookie = Cookie::new("remember_token", "alice|abcd").httponly(true);
/// let header = cookie.to_set_cookie_header();
/// assert!(header.starts_with("remember_token=alice|abcd"));
/// assert!(header.contains("HttpOnly"));
/// ```
#[derive(Debug, Clone)]
pub struct Cookie {
    /// The cookie name.
    pub name: String,
    /// The cookie value.
    pub value: String,
    /// Maximum age in seconds. `None` means a session cookie.
    pub max_age: Option<i64>,
    /// Absolute expiry. Formatted as an HTTP date in the header.
    pub expires: Option<DateTime<Utc>>,
    /// The path for which the cookie is valid.
    pub path: String,
    /// The domain for which the cookie is valid.
    pub domain: Option<String>,
    /// Whether the cookie is only sent over HTTPS.
    pub secure: bool,
    /// Whether the cookie is hidden from client-side scripts.
    pub httponly: bool,
    /// The `SameSite` attribute.
    pub samesite: Option<SameSite>,
}

impl Cookie {
    /// Creates a cookie with the given name and value and default attributes.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            max_age: None,
            expires: None,
            path: "/".to_string(),
            domain: None,
            secure: false,
            httponly: false,
            samesite: None,
        }
    }

    /// Creates a cookie that instructs the client to delete `name`.
    ///
    /// The value is emptied and both `Max-Age=0` and an epoch `Expires` are
    /// set so that old and new clients alike discard the cookie.
    pub fn expired(name: impl Into<String>) -> Self {
        Self::new(name, "")
            .max_age(0)
            .expires(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Sets the max age in seconds.
    #[must_use]
    pub const fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Sets the absolute expiry.
    #[must_use]
    pub const fn expires(mut self, at: DateTime<Utc>) -> Self {
        self.expires = Some(at);
        self
    }

    /// Sets the path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the domain.
    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the secure flag.
    #[must_use]
    pub const fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets the httponly flag.
    #[must_use]
    pub const fn httponly(mut self, httponly: bool) -> Self {
        self.httponly = httponly;
        self
    }

    /// Sets the `SameSite` attribute.
    #[must_use]
    pub fn samesite(mut self, samesite: SameSite) -> Self {
        self.samesite = Some(samesite);
        self
    }

    /// Formats this cookie as a `Set-Cookie` header value.
    pub fn to_set_cookie_header(&self) -> String {
        let mut parts = vec![format!("{}={}", self.name, self.value)];

        if let Some(max_age) = self.max_age {
            parts.push(format!("Max-Age={max_age}"));
        }
        if let Some(expires) = self.expires {
            parts.push(format!(
                "Expires={}",
                expires.format("%a, %d %b %Y %H:%M:%S GMT")
            ));
        }
        parts.push(format!("Path={}", self.path));
        if let Some(ref domain) = self.domain {
            parts.push(format!("Domain={domain}"));
        }
        if self.secure {
            parts.push("Secure".to_string());
        }
        if self.httponly {
            parts.push("HttpOnly".to_string());
        }
        if let Some(ref samesite) = self.samesite {
            parts.push(format!("SameSite={samesite}"));
        }

        parts.join("; ")
    }
}

/// Parses a `Cookie:` header value into a name → value map.
///
/// Entries without an `=` sign or with an empty name are skipped; a client
/// sending garbage must never break identity resolution.
pub fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();

    for part in header.split(';') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some((name, value)) = trimmed.split_once('=') {
            let name = name.trim();
            if !name.is_empty() {
                cookies.insert(name.to_string(), value.trim().to_string());
            }
        }
    }

    cookies
}
