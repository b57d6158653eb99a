//! Authentication policy configuration.
//!
//! [`Config`] names every session key and cookie attribute the engine uses,
//! plus the session-fixation [`ProtectionLevel`] and the HTTP methods guards
//! let through unconditionally. Built once at startup and read-only while
//! serving.

use chrono::Duration;
use http::Method;

use login_rs_http::SameSite;

/// How aggressively a fingerprint mismatch is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionLevel {
    /// Downgrade: the session merely loses its freshness.
    Basic,
    /// Purge: every auth-related session key is removed and the remember
    /// cookie is scheduled for deletion, forcing a re-login.
    Strong,
}

/// Immutable authentication policy.
///
/// # Examples
///
/// ```
/// use login_rs::{Config, ProtectionLevel};
///
/// let config = Config {
///     protection_level: ProtectionLevel::Strong,
///     ..Config::default()
/// };
/// assert_eq!(config.session_key_user, "_user_id");
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Session key holding the authenticated identity key.
    pub session_key_user: String,
    /// Session key holding the freshness flag.
    pub session_key_fresh: String,
    /// Session key holding the client fingerprint recorded at login.
    pub session_key_id: String,
    /// Session key (and query parameter name) for the post-login target.
    pub session_key_next: String,
    /// Session key holding the pending remember operation (`set`/`clear`).
    pub session_key_remember: String,
    /// Session key holding a remember-cookie TTL override in seconds.
    pub session_key_remember_seconds: String,

    /// Name of the remember cookie.
    pub cookie_name: String,
    /// Domain attribute for the remember cookie.
    pub cookie_domain: Option<String>,
    /// Path attribute for the remember cookie.
    pub cookie_path: String,
    /// Whether the remember cookie is HTTPS-only.
    pub cookie_secure: bool,
    /// Whether the remember cookie is hidden from client-side scripts.
    pub cookie_httponly: bool,
    /// `SameSite` attribute for the remember cookie.
    pub cookie_samesite: Option<SameSite>,
    /// Lifetime of the remember cookie.
    pub cookie_duration: Duration,

    /// Session-fixation protection level.
    pub protection_level: ProtectionLevel,
    /// HTTP methods the guards let through without an identity check.
    pub exempt_methods: Vec<Method>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_key_user: "_user_id".to_string(),
            session_key_fresh: "_fresh".to_string(),
            session_key_id: "_id".to_string(),
            session_key_next: "next".to_string(),
            session_key_remember: "_remember".to_string(),
            session_key_remember_seconds: "_remember_seconds".to_string(),
            cookie_name: "remember_token".to_string(),
            cookie_domain: None,
            cookie_path: "/".to_string(),
            cookie_secure: false,
            cookie_httponly: true,
            cookie_samesite: None,
            cookie_duration: Duration::days(365),
            protection_level: ProtectionLevel::Basic,
            exempt_methods: vec![Method::OPTIONS],
        }
    }
}

impl Config {
    /// Every auth-related session key, in purge order. Strong protection
    /// removes all of these on a fingerprint mismatch.
    pub fn session_keys(&self) -> [&str; 6] {
        [
            &self.session_key_fresh,
            &self.session_key_id,
            &self.session_key_user,
            &self.session_key_next,
            &self.session_key_remember,
            &self.session_key_remember_seconds,
        ]
    }

    /// Returns `true` if guards should let `method` through unconditionally.
    pub fn method_is_exempt(&self, method: &Method) -> bool {
        self.exempt_methods.contains(method)
    }
}
