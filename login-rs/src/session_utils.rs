//! Session-level login and logout operations.
//!
//! [`login_user`] and [`logout_user`] mutate the connection's session and
//! attached identity; the authentication middleware later turns the pending
//! remember flag they leave behind into actual `Set-Cookie` headers on the
//! response. [`create_identifier`] computes the client fingerprint the
//! session-fixation check compares against, and [`make_next_url`] builds the
//! login redirect with its `next` parameter.

use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use sha2::{Digest, Sha512};
use url::Url;

use login_rs_http::Connection;

use crate::identity::{attach_user, AuthUser};
use crate::manager::LoginManager;

/// Characters escaped in the `next` parameter value. `/` stays literal so
/// the target path remains readable in the redirect URL.
const NEXT_PARAM: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'=');

/// Options for [`login_user`].
#[derive(Debug, Clone)]
pub struct LoginOptions {
    /// Request a remember cookie alongside the session.
    pub remember: bool,
    /// Override the configured remember-cookie lifetime.
    pub duration: Option<chrono::Duration>,
    /// Mark the session fresh (directly authenticated, not restored).
    pub fresh: bool,
}

impl Default for LoginOptions {
    fn default() -> Self {
        Self {
            remember: false,
            duration: None,
            fresh: true,
        }
    }
}

/// Starts an authenticated session for `user` on this connection.
///
/// Records the identity key, freshness, and the client fingerprint in the
/// session, and attaches the user to the connection. With
/// `options.remember`, also leaves a pending flag for the middleware to
/// write the remember cookie on the way out.
///
/// Returns `false` without touching anything if the user has no identity
/// key: an identity-less user cannot be restored on the next request, so
/// storing it would create a session that dies immediately.
pub fn login_user(
    manager: &LoginManager,
    conn: &mut Connection,
    user: Arc<dyn AuthUser>,
    options: &LoginOptions,
) -> bool {
    let Some(identity) = user.identity() else {
        tracing::warn!("refusing to log in a user with no identity key");
        return false;
    };

    let config = manager.config();
    let fingerprint = create_identifier(conn);
    let session = conn.session_mut();
    session.set(&config.session_key_user, identity.into());
    session.set(&config.session_key_fresh, options.fresh.into());
    session.set(&config.session_key_id, fingerprint.into());
    if options.remember {
        session.set(&config.session_key_remember, "set".into());
        if let Some(duration) = options.duration {
            session.set(
                &config.session_key_remember_seconds,
                duration.num_seconds().into(),
            );
        }
    }

    attach_user(conn, user);
    tracing::debug!(remember = options.remember, "user logged in");
    true
}

/// Ends the authenticated session on this connection.
///
/// Removes the auth keys from the session, leaves a pending clear flag for
/// the remember cookie if the client presented one, and attaches the
/// anonymous identity.
pub fn logout_user(manager: &LoginManager, conn: &mut Connection) {
    let config = manager.config();
    let had_remember_cookie = conn.cookie(&config.cookie_name).is_some();

    let session = conn.session_mut();
    session.pop(&config.session_key_user);
    session.pop(&config.session_key_fresh);
    session.pop(&config.session_key_id);
    if had_remember_cookie {
        session.set(&config.session_key_remember, "clear".into());
        session.pop(&config.session_key_remember_seconds);
    }

    attach_user(conn, manager.anonymous_user());
    tracing::debug!("user logged out");
}

/// Computes the client fingerprint: the SHA-512 hex digest of the client
/// address joined to the user agent.
pub fn create_identifier(conn: &Connection) -> String {
    let mut hasher = Sha512::new();
    hasher.update(conn.remote_addr().unwrap_or_default().as_bytes());
    hasher.update(b"|");
    hasher.update(conn.user_agent().unwrap_or_default().as_bytes());
    hex::encode(hasher.finalize())
}

/// Builds the login redirect URL carrying the original target as a `next`
/// query parameter.
///
/// The parameter holds the target's path and query, percent-encoded. A
/// `next` whose origin differs from the redirect URL's is dropped — open
/// redirects through the login flow are not worth one saved click.
///
/// # Examples
///
/// ```
/// use login_rs::session_utils::make_next_url;
///
/// assert_eq!(
///     make_next_url("/login", Some("/protected")),
///     "/login?next=/protected"
/// );
/// assert_eq!(make_next_url("/login", None), "/login");
/// ```
pub fn make_next_url(redirect_url: &str, next: Option<&str>) -> String {
    let Some(next) = next else {
        return redirect_url.to_string();
    };

    let Some(next_target) = relative_target(redirect_url, next) else {
        return redirect_url.to_string();
    };

    let separator = if redirect_url.contains('?') { '&' } else { '?' };
    format!(
        "{redirect_url}{separator}next={}",
        utf8_percent_encode(&next_target, NEXT_PARAM)
    )
}

/// Reduces `next` to a path-and-query relative to `redirect_url`'s origin,
/// or `None` if the origins differ.
fn relative_target(redirect_url: &str, next: &str) -> Option<String> {
    // Relative next is same-origin by definition.
    let Ok(next_url) = Url::parse(next) else {
        return Some(next.to_string());
    };

    // Absolute next against a relative redirect target: the redirect stays
    // on the current origin, so only a matching-origin next survives. With
    // no origin to compare against, keep just the path and query.
    let same_origin = match Url::parse(redirect_url) {
        Ok(redirect) => redirect.origin() == next_url.origin(),
        Err(_) => true,
    };
    if !same_origin {
        return None;
    }

    let mut target = next_url.path().to_string();
    if let Some(query) = next_url.query() {
        target.push('?');
        target.push_str(query);
    }
    Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use login_rs_http::Response;

    use crate::error::AuthResult;
    use crate::identity::{current_user, AnonymousUser, SimpleUser};
    use crate::manager::UserLoader;

    struct NullLoader;

    #[async_trait]
    impl UserLoader for NullLoader {
        async fn load_user(
            &self,
            _conn: &Connection,
            _user_id: &str,
        ) -> AuthResult<Option<Arc<dyn AuthUser>>> {
            Ok(None)
        }
    }

    fn manager() -> LoginManager {
        LoginManager::builder(b"secret".to_vec(), "/login")
            .user_loader(Arc::new(NullLoader))
            .build()
            .unwrap()
    }

    fn alice() -> Arc<dyn AuthUser> {
        Arc::new(SimpleUser::new("alice", "Alice"))
    }

    // ── login_user ──

    #[test]
    fn test_login_records_session_state() {
        let manager = manager();
        let mut conn = Connection::builder()
            .client_addr("10.0.0.1")
            .header("user-agent", "test-agent")
            .build();

        assert!(login_user(
            &manager,
            &mut conn,
            alice(),
            &LoginOptions::default()
        ));

        assert_eq!(conn.session().get_str("_user_id"), Some("alice"));
        assert_eq!(conn.session().get_bool("_fresh"), Some(true));
        assert_eq!(
            conn.session().get_str("_id"),
            Some(create_identifier(&conn).as_str())
        );
        assert!(conn.session().get_str("_remember").is_none());
        assert!(current_user(&conn).unwrap().is_authenticated());
    }

    #[test]
    fn test_login_with_remember_sets_pending_flag() {
        let manager = manager();
        let mut conn = Connection::builder().build();

        login_user(
            &manager,
            &mut conn,
            alice(),
            &LoginOptions {
                remember: true,
                ..LoginOptions::default()
            },
        );

        assert_eq!(conn.session().get_str("_remember"), Some("set"));
        assert!(conn.session().get_i64("_remember_seconds").is_none());
    }

    #[test]
    fn test_login_with_remember_duration_override() {
        let manager = manager();
        let mut conn = Connection::builder().build();

        login_user(
            &manager,
            &mut conn,
            alice(),
            &LoginOptions {
                remember: true,
                duration: Some(chrono::Duration::hours(1)),
                fresh: true,
            },
        );

        assert_eq!(conn.session().get_i64("_remember_seconds"), Some(3600));
    }

    #[test]
    fn test_login_non_fresh() {
        let manager = manager();
        let mut conn = Connection::builder().build();

        login_user(
            &manager,
            &mut conn,
            alice(),
            &LoginOptions {
                fresh: false,
                ..LoginOptions::default()
            },
        );

        assert_eq!(conn.session().get_bool("_fresh"), Some(false));
    }

    #[test]
    fn test_login_rejects_identityless_user() {
        let manager = manager();
        let mut conn = Connection::builder().build();

        assert!(!login_user(
            &manager,
            &mut conn,
            Arc::new(AnonymousUser::new()),
            &LoginOptions::default()
        ));
        assert!(conn.session().is_empty());
        assert!(current_user(&conn).is_none());
    }

    // ── logout_user ──

    #[test]
    fn test_logout_clears_session_and_attaches_anonymous() {
        let manager = manager();
        let mut conn = Connection::builder().build();
        login_user(&manager, &mut conn, alice(), &LoginOptions::default());

        logout_user(&manager, &mut conn);

        assert!(conn.session().get_str("_user_id").is_none());
        assert!(conn.session().get_bool("_fresh").is_none());
        assert!(conn.session().get_str("_id").is_none());
        // No remember cookie was presented, so no clear flag either.
        assert!(conn.session().get_str("_remember").is_none());
        assert!(!current_user(&conn).unwrap().is_authenticated());
    }

    #[test]
    fn test_logout_schedules_cookie_clear_when_cookie_present() {
        let manager = manager();
        let token = manager.encode_remember_token("alice");
        let mut conn = Connection::builder()
            .header("cookie", &format!("remember_token={token}"))
            .build();
        login_user(&manager, &mut conn, alice(), &LoginOptions::default());

        logout_user(&manager, &mut conn);

        assert_eq!(conn.session().get_str("_remember"), Some("clear"));
    }

    // ── create_identifier ──

    #[test]
    fn test_identifier_is_stable_and_client_sensitive() {
        let conn_a = Connection::builder()
            .client_addr("10.0.0.1")
            .header("user-agent", "agent")
            .build();
        let conn_b = Connection::builder()
            .client_addr("10.0.0.1")
            .header("user-agent", "agent")
            .build();
        let conn_c = Connection::builder()
            .client_addr("10.0.0.2")
            .header("user-agent", "agent")
            .build();

        assert_eq!(create_identifier(&conn_a), create_identifier(&conn_b));
        assert_ne!(create_identifier(&conn_a), create_identifier(&conn_c));
        // sha-512 hex
        assert_eq!(create_identifier(&conn_a).len(), 128);
    }

    #[test]
    fn test_identifier_prefers_forwarded_address() {
        let direct = Connection::builder().client_addr("10.0.0.1").build();
        let forwarded = Connection::builder()
            .client_addr("10.0.0.1")
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .build();
        assert_ne!(create_identifier(&direct), create_identifier(&forwarded));
    }

    // ── make_next_url ──

    #[test]
    fn test_next_url_without_next() {
        assert_eq!(make_next_url("/login", None), "/login");
    }

    #[test]
    fn test_next_url_relative_next() {
        assert_eq!(
            make_next_url("/login", Some("/protected")),
            "/login?next=/protected"
        );
    }

    #[test]
    fn test_next_url_appends_to_existing_query() {
        assert_eq!(
            make_next_url("/login?lang=en", Some("/protected")),
            "/login?lang=en&next=/protected"
        );
    }

    #[test]
    fn test_next_url_encodes_query_in_next() {
        assert_eq!(
            make_next_url("/login", Some("/search?q=a&b")),
            "/login?next=/search%3Fq%3Da%26b"
        );
    }

    #[test]
    fn test_next_url_same_origin_absolute_next() {
        assert_eq!(
            make_next_url(
                "http://example.com/login",
                Some("http://example.com/protected?x=1")
            ),
            "http://example.com/login?next=/protected%3Fx%3D1"
        );
    }

    #[test]
    fn test_next_url_cross_origin_next_dropped() {
        assert_eq!(
            make_next_url("http://example.com/login", Some("http://evil.com/steal")),
            "http://example.com/login"
        );
        assert_eq!(
            make_next_url("https://example.com/login", Some("http://example.com/p")),
            "https://example.com/login"
        );
    }

    #[test]
    fn test_next_url_absolute_next_against_relative_redirect() {
        assert_eq!(
            make_next_url("/login", Some("http://example.com/protected")),
            "/login?next=/protected"
        );
    }

    #[test]
    fn test_remember_flag_survives_to_middleware() {
        // Sanity check that the pending flag lands in the session the
        // response phase will read (same shape the pipeline preserves).
        let manager = manager();
        let mut conn = Connection::builder().build();
        login_user(
            &manager,
            &mut conn,
            alice(),
            &LoginOptions {
                remember: true,
                ..LoginOptions::default()
            },
        );
        let mut response = Response::ok("");
        if conn.session().get_str("_remember") == Some("set") {
            manager.set_remember_cookie(&mut response, "alice", None);
        }
        assert_eq!(response.set_cookie_headers().len(), 1);
    }
}
