//! The authentication middleware.
//!
//! [`AuthenticationMiddleware`] runs the configured
//! [`AuthenticationBackend`] on every non-excluded connection and attaches
//! the resolved identity before the handler runs. On the way out it turns
//! the pending remember flag that [`login_user`](crate::login_user) /
//! [`logout_user`](crate::logout_user) (or a strong-protection purge) left
//! in the session into actual `Set-Cookie` headers.

use std::sync::Arc;

use async_trait::async_trait;

use login_rs_http::{Connection, ConnectionKind, Middleware, Response};

use crate::backend::AuthenticationBackend;
use crate::identity::{attach_user, current_user};
use crate::manager::LoginManager;

/// Middleware that resolves and attaches the caller's identity.
pub struct AuthenticationMiddleware {
    manager: Arc<LoginManager>,
    backend: Arc<dyn AuthenticationBackend>,
    excluded_prefixes: Vec<String>,
    websocket_auth: bool,
}

impl AuthenticationMiddleware {
    /// Creates the middleware over a manager and backend.
    pub fn new(manager: Arc<LoginManager>, backend: Arc<dyn AuthenticationBackend>) -> Self {
        Self {
            manager,
            backend,
            excluded_prefixes: Vec::new(),
            websocket_auth: true,
        }
    }

    /// Excludes paths under `prefix` from authentication entirely. Excluded
    /// connections carry no identity, not even the anonymous one.
    #[must_use]
    pub fn exclude_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.excluded_prefixes.push(prefix.into());
        self
    }

    /// Skips authentication for websocket handshakes.
    #[must_use]
    pub fn skip_websockets(mut self) -> Self {
        self.websocket_auth = false;
        self
    }

    fn is_excluded(&self, conn: &Connection) -> bool {
        if conn.kind() == ConnectionKind::WebSocket && !self.websocket_auth {
            return true;
        }
        self.excluded_prefixes
            .iter()
            .any(|prefix| conn.path().starts_with(prefix.as_str()))
    }
}

#[async_trait]
impl Middleware for AuthenticationMiddleware {
    async fn process_connection(&self, conn: &mut Connection) -> Option<Response> {
        if self.is_excluded(conn) {
            return None;
        }

        match self.backend.authenticate(conn).await {
            Ok(user) => {
                let user = if user.is_authenticated() {
                    user
                } else {
                    self.manager.anonymous_user()
                };
                attach_user(conn, user);
                None
            }
            Err(err) => {
                tracing::error!(error = %err, path = conn.path(), "authentication failed");
                Some(Response::server_error("authentication failure"))
            }
        }
    }

    async fn process_response(&self, conn: &Connection, mut response: Response) -> Response {
        if self.is_excluded(conn) {
            return response;
        }

        let config = self.manager.config();
        match conn.session().get_str(&config.session_key_remember) {
            Some("set") => {
                // Only an authenticated post-handler identity earns the
                // cookie; a login that failed or was undone leaves nothing.
                let identity = current_user(conn)
                    .filter(|user| user.is_authenticated())
                    .and_then(|user| user.identity());
                if let Some(identity) = identity {
                    let ttl = conn.session().get_i64(&config.session_key_remember_seconds);
                    self.manager.set_remember_cookie(&mut response, &identity, ttl);
                }
            }
            Some("clear") => self.manager.clear_remember_cookie(&mut response),
            _ => {}
        }

        response
    }
}

impl std::fmt::Debug for AuthenticationMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationMiddleware")
            .field("excluded_prefixes", &self.excluded_prefixes)
            .field("websocket_auth", &self.websocket_auth)
            .finish_non_exhaustive()
    }
}
