//! Access guards wrapping handlers.
//!
//! Guards are handler combinators: each takes a handler and returns a new
//! one that checks the attached identity first. [`login_required`] demands
//! an authenticated caller, [`fresh_login_required`] additionally demands a
//! fresh session, and [`ws_login_required`] guards socket handlers, where
//! there is no response to redirect with.

use std::sync::Arc;

use login_rs_http::{Connection, Response, SocketHandler, ViewHandler};

use crate::identity::current_user;
use crate::manager::LoginManager;
use crate::session_utils::{create_identifier, make_next_url};

fn is_authenticated(conn: &Connection) -> bool {
    current_user(conn).is_some_and(|user| user.is_authenticated())
}

/// Builds the redirect to the login page, carrying the connection's own URL
/// as the `next` parameter. A failure to resolve the login route is a
/// deployment bug and surfaces as a 500.
fn redirect_to_login(manager: &LoginManager, conn: &Connection) -> Response {
    match manager.build_redirect_url() {
        Ok(target) => {
            let url = make_next_url(&target, Some(&conn.absolute_url()));
            Response::redirect(&url)
        }
        Err(err) => {
            tracing::error!(error = %err, "cannot resolve login redirect target");
            Response::server_error("login redirect misconfigured")
        }
    }
}

/// Requires an authenticated caller.
///
/// Exempt methods (OPTIONS by default) pass through unchecked. Anyone else
/// without an authenticated identity is redirected to the login page with
/// the original URL in `next`.
pub fn login_required(manager: Arc<LoginManager>, handler: ViewHandler) -> ViewHandler {
    Arc::new(move |conn: Connection| {
        let manager = Arc::clone(&manager);
        let handler = Arc::clone(&handler);
        Box::pin(async move {
            if manager.config().method_is_exempt(conn.method()) || is_authenticated(&conn) {
                return handler(conn).await;
            }
            tracing::debug!(path = conn.path(), "unauthenticated access refused");
            let response = redirect_to_login(&manager, &conn);
            (conn, response)
        })
    })
}

/// Requires an authenticated caller with a *fresh* session.
///
/// A session restored from a remember cookie (or downgraded by the
/// fixation check) is authenticated but not fresh; sensitive views use this
/// guard to force a re-login. Before redirecting, the current client
/// fingerprint is recorded so the upcoming login binds to this client.
pub fn fresh_login_required(manager: Arc<LoginManager>, handler: ViewHandler) -> ViewHandler {
    Arc::new(move |mut conn: Connection| {
        let manager = Arc::clone(&manager);
        let handler = Arc::clone(&handler);
        Box::pin(async move {
            let config = manager.config();
            if config.method_is_exempt(conn.method())
                || (is_authenticated(&conn)
                    && conn.session().get_bool(&config.session_key_fresh) == Some(true))
            {
                return handler(conn).await;
            }
            tracing::debug!(path = conn.path(), "fresh login required");
            let fingerprint = create_identifier(&conn);
            conn.session_mut()
                .set(&config.session_key_id, fingerprint.into());
            let response = redirect_to_login(&manager, &conn);
            (conn, response)
        })
    })
}

/// Requires an authenticated caller on a socket handler.
///
/// There is no redirect for a handshake: unauthenticated callers go through
/// the manager's socket-unauthenticated callback, which by default closes
/// the connection.
pub fn ws_login_required(manager: Arc<LoginManager>, handler: SocketHandler) -> SocketHandler {
    Arc::new(move |conn: Connection| {
        let manager = Arc::clone(&manager);
        let handler = Arc::clone(&handler);
        Box::pin(async move {
            if is_authenticated(&conn) {
                return handler(conn).await;
            }
            tracing::debug!(path = conn.path(), "unauthenticated socket refused");
            manager.socket_unauthenticated(conn).await
        })
    })
}
