//! Connection-lifecycle middleware.
//!
//! [`Middleware`] components run before the handler (and may short-circuit
//! with a response) and again on the outgoing response, in reverse order,
//! before any bytes are flushed. Handlers take the [`Connection`] by value
//! and hand it back with their [`Response`]: state a handler mutates —
//! session flags, the attached identity — is therefore still visible to the
//! response phase, which is what lets an auth middleware decide about
//! remember-cookie emission after the handler ran.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::connection::Connection;
use crate::response::Response;

/// The future a view handler returns.
pub type HandlerFuture = Pin<Box<dyn Future<Output = (Connection, Response)> + Send>>;

/// An async view handler: consumes the connection, returns it with a response.
pub type ViewHandler = Arc<dyn Fn(Connection) -> HandlerFuture + Send + Sync>;

/// The future a socket handler returns.
pub type SocketFuture = Pin<Box<dyn Future<Output = Connection> + Send>>;

/// An async socket-style handler: consumes and returns the connection.
pub type SocketHandler = Arc<dyn Fn(Connection) -> SocketFuture + Send + Sync>;

/// Wraps an async closure or function into a [`ViewHandler`].
///
/// # Examples
///
/// ```
/// use login_rs_http::{view, Connection, Response};
///
/// let handler = view(|conn: Connection| async move {
///     (conn, Response::ok("hello"))
/// });
/// ```
pub fn view<F, Fut>(f: F) -> ViewHandler
where
    F: Fn(Connection) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (Connection, Response)> + Send + 'static,
{
    Arc::new(move |conn| Box::pin(f(conn)))
}

/// Wraps an async closure or function into a [`SocketHandler`].
pub fn socket<F, Fut>(f: F) -> SocketHandler
where
    F: Fn(Connection) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Connection> + Send + 'static,
{
    Arc::new(move |conn| Box::pin(f(conn)))
}

/// A middleware component.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Runs before the handler. Returning `Some(response)` short-circuits
    /// the pipeline; `None` lets the connection continue.
    async fn process_connection(&self, conn: &mut Connection) -> Option<Response>;

    /// Runs on the outgoing response, in reverse middleware order, before
    /// anything is flushed to the client.
    async fn process_response(&self, conn: &Connection, response: Response) -> Response;
}

/// An ordered middleware chain in front of a handler.
///
/// Connections pass through middleware in insertion order; responses pass
/// back in reverse order.
#[derive(Default)]
pub struct MiddlewarePipeline {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl MiddlewarePipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware to the chain.
    pub fn add(&mut self, middleware: impl Middleware + 'static) {
        self.middlewares.push(Box::new(middleware));
    }

    /// Returns the number of middleware components.
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Returns `true` if the pipeline has no middleware.
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Drives an HTTP connection through the chain and handler.
    ///
    /// The connection is returned alongside the response so callers (and
    /// tests) can inspect session state after the full round trip.
    pub async fn process(
        &self,
        mut conn: Connection,
        handler: &ViewHandler,
    ) -> (Connection, Response) {
        for (ran, mw) in self.middlewares.iter().enumerate() {
            if let Some(response) = mw.process_connection(&mut conn).await {
                tracing::debug!(path = conn.path(), "middleware short-circuited connection");
                // Short-circuit: only the middleware that already ran sees
                // the response.
                let mut response = response;
                for mw in self.middlewares[..=ran].iter().rev() {
                    response = mw.process_response(&conn, response).await;
                }
                return (conn, response);
            }
        }

        let (conn, response) = handler(conn).await;

        let mut response = response;
        for mw in self.middlewares.iter().rev() {
            response = mw.process_response(&conn, response).await;
        }

        (conn, response)
    }

    /// Drives a socket-style connection through the chain and handler.
    ///
    /// Socket handshakes have no response message to amend, so a middleware
    /// that short-circuits closes the connection instead.
    pub async fn process_socket(
        &self,
        mut conn: Connection,
        handler: &SocketHandler,
    ) -> Connection {
        for mw in &self.middlewares {
            if mw.process_connection(&mut conn).await.is_some() {
                conn.close();
                return conn;
            }
        }
        handler(conn).await
    }
}

impl std::fmt::Debug for MiddlewarePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewarePipeline")
            .field("middleware_count", &self.middlewares.len())
            .finish()
    }
}
