//! The per-connection request type.
//!
//! [`Connection`] models one inbound HTTP request or socket handshake as it
//! travels through the middleware pipeline: method, URL parts, headers, the
//! transport-level client address, the per-connection [`Session`], and an
//! extensions bag for request-scoped state such as the resolved identity.

use std::collections::HashMap;
use std::sync::OnceLock;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Extensions, Method};

use crate::cookies::parse_cookie_header;
use crate::session::Session;

/// Whether a connection is a plain HTTP request or a socket-style handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    /// A request/response HTTP exchange.
    Http,
    /// A bidirectional socket connection (e.g. a WebSocket upgrade).
    WebSocket,
}

/// One inbound connection.
///
/// Construct instances with [`Connection::builder`].
///
/// # Examples
///
/// ```
/// use login_rs_http::Connection;
///
/// let conn = Connection::builder()
///     .method(http::Method::GET)
///     .path("/protected")
///     .query_string("page=2")
///     .header("user-agent", "test-agent")
///     .build();
///
/// assert_eq!(conn.full_path(), "/protected?page=2");
/// assert_eq!(conn.user_agent(), Some("test-agent"));
/// ```
#[derive(Debug)]
pub struct Connection {
    kind: ConnectionKind,
    method: Method,
    path: String,
    query_string: String,
    scheme: String,
    host: String,
    headers: HeaderMap,
    client_addr: Option<String>,
    session: Session,
    extensions: Extensions,
    cached_cookies: OnceLock<HashMap<String, String>>,
    closed: bool,
}

impl Connection {
    /// Creates a new [`ConnectionBuilder`].
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::default()
    }

    /// Returns the connection kind.
    pub const fn kind(&self) -> ConnectionKind {
        self.kind
    }

    /// Returns `true` for socket-style connections.
    pub fn is_websocket(&self) -> bool {
        self.kind == ConnectionKind::WebSocket
    }

    /// Returns the HTTP method.
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path (without query string).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw query string (without the leading `?`).
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// Returns the URL scheme (`"http"` or `"https"`).
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns the host this request was addressed to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the request headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the path plus query string.
    pub fn full_path(&self) -> String {
        if self.query_string.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string)
        }
    }

    /// Returns the absolute URL of this request.
    pub fn absolute_url(&self) -> String {
        format!("{}://{}{}", self.scheme, self.host, self.full_path())
    }

    /// Returns the client address as seen by the engine.
    ///
    /// The first entry of `X-Forwarded-For` wins over the transport address,
    /// so fingerprints survive a reverse proxy in front of the server.
    pub fn remote_addr(&self) -> Option<String> {
        self.headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .or_else(|| self.client_addr.clone())
    }

    /// Returns the `User-Agent` header value, if present and valid UTF-8.
    pub fn user_agent(&self) -> Option<&str> {
        self.headers
            .get(http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
    }

    /// Parses the `Cookie:` header into a name → value map, cached after the
    /// first call.
    pub fn cookies(&self) -> &HashMap<String, String> {
        self.cached_cookies.get_or_init(|| {
            self.headers
                .get(http::header::COOKIE)
                .and_then(|v| v.to_str().ok())
                .map_or_else(HashMap::new, parse_cookie_header)
        })
    }

    /// Gets one cookie value by name.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies().get(name).map(String::as_str)
    }

    /// Returns the connection's session.
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the connection's session mutably.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Returns the request-scoped extensions.
    pub const fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Returns the request-scoped extensions mutably.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Marks a socket-style connection as closed.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Returns `true` if [`Connection::close`] was called.
    pub const fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Builder for [`Connection`].
#[derive(Debug)]
pub struct ConnectionBuilder {
    kind: ConnectionKind,
    method: Method,
    path: String,
    query_string: String,
    scheme: String,
    host: String,
    headers: HeaderMap,
    client_addr: Option<String>,
    session: Session,
}

impl Default for ConnectionBuilder {
    fn default() -> Self {
        Self {
            kind: ConnectionKind::Http,
            method: Method::GET,
            path: "/".to_string(),
            query_string: String::new(),
            scheme: "http".to_string(),
            host: "localhost".to_string(),
            headers: HeaderMap::new(),
            client_addr: None,
            session: Session::new(),
        }
    }
}

impl ConnectionBuilder {
    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the request path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the query string (without the leading `?`).
    #[must_use]
    pub fn query_string(mut self, query_string: impl Into<String>) -> Self {
        self.query_string = query_string.into();
        self
    }

    /// Sets the URL scheme.
    #[must_use]
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Sets the host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Adds a header. Invalid names or values are silently dropped.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets the transport-level client address.
    #[must_use]
    pub fn client_addr(mut self, addr: impl Into<String>) -> Self {
        self.client_addr = Some(addr.into());
        self
    }

    /// Marks this connection as a socket-style handshake.
    #[must_use]
    pub const fn websocket(mut self) -> Self {
        self.kind = ConnectionKind::WebSocket;
        self
    }

    /// Seeds the connection with an existing session.
    #[must_use]
    pub fn session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// Builds the connection.
    pub fn build(self) -> Connection {
        Connection {
            kind: self.kind,
            method: self.method,
            path: self.path,
            query_string: self.query_string,
            scheme: self.scheme,
            host: self.host,
            headers: self.headers,
            client_addr: self.client_addr,
            session: self.session,
            extensions: Extensions::new(),
            cached_cookies: OnceLock::new(),
            closed: false,
        }
    }
}
