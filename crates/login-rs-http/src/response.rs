//! The outgoing response type.
//!
//! [`Response`] carries the status, headers, and body handed back through
//! the middleware pipeline. Because the pipeline's response phase runs
//! before anything is flushed to the client, middleware can still append
//! `Set-Cookie` headers here.

use http::header::{HeaderMap, HeaderValue};
use http::StatusCode;

use crate::cookies::Cookie;

/// An HTTP response under construction.
///
/// # Examples
///
/// ```
/// use login_rs_http::Response;
///
/// let response = Response::redirect("/login?next=/protected");
/// assert_eq!(response.status(), http::StatusCode::FOUND);
/// assert_eq!(response.header("location"), Some("/login?next=/protected"));
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Response {
    /// Creates a response with the given status and body.
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Creates a `200 OK` response.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Creates a `403 Forbidden` response.
    pub fn forbidden(body: impl Into<Vec<u8>>) -> Self {
        Self::new(StatusCode::FORBIDDEN, body)
    }

    /// Creates a `500 Internal Server Error` response.
    pub fn server_error(body: impl Into<Vec<u8>>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, body)
    }

    /// Creates a `302 Found` redirect to `url`.
    ///
    /// A `url` that is not a valid header value yields a redirect without a
    /// `Location` header rather than a panic.
    pub fn redirect(url: &str) -> Self {
        let mut response = Self::new(StatusCode::FOUND, Vec::new());
        if let Ok(value) = HeaderValue::from_str(url) {
            response.headers.insert(http::header::LOCATION, value);
        }
        response
    }

    /// Returns the status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the response headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the response headers mutably.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns the first value of a header as a string, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the response body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Appends a `Set-Cookie` header for the given cookie.
    pub fn set_cookie(&mut self, cookie: &Cookie) {
        if let Ok(value) = HeaderValue::from_str(&cookie.to_set_cookie_header()) {
            self.headers.append(http::header::SET_COOKIE, value);
        }
    }

    /// Appends an expired `Set-Cookie` header that deletes `name` on the
    /// client, scoped to the same path/domain the cookie was set with.
    pub fn delete_cookie(&mut self, name: &str, path: &str, domain: Option<&str>) {
        let mut cookie = Cookie::expired(name).path(path);
        if let Some(domain) = domain {
            cookie = cookie.domain(domain);
        }
        self.set_cookie(&cookie);
    }

    /// Returns all `Set-Cookie` header values.
    pub fn set_cookie_headers(&self) -> Vec<&str> {
        self.headers
            .get_all(http::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }
}
