//! Named-route reversal.
//!
//! The auth engine never routes requests itself, but it does need to turn a
//! configured route name (e.g. `"login"`) into a path when building redirect
//! targets. [`RouteReverser`] is that collaborator contract; [`RouteTable`]
//! is the in-process implementation used by applications and tests.

use std::collections::HashMap;

use thiserror::Error;

/// Errors from the connection layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HttpError {
    /// No route is registered under the requested name.
    #[error("no route named '{0}'")]
    UnknownRoute(String),
}

/// Resolves a route name to a path.
pub trait RouteReverser: Send + Sync {
    /// Returns the path registered under `name`.
    fn reverse(&self, name: &str) -> Result<String, HttpError>;
}

/// A static name → path table.
///
/// # Examples
///
/// ```
/// use login_rs_http::router::{RouteReverser, RouteTable};
///
/// let routes = RouteTable::new().route("login", "/accounts/login");
/// assert_eq!(routes.reverse("login").unwrap(), "/accounts/login");
/// assert!(routes.reverse("logout").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, String>,
}

impl RouteTable {
    /// Creates an empty route table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a named route.
    #[must_use]
    pub fn route(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.routes.insert(name.into(), path.into());
        self
    }
}

impl RouteReverser for RouteTable {
    fn reverse(&self, name: &str) -> Result<String, HttpError> {
        self.routes
            .get(name)
            .cloned()
            .ok_or_else(|| HttpError::UnknownRoute(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_known_route() {
        let routes = RouteTable::new()
            .route("login", "/login")
            .route("home", "/");
        assert_eq!(routes.reverse("login").unwrap(), "/login");
        assert_eq!(routes.reverse("home").unwrap(), "/");
    }

    #[test]
    fn test_reverse_unknown_route() {
        let routes = RouteTable::new();
        assert_eq!(
            routes.reverse("nope"),
            Err(HttpError::UnknownRoute("nope".to_string()))
        );
    }

    #[test]
    fn test_error_display() {
        let err = HttpError::UnknownRoute("login".to_string());
        assert_eq!(err.to_string(), "no route named 'login'");
    }
}
