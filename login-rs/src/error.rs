//! Error types for the authentication engine.

use thiserror::Error;

use login_rs_http::HttpError;

/// Errors raised by the authentication engine.
///
/// Setup mistakes (`MissingUserLoader`) surface when the [`LoginManager`]
/// is built, not per request. `UserLoader` wraps failures from the
/// application's user store and is fatal for the request that hit it:
/// identity resolution is never retried.
///
/// [`LoginManager`]: crate::LoginManager
#[derive(Debug, Error)]
pub enum AuthError {
    /// The login manager was built without a user loader.
    #[error("a user loader must be configured before the login manager is built")]
    MissingUserLoader,

    /// The redirect target is a route name but no route reverser was
    /// configured.
    #[error("redirect target '{0}' is a route name but no route reverser is configured")]
    MissingRouteReverser(String),

    /// The configured redirect route name could not be resolved.
    #[error("no route named '{0}'")]
    UnknownRoute(String),

    /// The application's user loader failed while materializing an identity.
    #[error("user loader failed: {0}")]
    UserLoader(Box<dyn std::error::Error + Send + Sync>),
}

impl From<HttpError> for AuthError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::UnknownRoute(name) => Self::UnknownRoute(name),
        }
    }
}

/// A convenience alias for `Result<T, AuthError>`.
pub type AuthResult<T> = Result<T, AuthError>;
