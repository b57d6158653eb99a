//! The login manager.
//!
//! [`LoginManager`] owns the [`Config`], the secret key the remember-token
//! codec signs with, the application's [`UserLoader`], the redirect target
//! for unauthenticated callers, and the optional socket-unauthenticated
//! callback. It is built once at startup through [`LoginManagerBuilder`]
//! and handed by reference into the middleware and guards — there is no
//! ambient global to look it up from.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use login_rs_http::{Connection, Cookie, Response, RouteReverser, SocketFuture};

use crate::config::{Config, ProtectionLevel};
use crate::error::{AuthError, AuthResult};
use crate::identity::{AnonymousUser, AuthUser};
use crate::token::{decode_cookie, encode_cookie};

/// Produces the identity used for unauthenticated callers.
pub type AnonymousFactory = Arc<dyn Fn() -> Arc<dyn AuthUser> + Send + Sync>;

/// Callback invoked when an unauthenticated caller hits a guarded socket
/// handler. Receives the connection and returns it (typically closed).
pub type SocketUnauthenticatedCallback =
    Arc<dyn Fn(Connection) -> SocketFuture + Send + Sync>;

/// Materializes an identity from its stable key.
///
/// The loader is the bridge to the application's user store. It may be
/// backed by anything — a database, a cache, a static map — and it may
/// resolve synchronously or asynchronously; a synchronous loader simply
/// returns without awaiting. Errors are treated as application bugs and
/// propagate to the request that triggered the load.
#[async_trait]
pub trait UserLoader: Send + Sync {
    /// Loads the identity stored under `user_id`, or `None` if it no longer
    /// exists.
    async fn load_user(
        &self,
        conn: &Connection,
        user_id: &str,
    ) -> AuthResult<Option<Arc<dyn AuthUser>>>;
}

/// Orchestrates identity policy for one application.
pub struct LoginManager {
    config: Config,
    secret_key: Vec<u8>,
    redirect_to: String,
    reverser: Option<Arc<dyn RouteReverser>>,
    loader: Arc<dyn UserLoader>,
    socket_unauthenticated: Option<SocketUnauthenticatedCallback>,
    anonymous_factory: AnonymousFactory,
}

impl LoginManager {
    /// Starts building a manager with the given secret key and redirect
    /// target.
    ///
    /// The target is either a literal path (anything containing `/`) or a
    /// route name resolved through the configured
    /// [`RouteReverser`](login_rs_http::RouteReverser).
    pub fn builder(
        secret_key: impl Into<Vec<u8>>,
        redirect_to: impl Into<String>,
    ) -> LoginManagerBuilder {
        LoginManagerBuilder {
            secret_key: secret_key.into(),
            redirect_to: redirect_to.into(),
            config: Config::default(),
            reverser: None,
            loader: None,
            socket_unauthenticated: None,
            anonymous_factory: None,
        }
    }

    /// Returns the policy configuration.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns `true` under [`ProtectionLevel::Strong`].
    pub fn protection_is_strong(&self) -> bool {
        self.config.protection_level == ProtectionLevel::Strong
    }

    /// Creates the identity used for unauthenticated callers.
    pub fn anonymous_user(&self) -> Arc<dyn AuthUser> {
        (self.anonymous_factory)()
    }

    /// Resolves the redirect target for unauthenticated callers.
    pub fn build_redirect_url(&self) -> AuthResult<String> {
        if self.redirect_to.contains('/') {
            return Ok(self.redirect_to.clone());
        }
        let reverser = self
            .reverser
            .as_ref()
            .ok_or_else(|| AuthError::MissingRouteReverser(self.redirect_to.clone()))?;
        Ok(reverser.reverse(&self.redirect_to)?)
    }

    /// Materializes an identity through the configured user loader.
    pub async fn load_user(
        &self,
        conn: &Connection,
        user_id: &str,
    ) -> AuthResult<Option<Arc<dyn AuthUser>>> {
        self.loader.load_user(conn, user_id).await
    }

    /// Encodes an identity key into a signed remember-token value.
    pub fn encode_remember_token(&self, identity: &str) -> String {
        encode_cookie(identity, &self.secret_key)
    }

    /// Decodes a remember-token value back to the identity key, or `None`
    /// if the token is malformed or tampered.
    pub fn decode_remember_token(&self, cookie: &str) -> Option<String> {
        decode_cookie(cookie, &self.secret_key)
    }

    /// Writes the remember cookie onto the response.
    ///
    /// Expiry is now plus the configured duration, unless the session
    /// supplied a TTL override at login time.
    pub fn set_remember_cookie(
        &self,
        response: &mut Response,
        identity: &str,
        ttl_seconds: Option<i64>,
    ) {
        let seconds = ttl_seconds.unwrap_or_else(|| self.config.cookie_duration.num_seconds());
        let mut cookie = Cookie::new(&self.config.cookie_name, self.encode_remember_token(identity))
            .path(&self.config.cookie_path)
            .secure(self.config.cookie_secure)
            .httponly(self.config.cookie_httponly)
            .max_age(seconds)
            .expires(Utc::now() + Duration::seconds(seconds));
        if let Some(ref domain) = self.config.cookie_domain {
            cookie = cookie.domain(domain);
        }
        if let Some(ref samesite) = self.config.cookie_samesite {
            cookie = cookie.samesite(samesite.clone());
        }
        tracing::debug!(cookie = %self.config.cookie_name, "writing remember cookie");
        response.set_cookie(&cookie);
    }

    /// Instructs the client to delete the remember cookie.
    pub fn clear_remember_cookie(&self, response: &mut Response) {
        tracing::debug!(cookie = %self.config.cookie_name, "clearing remember cookie");
        response.delete_cookie(
            &self.config.cookie_name,
            &self.config.cookie_path,
            self.config.cookie_domain.as_deref(),
        );
    }

    /// Handles an unauthenticated caller on a guarded socket handler:
    /// invokes the configured callback, or closes the connection.
    pub async fn socket_unauthenticated(&self, mut conn: Connection) -> Connection {
        match &self.socket_unauthenticated {
            Some(callback) => callback(conn).await,
            None => {
                conn.close();
                conn
            }
        }
    }
}

impl fmt::Debug for LoginManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginManager")
            .field("redirect_to", &self.redirect_to)
            .field("protection_level", &self.config.protection_level)
            .field("has_reverser", &self.reverser.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`LoginManager`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use login_rs::{AuthResult, AuthUser, LoginManager, SimpleUser, UserLoader};
/// use login_rs_http::Connection;
///
/// struct OneUser;
///
/// #[async_trait]
/// impl UserLoader for OneUser {
///     async fn load_user(
///         &self,
///         _conn: &Connection,
///         user_id: &str,
///     ) -> AuthResult<Option<Arc<dyn AuthUser>>> {
///         Ok((user_id == "alice").then(|| {
///             Arc::new(SimpleUser::new("alice", "Alice")) as Arc<dyn AuthUser>
///         }))
///     }
/// }
///
/// let manager = LoginManager::builder(b"secret".to_vec(), "/login")
///     .user_loader(Arc::new(OneUser))
///     .build()
///     .unwrap();
/// assert_eq!(manager.build_redirect_url().unwrap(), "/login");
/// ```
pub struct LoginManagerBuilder {
    secret_key: Vec<u8>,
    redirect_to: String,
    config: Config,
    reverser: Option<Arc<dyn RouteReverser>>,
    loader: Option<Arc<dyn UserLoader>>,
    socket_unauthenticated: Option<SocketUnauthenticatedCallback>,
    anonymous_factory: Option<AnonymousFactory>,
}

impl LoginManagerBuilder {
    /// Replaces the default [`Config`].
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Sets the route reverser used for named redirect targets.
    #[must_use]
    pub fn route_reverser(mut self, reverser: Arc<dyn RouteReverser>) -> Self {
        self.reverser = Some(reverser);
        self
    }

    /// Sets the user loader. Required.
    #[must_use]
    pub fn user_loader(mut self, loader: Arc<dyn UserLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Sets the callback invoked when an unauthenticated caller hits a
    /// guarded socket handler. Defaults to closing the connection.
    #[must_use]
    pub fn socket_unauthenticated(mut self, callback: SocketUnauthenticatedCallback) -> Self {
        self.socket_unauthenticated = Some(callback);
        self
    }

    /// Replaces the anonymous-identity factory.
    #[must_use]
    pub fn anonymous_user(mut self, factory: AnonymousFactory) -> Self {
        self.anonymous_factory = Some(factory);
        self
    }

    /// Builds the manager.
    ///
    /// Fails with [`AuthError::MissingUserLoader`] if no loader was set —
    /// a misconfigured manager must not make it to serving.
    pub fn build(self) -> AuthResult<LoginManager> {
        let loader = self.loader.ok_or(AuthError::MissingUserLoader)?;
        Ok(LoginManager {
            config: self.config,
            secret_key: self.secret_key,
            redirect_to: self.redirect_to,
            reverser: self.reverser,
            loader,
            socket_unauthenticated: self.socket_unauthenticated,
            anonymous_factory: self
                .anonymous_factory
                .unwrap_or_else(|| Arc::new(|| Arc::new(AnonymousUser::new()))),
        })
    }
}
