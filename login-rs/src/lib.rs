//! # login-rs
//!
//! A per-connection authentication engine: session-based login state, a
//! signed remember-me cookie, session-fixation protection, and access
//! guards, framework-agnostic over the `login-rs-http` connection layer.
//!
//! The moving parts:
//!
//! - [`LoginManager`] holds the policy: the [`Config`], the secret key, the
//!   application's [`UserLoader`], and the login redirect target.
//! - [`AuthenticationMiddleware`] runs an [`AuthenticationBackend`]
//!   (default: [`SessionAuthBackend`]) on every connection and attaches the
//!   resolved identity; on the way out it writes or clears the remember
//!   cookie.
//! - [`login_user`] / [`logout_user`] start and end sessions from inside
//!   handlers.
//! - [`login_required`], [`fresh_login_required`], and [`ws_login_required`]
//!   wrap handlers with access checks.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use login_rs::{
//!     login_required, AuthResult, AuthUser, LoginManager, SimpleUser, UserLoader,
//! };
//! use login_rs_http::{view, Connection, Response};
//!
//! struct SingleUser;
//!
//! #[async_trait]
//! impl UserLoader for SingleUser {
//!     async fn load_user(
//!         &self,
//!         _conn: &Connection,
//!         user_id: &str,
//!     ) -> AuthResult<Option<Arc<dyn AuthUser>>> {
//!         Ok((user_id == "alice").then(|| {
//!             Arc::new(SimpleUser::new("alice", "Alice")) as Arc<dyn AuthUser>
//!         }))
//!     }
//! }
//!
//! let manager = Arc::new(
//!     LoginManager::builder(b"change-me".to_vec(), "/login")
//!         .user_loader(Arc::new(SingleUser))
//!         .build()
//!         .unwrap(),
//! );
//!
//! let protected = login_required(
//!     manager,
//!     view(|conn: Connection| async move { (conn, Response::ok("hello")) }),
//! );
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod guards;
pub mod identity;
pub mod manager;
pub mod middleware;
pub mod session_utils;
pub mod token;

pub use backend::{AuthenticationBackend, SessionAuthBackend};
pub use config::{Config, ProtectionLevel};
pub use error::{AuthError, AuthResult};
pub use guards::{fresh_login_required, login_required, ws_login_required};
pub use identity::{attach_user, current_user, AnonymousUser, AuthUser, SimpleUser};
pub use manager::{
    AnonymousFactory, LoginManager, LoginManagerBuilder, SocketUnauthenticatedCallback, UserLoader,
};
pub use middleware::AuthenticationMiddleware;
pub use session_utils::{create_identifier, login_user, logout_user, make_next_url, LoginOptions};
pub use token::{decode_cookie, encode_cookie};
