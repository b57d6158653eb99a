//! The identity surface: authenticated users, the anonymous user, and the
//! connection attachment point.
//!
//! The engine never looks inside an application's user model; it only
//! consumes the [`AuthUser`] capability surface. [`SimpleUser`] is a ready
//! implementation for applications that do not need their own, and the one
//! the tests use.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use login_rs_http::Connection;

/// The capability surface of a resolved caller.
pub trait AuthUser: Send + Sync {
    /// Whether this identity was authenticated.
    fn is_authenticated(&self) -> bool;

    /// The stable unique key for this identity. Must be `Some` to start a
    /// session; anonymous identities return `None`.
    fn identity(&self) -> Option<String>;

    /// A human-readable name for display purposes.
    fn display_name(&self) -> String;
}

/// The unauthenticated caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousUser;

impl AnonymousUser {
    /// Creates a new anonymous user.
    pub const fn new() -> Self {
        Self
    }
}

impl AuthUser for AnonymousUser {
    fn is_authenticated(&self) -> bool {
        false
    }

    fn identity(&self) -> Option<String> {
        None
    }

    fn display_name(&self) -> String {
        String::new()
    }
}

/// A minimal concrete authenticated user.
///
/// # Examples
///
/// ```
/// use login_rs::identity::{AuthUser, SimpleUser};
///
/// let user = SimpleUser::new("alice", "Alice");
/// assert!(user.is_authenticated());
/// assert_eq!(user.identity().as_deref(), Some("alice"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleUser {
    /// The stable unique identity key.
    pub id: String,
    /// The display name.
    pub name: String,
}

impl SimpleUser {
    /// Creates a user from its identity key and display name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl AuthUser for SimpleUser {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn identity(&self) -> Option<String> {
        Some(self.id.clone())
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

/// The identity attached to a connection, stored in its extensions.
#[derive(Clone)]
struct CurrentUser(Arc<dyn AuthUser>);

/// Attaches `user` to the connection as the current identity.
pub fn attach_user(conn: &mut Connection, user: Arc<dyn AuthUser>) {
    conn.extensions_mut().insert(CurrentUser(user));
}

/// Returns the identity attached to the connection, if any.
///
/// `None` means the authentication middleware has not run for this
/// connection (e.g. an excluded path); an anonymous caller is `Some` with
/// `is_authenticated() == false`.
pub fn current_user(conn: &Connection) -> Option<Arc<dyn AuthUser>> {
    conn.extensions()
        .get::<CurrentUser>()
        .map(|current| Arc::clone(&current.0))
}
