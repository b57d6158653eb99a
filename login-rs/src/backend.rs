//! Identity resolution for incoming connections.
//!
//! [`SessionAuthBackend`] is the default [`AuthenticationBackend`]: it runs
//! the session-fixation check, reads the identity key from the session,
//! falls back to the signed remember cookie, and materializes the identity
//! through the manager's user loader. Applications with another source of
//! identity (API keys, upstream proxy headers) implement the trait
//! themselves and hand it to the middleware.

use std::sync::Arc;

use async_trait::async_trait;

use login_rs_http::Connection;

use crate::error::AuthResult;
use crate::identity::AuthUser;
use crate::manager::LoginManager;
use crate::session_utils::create_identifier;

/// Resolves the identity behind a connection.
#[async_trait]
pub trait AuthenticationBackend: Send + Sync {
    /// Resolves the caller's identity. Must always return an identity —
    /// anonymous for unresolved callers — and may mutate the session as a
    /// side effect (fixation downgrades, cookie-restore bookkeeping).
    async fn authenticate(&self, conn: &mut Connection) -> AuthResult<Arc<dyn AuthUser>>;
}

/// Session-and-remember-cookie identity resolution.
#[derive(Debug)]
pub struct SessionAuthBackend {
    manager: Arc<LoginManager>,
}

impl SessionAuthBackend {
    /// Creates a backend over the given manager.
    pub const fn new(manager: Arc<LoginManager>) -> Self {
        Self { manager }
    }

    /// Compares the stored fingerprint against the connection's and applies
    /// the configured protection on mismatch. An absent stored fingerprint
    /// counts as a mismatch: a session that never recorded one cannot vouch
    /// for this client.
    fn apply_session_protection(&self, conn: &mut Connection) {
        let config = self.manager.config();
        let fingerprint = create_identifier(conn);
        let stored = conn
            .session()
            .get_str(&config.session_key_id)
            .map(str::to_owned);
        if stored.as_deref() == Some(fingerprint.as_str()) {
            return;
        }

        if self.manager.protection_is_strong() {
            tracing::info!("fingerprint mismatch under strong protection, purging session");
            let keys: Vec<String> = config.session_keys().map(str::to_owned).into();
            let session = conn.session_mut();
            for key in &keys {
                session.pop(key);
            }
            session.set(&config.session_key_remember, "clear".into());
        } else {
            tracing::info!("fingerprint mismatch, session downgraded to non-fresh");
            conn.session_mut().set(&config.session_key_fresh, false.into());
        }
    }

    /// The identity key for this connection: the session's, or the remember
    /// cookie's. A cookie restore marks the session non-fresh.
    fn resolve_user_id(&self, conn: &mut Connection) -> Option<String> {
        let config = self.manager.config();
        if let Some(user_id) = conn
            .session()
            .get_str(&config.session_key_user)
            .map(str::to_owned)
        {
            return Some(user_id);
        }

        // A pending clear (logout or purge) outranks the cookie the client
        // is still presenting.
        if conn.session().get_str(&config.session_key_remember) == Some("clear") {
            return None;
        }

        let cookie = conn.cookie(&config.cookie_name).map(str::to_owned)?;
        let user_id = self.manager.decode_remember_token(&cookie)?;
        tracing::debug!("session restored from remember cookie");
        // A cookie-restored session is never fresh; the identity key itself
        // stays in the cookie, not the session.
        conn.session_mut().set(&config.session_key_fresh, false.into());
        Some(user_id)
    }
}

#[async_trait]
impl AuthenticationBackend for SessionAuthBackend {
    async fn authenticate(&self, conn: &mut Connection) -> AuthResult<Arc<dyn AuthUser>> {
        self.apply_session_protection(conn);

        let Some(user_id) = self.resolve_user_id(conn) else {
            return Ok(self.manager.anonymous_user());
        };

        match self.manager.load_user(conn, &user_id).await? {
            Some(user) => Ok(user),
            None => {
                tracing::debug!(user_id, "stored identity no longer exists");
                Ok(self.manager.anonymous_user())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use login_rs_http::ConnectionBuilder;

    use crate::config::{Config, ProtectionLevel};
    use crate::identity::SimpleUser;
    use crate::manager::UserLoader;
    use crate::session_utils::{login_user, LoginOptions};

    struct MapLoader {
        users: HashMap<String, SimpleUser>,
    }

    impl MapLoader {
        fn with_alice() -> Self {
            let mut users = HashMap::new();
            users.insert("alice".to_string(), SimpleUser::new("alice", "Alice"));
            Self { users }
        }
    }

    #[async_trait]
    impl UserLoader for MapLoader {
        async fn load_user(
            &self,
            _conn: &Connection,
            user_id: &str,
        ) -> AuthResult<Option<Arc<dyn AuthUser>>> {
            Ok(self
                .users
                .get(user_id)
                .map(|user| Arc::new(user.clone()) as Arc<dyn AuthUser>))
        }
    }

    fn manager_with(config: Config) -> Arc<LoginManager> {
        Arc::new(
            LoginManager::builder(b"secret".to_vec(), "/login")
                .config(config)
                .user_loader(Arc::new(MapLoader::with_alice()))
                .build()
                .unwrap(),
        )
    }

    fn manager() -> Arc<LoginManager> {
        manager_with(Config::default())
    }

    fn client() -> ConnectionBuilder {
        Connection::builder()
            .client_addr("10.0.0.1")
            .header("user-agent", "test-agent")
    }

    fn logged_in_conn(manager: &LoginManager) -> Connection {
        let mut conn = client().build();
        login_user(
            manager,
            &mut conn,
            Arc::new(SimpleUser::new("alice", "Alice")),
            &LoginOptions::default(),
        );
        conn
    }

    #[tokio::test]
    async fn test_empty_session_resolves_anonymous() {
        let backend = SessionAuthBackend::new(manager());
        let mut conn = client().build();
        let user = backend.authenticate(&mut conn).await.unwrap();
        assert!(!user.is_authenticated());
    }

    #[tokio::test]
    async fn test_session_user_resolved() {
        let manager = manager();
        let backend = SessionAuthBackend::new(manager.clone());
        let mut conn = logged_in_conn(&manager);

        let user = backend.authenticate(&mut conn).await.unwrap();
        assert!(user.is_authenticated());
        assert_eq!(user.identity().as_deref(), Some("alice"));
        // Matching fingerprint keeps the session fresh.
        assert_eq!(conn.session().get_bool("_fresh"), Some(true));
    }

    #[tokio::test]
    async fn test_unknown_session_user_resolves_anonymous() {
        let manager = manager();
        let backend = SessionAuthBackend::new(manager.clone());
        let mut conn = logged_in_conn(&manager);
        conn.session_mut().set("_user_id", "ghost".into());

        let user = backend.authenticate(&mut conn).await.unwrap();
        assert!(!user.is_authenticated());
    }

    #[tokio::test]
    async fn test_basic_protection_downgrades_on_mismatch() {
        let manager = manager();
        let backend = SessionAuthBackend::new(manager.clone());
        let mut conn = logged_in_conn(&manager);
        // Same session presented from a different client.
        let session = conn.session().clone();
        let mut conn = client()
            .client_addr("203.0.113.9")
            .session(session)
            .build();

        let user = backend.authenticate(&mut conn).await.unwrap();
        assert!(user.is_authenticated());
        assert_eq!(conn.session().get_bool("_fresh"), Some(false));
        assert_eq!(conn.session().get_str("_user_id"), Some("alice"));
    }

    #[tokio::test]
    async fn test_strong_protection_purges_on_mismatch() {
        let manager = manager_with(Config {
            protection_level: ProtectionLevel::Strong,
            ..Config::default()
        });
        let backend = SessionAuthBackend::new(manager.clone());
        let conn = logged_in_conn(&manager);
        let session = conn.session().clone();
        let mut conn = client()
            .client_addr("203.0.113.9")
            .session(session)
            .build();

        let user = backend.authenticate(&mut conn).await.unwrap();
        assert!(!user.is_authenticated());
        assert!(conn.session().get_str("_user_id").is_none());
        assert!(conn.session().get_bool("_fresh").is_none());
        assert_eq!(conn.session().get_str("_remember"), Some("clear"));
    }

    #[tokio::test]
    async fn test_missing_fingerprint_counts_as_mismatch() {
        let manager = manager();
        let backend = SessionAuthBackend::new(manager.clone());
        let mut conn = logged_in_conn(&manager);
        conn.session_mut().pop("_id");

        backend.authenticate(&mut conn).await.unwrap();
        assert_eq!(conn.session().get_bool("_fresh"), Some(false));
    }

    #[tokio::test]
    async fn test_remember_cookie_restores_session_non_fresh() {
        let manager = manager();
        let backend = SessionAuthBackend::new(manager.clone());
        let token = manager.encode_remember_token("alice");
        let mut conn = client()
            .header("cookie", &format!("remember_token={token}"))
            .build();

        let user = backend.authenticate(&mut conn).await.unwrap();
        assert!(user.is_authenticated());
        assert_eq!(user.identity().as_deref(), Some("alice"));
        assert_eq!(conn.session().get_bool("_fresh"), Some(false));
        assert!(conn.session().get_str("_user_id").is_none());
    }

    #[tokio::test]
    async fn test_tampered_remember_cookie_ignored() {
        let manager = manager();
        let backend = SessionAuthBackend::new(manager.clone());
        let mut conn = client()
            .header("cookie", "remember_token=alice|deadbeef")
            .build();

        let user = backend.authenticate(&mut conn).await.unwrap();
        assert!(!user.is_authenticated());
        assert!(conn.session().get_str("_user_id").is_none());
    }

    #[tokio::test]
    async fn test_pending_clear_blocks_cookie_restore() {
        let manager = manager();
        let backend = SessionAuthBackend::new(manager.clone());
        let token = manager.encode_remember_token("alice");
        let mut conn = client()
            .header("cookie", &format!("remember_token={token}"))
            .build();
        conn.session_mut().set("_remember", "clear".into());

        let user = backend.authenticate(&mut conn).await.unwrap();
        assert!(!user.is_authenticated());
    }
}
