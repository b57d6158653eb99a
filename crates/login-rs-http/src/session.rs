//! Per-connection session store handle.
//!
//! [`Session`] is the key-value store the auth engine reads and mutates
//! during a connection's lifetime. Transport and persistence (signed session
//! cookies, server-side stores) are external concerns: whatever loads the
//! session before the pipeline runs and saves it afterwards only needs the
//! `modified` flag to decide whether a write-back is required.

use std::collections::HashMap;

use serde_json::Value;

/// A mutable view of one connection's session data.
///
/// # Examples
///
/// ```
/// use login_rs_http::Session;
///
/// let mut session = Session::new();
/// session.set("_user_id", "alice".into());
/// assert_eq!(session.get_str("_user_id"), Some("alice"));
/// assert!(session.is_modified());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Session {
    data: HashMap<String, Value>,
    modified: bool,
}

impl Session {
    /// Creates an empty, unmodified session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session seeded with existing data, marked unmodified.
    pub fn from_data(data: HashMap<String, Value>) -> Self {
        Self {
            data,
            modified: false,
        }
    }

    /// Gets a value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Gets a string value by key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Gets a boolean value by key.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.data.get(key).and_then(Value::as_bool)
    }

    /// Gets an integer value by key.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.data.get(key).and_then(Value::as_i64)
    }

    /// Sets a value, marking the session modified.
    pub fn set(&mut self, key: &str, value: Value) {
        self.data.insert(key.to_string(), value);
        self.modified = true;
    }

    /// Removes and returns a value. The session is only marked modified if
    /// the key was present.
    pub fn pop(&mut self, key: &str) -> Option<Value> {
        let removed = self.data.remove(key);
        if removed.is_some() {
            self.modified = true;
        }
        removed
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.data.clear();
        self.modified = true;
    }

    /// Returns `true` if the session holds no entries.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns `true` if the session has been mutated since it was loaded.
    pub const fn is_modified(&self) -> bool {
        self.modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty_and_unmodified() {
        let session = Session::new();
        assert!(session.is_empty());
        assert!(!session.is_modified());
    }

    #[test]
    fn test_set_and_get() {
        let mut session = Session::new();
        session.set("_fresh", Value::Bool(true));
        assert_eq!(session.get_bool("_fresh"), Some(true));
        assert!(session.is_modified());
    }

    #[test]
    fn test_typed_getters() {
        let mut session = Session::new();
        session.set("_user_id", "alice".into());
        session.set("_remember_seconds", 3600.into());
        assert_eq!(session.get_str("_user_id"), Some("alice"));
        assert_eq!(session.get_i64("_remember_seconds"), Some(3600));
        assert_eq!(session.get_bool("_user_id"), None);
    }

    #[test]
    fn test_pop_marks_modified_only_when_present() {
        let mut session = Session::from_data(HashMap::from([(
            "_user_id".to_string(),
            Value::from("alice"),
        )]));
        assert!(!session.is_modified());

        assert!(session.pop("missing").is_none());
        assert!(!session.is_modified());

        assert_eq!(session.pop("_user_id"), Some(Value::from("alice")));
        assert!(session.is_modified());
        assert!(!session.contains_key("_user_id"));
    }

    #[test]
    fn test_clear() {
        let mut session = Session::new();
        session.set("a", 1.into());
        session.set("b", 2.into());
        assert_eq!(session.len(), 2);
        session.clear();
        assert!(session.is_empty());
        assert!(session.is_modified());
    }

    #[test]
    fn test_from_data_is_unmodified() {
        let session =
            Session::from_data(HashMap::from([("theme".to_string(), Value::from("dark"))]));
        assert_eq!(session.get_str("theme"), Some("dark"));
        assert!(!session.is_modified());
    }
}
