//! The signed-in user record shared between the login flow and the HTTP client

use crate::error::UserError;
use crate::storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Storage key holding the JSON-encoded [`StoredUser`]
pub const USER_STORAGE_KEY: &str = "xm-user";

/// User record persisted by the login flow
///
/// Only `token` is interpreted here; every other field the backend returned
/// at login is kept in `extra` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoredUser {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            extra: Map::new(),
        }
    }

    /// Read the user record from `store`
    ///
    /// A missing or empty entry yields an empty record; an entry that is not a
    /// JSON object is an error.
    pub fn load(store: &dyn KeyValueStore) -> Result<Self, UserError> {
        match store.get_item(USER_STORAGE_KEY)? {
            Some(raw) if !raw.is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Self::default()),
        }
    }

    /// Persist the record under [`USER_STORAGE_KEY`]
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), UserError> {
        let raw = serde_json::to_string(self)?;
        store.set_item(USER_STORAGE_KEY, &raw)?;
        Ok(())
    }

    /// Remove the stored record
    pub fn clear(store: &dyn KeyValueStore) -> Result<(), UserError> {
        store.remove_item(USER_STORAGE_KEY)?;
        Ok(())
    }

    pub fn token_or_empty(&self) -> &str {
        self.token.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_missing_entry_is_empty_user() {
        let store = MemoryStore::new();
        let user = StoredUser::load(&store).unwrap();
        assert_eq!(user, StoredUser::default());
        assert_eq!(user.token_or_empty(), "");
    }

    #[test]
    fn test_empty_entry_is_empty_user() {
        let store = MemoryStore::with_item(USER_STORAGE_KEY, "");
        assert_eq!(StoredUser::load(&store).unwrap().token, None);
    }

    #[test]
    fn test_load_keeps_extra_fields() {
        let store = MemoryStore::with_item(
            USER_STORAGE_KEY,
            r#"{"id":7,"username":"admin","role":"ADMIN","token":"tok-1"}"#,
        );

        let user = StoredUser::load(&store).unwrap();
        assert_eq!(user.token_or_empty(), "tok-1");
        assert_eq!(user.extra["username"], "admin");
        assert_eq!(user.extra["id"], 7);
    }

    #[test]
    fn test_object_without_token() {
        let store = MemoryStore::with_item(USER_STORAGE_KEY, r#"{"username":"guest"}"#);
        assert_eq!(StoredUser::load(&store).unwrap().token_or_empty(), "");
    }

    #[test]
    fn test_malformed_entry_is_error() {
        let store = MemoryStore::with_item(USER_STORAGE_KEY, "{not json");
        assert!(matches!(
            StoredUser::load(&store),
            Err(UserError::Malformed(_))
        ));
    }

    #[test]
    fn test_save_then_clear() {
        let store = MemoryStore::new();
        let mut user = StoredUser::with_token("abc");
        user.extra.insert("name".into(), Value::from("Ada"));
        user.save(&store).unwrap();

        assert_eq!(StoredUser::load(&store).unwrap(), user);

        StoredUser::clear(&store).unwrap();
        assert_eq!(store.get_item(USER_STORAGE_KEY).unwrap(), None);
    }
}
