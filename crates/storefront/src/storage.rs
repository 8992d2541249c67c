//! Durable per-visitor key-value storage.
//!
//! The storefront keeps a visitor's saved checkout details in a single JSON
//! blob under [`CHECKOUT_FORM_STORAGE_KEY`]. Reads and writes are plain get/set
//! with no versioning: a JSON `null` is a stored value like any other and is
//! how "forget my details" is recorded.
//!
//! Production uses [`SessionStorage`] (the visitor's `tower-sessions` session,
//! persisted in `PostgreSQL`). Tests use [`MemoryStorage`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tower_sessions::Session;

/// Storage key for saved checkout details.
pub const CHECKOUT_FORM_STORAGE_KEY: &str = "checkout-form";

/// Errors from the underlying storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The session backend failed.
    #[error("Session storage error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// A stored value could not be encoded or decoded.
    #[error("Stored value has unexpected shape: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Get/set of JSON values under string keys.
pub trait LocalStorage: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn read(&self, key: &str) -> impl Future<Output = Result<Option<Value>, StorageError>> + Send;

    /// Store `value` under `key`, replacing what was there.
    fn write(&self, key: &str, value: Value)
    -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Read and decode a value. A stored `null` reads as `None`.
///
/// # Errors
///
/// Returns an error if the storage fails or the value does not decode as `T`.
pub async fn read_json<T, S>(storage: &S, key: &str) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
    S: LocalStorage,
{
    match storage.read(key).await? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
    }
}

/// Encode and store a value. `None` stores `null`.
///
/// # Errors
///
/// Returns an error if encoding or the storage fails.
pub async fn write_json<T, S>(storage: &S, key: &str, value: Option<&T>) -> Result<(), StorageError>
where
    T: Serialize + Sync,
    S: LocalStorage,
{
    let value = match value {
        Some(value) => serde_json::to_value(value)?,
        None => Value::Null,
    };
    storage.write(key, value).await
}

/// Storage backed by the visitor's session.
#[derive(Clone, Debug)]
pub struct SessionStorage {
    session: Session,
}

impl SessionStorage {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl LocalStorage for SessionStorage {
    async fn read(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.session.get::<Value>(key).await?)
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.session.insert(key, value).await?;
        Ok(())
    }
}

/// In-memory storage.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    values: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

impl LocalStorage for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.values.lock().insert(key.to_owned(), value);
        Ok(())
    }
}
