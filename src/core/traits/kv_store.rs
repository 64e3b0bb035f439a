use crate::core::errors::Result;

/// Port for durable string key/value persistence.
///
/// The lockout and session state live behind this abstraction so that
/// tests can substitute an in-memory store; production uses a JSON file
/// per store under `.roamguard/`. Values are opaque to the store;
/// callers serialize their own records.
pub trait KeyValueStore: Send + Sync {
    /// Read the value for `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write (or overwrite) the value for `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
