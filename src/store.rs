//! Persistence of the last known credential.
//!
//! The connector reads the stored credential once when it is built and writes
//! every newly obtained credential back. Where it lives (keychain, file,
//! database row) is up to the [`TokenStore`] implementation.

use std::sync::{Arc, Mutex, PoisonError};

/// Keeps the last known credential across connector (or process) lifetimes.
///
/// Both methods are synchronous and may be slow. The connector calls
/// [`TokenStore::credential`] once while building, and
/// [`TokenStore::set_credential`] after each successful authentication while
/// holding its internal auth gate. Implementations must not call back into
/// the connector that owns them.
///
/// # Examples
///
/// ```
/// use authwire::TokenStore;
/// use std::sync::Mutex;
///
/// #[derive(Default)]
/// struct LoggingStore {
///     token: Mutex<Option<String>>,
/// }
///
/// impl TokenStore for LoggingStore {
///     fn credential(&self) -> Option<String> {
///         self.token.lock().unwrap().clone()
///     }
///
///     fn set_credential(&self, credential: &str) {
///         println!("persisting new credential");
///         *self.token.lock().unwrap() = Some(credential.to_string());
///     }
/// }
/// ```
pub trait TokenStore: Send + Sync {
    /// Returns the stored credential, or `None` if nothing is known.
    fn credential(&self) -> Option<String>;

    /// Replaces the stored credential.
    fn set_credential(&self, credential: &str);
}

impl<T: TokenStore + ?Sized> TokenStore for Arc<T> {
    fn credential(&self) -> Option<String> {
        (**self).credential()
    }

    fn set_credential(&self, credential: &str) {
        (**self).set_credential(credential)
    }
}

/// A [`TokenStore`] that keeps the credential in memory only.
///
/// This is the default store. Credentials do not survive the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    credential: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `credential`.
    pub fn with_credential(credential: impl Into<String>) -> Self {
        Self {
            credential: Mutex::new(Some(credential.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn credential(&self) -> Option<String> {
        self.credential
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_credential(&self, credential: &str) {
        *self
            .credential
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(credential.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.credential(), None);

        store.set_credential("abc");
        assert_eq!(store.credential().as_deref(), Some("abc"));

        store.set_credential("def");
        assert_eq!(store.credential().as_deref(), Some("def"));
    }

    #[test]
    fn test_shared_handle_sees_writes() {
        let store = Arc::new(MemoryTokenStore::with_credential("first"));
        let handle: Box<dyn TokenStore> = Box::new(store.clone());

        handle.set_credential("second");
        assert_eq!(store.credential().as_deref(), Some("second"));
    }
}
