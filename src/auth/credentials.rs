use keyring::Entry;

use crate::api::ApiError;

/// Keychain service name the token entry lives under
const SERVICE_NAME: &str = "gatehouse";

/// Fixed entry name - the app stores exactly one secret
const TOKEN_ENTRY: &str = "session-token";

/// Durable storage for the one bearer token that constitutes a session.
///
/// Callers own the write discipline: there is a single logical writer
/// timeline and the store performs no locking of its own. Every failure is
/// surfaced - nothing is swallowed here.
pub trait TokenStore: Send + Sync {
    async fn get(&self) -> Result<Option<String>, ApiError>;
    async fn set(&self, token: &str) -> Result<(), ApiError>;
    async fn clear(&self) -> Result<(), ApiError>;
}

/// OS keychain persistence via `keyring`, keyed by a single fixed entry.
/// Survives process restarts; the platform keychain provides whatever
/// at-rest protection there is.
#[derive(Default)]
pub struct KeyringStore;

impl KeyringStore {
    pub fn new() -> Self {
        Self
    }

    fn entry() -> Result<Entry, ApiError> {
        Ok(Entry::new(SERVICE_NAME, TOKEN_ENTRY)?)
    }
}

impl TokenStore for KeyringStore {
    async fn get(&self) -> Result<Option<String>, ApiError> {
        match Self::entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, token: &str) -> Result<(), ApiError> {
        Self::entry()?.set_password(token)?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), ApiError> {
        match Self::entry()?.delete_credential() {
            // Clearing an absent token is not an error
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// In-memory stand-in so the gateway and guard can be exercised without
    /// touching the OS keychain.
    #[derive(Default)]
    pub struct MemoryStore {
        token: Mutex<Option<String>>,
        fail: bool,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// A store whose every operation fails with a storage error.
        pub fn failing() -> Self {
            Self {
                token: Mutex::new(None),
                fail: true,
            }
        }

        fn check(&self) -> Result<(), ApiError> {
            if self.fail {
                Err(ApiError::Storage(keyring::Error::Invalid(
                    "test".to_string(),
                    "forced failure".to_string(),
                )))
            } else {
                Ok(())
            }
        }
    }

    impl TokenStore for MemoryStore {
        async fn get(&self) -> Result<Option<String>, ApiError> {
            self.check()?;
            Ok(self.token.lock().unwrap().clone())
        }

        async fn set(&self, token: &str) -> Result<(), ApiError> {
            self.check()?;
            *self.token.lock().unwrap() = Some(token.to_string());
            Ok(())
        }

        async fn clear(&self) -> Result<(), ApiError> {
            self.check()?;
            *self.token.lock().unwrap() = None;
            Ok(())
        }
    }
}
