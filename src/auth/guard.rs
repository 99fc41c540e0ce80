//! Boot-time session determination and top-level navigation state.

use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::credentials::TokenStore;

/// Tri-state session answer that drives routing. `Unknown` is the mandatory
/// initial value so nothing renders before the store has been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Decides whether a valid session exists, from the credential store alone.
/// Presence of a token is the only signal tracked - no expiry is modeled.
pub struct SessionGuard<S> {
    store: Arc<S>,
    state: AuthState,
}

impl<S: TokenStore> SessionGuard<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            state: AuthState::Unknown,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// One-shot boot read of the credential store. Idempotent: once the
    /// state has left `Unknown` the store is not read again. A storage
    /// failure fails safe to `Unauthenticated` and is logged.
    pub async fn initialize(&mut self) -> AuthState {
        if self.state != AuthState::Unknown {
            return self.state;
        }

        self.state = match self.store.get().await {
            Ok(Some(_)) => AuthState::Authenticated,
            Ok(None) => AuthState::Unauthenticated,
            Err(e) => {
                warn!(error = %e, "credential read failed at startup, treating as signed out");
                AuthState::Unauthenticated
            }
        };

        info!(state = ?self.state, "session state determined");
        self.state
    }

    /// A login just persisted a credential.
    pub fn on_login(&mut self) {
        self.state = AuthState::Authenticated;
    }

    /// Logout completed; route back to the unauthenticated flow.
    pub fn on_logout(&mut self) {
        self.state = AuthState::Unauthenticated;
    }

    /// The gateway reported `SessionExpired`. Transitions at most once per
    /// authenticated period; returns whether this call did the transition.
    pub fn on_session_expired(&mut self) -> bool {
        if self.state == AuthState::Authenticated {
            info!("session expired, routing to login");
            self.state = AuthState::Unauthenticated;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::testing::MemoryStore;

    #[tokio::test]
    async fn starts_unknown_until_initialized() {
        let guard = SessionGuard::new(Arc::new(MemoryStore::new()));
        assert_eq!(guard.state(), AuthState::Unknown);
    }

    #[tokio::test]
    async fn empty_store_boots_to_unauthenticated() {
        let mut guard = SessionGuard::new(Arc::new(MemoryStore::new()));
        assert_eq!(guard.initialize().await, AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn stored_token_boots_to_authenticated() {
        let store = Arc::new(MemoryStore::new());
        store.set("T1").await.unwrap();

        let mut guard = SessionGuard::new(store);
        assert_eq!(guard.initialize().await, AuthState::Authenticated);
    }

    #[tokio::test]
    async fn storage_failure_fails_safe_to_unauthenticated() {
        let mut guard = SessionGuard::new(Arc::new(MemoryStore::failing()));
        assert_eq!(guard.initialize().await, AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn initialize_reads_the_store_only_once() {
        let store = Arc::new(MemoryStore::new());
        let mut guard = SessionGuard::new(Arc::clone(&store));
        guard.initialize().await;

        // A token appearing later must not flip the already-determined state.
        store.set("T1").await.unwrap();
        assert_eq!(guard.initialize().await, AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn session_expiry_transitions_exactly_once() {
        let store = Arc::new(MemoryStore::new());
        store.set("T1").await.unwrap();

        let mut guard = SessionGuard::new(store);
        guard.initialize().await;

        assert!(guard.on_session_expired());
        assert_eq!(guard.state(), AuthState::Unauthenticated);
        assert!(!guard.on_session_expired());
    }

    #[tokio::test]
    async fn login_and_logout_flip_the_state() {
        let mut guard = SessionGuard::new(Arc::new(MemoryStore::new()));
        guard.initialize().await;

        guard.on_login();
        assert_eq!(guard.state(), AuthState::Authenticated);

        guard.on_logout();
        assert_eq!(guard.state(), AuthState::Unauthenticated);
    }
}
