//! Session lifecycle: credential persistence, the signup/login flow, and
//! the boot-time session guard.
//!
//! - `TokenStore` / `KeyringStore`: durable storage for the one bearer token
//! - `AuthFlow`: the signup -> confirm -> login state machine
//! - `SessionGuard`: tri-state auth answer driving top-level navigation

pub mod credentials;
pub mod flow;
pub mod guard;

pub use credentials::{KeyringStore, TokenStore};
pub use flow::{user_message, AuthFlow, FlowState};
pub use guard::{AuthState, SessionGuard};
