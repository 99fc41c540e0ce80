//! Signup -> confirm -> login orchestration.
//!
//! A linear state machine driven by the screens. It owns the transient
//! signup email between the signup and confirmation steps and is the one
//! place that turns gateway errors into user-facing text.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{ApiError, AuthClient};
use crate::auth::credentials::TokenStore;

/// Where the unauthenticated flow currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Submitting,
    AwaitingConfirmation,
    Authenticated,
    Failed(String),
}

/// Email captured at signup time, threaded to the confirmation step.
/// In-memory only; discarded once confirmation succeeds or the flow is
/// abandoned.
#[derive(Debug, Clone)]
struct PendingSignup {
    email: String,
}

pub struct AuthFlow<S> {
    client: Arc<AuthClient<S>>,
    state: FlowState,
    pending: Option<PendingSignup>,
}

impl<S: TokenStore> AuthFlow<S> {
    pub fn new(client: Arc<AuthClient<S>>) -> Self {
        Self {
            client,
            state: FlowState::Idle,
            pending: None,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// Address awaiting confirmation, if a signup is in progress.
    pub fn pending_email(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.email.as_str())
    }

    /// Register a new account. On success the flow moves to
    /// `AwaitingConfirmation` and keeps the email for the confirm step.
    pub async fn submit_signup(&mut self, name: &str, email: &str, password: &str) {
        if !self.begin_submission() {
            return;
        }
        match self.client.signup(name, email, password).await {
            Ok(()) => {
                self.pending = Some(PendingSignup {
                    email: email.trim().to_string(),
                });
                self.state = FlowState::AwaitingConfirmation;
                info!("signup accepted, awaiting confirmation code");
            }
            Err(e) => self.fail(e),
        }
    }

    /// Verify the code sent to the pending signup address. On success the
    /// flow returns to `Idle`, ready for login; no credential is written.
    pub async fn submit_confirmation(&mut self, code: &str) {
        let Some(email) = self.pending.as_ref().map(|p| p.email.clone()) else {
            self.state = FlowState::Failed("No signup in progress".to_string());
            return;
        };
        if !self.begin_submission() {
            return;
        }
        match self.client.confirm_email(&email, code).await {
            Ok(()) => {
                self.pending = None;
                self.state = FlowState::Idle;
                info!("email confirmed");
            }
            Err(e) => self.fail(e),
        }
    }

    /// Authenticate. On success the credential is already persisted by the
    /// gateway and the flow is `Authenticated`.
    pub async fn submit_login(&mut self, email: &str, password: &str) {
        if !self.begin_submission() {
            return;
        }
        match self.client.login(email, password).await {
            Ok(_) => {
                self.state = FlowState::Authenticated;
                info!("login succeeded");
            }
            Err(e) => self.fail(e),
        }
    }

    /// Ask for the confirmation code to be resent. Returns the message to
    /// show; the flow state is left alone.
    pub async fn resend_code(&self) -> String {
        let Some(email) = self.pending_email().map(String::from) else {
            return "No signup in progress".to_string();
        };
        match self.client.resend_code(&email).await {
            Ok(()) => "Confirmation code sent".to_string(),
            Err(e) => user_message(&e),
        }
    }

    /// Acknowledge a failure; next user action starts from `Idle`.
    /// A pending signup survives dismissal so the code can be retried.
    pub fn dismiss(&mut self) {
        if matches!(self.state, FlowState::Failed(_)) {
            self.state = FlowState::Idle;
        }
    }

    /// Abandon the flow entirely, discarding any pending signup.
    pub fn reset(&mut self) {
        self.state = FlowState::Idle;
        self.pending = None;
    }

    /// Enter `Submitting` unless a submission is already in flight.
    /// One submission per flow instance: a second one is rejected, never
    /// interleaved.
    fn begin_submission(&mut self) -> bool {
        if self.state == FlowState::Submitting {
            warn!("submission already in flight, rejecting");
            return false;
        }
        self.state = FlowState::Submitting;
        true
    }

    fn fail(&mut self, err: ApiError) {
        warn!(error = %err, "submission failed");
        self.state = FlowState::Failed(user_message(&err));
    }
}

/// Translate a gateway error into the text a screen may show. Raw transport
/// error shapes stay out of the presentation layer.
pub fn user_message(err: &ApiError) -> String {
    match err {
        ApiError::Validation(_) => err.to_string(),
        ApiError::Auth(msg) => msg.clone(),
        ApiError::SessionExpired => "Your session has expired. Please log in again.".to_string(),
        ApiError::Network(_) => "Unable to reach the server. Check your connection.".to_string(),
        ApiError::Server(_) => "The service is having trouble. Try again later.".to_string(),
        ApiError::InvalidResponse(_) => {
            "Received an unexpected response from the service.".to_string()
        }
        ApiError::Storage(_) => "Could not access secure credential storage.".to_string(),
        ApiError::NotImplemented => "Resending codes is not supported yet.".to_string(),
    }
}
