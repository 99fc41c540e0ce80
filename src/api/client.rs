//! API client for the identity service.
//!
//! All four round trips (signup, confirm, login, user info) live here, plus
//! the logout that only touches local state. The client holds a reference to
//! the credential store and reads it per call - the token is never cached
//! across requests.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::credentials::TokenStore;
use crate::models::UserProfile;

use super::ApiError;

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct SignupRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct ConfirmRequest<'a> {
    email: &'a str,
    code: &'a str,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Login success body. Depending on deployment the token arrives at the top
/// level or inside the service's `data` envelope; both are accepted.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
    data: Option<LoginData>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    access_token: Option<String>,
}

impl LoginResponse {
    fn into_token(self) -> Option<String> {
        self.access_token
            .or_else(|| self.data.and_then(|d| d.access_token))
    }
}

/// GET /user/info envelope: `{status, data: {attributes, username}}`
#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    data: UserInfoData,
}

#[derive(Debug, Deserialize)]
struct UserInfoData {
    attributes: UserAttributes,
    username: String,
}

#[derive(Debug, Deserialize)]
struct UserAttributes {
    name: String,
    email: String,
    email_verified: String,
    sub: String,
}

impl UserInfoResponse {
    fn into_profile(self) -> UserProfile {
        UserProfile {
            name: self.data.attributes.name,
            email: self.data.attributes.email,
            email_verified: self.data.attributes.email_verified,
            sub: self.data.attributes.sub,
            username: self.data.username,
        }
    }
}

/// Gateway to the identity service.
pub struct AuthClient<S> {
    http: Client,
    base_url: String,
    store: Arc<S>,
}

impl<S: TokenStore> AuthClient<S> {
    pub fn new(base_url: &str, store: Arc<S>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
        })
    }

    /// Register a new account. Does not establish a session - the service
    /// sends a confirmation code to the given address instead.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<(), ApiError> {
        let name = require(name, "Name")?;
        let email = require(email, "Email")?;
        let password = require(password, "Password")?;

        let url = format!("{}/signup", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&SignupRequest {
                name,
                email,
                password,
            })
            .send()
            .await?;
        Self::check(response).await?;

        debug!(email, "signup accepted");
        Ok(())
    }

    /// Validate a confirmation code against a pending account.
    pub async fn confirm_email(&self, email: &str, code: &str) -> Result<(), ApiError> {
        let email = require(email, "Email")?;
        let code = require(code, "Verification code")?;

        let url = format!("{}/confirm", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&ConfirmRequest { email, code })
            .send()
            .await?;
        Self::check(response).await?;

        debug!(email, "email confirmed");
        Ok(())
    }

    /// Authenticate and persist the returned token. The store write
    /// completes before this returns, so a subsequent read anywhere in the
    /// app sees the new credential.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let email = require(email, "Email")?;
        let password = require(password, "Password")?;

        let url = format!("{}/login", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&LoginRequest { email, password })
            .send()
            .await?;
        let response = Self::check(response).await?;

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        let token = body
            .into_token()
            .ok_or_else(|| ApiError::InvalidResponse("login response missing access_token".to_string()))?;

        self.store.set(&token).await?;
        debug!(email, "login succeeded, token stored");
        Ok(token)
    }

    /// Fetch the caller's profile. Requires a stored credential; without one
    /// the request goes out bare and the service answers 401, which maps to
    /// `SessionExpired`.
    pub async fn get_user_info(&self) -> Result<UserProfile, ApiError> {
        let url = format!("{}/user/info", self.base_url);

        // The store read must settle before the request is dispatched.
        let mut request = self.http.get(&url);
        if let Some(token) = self.store.get().await? {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let response = Self::check_protected(response).await?;

        let body: UserInfoResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        Ok(body.into_profile())
    }

    /// Ask the service to resend the confirmation code.
    /// No such endpoint exists upstream yet; callers get a defined error
    /// instead of a silent no-op.
    pub async fn resend_code(&self, _email: &str) -> Result<(), ApiError> {
        Err(ApiError::NotImplemented)
    }

    /// End the session. There is no server-side session to invalidate - the
    /// stored token is the only session state, so this is purely local.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.store.clear().await?;
        debug!("token cleared, logged out");
        Ok(())
    }

    /// Check an unauthenticated response, turning failures into `ApiError`
    /// with the service's message attached.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Check a credentialed response; 401 becomes `SessionExpired`.
    async fn check_protected(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_protected_status(status, &body))
        }
    }
}

/// Reject empty required fields before any network dispatch.
fn require<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ApiError::Validation(field))
    } else {
        Ok(trimmed)
    }
}
