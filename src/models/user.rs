use serde::Deserialize;

/// Read-only profile projection returned by the identity service.
///
/// Not cached anywhere - screens re-fetch it on demand and drop it when
/// they go away.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    /// Cognito-style string flag, "true" or "false".
    pub email_verified: String,
    /// Subject identifier assigned by the identity provider.
    pub sub: String,
    pub username: String,
}

impl UserProfile {
    pub fn is_email_verified(&self) -> bool {
        self.email_verified == "true"
    }
}
