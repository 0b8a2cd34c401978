//! Common types used throughout drivekit.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// MIME type Google Drive uses to mark an item as a folder.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// OAuth2 bearer credential.
///
/// Token strings are wiped from memory when the value is dropped.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Credential {
    /// Access token presented as `Authorization: Bearer <token>`.
    pub access_token: String,
    /// Refresh token, when the grant included offline access.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// When the access token expires.
    #[serde(default)]
    #[zeroize(skip)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Create a credential from a bare access token.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    /// Check if the access token is expired or about to expire.
    ///
    /// A credential without a recorded expiry is never considered expired.
    pub fn is_expired(&self) -> bool {
        // Less than a minute remaining counts as expired
        match self.expires_at {
            Some(at) => at < Utc::now() + Duration::minutes(1),
            None => false,
        }
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
