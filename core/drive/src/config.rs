//! Client configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use drivekit_common::{Error, Result};

use crate::auth::AuthConfig;
use crate::endpoints::EndpointTable;

const DEFAULT_USER_AGENT: &str = concat!("drivekit/", env!("CARGO_PKG_VERSION"));

/// Everything a [`DriveClient`](crate::DriveClient) needs besides a credential.
///
/// Loaded once at startup and owned by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveConfig {
    /// OAuth2 client settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Endpoint templates. Entries given in a config file override the
    /// defaults one by one.
    #[serde(default, deserialize_with = "merge_with_defaults")]
    pub endpoints: EndpointTable,
    /// `User-Agent` sent on every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            auth: AuthConfig::default(),
            endpoints: EndpointTable::default(),
            user_agent: default_user_agent(),
        }
    }
}

impl DriveConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    /// - `Io` if the file cannot be read
    /// - `Configuration` if it is not a valid configuration document
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| {
            Error::Configuration(format!("Invalid config {}: {}", path.display(), e))
        })
    }

    /// Point every default endpoint at other base URLs.
    pub fn with_bases(mut self, api_base: &str, upload_base: &str) -> Self {
        self.endpoints = EndpointTable::with_bases(api_base, upload_base);
        self
    }

    /// Override one endpoint template.
    pub fn with_endpoint(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.endpoints.set(name, template);
        self
    }

    /// Override the OAuth2 client credentials.
    pub fn with_client(mut self, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        self.auth.client_id = client_id.into();
        self.auth.client_secret = client_secret.into();
        self
    }
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn merge_with_defaults<'de, D>(deserializer: D) -> std::result::Result<EndpointTable, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let overrides = EndpointTable::deserialize(deserializer)?;
    let mut table = EndpointTable::default();
    table.merge(overrides);
    Ok(table)
}
