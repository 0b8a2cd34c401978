//! OAuth2 authorization-code flow for Google Drive.

use chrono::{Duration, Utc};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use drivekit_common::{Credential, Error, Result};

/// OAuth2 authorization endpoint.
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// OAuth2 token endpoint.
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Redirect URL for OAuth2 flow (localhost for desktop apps).
const REDIRECT_URL: &str = "http://localhost:8080/callback";

/// Full read/write access to the user's Drive.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

type GoogleClient = BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Configuration for OAuth2 authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub scope: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_url: REDIRECT_URL.to_string(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            scope: DRIVE_SCOPE.to_string(),
        }
    }
}

impl AuthConfig {
    /// Configuration for an installed-app client.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            ..Self::default()
        }
    }
}

/// OAuth2 authentication manager for Google Drive.
pub struct AuthManager {
    client: GoogleClient,
    http: oauth2::reqwest::Client,
    config: AuthConfig,
}

impl AuthManager {
    /// Create a new authentication manager.
    ///
    /// # Errors
    /// - `Configuration` if the client ID is empty or a URL is invalid
    pub fn new(config: AuthConfig) -> Result<Self> {
        if config.client_id.is_empty() {
            return Err(Error::Configuration(
                "OAuth2 client ID is not set".to_string(),
            ));
        }

        let client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.client_secret.clone()))
            .set_auth_uri(
                AuthUrl::new(config.auth_url.clone())
                    .map_err(|e| Error::Configuration(format!("Invalid auth URL: {}", e)))?,
            )
            .set_token_uri(
                TokenUrl::new(config.token_url.clone())
                    .map_err(|e| Error::Configuration(format!("Invalid token URL: {}", e)))?,
            )
            .set_redirect_uri(
                RedirectUrl::new(config.redirect_url.clone())
                    .map_err(|e| Error::Configuration(format!("Invalid redirect URL: {}", e)))?,
            );

        // Following redirects on the token endpoint would leak the code.
        let http = oauth2::reqwest::ClientBuilder::new()
            .redirect(oauth2::reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            http,
            config,
        })
    }

    /// Generate the authorization URL for the user to visit.
    ///
    /// Returns the URL and a CSRF state that should be verified on callback.
    pub fn authorization_url(&self) -> (String, String) {
        let (auth_url, csrf_token) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(self.config.scope.clone()))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .url();

        (auth_url.to_string(), csrf_token.secret().clone())
    }

    /// Exchange an authorization code for a credential.
    ///
    /// # Errors
    /// - `Authentication` if the code is rejected or the exchange fails
    pub async fn exchange_code(&self, code: &str) -> Result<Credential> {
        let token_result = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| Error::Authentication(format!("Token exchange failed: {}", e)))?;

        info!("Authorization code exchanged for access token");
        Ok(credential_from(&token_result, None))
    }

    /// Obtain a fresh access token from a refresh token.
    ///
    /// The returned credential keeps `refresh_token` when the server does not
    /// issue a new one.
    ///
    /// # Errors
    /// - `Authentication` if the refresh token is invalid or revoked
    pub async fn refresh(&self, refresh_token: &str) -> Result<Credential> {
        let token_result = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| Error::Authentication(format!("Token refresh failed: {}", e)))?;

        info!("Access token refreshed");
        Ok(credential_from(&token_result, Some(refresh_token)))
    }

    /// Get the current configuration.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

fn credential_from(token: &BasicTokenResponse, previous_refresh: Option<&str>) -> Credential {
    let expires_at = token
        .expires_in()
        .and_then(|expires_in| Duration::from_std(expires_in).ok())
        .map(|expires_in| Utc::now() + expires_in);

    let refresh_token = token
        .refresh_token()
        .map(|t| t.secret().clone())
        .or_else(|| previous_refresh.map(str::to_string));

    Credential {
        access_token: token.access_token().secret().clone(),
        refresh_token,
        expires_at,
    }
}

/// Extract the authorization code from whatever the user pasted.
///
/// Accepts either the bare code or the full redirect URL. A URL must carry a
/// `state` parameter equal to `expected_state`.
///
/// # Errors
/// - `Authentication` on missing or mismatched state, or when the redirect reports an error
/// - `InvalidInput` if a URL carries no code
pub fn parse_redirect(input: &str, expected_state: &str) -> Result<String> {
    let input = input.trim();

    let url = match url::Url::parse(input) {
        Ok(url) => url,
        Err(_) => return Ok(input.to_string()),
    };

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => {
                return Err(Error::Authentication(format!(
                    "Authorization was denied: {}",
                    value
                )))
            }
            _ => {}
        }
    }

    match state {
        Some(state) if state == expected_state => {}
        Some(_) => {
            return Err(Error::Authentication(
                "CSRF state mismatch in redirect URL".to_string(),
            ))
        }
        None => {
            return Err(Error::Authentication(
                "Redirect URL carries no state".to_string(),
            ))
        }
    }

    code.ok_or_else(|| Error::InvalidInput("Redirect URL carries no code".to_string()))
}
