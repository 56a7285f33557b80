use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::Mutex;

pub const FIREBASE_MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN: Duration = Duration::from_secs(60);
/// Upper bound on how long a fetched token is trusted, whatever the endpoint claims.
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Failed to read service account key: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed service account key: {0}")]
    MalformedKey(#[from] serde_json::Error),
    #[error("Failed to sign token assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("Token exchange failed: {0}")]
    Exchange(#[from] reqwest::Error),
    #[error("Token endpoint rejected the assertion with status {0}")]
    Rejected(u16),
}

/// Source of bearer tokens for the push gateway.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync + std::fmt::Debug {
    /// Returns a currently valid access token, refreshing it if needed.
    ///
    /// # Errors
    /// Returns an error if no usable token can be obtained.
    async fn access_token(&self) -> Result<String, CredentialError>;
}

/// A fixed token, typically injected through configuration for local gateways.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StaticToken").field(&"<redacted>").finish()
    }
}

#[async_trait]
impl AccessTokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, CredentialError> {
        Ok(self.0.clone())
    }
}

/// The fields of a Google service account key file that the token exchange needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Reads a service account key from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a service account key.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CredentialError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// OAuth2 service account flow: a signed JWT assertion is exchanged for an access token.
///
/// Tokens are cached and only re-fetched once they are about to expire.
pub struct ServiceAccountCredentials {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for ServiceAccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountCredentials").field("key", &self.key).finish_non_exhaustive()
    }
}

impl ServiceAccountCredentials {
    /// # Errors
    /// Returns an error if the private key is not a valid RSA PEM key.
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> Result<Self, CredentialError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        Ok(Self { key, encoding_key, http, cached: Mutex::new(None) })
    }

    fn sign_assertion(&self) -> Result<String, CredentialError> {
        let iat = OffsetDateTime::now_utc().unix_timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: FIREBASE_MESSAGING_SCOPE,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        Ok(jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)?)
    }

    #[tracing::instrument(level = "debug", skip(self), fields(client_email = %self.key.client_email), err)]
    async fn fetch_token(&self) -> Result<CachedToken, CredentialError> {
        let assertion = self.sign_assertion()?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CredentialError::Rejected(status.as_u16()));
        }

        let body: TokenResponse = response.json().await?;
        tracing::debug!(expires_in = body.expires_in, "Obtained gateway access token");
        Ok(CachedToken { token: body.access_token, expires_at: expiry_from_now(body.expires_in) })
    }
}

fn expiry_from_now(expires_in: u64) -> Instant {
    Instant::now() + Duration::from_secs(expires_in).min(MAX_TOKEN_LIFETIME)
}

#[async_trait]
impl AccessTokenProvider for ServiceAccountCredentials {
    async fn access_token(&self) -> Result<String, CredentialError> {
        let mut cached = self.cached.lock().await;
        if let Some(current) = cached.as_ref()
            && current.expires_at > Instant::now() + REFRESH_MARGIN
        {
            return Ok(current.token.clone());
        }

        let fresh = self.fetch_token().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}
