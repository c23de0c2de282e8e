//! Google Drive authentication
//!
//! Drive requests carry a bearer token that comes either from configuration
//! (`DRIVE_ACCESS_TOKEN`) or from a service-account key file. For a service
//! account, an RS256-signed JWT is exchanged at the key's token URI and the
//! resulting access token is cached until shortly before it expires.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::StorageConfig;
use crate::types::{AppError, AppResult};

pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

/// Fields of a service-account key file that the token exchange needs
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    client: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn from_file(path: &str) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Auth(format!("Cannot read service account file {}: {}", path, e)))?;
        let key: ServiceAccountKey = serde_json::from_str(&raw)
            .map_err(|e| AppError::Auth(format!("Invalid service account file {}: {}", path, e)))?;
        Self::from_key(key)
    }

    pub fn from_key(key: ServiceAccountKey) -> AppResult<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| AppError::Auth(format!("Invalid service account private key: {}", e)))?;

        info!(client_email = %key.client_email, "Loaded service account credentials");
        Ok(Self {
            key,
            encoding_key,
            client: Client::new(),
            cached: Mutex::new(None),
        })
    }

    fn claims(&self, now: DateTime<Utc>) -> Claims {
        Claims {
            iss: self.key.client_email.clone(),
            scope: DRIVE_SCOPE.to_string(),
            aud: self.key.token_uri.clone(),
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        }
    }

    fn assertion(&self, now: DateTime<Utc>) -> AppResult<String> {
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &self.claims(now), &self.encoding_key)
            .map_err(|e| AppError::Auth(format!("Failed to sign token request: {}", e)))
    }

    pub async fn access_token(&self) -> AppResult<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref() {
            if token.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now {
                return Ok(token.value.clone());
            }
        }

        debug!(token_uri = %self.key.token_uri, "Requesting Drive access token");
        let assertion = self.assertion(now)?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!("Token endpoint returned {}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Invalid token response: {}", e)))?;

        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        });
        Ok(value)
    }
}

/// Where Drive bearer tokens come from
pub enum TokenSource {
    Static(String),
    ServiceAccount(Box<ServiceAccountAuth>),
}

impl TokenSource {
    /// A configured access token wins over a service-account file
    pub fn from_config(config: &StorageConfig) -> AppResult<Self> {
        if let Some(token) = config.access_token.as_ref().filter(|t| !t.is_empty()) {
            return Ok(TokenSource::Static(token.clone()));
        }
        match config.service_account_file.as_deref() {
            Some(path) if !path.is_empty() => Ok(TokenSource::ServiceAccount(Box::new(
                ServiceAccountAuth::from_file(path)?,
            ))),
            _ => Err(AppError::Config(
                "Drive storage needs DRIVE_ACCESS_TOKEN or SERVICE_ACCOUNT_FILE".to_string(),
            )),
        }
    }

    pub async fn access_token(&self) -> AppResult<String> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::ServiceAccount(auth) => auth.access_token().await,
        }
    }
}
