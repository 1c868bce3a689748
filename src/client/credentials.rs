//! Service-account credentials and OAuth2 access tokens.
//!
//! The key file is the JSON downloaded from the Cloud console. An access
//! token is obtained by signing a JWT assertion with the key and exchanging
//! it at the key's `token_uri`.

use crate::error::{Error, Result};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// OAuth2 scope for the Vision API.
pub const VISION_SCOPE: &str = "https://www.googleapis.com/auth/cloud-vision";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// A Google service-account key, with its PEM already parsed.
#[derive(Clone)]
pub struct ServiceAccountKey {
    pub key_type: String,
    pub project_id: Option<String>,
    pub private_key_id: Option<String>,
    pub client_email: String,
    pub token_uri: String,
    signing_key: EncodingKey,
}

/// On-disk layout of the key file.
#[derive(Deserialize)]
struct KeyFile {
    #[serde(rename = "type")]
    key_type: String,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    private_key_id: Option<String>,
    private_key: String,
    client_email: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Parse and check a key from JSON text.
    ///
    /// The RSA private key is decoded here, so a key that cannot sign is
    /// rejected before any request is made.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: KeyFile = serde_json::from_str(json)
            .map_err(|e| Error::Credentials(format!("malformed key file: {}", e)))?;

        if file.key_type != "service_account" {
            return Err(Error::Credentials(format!(
                "expected a service_account key, found '{}'",
                file.key_type
            )));
        }
        if file.client_email.trim().is_empty() {
            return Err(Error::Credentials("key has no client_email".to_string()));
        }

        let signing_key = EncodingKey::from_rsa_pem(file.private_key.as_bytes())
            .map_err(|e| Error::Credentials(format!("invalid private_key: {}", e)))?;

        Ok(Self {
            key_type: file.key_type,
            project_id: file.project_id,
            private_key_id: file.private_key_id,
            client_email: file.client_email,
            token_uri: file.token_uri,
            signing_key,
        })
    }

    /// Load a key from disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Claims for a token request issued at `issued_at` (Unix seconds).
    pub fn claims(&self, scope: &str, issued_at: i64) -> AssertionClaims {
        AssertionClaims {
            iss: self.client_email.clone(),
            scope: scope.to_string(),
            aud: self.token_uri.clone(),
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        }
    }

    /// Sign a JWT assertion with the key.
    pub fn sign_assertion(&self, scope: &str, issued_at: i64) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();
        Ok(encode(&header, &self.claims(scope, issued_at), &self.signing_key)?)
    }
}

/// JWT claims of an OAuth2 service-account assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    ASSERTION_LIFETIME_SECS as u64
}

/// A bearer token and when it stops being usable.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Instant,
}

impl AccessToken {
    /// Whether the token is still valid with the refresh margin applied.
    pub fn is_fresh(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN < self.expires_at
    }
}

/// Hands out access tokens, exchanging a new assertion when the cached one
/// is about to expire.
#[derive(Debug)]
pub struct TokenProvider {
    key: ServiceAccountKey,
    scope: String,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenProvider {
    pub fn new(key: ServiceAccountKey, scope: impl Into<String>) -> Self {
        Self {
            key,
            scope: scope.into(),
            cached: Mutex::new(None),
        }
    }

    pub fn key(&self) -> &ServiceAccountKey {
        &self.key
    }

    /// Return a valid bearer token.
    pub fn token(&self, http: &reqwest::blocking::Client) -> Result<String> {
        let mut cached = self
            .cached
            .lock()
            .map_err(|_| Error::Token("token cache poisoned".to_string()))?;

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.token.clone());
        }

        let fresh = self.exchange(http)?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    fn exchange(&self, http: &reqwest::blocking::Client) -> Result<AccessToken> {
        let assertion = self
            .key
            .sign_assertion(&self.scope, chrono::Utc::now().timestamp())?;

        log::debug!(
            "Requesting access token for {} from {}",
            self.key.client_email,
            self.key.token_uri
        );

        let response = http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .map_err(|e| Error::Token(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Token(format!("{}: {}", status, body.trim())));
        }

        let parsed: TokenResponse = response
            .json()
            .map_err(|e| Error::Token(format!("malformed token response: {}", e)))?;

        Ok(AccessToken {
            token: parsed.access_token,
            expires_at: Instant::now() + Duration::from_secs(parsed.expires_in),
        })
    }
}
