//! Signed session tokens.
//!
//! Tokens are HS256 JWTs. They stand on their own: a token stays valid until
//! its `exp` whether or not the cached session record still exists.

use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Signature algorithm for every issued token.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Default token lifetime (24 hours).
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 24 * 60 * 60;

/// Token errors.
#[derive(Error, Debug)]
pub enum TokenError {
    /// Claims could not be signed.
    #[error("token signing failed: {0}")]
    Signing(String),

    /// Bad signature or not a well-formed token.
    #[error("token signature is invalid")]
    SignatureInvalid,

    /// Token is past its expiry.
    #[error("token has expired")]
    Expired,
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,
    /// User email.
    pub email: String,
    /// User role label.
    pub role: String,
    /// Issued at (Unix seconds).
    pub iat: i64,
    /// Expiration (Unix seconds).
    pub exp: i64,
    /// Token ID.
    pub jti: String,
}

/// Signing settings.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HMAC secret.
    pub secret: String,
    /// How long an issued token is valid.
    pub lifetime: Duration,
}

impl TokenConfig {
    /// Settings with the default 24 hour lifetime.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            lifetime: Duration::from_secs(DEFAULT_TOKEN_LIFETIME_SECS),
        }
    }
}

/// Produces signed tokens for authenticated users.
pub trait TokenIssuer: Send + Sync {
    /// Sign a token for the given identity.
    fn issue(&self, user_id: &str, email: &str, role: &str) -> Result<String, TokenError>;
}

/// HS256 token issuer and validator.
#[derive(Clone)]
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenManager {
    /// Create a manager from signing settings.
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            lifetime: config.lifetime,
        }
    }

    /// Lifetime of newly issued tokens.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Build the claims for a token issued now.
    pub fn claims_for(&self, user_id: &str, email: &str, role: &str) -> Claims {
        let now = chrono::Utc::now().timestamp();
        let lifetime = i64::try_from(self.lifetime.as_secs()).unwrap_or(i64::MAX);
        Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            iat: now,
            exp: now.saturating_add(lifetime),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Sign a set of claims.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(SIGNING_ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Check a token's signature, structure and expiry and return its claims.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => {
                    tracing::debug!(error = %e, "Token validation failed");
                    TokenError::SignatureInvalid
                }
            })
    }
}

impl TokenIssuer for TokenManager {
    fn issue(&self, user_id: &str, email: &str, role: &str) -> Result<String, TokenError> {
        self.sign(&self.claims_for(user_id, email, role))
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}
