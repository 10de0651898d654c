// ABOUTME: JWT issue and verification
// ABOUTME: Claims carry username, user id and system role

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::AuthError;

/// Bearer-token claims. `sub` is the username, mirroring the login
/// response the frontend already expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user_id: i64,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(username: String, user_id: i64, role: String, expires_in: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: username,
            user_id,
            role,
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }
}

/// Issues and resolves bearer tokens with a shared HMAC secret.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expires_in: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], expire_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::default(),
            expires_in: Duration::minutes(expire_minutes),
        }
    }

    pub fn issue(&self, username: &str, user_id: i64, role: &str) -> Result<String, AuthError> {
        let claims = Claims::new(
            username.to_string(),
            user_id,
            role.to_string(),
            self.expires_in,
        );
        encode(&Header::default(), &claims, &self.encoding_key).map_err(AuthError::Encode)
    }

    /// Resolves a token back to its claims. Every decode failure collapses
    /// to `InvalidToken` so callers cannot distinguish expiry from
    /// tampering.
    pub fn resolve(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}
