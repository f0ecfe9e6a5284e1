//! Identity token verification
//!
//! Tokens are issued by the external identity provider; this service only
//! verifies them and turns their claims into an [`Actor`].

use chrono::{Duration, Utc};
use grace_core::Actor;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::error::AppError;

/// Identity token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (opaque user ID)
    pub sub: String,
    /// Display name at the time the token was issued
    #[serde(default)]
    pub name: String,
    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Convert verified claims into the acting identity
    ///
    /// # Errors
    /// Returns `InvalidToken` if the subject is blank
    pub fn into_actor(self) -> Result<Actor, AppError> {
        if self.sub.trim().is_empty() {
            return Err(AppError::InvalidToken);
        }
        Ok(Actor::new(self.sub, self.name, self.picture))
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Verifies bearer tokens against a shared HMAC secret
#[derive(Clone)]
pub struct IdentityVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: Option<String>,
}

impl IdentityVerifier {
    #[must_use]
    pub fn new(secret: &str, issuer: Option<String>, leeway_secs: u64) -> Self {
        let mut validation = Validation::default();
        validation.leeway = leeway_secs;
        if let Some(iss) = &issuer {
            validation.set_issuer(&[iss]);
        }

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer,
        }
    }

    #[must_use]
    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(&config.secret, config.issuer.clone(), config.leeway_secs)
    }

    /// Decode and validate a token
    ///
    /// # Errors
    /// Returns `TokenExpired` or `InvalidToken`
    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::InvalidToken,
            })
    }

    /// Verify a token and return the identity it carries
    ///
    /// # Errors
    /// Returns an error if the token is invalid, expired, or has no subject
    pub fn verify(&self, token: &str) -> Result<Actor, AppError> {
        self.decode_token(token)?.into_actor()
    }

    /// Sign a token for `actor`, valid for `ttl_secs`.
    ///
    /// Used by local tooling and tests standing in for the identity provider.
    ///
    /// # Errors
    /// Returns an error if encoding fails
    pub fn sign(&self, actor: &Actor, ttl_secs: i64) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: actor.user_id.clone(),
            name: actor.display_name.clone(),
            picture: actor.avatar_url.clone(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to encode JWT: {e}")))
    }
}

impl std::fmt::Debug for IdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityVerifier")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> IdentityVerifier {
        IdentityVerifier::new("test-secret-key-that-is-long-enough", None, 0)
    }

    fn actor() -> Actor {
        Actor::new("user-42", "Hannah", Some("https://cdn.example/h.png".to_string()))
    }

    #[test]
    fn test_sign_and_verify() {
        let verifier = verifier();
        let token = verifier.sign(&actor(), 900).unwrap();

        let verified = verifier.verify(&token).unwrap();
        assert_eq!(verified, actor());
    }

    #[test]
    fn test_expired_token() {
        let verifier = verifier();
        let token = verifier.sign(&actor(), -120).unwrap();

        assert!(matches!(verifier.verify(&token), Err(AppError::TokenExpired)));
    }

    #[test]
    fn test_wrong_secret() {
        let token = verifier().sign(&actor(), 900).unwrap();
        let other = IdentityVerifier::new("a-completely-different-secret-key", None, 0);

        assert!(matches!(other.verify(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_issuer_enforced() {
        let issuing = IdentityVerifier::new("shared-secret-shared-secret", Some("grace-id".into()), 0);
        let token = issuing.sign(&actor(), 900).unwrap();
        assert!(issuing.verify(&token).is_ok());

        let strict = IdentityVerifier::new("shared-secret-shared-secret", Some("other".into()), 0);
        assert!(matches!(strict.verify(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_blank_subject_rejected() {
        let verifier = verifier();
        let token = verifier.sign(&Actor::new("", "Nobody", None), 900).unwrap();
        assert!(matches!(verifier.verify(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_garbage_token() {
        assert!(matches!(
            verifier().decode_token("invalid.token.here"),
            Err(AppError::InvalidToken)
        ));
    }
}
