//! JWT access token utilities.
//!
//! Login happens at the external identity provider; the session layer then
//! hands the browser an RS256 access token whose subject is our user id.
//! This service only needs the public key to verify those tokens. The
//! signing half is kept for the session layer and for tests.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingError(String),

    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("No signing key configured")]
    SigningDisabled,
}

/// JWT token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// JWT ID (unique token identifier for revocation)
    pub jti: String,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Type of JWT token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Default leeway in seconds for clock skew tolerance
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

/// Keys and settings for validating (and optionally issuing) tokens.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: Option<EncodingKey>,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    /// Access token expiration in seconds, used when issuing.
    pub access_token_expiry_secs: i64,
    /// Leeway in seconds for clock skew tolerance
    pub leeway_secs: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm)
            .field("can_sign", &self.encoding_key.is_some())
            .field("access_token_expiry_secs", &self.access_token_expiry_secs)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

impl JwtConfig {
    /// Creates a verify-only config from an RSA public key in PEM format.
    pub fn verifier(public_key_pem: &str, leeway_secs: u64) -> Result<Self, JwtError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid public key: {}", e)))?;

        Ok(Self {
            encoding_key: None,
            decoding_key,
            algorithm: Algorithm::RS256,
            access_token_expiry_secs: 0,
            leeway_secs,
        })
    }

    /// Creates a config able to both sign and verify from an RSA key pair.
    pub fn with_signing_key(
        private_key_pem: &str,
        public_key_pem: &str,
        access_token_expiry_secs: i64,
        leeway_secs: u64,
    ) -> Result<Self, JwtError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid private key: {}", e)))?;
        let mut config = Self::verifier(public_key_pem, leeway_secs)?;
        config.encoding_key = Some(encoding_key);
        config.access_token_expiry_secs = access_token_expiry_secs;
        Ok(config)
    }

    /// Creates a JwtConfig for testing with HS256 symmetric key.
    /// DO NOT use in production - only for tests.
    #[cfg(test)]
    pub fn new_for_testing(secret: &str) -> Self {
        Self {
            encoding_key: Some(EncodingKey::from_secret(secret.as_bytes())),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: Algorithm::HS256,
            access_token_expiry_secs: 900,
            leeway_secs: 0,
        }
    }

    /// Issues an access token for the given user ID.
    pub fn generate_access_token(&self, user_id: Uuid) -> Result<(String, String), JwtError> {
        self.generate_token(user_id, TokenType::Access, self.access_token_expiry_secs)
    }

    fn generate_token(
        &self,
        user_id: Uuid,
        token_type: TokenType,
        expiry_secs: i64,
    ) -> Result<(String, String), JwtError> {
        let key = self.encoding_key.as_ref().ok_or(JwtError::SigningDisabled)?;
        let now = Utc::now();
        let jti = Uuid::new_v4().to_string();

        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + Duration::seconds(expiry_secs)).timestamp(),
            iat: now.timestamp(),
            jti: jti.clone(),
            token_type,
        };

        let token = encode(&Header::new(self.algorithm), &claims, key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;

        Ok((token, jti))
    }

    /// Validates a token and returns its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidToken,
                _ => JwtError::DecodingError(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Validates an access token specifically.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = self.validate_token(token)?;
        if claims.token_type != TokenType::Access {
            return Err(JwtError::InvalidToken);
        }
        Ok(claims)
    }
}

/// Extracts user ID from validated claims.
pub fn extract_user_id(claims: &Claims) -> Result<Uuid, JwtError> {
    Uuid::parse_str(&claims.sub).map_err(|_| JwtError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> JwtConfig {
        JwtConfig::new_for_testing("test_secret_key_for_jwt_testing_12345")
    }

    #[test]
    fn test_generate_and_validate_access_token() {
        let config = create_test_config();
        let user_id = Uuid::new_v4();

        let (token, jti) = config.generate_access_token(user_id).unwrap();
        let claims = config.validate_access_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.jti, jti);
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(extract_user_id(&claims).unwrap(), user_id);
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let config = create_test_config();
        let (token, _) = config
            .generate_token(Uuid::new_v4(), TokenType::Refresh, 60)
            .unwrap();

        assert!(matches!(
            config.validate_access_token(&token),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token() {
        let config = create_test_config();
        let (token, _) = config
            .generate_token(Uuid::new_v4(), TokenType::Access, -120)
            .unwrap();

        assert!(matches!(
            config.validate_access_token(&token),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let issuer = JwtConfig::new_for_testing("one_secret_for_signing_tokens_000");
        let verifier = create_test_config();
        let (token, _) = issuer.generate_access_token(Uuid::new_v4()).unwrap();

        assert!(matches!(
            verifier.validate_access_token(&token),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_malformed_token() {
        assert!(create_test_config().validate_token("not_a_jwt").is_err());
    }

    #[test]
    fn test_verifier_rejects_garbage_key() {
        assert!(matches!(
            JwtConfig::verifier("not a pem", 30),
            Err(JwtError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_extract_user_id_rejects_non_uuid_subject() {
        let claims = Claims {
            sub: "vas3k".to_string(),
            exp: 0,
            iat: 0,
            jti: "jti".to_string(),
            token_type: TokenType::Access,
        };
        assert!(matches!(extract_user_id(&claims), Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_token_type_serialization() {
        assert_eq!(serde_json::to_string(&TokenType::Access).unwrap(), "\"access\"");
        assert_eq!(serde_json::to_string(&TokenType::Refresh).unwrap(), "\"refresh\"");
    }
}
