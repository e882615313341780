//! Token issuance and validation
//!
//! Signed, time-bounded bearer tokens binding a subject identity.
//! Transport-independent: nothing here knows about HTTP.

use crate::config::AuthConfig;
use crate::errors::{AppError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// What a token is good for. Encoded as a claim and checked on use, so an
/// access token can never be replayed through the refresh flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Access,
    Refresh,
}

/// Token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Token purpose
    pub purpose: TokenPurpose,
}

impl Claims {
    /// Parse the subject claim back into a user id
    pub fn subject_id(&self) -> Result<i64> {
        self.sub.parse::<i64>().map_err(|_| AppError::InvalidToken)
    }
}

/// Issues and validates signed bearer tokens
pub struct TokenService {
    header: Header,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    /// Create a token service from the auth configuration
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let algorithm: Algorithm =
            config
                .jwt_algorithm
                .parse()
                .map_err(|_| AppError::Configuration {
                    message: format!("Unknown token algorithm '{}'", config.jwt_algorithm),
                })?;

        Ok(Self {
            header: Header::new(algorithm),
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation: Validation::new(algorithm),
            access_ttl: Duration::seconds(config.access_token_ttl_secs as i64),
            refresh_ttl: Duration::seconds(config.refresh_token_ttl_secs as i64),
        })
    }

    /// Issue a token for the given subject with a purpose-specific lifetime
    pub fn issue(&self, subject: i64, purpose: TokenPurpose) -> Result<String> {
        let now = Utc::now();
        let ttl = match purpose {
            TokenPurpose::Access => self.access_ttl,
            TokenPurpose::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            purpose,
        };

        encode(&self.header, &claims, &self.encoding_key).map_err(|e| AppError::Internal {
            message: format!("Failed to sign token: {}", e),
        })
    }

    /// Issue an access/refresh token pair for the given subject
    pub fn issue_pair(&self, subject: i64) -> Result<(String, String)> {
        Ok((
            self.issue(subject, TokenPurpose::Access)?,
            self.issue(subject, TokenPurpose::Refresh)?,
        ))
    }

    /// Verify signature and expiry, returning the decoded claims
    pub fn validate(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::InvalidToken,
            })
    }

    /// Validate and additionally require a specific purpose claim
    pub fn validate_purpose(&self, token: &str, purpose: TokenPurpose) -> Result<Claims> {
        let claims = self.validate(token)?;
        if claims.purpose != purpose {
            return Err(AppError::InvalidToken);
        }
        Ok(claims)
    }

    /// Exchange a refresh token for a fresh token pair.
    ///
    /// The refresh token's signature, expiry, and purpose claim are all
    /// verified before anything is reissued. Both tokens rotate.
    pub fn refresh(&self, refresh_token: &str) -> Result<(String, String)> {
        let claims = self.validate_purpose(refresh_token, TokenPurpose::Refresh)?;
        self.issue_pair(claims.subject_id()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn service() -> TokenService {
        TokenService::new(&AppConfig::default().auth).unwrap()
    }

    #[test]
    fn test_issue_validate_roundtrip() {
        let tokens = service();

        let token = tokens.issue(42, TokenPurpose::Access).unwrap();
        let claims = tokens.validate(&token).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.purpose, TokenPurpose::Access);
        assert_eq!(claims.subject_id().unwrap(), 42);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_refresh_outlives_access() {
        let tokens = service();

        let access = tokens.issue(1, TokenPurpose::Access).unwrap();
        let refresh = tokens.issue(1, TokenPurpose::Refresh).unwrap();

        let access_exp = tokens.validate(&access).unwrap().exp;
        let refresh_exp = tokens.validate(&refresh).unwrap().exp;
        assert!(refresh_exp > access_exp);
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service();
        let now = Utc::now();

        // Encode an already-expired token with the same secret
        let claims = Claims {
            sub: "7".to_string(),
            iat: (now - Duration::hours(2)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
            purpose: TokenPurpose::Access,
        };
        let secret = AppConfig::default().auth.jwt_secret;
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            tokens.validate(&token),
            Err(AppError::ExpiredToken)
        ));
    }

    #[test]
    fn test_forged_signature_rejected() {
        let tokens = service();

        let mut other_config = AppConfig::default().auth;
        other_config.jwt_secret = "some-other-secret".to_string();
        let other = TokenService::new(&other_config).unwrap();

        let forged = other.issue(42, TokenPurpose::Access).unwrap();
        assert!(matches!(tokens.validate(&forged), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let tokens = service();
        assert!(matches!(
            tokens.validate("not-a-token"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_refresh_rejects_access_token() {
        let tokens = service();
        let access = tokens.issue(42, TokenPurpose::Access).unwrap();

        assert!(matches!(tokens.refresh(&access), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_refresh_rejects_forged_token() {
        let tokens = service();

        let mut other_config = AppConfig::default().auth;
        other_config.jwt_secret = "some-other-secret".to_string();
        let other = TokenService::new(&other_config).unwrap();

        let forged = other.issue(42, TokenPurpose::Refresh).unwrap();
        assert!(matches!(tokens.refresh(&forged), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_refresh_rotates_pair() {
        let tokens = service();
        let (_, refresh) = tokens.issue_pair(42).unwrap();

        let (new_access, new_refresh) = tokens.refresh(&refresh).unwrap();

        let claims = tokens
            .validate_purpose(&new_access, TokenPurpose::Access)
            .unwrap();
        assert_eq!(claims.subject_id().unwrap(), 42);
        tokens
            .validate_purpose(&new_refresh, TokenPurpose::Refresh)
            .unwrap();
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let mut config = AppConfig::default().auth;
        config.jwt_algorithm = "ROT13".to_string();
        assert!(TokenService::new(&config).is_err());
    }
}
