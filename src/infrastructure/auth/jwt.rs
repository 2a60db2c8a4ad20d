//! Caller tokens: HS256 JWTs carrying the member identity

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::caller::Caller;
use crate::domain::team::MemberId;
use crate::domain::DomainError;

/// Claims carried by a caller token; `sub` is the member id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerClaims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl CallerClaims {
    pub fn new(caller: &Caller, ttl_hours: u64) -> Self {
        let issued_at = Utc::now();
        let expires_at = issued_at + Duration::hours(ttl_hours as i64);

        Self {
            sub: caller.id().as_str().to_string(),
            name: caller.display_name.clone(),
            email: caller.email.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// The identity operations run as
    pub fn into_caller(self) -> Result<Caller, DomainError> {
        let member_id =
            MemberId::new(self.sub).map_err(|e| DomainError::validation(e.to_string()))?;
        Ok(Caller::new(member_id, self.name, self.email))
    }
}

/// HS256 signing secret and token lifetime
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: u64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, expiration_hours: u64) -> Self {
        Self {
            secret: secret.into(),
            expiration_hours,
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            expiration_hours: 24,
        }
    }
}

/// Issues and verifies caller tokens with a shared secret
#[derive(Clone)]
pub struct JwtService {
    ttl_hours: u64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("ttl_hours", &self.ttl_hours)
            .field("secret", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let secret = config.secret.as_bytes();

        Self {
            ttl_hours: config.expiration_hours,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn issue(&self, caller: &Caller) -> Result<String, DomainError> {
        let claims = CallerClaims::new(caller, self.ttl_hours);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| DomainError::internal(format!("Failed to sign caller token: {}", e)))
    }

    /// Checks signature, algorithm and expiry
    pub fn validate(&self, token: &str) -> Result<CallerClaims, DomainError> {
        decode::<CallerClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| DomainError::validation(format!("Invalid caller token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller() -> Caller {
        Caller::new(MemberId::new("uid-42").unwrap(), "Ana", "ana@example.org")
    }

    #[test]
    fn test_issue_and_validate() {
        let service = JwtService::new(JwtConfig::new("test-secret", 1));

        let token = service.issue(&caller()).unwrap();
        let claims = service.validate(&token).unwrap();

        assert_eq!(claims.sub, "uid-42");
        assert_eq!(claims.email, "ana@example.org");
        assert!(!claims.is_expired());
        assert_eq!(claims.into_caller().unwrap(), caller());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtService::new(JwtConfig::new("secret-one", 1));
        let verifier = JwtService::new(JwtConfig::new("secret-two", 1));

        let token = issuer.issue(&caller()).unwrap();
        assert!(verifier.validate(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = JwtService::new(JwtConfig::default());
        let mut claims = CallerClaims::new(&caller(), 1);
        claims.iat -= 7200;
        claims.exp = Utc::now().timestamp() - 3600;
        assert!(claims.is_expired());

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"change-me-in-production"),
        )
        .unwrap();
        assert!(service.validate(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let service = JwtService::new(JwtConfig::default());
        assert!(service.validate("not-a-token").is_err());
    }
}
