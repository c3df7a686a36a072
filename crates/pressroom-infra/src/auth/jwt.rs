//! Bearer tokens carrying the caller's role.
//!
//! The role travels in the token so the authorization gate never needs a
//! store round-trip. A token whose role no longer parses is rejected.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pressroom_core::Role;
use pressroom_core::ports::{AuthError, TokenClaims, TokenService};

const DEFAULT_SECRET: &str = "change-me-in-production";
const ISSUER: &str = "pressroom-api";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            expiration_hours: 24,
            issuer: ISSUER.to_string(),
        }
    }
}

impl JwtConfig {
    /// `JWT_SECRET` and `JWT_EXPIRATION_HOURS`, falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secret = std::env::var("JWT_SECRET").unwrap_or(defaults.secret);
        if secret == DEFAULT_SECRET {
            tracing::warn!("JWT_SECRET not set; tokens are signed with the built-in secret");
        }

        Self {
            secret,
            expiration_hours: std::env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.expiration_hours),
            issuer: defaults.issuer,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    role: String,
    exp: i64,
    iat: i64,
    iss: String,
}

/// HS256 [`TokenService`].
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(JwtConfig::from_env())
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(&self, user_id: Uuid, email: &str, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();

        self.sign(&Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.as_str().to_string(),
            exp: (now + TimeDelta::hours(self.config.expiration_hours)).timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        })
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            })?
            .claims;

        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let role: Role = claims
            .role
            .parse()
            .map_err(|_| AuthError::InvalidToken(format!("unknown role '{}'", claims.role)))?;

        Ok(TokenClaims {
            user_id,
            email: claims.email,
            role,
            exp: claims.exp,
        })
    }

    fn expiration_seconds(&self) -> i64 {
        self.config.expiration_hours * 3600
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtTokenService {
        JwtTokenService::new(JwtConfig {
            secret: "test-secret-key".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_every_role_survives_the_token() {
        let service = service();
        for role in [Role::Admin, Role::Editor, Role::User] {
            let user_id = Uuid::new_v4();
            let token = service
                .generate_token(user_id, "staff@example.com", role)
                .unwrap();

            let claims = service.validate_token(&token).unwrap();
            assert_eq!(claims.role, role);
            assert_eq!(claims.actor().user_id, user_id);
            assert_eq!(claims.actor().role, role);
        }
    }

    #[test]
    fn test_garbage_token_rejected() {
        let result = service().validate_token("invalid-token");
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let other = JwtTokenService::new(JwtConfig {
            secret: "someone-else".to_string(),
            ..Default::default()
        });
        let token = other
            .generate_token(Uuid::new_v4(), "x@example.com", Role::Admin)
            .unwrap();

        assert!(service().validate_token(&token).is_err());
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let other = JwtTokenService::new(JwtConfig {
            secret: "test-secret-key".to_string(),
            issuer: "another-service".to_string(),
            ..Default::default()
        });
        let token = other
            .generate_token(Uuid::new_v4(), "x@example.com", Role::Editor)
            .unwrap();

        assert!(service().validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_reported_as_expired() {
        let stale = JwtTokenService::new(JwtConfig {
            secret: "test-secret-key".to_string(),
            expiration_hours: -2,
            ..Default::default()
        });
        let token = stale
            .generate_token(Uuid::new_v4(), "x@example.com", Role::User)
            .unwrap();

        assert!(matches!(
            service().validate_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_unknown_role_claim_rejected() {
        let service = service();
        let now = Utc::now();
        let token = service
            .sign(&Claims {
                sub: Uuid::new_v4().to_string(),
                email: "x@example.com".to_string(),
                role: "superuser".to_string(),
                exp: (now + TimeDelta::hours(1)).timestamp(),
                iat: now.timestamp(),
                iss: ISSUER.to_string(),
            })
            .unwrap();

        assert!(matches!(
            service.validate_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
