use serde::{Deserialize, Serialize};

use crate::models::auth::AuthenticatedUser;
use crate::models::config::{AuthConfig, ServiceConfig, TransConfig};
use crate::services::{ServiceError, ServiceResult};

/// Service responsible for minting access tokens and checking presented ones.
///
/// Holds its own copy of the secret material so handlers never touch the
/// configuration sections directly.
#[derive(Clone, Debug)]
pub struct TokenService {
    auth: AuthConfig,
    trans: TransConfig,
}

/// Token handed back to a client, with its absolute expiry timestamp.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub access_expire: i64,
}

impl TokenService {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            auth: config.auth.clone(),
            trans: config.trans.clone(),
        }
    }

    /// Sign a fresh access token for the given subject.
    pub fn issue(&self, subject: &str) -> ServiceResult<IssuedToken> {
        let mut claims = AuthenticatedUser::new(subject);
        let access_token = claims.to_jwt(&self.auth).map_err(ServiceError::TokenSigning)?;

        Ok(IssuedToken {
            access_token,
            access_expire: claims.exp,
        })
    }

    /// Verify a token against the access secret.
    pub fn verify_access(&self, token: &str) -> ServiceResult<AuthenticatedUser> {
        AuthenticatedUser::from_jwt(token, &self.auth.access_secret)
            .map_err(|_| ServiceError::InvalidToken)
    }

    /// Verify a token against the rotation pair, accepting the previous
    /// secret while a rotation is in progress.
    pub fn verify_transitional(&self, token: &str) -> ServiceResult<AuthenticatedUser> {
        AuthenticatedUser::from_transitional_jwt(token, &self.trans)
            .map_err(|_| ServiceError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn build_service(access: &str, current: &str, previous: &str) -> TokenService {
        TokenService {
            auth: AuthConfig {
                access_secret: access.to_string(),
                access_expire: 3600,
            },
            trans: TransConfig {
                secret: current.to_string(),
                prev_secret: previous.to_string(),
            },
        }
    }

    #[test]
    fn issue_then_verify_round_trip() {
        let service = build_service("access", "access", "");

        let issued = service.issue("alice").unwrap();
        let claims = service.verify_access(&issued.access_token).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.exp, issued.access_expire);

        let now = Utc::now().timestamp();
        assert!(issued.access_expire >= now + 3590 && issued.access_expire <= now + 3610);
    }

    #[test]
    fn verify_access_rejects_foreign_token() {
        let issuer = build_service("other", "other", "");
        let service = build_service("access", "access", "");

        let issued = issuer.issue("mallory").unwrap();
        let err = service.verify_access(&issued.access_token).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidToken));
    }

    #[test]
    fn verify_transitional_accepts_rotated_pair() {
        // Token signed under the retired secret, service already rotated.
        let issuer = build_service("old", "old", "");
        let service = build_service("new", "new", "old");

        let issued = issuer.issue("bob").unwrap();
        let claims = service.verify_transitional(&issued.access_token).unwrap();
        assert_eq!(claims.sub, "bob");
    }

    #[test]
    fn verify_transitional_refuses_after_rotation_ends() {
        let issuer = build_service("old", "old", "");
        let service = build_service("new", "new", "");

        let issued = issuer.issue("bob").unwrap();
        let err = service.verify_transitional(&issued.access_token).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidToken));
    }
}
