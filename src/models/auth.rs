use std::future::{Ready, ready};

use actix_web::error::{ErrorInternalServerError, ErrorUnauthorized};
use actix_web::{Error, FromRequest, HttpRequest, dev::Payload, web::Data};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bearer_token;
use crate::models::config::{AuthConfig, ServiceConfig, TransConfig};

/// Verified JWT claims for an authenticated principal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub sub: String, // subject (user ID or UUID)
    pub jti: String,
    pub iat: i64,
    pub exp: i64, // expiration as timestamp
}

impl AuthenticatedUser {
    pub fn new(subject: &str) -> Self {
        Self {
            sub: subject.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: 0,
            exp: 0,
        }
    }

    fn set_expiration(&mut self, seconds: i64) {
        let now = Utc::now().timestamp();
        self.iat = now;
        self.exp = now + seconds;
    }

    /// Sign these claims with the access secret, stamping the validity
    /// window from the configuration.
    pub fn to_jwt(&mut self, auth: &AuthConfig) -> Result<String, jsonwebtoken::errors::Error> {
        self.set_expiration(auth.access_expire);
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(auth.access_secret.as_ref()),
        )
    }

    pub fn from_jwt(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let validation = jsonwebtoken::Validation::default();
        let token_data = jsonwebtoken::decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_ref()),
            &validation,
        )?;
        Ok(token_data.claims)
    }

    /// Verify a token during a signing-secret rotation: the current secret
    /// is tried first, then the previous one while it is still configured.
    /// An empty `prev_secret` means no rotation is in progress.
    pub fn from_transitional_jwt(
        token: &str,
        trans: &TransConfig,
    ) -> Result<Self, jsonwebtoken::errors::Error> {
        match Self::from_jwt(token, &trans.secret) {
            Ok(claims) => Ok(claims),
            Err(err) if trans.prev_secret.is_empty() => Err(err),
            Err(_) => Self::from_jwt(token, &trans.prev_secret),
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let config = match req.app_data::<Data<ServiceConfig>>() {
            Some(config) => config,
            None => return ready(Err(ErrorInternalServerError("Service config not found"))),
        };

        let token = match bearer_token(req.headers()) {
            Some(token) => token,
            None => return ready(Err(ErrorUnauthorized("Missing bearer token"))),
        };

        match AuthenticatedUser::from_jwt(token, &config.auth.access_secret) {
            Ok(claims) => ready(Ok(claims)),
            Err(_) => ready(Err(ErrorUnauthorized("Invalid token"))),
        }
    }
}
