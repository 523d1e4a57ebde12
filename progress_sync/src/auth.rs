//! Credential validation for the authentication handshake.
//!
//! The progress sync service never issues credentials; it only checks the
//! bearer token a client presents in its `auth` frame. Validation sits behind
//! the [`CredentialValidator`] trait so the service can be driven by any
//! identity provider. [`JwtValidator`] checks HS256 tokens carrying
//! `user_id` and `username` claims.

use crate::error::{Error, ErrorKind};
use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// The user a session is authenticated as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
}

#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// Resolves an opaque bearer credential to the identity it was issued for.
    async fn validate(&self, token: &str) -> Result<Identity, Error>;
}

/// Claims carried by bearer tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub username: String,
    pub exp: usize,
    #[serde(default)]
    pub iat: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<usize>,
}

/// Validates HS256-signed JWTs against a shared secret.
pub struct JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_nbf = true;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl CredentialValidator for JwtValidator {
    async fn validate(&self, token: &str) -> Result<Identity, Error> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        let claims = data.claims;

        if claims.user_id.is_empty() {
            return Err(Error::new(ErrorKind::AuthFailed(
                "token has no user id".to_string(),
            )));
        }

        Ok(Identity {
            user_id: claims.user_id,
            username: claims.username,
        })
    }
}
