use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash};
use axum::Extension;
use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

use crate::AppContext;
use crate::error::{Error, Result};

/// Sessions expire a week after issuance. Tokens are stateless, so validity
/// is entirely a function of signature and this expiry.
pub const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub user_id: Uuid,
}

impl Display for Claims {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Username: {}", self.sub)
    }
}

pub struct Keys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl Keys {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Extension(app_context): Extension<AppContext> = parts
            .extract()
            .await
            .expect("Bug: AppContext should be added as an Extension");

        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|rejection| {
                if rejection.is_missing() {
                    Error::MissingCredentials
                } else {
                    Error::InvalidToken
                }
            })?;

        let token_data = decode::<Claims>(
            bearer.token(),
            &app_context.keys.decoding,
            &Validation::default(),
        )
        .map_err(|_| Error::InvalidToken)?;

        Ok(token_data.claims)
    }
}

/// Mint a signed token for an identity the caller has already verified.
pub fn issue_token(keys: &Keys, user_id: Uuid, username: &str) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::days(TOKEN_TTL_DAYS))
        .expect("Not overflow")
        .timestamp();
    let claims = Claims {
        sub: username.to_owned(),
        exp: expiration,
        user_id,
    };
    let token = encode(&Header::default(), &claims, &keys.encoding)?;
    Ok(token)
}

/// Decode and validate a token outside of the extractor path.
pub fn verify_token(keys: &Keys, token: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(token, &keys.decoding, &Validation::default())
        .map_err(|_| Error::InvalidToken)?;
    Ok(token_data.claims)
}

pub async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        match PasswordHash::generate(Argon2::default(), password, salt.as_salt()) {
            Ok(hash) => Ok(hash.to_string()),
            Err(error) => Err(Error::argon2(error.to_string())),
        }
    })
    .await
    .map_err(|error| Error::argon2(error.to_string()))?
}

pub async fn verify_password(password: String, password_hash: String) -> Result<()> {
    tokio::task::spawn_blocking(move || -> Result<()> {
        let hash: PasswordHash = PasswordHash::new(&password_hash).map_err(|e| Error::Argon2 {
            details: format!("invalid password hash: {e}"),
        })?;

        hash.verify_password(&[&Argon2::default()], password)
            .map_err(|e| match e {
                argon2::password_hash::Error::Password => Error::WrongCredentials,
                _ => Error::argon2(format!("failed to verify password hash: {e}")),
            })
    })
    .await
    .map_err(|error| Error::argon2(error.to_string()))?
}
