use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use common::Role;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // Profile ID
    pub email: String,
    pub role: Role,
    pub exp: usize, // Expiration timestamp
}

/// Sign a new access token for a profile. Returns the token and its expiry.
pub fn sign(
    user_id: Uuid,
    email: &str,
    role: Role,
    config: &AuthConfig,
) -> Result<(String, DateTime<Utc>)> {
    let expires_at = Utc::now()
        .checked_add_signed(Duration::hours(config.token_ttl_hours))
        .context("token expiry overflows the calendar")?;

    let claims = Claims {
        sub: user_id,
        email: email.to_owned(),
        role,
        exp: expires_at.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;

    Ok((token, expires_at))
}

/// Verify and decode a JWT token.
pub fn verify(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
