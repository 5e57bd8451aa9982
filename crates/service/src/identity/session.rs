use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::domain::AuthUser;
use super::errors::IdentityError;

/// Claims carried by the session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
}

impl SessionClaims {
    pub fn user_id(&self) -> Result<Uuid, IdentityError> {
        Uuid::parse_str(&self.sub).map_err(|e| IdentityError::TokenError(e.to_string()))
    }
}

/// HS256 session token for `user`, valid for `hours`.
pub fn issue_session(user: &AuthUser, secret: &str, hours: i64) -> Result<String, IdentityError> {
    let expires_at = Duration::try_hours(hours)
        .and_then(|d| Utc::now().checked_add_signed(d))
        .ok_or_else(|| IdentityError::TokenError(format!("session length out of range: {hours}h")))?;
    let exp = expires_at.timestamp().max(0) as usize;
    let claims = SessionClaims { sub: user.id.to_string(), email: user.email.clone(), exp };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| IdentityError::TokenError(e.to_string()))
}

pub fn verify_session(token: &str, secret: &str) -> Result<SessionClaims, IdentityError> {
    decode::<SessionClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| IdentityError::TokenError(e.to_string()))
}
