/**
 * Session Management and JWT Tokens
 *
 * Tokens are HS256 JWTs signed with `JWT_SECRET`. The subject is the user id;
 * email and display name ride along so logs can name the user without a
 * store lookup.
 */

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::server::config::ServerConfig;
use crate::shared::User;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

impl Claims {
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

fn now_secs() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Create a JWT token for a user, valid for the configured TTL
pub fn create_token(config: &ServerConfig, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
    issue_token(&config.jwt_secret, user, now_secs() + config.token_ttl_secs)
}

/// Create a JWT token with an explicit expiry
pub fn issue_token(
    secret: &str,
    user: &User,
    expires_at: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        name: Some(user.name.clone()),
        exp: expires_at,
        iat: now_secs(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify and decode a JWT token
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &key, &Validation::default())?;
    Ok(token_data.claims)
}
