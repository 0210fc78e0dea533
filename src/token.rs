use std::{
    fmt,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    error::{AuthError, TokenError},
    types::{Claims, Login, TokenPayload, UserId},
};

/// Signing secret and lifetime for one kind of token.
#[derive(Clone)]
pub struct TokenPolicy {
    pub secret: String,
    pub ttl: Duration,
}

impl TokenPolicy {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }
}

impl fmt::Debug for TokenPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPolicy")
            .field("secret_length", &self.secret.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// HS256 JWT signing and verification against the system clock, with no leeway.
#[derive(Clone)]
pub struct TokenCodec {
    validation: Validation,
}

impl Default for TokenCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCodec {
    pub fn new() -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self { validation }
    }

    pub fn issue(&self, payload: &TokenPayload, policy: &TokenPolicy) -> Result<String, AuthError> {
        let iat = unix_now()?;

        let claims = Claims {
            user_id: payload.user_id.0.clone(),
            login: payload.login.0.clone(),
            iat,
            exp: iat.saturating_add(policy.ttl.as_secs()),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(policy.secret.as_ref()),
        )
        .map_err(|_| AuthError::Internal("token signing failed"))
    }

    /// A token expiring at exactly the current second is already expired.
    pub fn verify(&self, token: &str, secret: &str) -> Result<TokenPayload, TokenError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_ref()),
            &self.validation,
        )
        .map_err(|e| {
            tracing::debug!("token verification failed: {}", e);
            TokenError::from(e)
        })?;

        let claims = data.claims;

        let now = unix_now().map_err(|_| TokenError::Expired)?;
        if now >= claims.exp {
            tracing::debug!("token expired at {}", claims.exp);
            return Err(TokenError::Expired);
        }

        if claims.user_id.is_empty() || claims.login.is_empty() {
            tracing::debug!("token payload missing identity fields");
            return Err(TokenError::IncompletePayload);
        }

        Ok(TokenPayload {
            user_id: UserId(claims.user_id),
            login: Login(claims.login),
        })
    }
}

fn unix_now() -> Result<u64, AuthError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| AuthError::Internal("system clock before unix epoch"))
}
