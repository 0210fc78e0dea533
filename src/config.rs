use std::{fmt, time::Duration};

use crate::{
    error::ConfigError,
    password::{PasswordHasher, DEFAULT_COST_FACTOR},
    token::TokenPolicy,
};

pub const COST_FACTOR_KEY: &str = "CRYPT_SALT";
pub const ACCESS_SECRET_KEY: &str = "JWT_SECRET_KEY";
pub const ACCESS_TTL_KEY: &str = "TOKEN_EXPIRE_TIME";
pub const REFRESH_SECRET_KEY: &str = "JWT_SECRET_REFRESH_KEY";
pub const REFRESH_TTL_KEY: &str = "TOKEN_REFRESH_EXPIRE_TIME";

#[derive(Clone)]
pub struct AuthConfig {
    /// Work factor for password hashing. Stored hashes keep the factor they were made with,
    /// so changing it only affects new signups.
    pub password_cost_factor: u32,
    /// Signs short-lived access tokens.
    pub access: TokenPolicy,
    /// Signs refresh tokens. Must differ from the access secret.
    pub refresh: TokenPolicy,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("password_cost_factor", &self.password_cost_factor)
            .field("access", &self.access)
            .field("refresh", &self.refresh)
            .finish()
    }
}

impl AuthConfig {
    pub fn new(
        password_cost_factor: u32,
        access: TokenPolicy,
        refresh: TokenPolicy,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            password_cost_factor,
            access,
            refresh,
        };
        config.validate()?;
        Ok(config)
    }

    /// Build from a read-only key lookup. Only the cost factor has a default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| value(key).ok_or(ConfigError::Missing(key));

        let password_cost_factor = match value(COST_FACTOR_KEY) {
            Some(raw) => raw.parse::<u32>().map_err(|e| ConfigError::Invalid {
                key: COST_FACTOR_KEY,
                reason: e.to_string(),
            })?,
            None => DEFAULT_COST_FACTOR,
        };

        let access = TokenPolicy::new(
            required(ACCESS_SECRET_KEY)?,
            parse_ttl(ACCESS_TTL_KEY, &required(ACCESS_TTL_KEY)?)?,
        );
        let refresh = TokenPolicy::new(
            required(REFRESH_SECRET_KEY)?,
            parse_ttl(REFRESH_TTL_KEY, &required(REFRESH_TTL_KEY)?)?,
        );

        Self::new(password_cost_factor, access, refresh)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn hasher(&self) -> PasswordHasher {
        PasswordHasher::new(self.password_cost_factor)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.password_cost_factor == 0 {
            return Err(ConfigError::Invalid {
                key: COST_FACTOR_KEY,
                reason: "must be at least 1".into(),
            });
        }
        if self.access.secret.is_empty() {
            return Err(ConfigError::Missing(ACCESS_SECRET_KEY));
        }
        if self.refresh.secret.is_empty() {
            return Err(ConfigError::Missing(REFRESH_SECRET_KEY));
        }
        if self.access.ttl.is_zero() {
            return Err(ConfigError::Invalid {
                key: ACCESS_TTL_KEY,
                reason: "must be positive".into(),
            });
        }
        if self.refresh.ttl.is_zero() {
            return Err(ConfigError::Invalid {
                key: REFRESH_TTL_KEY,
                reason: "must be positive".into(),
            });
        }
        if self.access.secret == self.refresh.secret {
            return Err(ConfigError::SharedSecret);
        }
        Ok(())
    }
}

// "3600", "45s", "30m", "1h", "7d"
fn parse_ttl(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        key,
        reason: format!("{reason}: {raw:?}"),
    };

    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);

    let amount: u64 = digits
        .parse()
        .map_err(|_| invalid("expected a whole number"))?;

    let multiplier = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return Err(invalid("unknown unit")),
    };

    amount
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(|| invalid("too large"))
}
