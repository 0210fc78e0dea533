use argon2::{Config, Variant};
use rand::RngCore;

use crate::{error::AuthError, types::PasswordHash};

pub const DEFAULT_COST_FACTOR: u32 = 10;

const SALT_LEN: usize = 16;

/// Salted one-way password hashing. The cost factor is the argon2 iteration count.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost_factor: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST_FACTOR)
    }
}

impl PasswordHasher {
    pub fn new(cost_factor: u32) -> Self {
        Self { cost_factor }
    }

    pub fn cost_factor(&self) -> u32 {
        self.cost_factor
    }

    /// Hash with a fresh random salt, so equal plaintexts never produce equal output.
    pub fn hash(&self, password: &str) -> Result<PasswordHash, AuthError> {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);

        let config = Config {
            variant: Variant::Argon2id,
            time_cost: self.cost_factor,
            ..Config::default()
        };

        argon2::hash_encoded(password.as_bytes(), &salt, &config)
            .map(PasswordHash)
            .map_err(|_| AuthError::Internal("password hashing failed"))
    }

    /// A malformed stored hash is a mismatch, not an error.
    pub fn matches(&self, password: &str, hash: &PasswordHash) -> bool {
        argon2::verify_encoded(&hash.0, password.as_bytes()).unwrap_or(false)
    }

    pub(crate) async fn hash_blocking(&self, password: String) -> Result<PasswordHash, AuthError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|_| AuthError::Internal("password hashing task failed"))?
    }

    pub(crate) async fn matches_blocking(
        &self,
        password: String,
        hash: PasswordHash,
    ) -> Result<bool, AuthError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.matches(&password, &hash))
            .await
            .map_err(|_| AuthError::Internal("password verification task failed"))
    }
}
