use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::{
    config::AuthConfig,
    directory::UserDirectory,
    error::AuthError,
    password::PasswordHasher,
    token::TokenCodec,
    types::{CreateUser, Credentials, Login, PasswordHash, TokenPair, TokenPayload, UserProfile},
};

// Verified against when the login is unknown, so both failure paths do the same work.
const DECOY_PASSWORD: &str = "decoy password for unknown logins";

struct AuthInternal {
    config: AuthConfig,
    hasher: PasswordHasher,
    codec: TokenCodec,
    directory: Arc<dyn UserDirectory>,
    decoy_hash: OnceCell<PasswordHash>,
}

impl AuthInternal {
    async fn signup(&self, input: CreateUser) -> Result<UserProfile, AuthError> {
        let login = Login(input.login);
        let password_hash = self.hasher.hash_blocking(input.password).await?;

        let user = self.directory.create(&login, &password_hash).await?;

        Ok(user.into())
    }

    async fn login(&self, credentials: Credentials) -> Result<TokenPair, AuthError> {
        // resolved before the lookup so its one-time cost is not tied to unknown logins
        let decoy_hash = self.decoy_hash().await?;

        let login = Login(credentials.login);
        let user = self.directory.find_by_login(&login).await?;

        let stored_hash = match &user {
            Some(user) => user.password_hash.clone(),
            None => decoy_hash,
        };
        let verified = self
            .hasher
            .matches_blocking(credentials.password, stored_hash)
            .await?;

        match user {
            Some(user) if verified => self.issue_pair(&TokenPayload {
                user_id: user.id,
                login: user.login,
            }),
            _ => Err(AuthError::CredentialsInvalid),
        }
    }

    fn refresh(&self, refresh_token: Option<&str>) -> Result<TokenPair, AuthError> {
        let token = match refresh_token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(AuthError::RefreshTokenMissing),
        };

        let payload = self
            .codec
            .verify(token, &self.config.refresh.secret)
            .map_err(|_| AuthError::RefreshTokenInvalid)?;

        self.issue_pair(&payload)
    }

    fn issue_pair(&self, payload: &TokenPayload) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.codec.issue(payload, &self.config.access)?,
            refresh_token: self.codec.issue(payload, &self.config.refresh)?,
        })
    }

    fn verify_access(&self, token: &str) -> Result<TokenPayload, AuthError> {
        self.codec
            .verify(token, &self.config.access.secret)
            .map_err(|_| AuthError::AccessTokenInvalid)
    }

    async fn decoy_hash(&self) -> Result<PasswordHash, AuthError> {
        self.decoy_hash
            .get_or_try_init(|| self.hasher.hash_blocking(DECOY_PASSWORD.to_string()))
            .await
            .cloned()
    }
}

/// Signup, login and refresh flows. Cheap to clone; clones share the same directory.
///
/// Issued tokens are not stored. A refresh token stays valid until it expires, even after
/// it has been rotated by [`Auth::refresh`].
#[derive(Clone)]
pub struct Auth {
    internal: Arc<AuthInternal>,
}

impl Auth {
    pub fn new(config: AuthConfig, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            internal: Arc::new(AuthInternal {
                hasher: config.hasher(),
                codec: TokenCodec::new(),
                config,
                directory,
                decoy_hash: OnceCell::new(),
            }),
        }
    }

    /// Hash the password and create the user. Login conflicts come from the directory.
    pub async fn signup(&self, input: CreateUser) -> Result<UserProfile, AuthError> {
        self.internal.signup(input).await
    }

    /// Unknown login and wrong password both fail with [`AuthError::CredentialsInvalid`].
    pub async fn login(&self, credentials: Credentials) -> Result<TokenPair, AuthError> {
        self.internal.login(credentials).await
    }

    /// Rotate both tokens. Every verification failure is reported as
    /// [`AuthError::RefreshTokenInvalid`].
    pub fn refresh(&self, refresh_token: Option<&str>) -> Result<TokenPair, AuthError> {
        self.internal.refresh(refresh_token)
    }

    pub fn issue_pair(&self, payload: &TokenPayload) -> Result<TokenPair, AuthError> {
        self.internal.issue_pair(payload)
    }

    /// Check an access token and return the identity it carries.
    pub fn verify_access(&self, token: &str) -> Result<TokenPayload, AuthError> {
        self.internal.verify_access(token)
    }
}
