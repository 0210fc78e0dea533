use warp::reject::Reject;

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("user with this login and password not found")]
    CredentialsInvalid,
    #[error("refresh token required")]
    RefreshTokenMissing,
    #[error("refresh token invalid or expired")]
    RefreshTokenInvalid,
    #[error("access token invalid or expired")]
    AccessTokenInvalid,
    #[error("an account with that login already exists")]
    LoginConflict,
    #[error("error during directory operation")]
    Directory {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl Reject for AuthError {}

impl From<DirectoryError> for AuthError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::LoginConflict => AuthError::LoginConflict,
            DirectoryError::Backend(source) => AuthError::Directory { source },
        }
    }
}

/// Failures reported by a [`UserDirectory`](crate::UserDirectory) implementation.
#[derive(thiserror::Error, Debug)]
pub enum DirectoryError {
    #[error("login already taken")]
    LoginConflict,
    #[error("directory backend failure")]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(thiserror::Error, Debug)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token payload is missing identity fields")]
    IncompletePayload,
    #[error("token rejected")]
    Rejected {
        #[from]
        source: jsonwebtoken::errors::Error,
    },
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration key {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("access and refresh tokens must be signed with different secrets")]
    SharedSecret,
}
