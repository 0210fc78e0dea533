use std::convert::Infallible;

use serde_json::json;
use warp::{hyper::StatusCode, path, Filter, Rejection, Reply};

use crate::{
    auth::Auth,
    error::AuthError,
    types::{CreateUser, Credentials, RefreshRequest, TokenPayload},
};

pub fn build_api_route_filter(
    auth: &Auth,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let signup = path!("auth" / "signup")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_auth_state(auth.clone()))
        .and_then(user_signup);

    let login = path!("auth" / "login")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_auth_state(auth.clone()))
        .and_then(user_login);

    // a missing, `null` or unreadable body carries no token
    let refresh = path!("auth" / "refresh")
        .and(warp::post())
        .and(
            warp::body::json::<RefreshRequest>()
                .or(warp::any().map(RefreshRequest::default))
                .unify(),
        )
        .and(with_auth_state(auth.clone()))
        .and_then(token_refresh);

    signup.or(login).or(refresh)
}

/// Extract the identity from a valid `Authorization: Bearer <access token>` header.
pub fn with_auth(
    auth: &Auth,
) -> impl Filter<Extract = (TokenPayload,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(with_auth_state(auth.clone()))
        .and_then(user_auth_check)
}

pub async fn handle_auth_errors(err: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(auth_error) = err.find::<AuthError>() {
        let status = match auth_error {
            AuthError::LoginConflict => StatusCode::CONFLICT,
            AuthError::CredentialsInvalid | AuthError::RefreshTokenInvalid => {
                StatusCode::FORBIDDEN
            }
            AuthError::RefreshTokenMissing | AuthError::AccessTokenInvalid => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Directory { .. } | AuthError::Internal(_) => {
                tracing::error!("auth request failed: {:?}", auth_error);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "an unknown error has occurred".to_string()
        } else {
            auth_error.to_string()
        };

        return Ok(warp::reply::with_status(
            warp::reply::json(&json!({ "statusCode": status.as_u16(), "message": message })),
            status,
        ));
    }

    Err(err)
}

async fn user_signup(input: CreateUser, auth: Auth) -> Result<impl Reply, Rejection> {
    let user = auth.signup(input).await?;

    tracing::debug!("created user {}", user.id.0);

    Ok(warp::reply::with_status(
        warp::reply::json(&user),
        StatusCode::CREATED,
    ))
}

async fn user_login(input: Credentials, auth: Auth) -> Result<impl Reply, Rejection> {
    let tokens = auth.login(input).await?;

    Ok(warp::reply::json(&tokens))
}

async fn token_refresh(input: RefreshRequest, auth: Auth) -> Result<impl Reply, Rejection> {
    let tokens = auth.refresh(input.refresh_token.as_deref())?;

    Ok(warp::reply::json(&tokens))
}

async fn user_auth_check(header: Option<String>, auth: Auth) -> Result<TokenPayload, Rejection> {
    let token = header
        .as_deref()
        .and_then(bearer_token)
        .ok_or(AuthError::AccessTokenInvalid)?;

    let payload = auth.verify_access(token)?;

    Ok(payload)
}

// The scheme name is case-insensitive.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

// functor that adds a handle to the auth state into the filter chain
fn with_auth_state(auth: Auth) -> impl Filter<Extract = (Auth,), Error = Infallible> + Clone {
    warp::any().map(move || auth.clone())
}
