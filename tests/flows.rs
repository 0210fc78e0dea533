use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use token_pair_auth::{
    Auth, AuthConfig, AuthError, CreateUser, Credentials, DirectoryError, Login, MemoryDirectory,
    PasswordHash, TokenCodec, TokenPayload, TokenPolicy, User, UserDirectory, UserProfile,
};

const ACCESS_SECRET: &str = "access secret for tests";
const REFRESH_SECRET: &str = "refresh secret for tests";

fn config(access_ttl: u64, refresh_ttl: u64) -> AuthConfig {
    AuthConfig::new(
        1,
        TokenPolicy::new(ACCESS_SECRET, Duration::from_secs(access_ttl)),
        TokenPolicy::new(REFRESH_SECRET, Duration::from_secs(refresh_ttl)),
    )
    .unwrap()
}

fn auth() -> Auth {
    Auth::new(config(60, 600), Arc::new(MemoryDirectory::new()))
}

fn credentials(login: &str, password: &str) -> Credentials {
    Credentials {
        login: login.into(),
        password: password.into(),
    }
}

async fn signup(auth: &Auth, login: &str, password: &str) -> UserProfile {
    auth.signup(CreateUser {
        login: login.into(),
        password: password.into(),
    })
    .await
    .unwrap()
}

fn decode(token: &str, secret: &str) -> TokenPayload {
    TokenCodec::new().verify(token, secret).unwrap()
}

// replace one character in the middle of the payload segment
fn tamper(token: &str) -> String {
    let payload_start = token.find('.').unwrap() + 1;
    let payload_end = token.rfind('.').unwrap();
    let index = payload_start + (payload_end - payload_start) / 2;

    let mut bytes = token.as_bytes().to_vec();
    bytes[index] = if bytes[index] == b'A' { b'B' } else { b'A' };
    String::from_utf8(bytes).unwrap()
}

#[tokio::test]
async fn signup_then_login() {
    let auth = auth();

    let user = signup(&auth, "alice", "s3cret").await;
    assert_eq!(user.login, Login("alice".into()));
    let rendered = format!("{user:?} {}", serde_json::to_string(&user).unwrap());
    assert!(!rendered.contains("argon2"), "{rendered}");
    assert!(!rendered.contains("s3cret"), "{rendered}");

    auth.login(credentials("alice", "s3cret")).await.unwrap();

    let wrong = auth.login(credentials("alice", "wrong")).await;
    assert!(matches!(wrong, Err(AuthError::CredentialsInvalid)));
}

#[tokio::test]
async fn login_tokens_carry_the_same_identity() {
    let auth = auth();
    let user = signup(&auth, "alice", "s3cret").await;

    let pair = auth.login(credentials("alice", "s3cret")).await.unwrap();

    let access = decode(&pair.access_token, ACCESS_SECRET);
    let refresh = decode(&pair.refresh_token, REFRESH_SECRET);
    assert_eq!(access, refresh);
    assert_eq!(access.user_id, user.id);
    assert_eq!(access.login, user.login);
}

#[tokio::test]
async fn access_and_refresh_use_distinct_secrets() {
    let auth = auth();
    signup(&auth, "alice", "s3cret").await;
    let pair = auth.login(credentials("alice", "s3cret")).await.unwrap();

    let codec = TokenCodec::new();
    assert!(codec.verify(&pair.access_token, REFRESH_SECRET).is_err());
    assert!(codec.verify(&pair.refresh_token, ACCESS_SECRET).is_err());
}

#[tokio::test]
async fn wrong_password_and_unknown_login_are_indistinguishable() {
    let auth = auth();
    signup(&auth, "alice", "s3cret").await;

    let wrong_password = auth.login(credentials("alice", "nope")).await.unwrap_err();
    let unknown_login = auth.login(credentials("mallory", "s3cret")).await.unwrap_err();

    assert!(matches!(wrong_password, AuthError::CredentialsInvalid));
    assert!(matches!(unknown_login, AuthError::CredentialsInvalid));
    assert_eq!(wrong_password.to_string(), unknown_login.to_string());
    assert_eq!(format!("{wrong_password:?}"), format!("{unknown_login:?}"));
}

#[tokio::test]
async fn duplicate_signup_propagates_conflict() {
    let auth = auth();
    signup(&auth, "alice", "s3cret").await;

    let second = auth
        .signup(CreateUser {
            login: "alice".into(),
            password: "other".into(),
        })
        .await;

    assert!(matches!(second, Err(AuthError::LoginConflict)));
}

#[tokio::test]
async fn refresh_rotates_both_tokens() {
    let auth = auth();
    let user = signup(&auth, "alice", "s3cret").await;
    let pair = auth.login(credentials("alice", "s3cret")).await.unwrap();

    let rotated = auth.refresh(Some(&pair.refresh_token)).unwrap();

    assert_ne!(rotated.access_token, pair.access_token);
    assert_ne!(rotated.refresh_token, pair.refresh_token);
    let payload = decode(&rotated.refresh_token, REFRESH_SECRET);
    assert_eq!(payload.user_id, user.id);
    assert_eq!(payload, decode(&rotated.access_token, ACCESS_SECRET));
}

#[tokio::test]
async fn rotated_refresh_token_remains_usable_until_expiry() {
    // no revocation store: the old token still works after rotation
    let auth = auth();
    signup(&auth, "alice", "s3cret").await;
    let pair = auth.login(credentials("alice", "s3cret")).await.unwrap();

    auth.refresh(Some(&pair.refresh_token)).unwrap();

    assert!(auth.refresh(Some(&pair.refresh_token)).is_ok());
}

#[tokio::test]
async fn refresh_without_token_is_missing() {
    let auth = auth();

    assert!(matches!(
        auth.refresh(None),
        Err(AuthError::RefreshTokenMissing)
    ));
    assert!(matches!(
        auth.refresh(Some("")),
        Err(AuthError::RefreshTokenMissing)
    ));
}

#[tokio::test]
async fn refresh_failures_collapse_to_invalid() {
    let auth = auth();
    signup(&auth, "alice", "s3cret").await;
    let pair = auth.login(credentials("alice", "s3cret")).await.unwrap();

    let tampered = tamper(&pair.refresh_token);
    assert_ne!(tampered, pair.refresh_token);

    for token in [
        tampered.as_str(),
        pair.access_token.as_str(),
        "not a token",
        "a.b.c",
    ] {
        let err = auth.refresh(Some(token)).unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenInvalid), "{token}");
        assert_eq!(err.to_string(), "refresh token invalid or expired");
    }
}

#[tokio::test]
async fn expired_refresh_token_is_invalid() {
    let auth = auth();
    let user = signup(&auth, "alice", "s3cret").await;

    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
    let sign = |exp: u64| {
        encode(
            &Header::default(),
            &json!({
                "userId": user.id.0,
                "login": user.login.0,
                "iat": now - 600,
                "exp": exp,
                "jti": "expired",
            }),
            &EncodingKey::from_secret(REFRESH_SECRET.as_ref()),
        )
        .unwrap()
    };

    for exp in [now - 60, now] {
        assert!(matches!(
            auth.refresh(Some(&sign(exp))),
            Err(AuthError::RefreshTokenInvalid)
        ));
    }
    assert!(auth.refresh(Some(&sign(now + 60))).is_ok());
}

#[tokio::test]
async fn access_token_guard() {
    let auth = auth();
    signup(&auth, "alice", "s3cret").await;
    let pair = auth.login(credentials("alice", "s3cret")).await.unwrap();

    assert_eq!(auth.verify_access(&pair.access_token).unwrap().login.0, "alice");
    assert!(matches!(
        auth.verify_access(&pair.refresh_token),
        Err(AuthError::AccessTokenInvalid)
    ));
    assert!(matches!(
        auth.verify_access(&tamper(&pair.access_token)),
        Err(AuthError::AccessTokenInvalid)
    ));
}

#[tokio::test]
async fn concurrent_flows_do_not_interfere() {
    let auth = auth();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let auth = auth.clone();
            tokio::spawn(async move {
                let login = format!("user{i}");
                let password = format!("pw{i}");
                auth.signup(CreateUser {
                    login: login.clone(),
                    password: password.clone(),
                })
                .await?;
                let pair = auth.login(credentials(&login, &password)).await?;
                Ok::<_, AuthError>((login, pair))
            })
        })
        .collect();

    for handle in handles {
        let (login, pair) = handle.await.unwrap().unwrap();
        assert_eq!(decode(&pair.access_token, ACCESS_SECRET).login.0, login);
    }
}

struct FailingDirectory;

#[async_trait]
impl UserDirectory for FailingDirectory {
    async fn create(&self, _: &Login, _: &PasswordHash) -> Result<User, DirectoryError> {
        Err(DirectoryError::Backend("connection reset".into()))
    }

    async fn find_by_login(&self, _: &Login) -> Result<Option<User>, DirectoryError> {
        Err(DirectoryError::Backend("connection reset".into()))
    }
}

#[tokio::test]
async fn directory_failures_are_not_credential_errors() {
    let auth = Auth::new(config(60, 600), Arc::new(FailingDirectory));

    let signup = auth
        .signup(CreateUser {
            login: "alice".into(),
            password: "s3cret".into(),
        })
        .await;
    let login = auth.login(credentials("alice", "s3cret")).await;

    assert!(matches!(signup, Err(AuthError::Directory { .. })));
    assert!(matches!(login, Err(AuthError::Directory { .. })));
}
