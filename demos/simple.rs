use std::{net::SocketAddr, sync::Arc};

use serde_json::json;
use token_pair_auth::{
    build_api_route_filter, handle_auth_errors, with_auth, Auth, AuthConfig, MemoryDirectory,
    TokenPayload,
};
use tracing_subscriber::EnvFilter;
use warp::{path, Filter};

// JWT_SECRET_KEY=a JWT_SECRET_REFRESH_KEY=b TOKEN_EXPIRE_TIME=1h TOKEN_REFRESH_EXPIRE_TIME=24h \
//     cargo run --example simple
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AuthConfig::from_env()?;
    tracing::info!("starting with {:?}", config);

    let auth = Auth::new(config, Arc::new(MemoryDirectory::new()));

    let auth_routes = build_api_route_filter(&auth);

    let unsecured_homepage = warp::path::end().map(|| warp::reply::html("hello, world!"));

    let secure_page = path!("whoami")
        .and(with_auth(&auth))
        .map(|payload: TokenPayload| {
            warp::reply::json(&json!({ "userId": payload.user_id, "login": payload.login }))
        });

    let all_routes = unsecured_homepage
        .or(secure_page)
        .or(auth_routes)
        .recover(handle_auth_errors)
        .with(warp::trace::request());

    warp::serve(all_routes)
        .run("127.0.0.1:4000".parse::<SocketAddr>()?)
        .await;

    Ok(())
}
