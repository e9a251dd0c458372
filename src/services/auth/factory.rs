/// Factory: build the token verifier from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::AuthService;

pub fn build_auth_service(config: &Config) -> anyhow::Result<Arc<AuthService>> {
    let auth = AuthService::new(
        &config.auth_jwt_secret,
        &config.auth_issuer,
        &config.auth_audience,
        config.access_token_leeway_seconds,
    )
    .map_err(anyhow::Error::msg)?;

    Ok(Arc::new(auth))
}
