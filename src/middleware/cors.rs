//! CORS policy for the quiz web client.
//!
//! - development: any origin
//! - production: only origins listed in `CORS_ALLOWED_ORIGINS`; an empty list
//!   means no cross-origin caller is allowed
//! - credentials are never allowed (auth is a bearer header, not a cookie)

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::Config;
use crate::middleware::http::REQUEST_ID_HEADER;

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(600);

fn allowed_origins(config: &Config) -> AllowOrigin {
    if !config.app_env.is_production() {
        return AllowOrigin::any();
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS is empty, cross-origin requests are disabled");
    }
    AllowOrigin::list(origins)
}

pub fn apply(router: Router, config: &Config) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(config))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            request_id.clone(),
        ])
        .expose_headers([request_id])
        .max_age(PREFLIGHT_MAX_AGE);

    router.layer(cors)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, header},
        routing::get,
    };
    use tower::ServiceExt;

    use super::*;

    fn config(app_env: &'static str, origins: &'static str) -> Config {
        Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/unused".into()),
            "AUTH_JWT_SECRET" => Some("secret".into()),
            "AUTH_ISSUER" => Some("valanse-auth".into()),
            "AUTH_AUDIENCE" => Some("valanse-api".into()),
            "APP_ENV" => Some(app_env.into()),
            "CORS_ALLOWED_ORIGINS" => Some(origins.into()),
            _ => None,
        })
        .unwrap()
    }

    async fn preflight(config: &Config, origin: &str) -> Option<String> {
        let app = apply(Router::new().route("/quizzes/random", get(|| async { "ok" })), config);

        let response = app
            .oneshot(
                Request::options("/quizzes/random")
                    .header(header::ORIGIN, origin)
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    #[tokio::test]
    async fn development_allows_any_origin() {
        let config = config("development", "");
        assert_eq!(
            preflight(&config, "http://localhost:5173").await.as_deref(),
            Some("*")
        );
    }

    #[tokio::test]
    async fn production_only_allows_listed_origins() {
        let config = config("production", "https://valanse.example");

        assert_eq!(
            preflight(&config, "https://valanse.example").await.as_deref(),
            Some("https://valanse.example")
        );
        assert_eq!(preflight(&config, "https://evil.example").await, None);
    }
}
