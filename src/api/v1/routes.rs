/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health, /token/health, /users/me, /recommendations, /notices, /quizzes
 * - 認証ゲートは app 側で routes() 全体に掛ける (匿名可/必須は handler の extractor で決まる)
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use crate::api::v1::handlers::{
    health::health,
    notices::{
        create_notice, delete_notice, get_notice, increase_view, list_notices, update_notice,
    },
    quizzes::{create_quiz, delete_quiz, get_quiz, random_quiz, update_quiz},
    users::{list_recommendations, me},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/token/health", get(health))
        .route("/users/me", get(me))
        .route("/recommendations", get(list_recommendations))
        .route("/notices", get(list_notices).post(create_notice))
        .route(
            "/notices/{notice_id}",
            get(get_notice).put(update_notice).delete(delete_notice),
        )
        .route("/notices/{notice_id}/views", post(increase_view))
        .route("/quizzes", post(create_quiz))
        .route("/quizzes/random", get(random_quiz))
        .route(
            "/quizzes/{quiz_id}",
            get(get_quiz).put(update_quiz).delete(delete_quiz),
        )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::routes;
    use crate::middleware::auth::access;
    use crate::services::auth::Role;
    use crate::services::auth::gate::testing::{FakeIdentities, FakeVerifier};
    use crate::state::AppState;

    // 以下のケースはどれも DB に到達する前に応答が決まる
    fn app() -> Router {
        let db = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let identities = Arc::new(FakeIdentities::with(&[(1, Role::User), (2, Role::Admin)]));
        let state = AppState::new(db, Arc::new(FakeVerifier::default()), identities);

        Router::new()
            .nest("/api/v1", access::apply(routes(), state.clone()))
            .with_state(state)
    }

    async fn send(
        method: &str,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn health_is_public() {
        let (status, body) = send("GET", "/api/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn token_paths_ignore_broken_credentials() {
        let (status, _) = send("GET", "/api/v1/token/health", Some("Bearer junk"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send("GET", "/api/v1/health", Some("Bearer junk"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_requires_login() {
        let (status, body) = send("GET", "/api/v1/users/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn notice_writes_are_admin_only() {
        let notice = json!({ "title": "maintenance", "content": "tonight" });

        let (status, body) =
            send("POST", "/api/v1/notices", Some("Bearer valid-1"), Some(notice)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");

        let (status, _) = send("DELETE", "/api/v1/notices/5", Some("Bearer valid-1"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn invalid_notice_from_admin_is_bad_request() {
        let notice = json!({ "title": " ", "content": "tonight" });

        let (status, body) =
            send("POST", "/api/v1/notices", Some("Bearer valid-2"), Some(notice)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_NOTICE");
    }

    #[tokio::test]
    async fn quiz_registration_requires_login_and_valid_body() {
        let quiz = json!({ "content": "pick one", "optionA": "cats", "optionB": "" });

        let (status, _) = send("POST", "/api/v1/quizzes", None, Some(quiz.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) =
            send("POST", "/api/v1/quizzes", Some("Bearer valid-1"), Some(quiz)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_QUIZ");
    }
}
