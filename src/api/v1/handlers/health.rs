/*
 * Responsibility
 * - GET /health (疎通用)
 * - GET /token/health (token 発行系パスが認証ゲートを通らないことの確認用)
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
