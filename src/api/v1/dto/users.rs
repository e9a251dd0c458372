/*
 * Responsibility
 * - /users 系の response DTO
 */
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: i64,
    pub user_name: String,
    pub role: &'static str,
    pub favorite_category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsResponse {
    pub user_id: i64,
    pub quiz_ids: Vec<i64>,
}
