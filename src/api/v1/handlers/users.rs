/*
 * Responsibility
 * - /users/me, /recommendations (ログインユーザー本人の情報)
 * - AuthCtxExtractor が無ければ 401
 */
use axum::{Json, extract::State};

use crate::{
    api::v1::{
        dto::users::{MeResponse, RecommendationsResponse},
        extractors::AuthCtxExtractor,
    },
    error::AppError,
    repos::{favorite_category_repo, recommend_quiz_repo, user_repo},
    state::AppState,
};

pub async fn me(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<Json<MeResponse>, AppError> {
    let user = user_repo::get(&state.db, ctx.user_id)
        .await?
        .ok_or(AppError::not_found("user"))?;
    let favorite_category = favorite_category_repo::get(&state.db, ctx.user_id).await?;

    Ok(Json(MeResponse {
        user_id: user.id,
        user_name: user.user_name,
        role: ctx.role.as_str(),
        favorite_category,
    }))
}

pub async fn list_recommendations(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<Json<RecommendationsResponse>, AppError> {
    let quiz_ids = recommend_quiz_repo::list_for_user(&state.db, ctx.user_id).await?;

    Ok(Json(RecommendationsResponse {
        user_id: ctx.user_id,
        quiz_ids,
    }))
}
