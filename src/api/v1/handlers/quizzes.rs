/*
 * Responsibility
 * - /quizzes 系 CRUD handler
 * - 登録はログインユーザー、更新/削除は作成者本人のみ
 */
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    api::v1::{
        dto::quizzes::{CreateQuizRequest, QuizResponse, UpdateQuizRequest},
        extractors::{AuthCtx, AuthCtxExtractor},
    },
    error::AppError,
    repos::quiz_repo,
    state::AppState,
};

/// 作成者本人でなければ Forbidden。quiz が無ければ NotFound
async fn require_author(state: &AppState, ctx: &AuthCtx, quiz_id: i64) -> Result<(), AppError> {
    let quiz = quiz_repo::get(&state.db, quiz_id)
        .await?
        .ok_or(AppError::not_found("quiz"))?;

    ctx.require_owner(quiz.author_user_id).inspect_err(|_| {
        tracing::warn!(
            user_id = ctx.user_id,
            quiz_id,
            author_user_id = quiz.author_user_id,
            "forbidden: not the author"
        );
    })
}

async fn to_response(state: &AppState, row: quiz_repo::QuizRow) -> Result<QuizResponse, AppError> {
    let categories = quiz_repo::categories(&state.db, row.quiz_id).await?;
    Ok(QuizResponse::from_row(row, categories))
}

pub async fn get_quiz(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> Result<Json<QuizResponse>, AppError> {
    let row = quiz_repo::get(&state.db, quiz_id)
        .await?
        .ok_or(AppError::not_found("quiz"))?;

    Ok(Json(to_response(&state, row).await?))
}

pub async fn random_quiz(State(state): State<AppState>) -> Result<Json<QuizResponse>, AppError> {
    let row = quiz_repo::random(&state.db)
        .await?
        .ok_or(AppError::not_found("quiz"))?;

    Ok(Json(to_response(&state, row).await?))
}

pub async fn create_quiz(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Json(req): Json<CreateQuizRequest>,
) -> Result<(StatusCode, Json<QuizResponse>), AppError> {
    req.validate()
        .map_err(|m| AppError::bad_request("INVALID_QUIZ", m))?;

    let row = quiz_repo::create(&state.db, ctx.user_id, req.as_new_quiz(), &req.category).await?;
    tracing::info!(quiz_id = row.quiz_id, user_id = ctx.user_id, "quiz registered");

    Ok((StatusCode::CREATED, Json(to_response(&state, row).await?)))
}

pub async fn update_quiz(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Path(quiz_id): Path<i64>,
    Json(req): Json<UpdateQuizRequest>,
) -> Result<Json<QuizResponse>, AppError> {
    req.validate()
        .map_err(|m| AppError::bad_request("INVALID_QUIZ", m))?;
    require_author(&state, &ctx, quiz_id).await?;

    let row = quiz_repo::update(&state.db, quiz_id, req.as_patch())
        .await?
        .ok_or(AppError::not_found("quiz"))?;

    Ok(Json(to_response(&state, row).await?))
}

pub async fn delete_quiz(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Path(quiz_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_author(&state, &ctx, quiz_id).await?;

    if quiz_repo::delete(&state.db, quiz_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("quiz"))
    }
}
