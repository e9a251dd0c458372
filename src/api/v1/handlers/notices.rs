/*
 * Responsibility
 * - /notices 系 CRUD handler
 * - 読み取りは匿名で可、書き込みは admin のみ (AuthCtx.role で判定)
 */
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    api::v1::{
        dto::notices::{CreateNoticeRequest, NoticeResponse, UpdateNoticeRequest},
        extractors::{AuthCtx, AuthCtxExtractor},
    },
    error::AppError,
    repos::notice_repo,
    state::AppState,
};

fn require_admin(ctx: &AuthCtx, action: &'static str) -> Result<(), AppError> {
    ctx.require_admin().inspect_err(|_| {
        tracing::warn!(user_id = ctx.user_id, action, "forbidden: admin only");
    })
}

pub async fn list_notices(
    State(state): State<AppState>,
) -> Result<Json<Vec<NoticeResponse>>, AppError> {
    let rows = notice_repo::list(&state.db).await?;

    Ok(Json(rows.into_iter().map(NoticeResponse::from).collect()))
}

pub async fn get_notice(
    State(state): State<AppState>,
    Path(notice_id): Path<i64>,
) -> Result<Json<NoticeResponse>, AppError> {
    let row = notice_repo::get(&state.db, notice_id)
        .await?
        .ok_or(AppError::not_found("notice"))?;

    Ok(Json(row.into()))
}

pub async fn create_notice(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Json(req): Json<CreateNoticeRequest>,
) -> Result<(StatusCode, Json<NoticeResponse>), AppError> {
    require_admin(&ctx, "create_notice")?;
    req.validate()
        .map_err(|m| AppError::bad_request("INVALID_NOTICE", m))?;

    let row = notice_repo::create(&state.db, req.title.trim(), &req.content, ctx.user_id).await?;

    Ok((StatusCode::CREATED, Json(row.into())))
}

pub async fn update_notice(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Path(notice_id): Path<i64>,
    Json(req): Json<UpdateNoticeRequest>,
) -> Result<Json<NoticeResponse>, AppError> {
    require_admin(&ctx, "update_notice")?;
    req.validate()
        .map_err(|m| AppError::bad_request("INVALID_NOTICE", m))?;

    let row = notice_repo::update(
        &state.db,
        notice_id,
        req.title.as_deref().map(str::trim),
        req.content.as_deref(),
    )
    .await?
    .ok_or(AppError::not_found("notice"))?;

    Ok(Json(row.into()))
}

pub async fn delete_notice(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Path(notice_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_admin(&ctx, "delete_notice")?;

    if notice_repo::delete(&state.db, notice_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("notice"))
    }
}

pub async fn increase_view(
    State(state): State<AppState>,
    Path(notice_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if notice_repo::increase_view(&state.db, notice_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("notice"))
    }
}
