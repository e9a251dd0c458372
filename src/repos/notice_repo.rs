/*
 * Responsibility
 * - notices CRUD + 閲覧数カウント
 * - 権限チェック (admin のみ書き込み) は handler 側
 */
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::repos::error::RepoError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NoticeRow {
    #[sqlx(rename = "noticeId")]
    pub notice_id: i64,

    pub title: String,
    pub content: String,

    #[sqlx(rename = "authorId")]
    pub author_id: i64,

    pub views: i64,

    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[sqlx(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

pub async fn list(db: &PgPool) -> Result<Vec<NoticeRow>, RepoError> {
    let rows = sqlx::query_as::<_, NoticeRow>(
        r#"
        SELECT
            "noticeId", title, content, "authorId", views, "createdAt", "updatedAt"
        FROM notices
        ORDER BY "noticeId" DESC
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(rows)
}

pub async fn get(db: &PgPool, notice_id: i64) -> Result<Option<NoticeRow>, RepoError> {
    let row = sqlx::query_as::<_, NoticeRow>(
        r#"
        SELECT
            "noticeId", title, content, "authorId", views, "createdAt", "updatedAt"
        FROM notices
        WHERE "noticeId" = $1
        "#,
    )
    .bind(notice_id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn create(
    db: &PgPool,
    title: &str,
    content: &str,
    author_id: i64,
) -> Result<NoticeRow, RepoError> {
    let row = sqlx::query_as::<_, NoticeRow>(
        r#"
        INSERT INTO notices (title, content, "authorId")
        VALUES ($1, $2, $3)
        RETURNING
            "noticeId", title, content, "authorId", views, "createdAt", "updatedAt"
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(author_id)
    .fetch_one(db)
    .await?;

    Ok(row)
}

pub async fn update(
    db: &PgPool,
    notice_id: i64,
    title: Option<&str>,
    content: Option<&str>,
) -> Result<Option<NoticeRow>, RepoError> {
    let row = sqlx::query_as::<_, NoticeRow>(
        r#"
        UPDATE notices
        SET
            title = COALESCE($2, title),
            content = COALESCE($3, content),
            "updatedAt" = now()
        WHERE "noticeId" = $1
        RETURNING
            "noticeId", title, content, "authorId", views, "createdAt", "updatedAt"
        "#,
    )
    .bind(notice_id)
    .bind(title)
    .bind(content)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn delete(db: &PgPool, notice_id: i64) -> Result<bool, RepoError> {
    let result = sqlx::query(
        r#"
        DELETE FROM notices
        WHERE "noticeId" = $1
        "#,
    )
    .bind(notice_id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// 閲覧数 +1。対象が無ければ false
pub async fn increase_view(db: &PgPool, notice_id: i64) -> Result<bool, RepoError> {
    let result = sqlx::query(
        r#"
        UPDATE notices
        SET views = views + 1
        WHERE "noticeId" = $1
        "#,
    )
    .bind(notice_id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}
