/*
 * Responsibility
 * - favorite_categories (ユーザーごとに 1 件) の upsert / 参照
 * - FavoriteCategorySink の Pg 実装
 */
use async_trait::async_trait;
use sqlx::PgPool;

use crate::repos::error::RepoError;
use crate::services::ingest::FavoriteCategorySink;
use crate::services::ingest::decoder::FavoriteCategoryUpdate;

pub async fn upsert(db: &PgPool, user_id: i64, category: &str) -> Result<(), RepoError> {
    sqlx::query(
        r#"
        INSERT INTO favorite_categories ("userId", category)
        VALUES ($1, $2)
        ON CONFLICT ("userId") DO UPDATE SET category = EXCLUDED.category
        "#,
    )
    .bind(user_id)
    .bind(category)
    .execute(db)
    .await?;

    Ok(())
}

pub async fn get(db: &PgPool, user_id: i64) -> Result<Option<String>, RepoError> {
    let category = sqlx::query_scalar::<_, String>(
        r#"
        SELECT category
        FROM favorite_categories
        WHERE "userId" = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(category)
}

#[derive(Clone, Debug)]
pub struct PgFavoriteCategorySink {
    db: PgPool,
}

impl PgFavoriteCategorySink {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FavoriteCategorySink for PgFavoriteCategorySink {
    async fn save(&self, update: &FavoriteCategoryUpdate) -> Result<(), RepoError> {
        upsert(&self.db, update.user_id, &update.category).await
    }
}
