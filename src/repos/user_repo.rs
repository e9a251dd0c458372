/*
 * Responsibility
 * - users テーブル向け SQLx 操作 (認証ゲートが使う identity 解決)
 * - IdentityLookup の Pg 実装
 */
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoError;
use crate::services::auth::{Identity, IdentityLookup, Role};

#[derive(Debug, FromRow)]
pub struct UserRow {
    #[sqlx(rename = "userId")]
    pub id: i64,
    #[sqlx(rename = "userName")]
    pub user_name: String,
    pub role: String,
}

pub async fn get(db: &PgPool, user_id: i64) -> Result<Option<UserRow>, RepoError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT "userId", "userName", role
        FROM users
        WHERE "userId" = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

/// users テーブルを identity store として使う
#[derive(Clone, Debug)]
pub struct PgIdentityLookup {
    db: PgPool,
}

impl PgIdentityLookup {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityLookup for PgIdentityLookup {
    async fn find_by_id(&self, user_id: i64) -> Result<Option<Identity>, RepoError> {
        let row = get(&self.db, user_id).await?;

        Ok(row.map(|u| Identity {
            user_id: u.id,
            role: Role::parse(&u.role),
        }))
    }
}
