/*
 * Responsibility
 * - recommend_quizzes (userId, quizId) の一括保存 / 参照
 * - RecommendationSink の Pg 実装 (1 トランザクションで全件 or 0 件)
 */
use async_trait::async_trait;
use sqlx::PgPool;

use crate::repos::error::RepoError;
use crate::services::ingest::RecommendationSink;
use crate::services::ingest::decoder::RecommendedQuiz;

// 既にある (userId, quizId) は無視する。rows_affected は新規分だけになる
const INSERT_RECOMMENDATION: &str = r#"
    INSERT INTO recommend_quizzes ("userId", "quizId")
    VALUES ($1, $2)
    ON CONFLICT ("userId", "quizId") DO NOTHING
"#;

pub async fn list_for_user(db: &PgPool, user_id: i64) -> Result<Vec<i64>, RepoError> {
    let quiz_ids = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT "quizId"
        FROM recommend_quizzes
        WHERE "userId" = $1
        ORDER BY "createdAt" DESC, "quizId"
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    Ok(quiz_ids)
}

#[derive(Clone, Debug)]
pub struct PgRecommendationSink {
    db: PgPool,
}

impl PgRecommendationSink {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecommendationSink for PgRecommendationSink {
    async fn save_all(&self, rows: &[RecommendedQuiz]) -> Result<u64, RepoError> {
        let mut tx = self.db.begin().await?;
        let mut written = 0;

        for row in rows {
            let result = sqlx::query(INSERT_RECOMMENDATION)
                .bind(row.user_id)
                .bind(row.quiz_id)
                .execute(&mut *tx)
                .await?;

            written += result.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_recommendations_are_ignored_not_rewritten() {
        let sql = INSERT_RECOMMENDATION.to_ascii_uppercase();

        assert!(sql.contains(r#"ON CONFLICT ("USERID", "QUIZID") DO NOTHING"#));
        assert!(!sql.contains("DO UPDATE"));
    }
}
