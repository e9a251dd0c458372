/*
 * Responsibility
 * - quizzes / quiz_categories の CRUD
 * - quiz 登録は quiz + category を 1 トランザクションで保存
 * - 作成者チェック (owner only) は handler 側
 */
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::repos::error::RepoError;

const QUIZ_COLUMNS: &str = r#"
    "quizId", "authorUserId", content, "optionA", "optionB",
    "descriptionA", "descriptionB", "imageA", "imageB",
    view, preference, "createdAt", "updatedAt"
"#;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuizRow {
    #[sqlx(rename = "quizId")]
    pub quiz_id: i64,
    #[sqlx(rename = "authorUserId")]
    pub author_user_id: i64,

    pub content: String,
    #[sqlx(rename = "optionA")]
    pub option_a: String,
    #[sqlx(rename = "optionB")]
    pub option_b: String,
    #[sqlx(rename = "descriptionA")]
    pub description_a: Option<String>,
    #[sqlx(rename = "descriptionB")]
    pub description_b: Option<String>,
    #[sqlx(rename = "imageA")]
    pub image_a: Option<String>,
    #[sqlx(rename = "imageB")]
    pub image_b: Option<String>,

    pub view: i64,
    pub preference: i64,

    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy)]
pub struct NewQuiz<'a> {
    pub content: &'a str,
    pub option_a: &'a str,
    pub option_b: &'a str,
    pub description_a: Option<&'a str>,
    pub description_b: Option<&'a str>,
    pub image_a: Option<&'a str>,
    pub image_b: Option<&'a str>,
}

/// None のフィールドは更新しない
#[derive(Debug, Clone, Copy, Default)]
pub struct QuizPatch<'a> {
    pub content: Option<&'a str>,
    pub option_a: Option<&'a str>,
    pub option_b: Option<&'a str>,
    pub description_a: Option<&'a str>,
    pub description_b: Option<&'a str>,
    pub image_a: Option<&'a str>,
    pub image_b: Option<&'a str>,
}

pub async fn get(db: &PgPool, quiz_id: i64) -> Result<Option<QuizRow>, RepoError> {
    let sql = format!(r#"SELECT {QUIZ_COLUMNS} FROM quizzes WHERE "quizId" = $1"#);

    let row = sqlx::query_as::<_, QuizRow>(&sql)
        .bind(quiz_id)
        .fetch_optional(db)
        .await?;

    Ok(row)
}

/// 1 件ランダムに返す (quiz が無ければ None)
pub async fn random(db: &PgPool) -> Result<Option<QuizRow>, RepoError> {
    let sql = format!("SELECT {QUIZ_COLUMNS} FROM quizzes ORDER BY random() LIMIT 1");

    let row = sqlx::query_as::<_, QuizRow>(&sql)
        .fetch_optional(db)
        .await?;

    Ok(row)
}

pub async fn categories(db: &PgPool, quiz_id: i64) -> Result<Vec<String>, RepoError> {
    let rows = sqlx::query_scalar::<_, String>(
        r#"
        SELECT category
        FROM quiz_categories
        WHERE "quizId" = $1
        ORDER BY category
        "#,
    )
    .bind(quiz_id)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

/// quiz を保存してから、その ID で category を保存する
/// 空白だけの category は読み飛ばす
pub async fn create(
    db: &PgPool,
    author_user_id: i64,
    quiz: NewQuiz<'_>,
    categories: &[String],
) -> Result<QuizRow, RepoError> {
    let mut tx = db.begin().await?;

    let sql = format!(
        r#"
        INSERT INTO quizzes (
            "authorUserId", content, "optionA", "optionB",
            "descriptionA", "descriptionB", "imageA", "imageB"
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {QUIZ_COLUMNS}
        "#
    );

    let row = sqlx::query_as::<_, QuizRow>(&sql)
        .bind(author_user_id)
        .bind(quiz.content)
        .bind(quiz.option_a)
        .bind(quiz.option_b)
        .bind(quiz.description_a)
        .bind(quiz.description_b)
        .bind(quiz.image_a)
        .bind(quiz.image_b)
        .fetch_one(&mut *tx)
        .await?;

    for category in categories.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
        sqlx::query(
            r#"
            INSERT INTO quiz_categories ("quizId", category)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(row.quiz_id)
        .bind(category)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(row)
}

pub async fn update(
    db: &PgPool,
    quiz_id: i64,
    patch: QuizPatch<'_>,
) -> Result<Option<QuizRow>, RepoError> {
    let sql = format!(
        r#"
        UPDATE quizzes
        SET
            content = COALESCE($2, content),
            "optionA" = COALESCE($3, "optionA"),
            "optionB" = COALESCE($4, "optionB"),
            "descriptionA" = COALESCE($5, "descriptionA"),
            "descriptionB" = COALESCE($6, "descriptionB"),
            "imageA" = COALESCE($7, "imageA"),
            "imageB" = COALESCE($8, "imageB"),
            "updatedAt" = now()
        WHERE "quizId" = $1
        RETURNING {QUIZ_COLUMNS}
        "#
    );

    let row = sqlx::query_as::<_, QuizRow>(&sql)
        .bind(quiz_id)
        .bind(patch.content)
        .bind(patch.option_a)
        .bind(patch.option_b)
        .bind(patch.description_a)
        .bind(patch.description_b)
        .bind(patch.image_a)
        .bind(patch.image_b)
        .fetch_optional(db)
        .await?;

    Ok(row)
}

pub async fn delete(db: &PgPool, quiz_id: i64) -> Result<bool, RepoError> {
    // quiz_categories は FK (ON DELETE CASCADE) で消える
    let result = sqlx::query(
        r#"
        DELETE FROM quizzes
        WHERE "quizId" = $1
        "#,
    )
    .bind(quiz_id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}
