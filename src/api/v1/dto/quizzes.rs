/*
 * Responsibility
 * - Quizzes の request/response DTO
 * - 画像はクライアントがアップロード済みの参照 (URL/パス) を文字列で渡す
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repos::quiz_repo::{NewQuiz, QuizPatch, QuizRow};

const REF_MAX: usize = 512;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    pub content: String,
    pub option_a: String,
    pub option_b: String,
    pub description_a: Option<String>,
    pub description_b: Option<String>,
    pub image_a: Option<String>,
    pub image_b: Option<String>,
    #[serde(default)]
    pub category: Vec<String>,
}

impl CreateQuizRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.content.trim().is_empty() {
            return Err("content is required");
        }
        if self.option_a.trim().is_empty() || self.option_b.trim().is_empty() {
            return Err("optionA and optionB are required");
        }
        validate_refs(self.image_a.as_deref(), self.image_b.as_deref())
    }

    pub fn as_new_quiz(&self) -> NewQuiz<'_> {
        NewQuiz {
            content: &self.content,
            option_a: &self.option_a,
            option_b: &self.option_b,
            description_a: self.description_a.as_deref(),
            description_b: self.description_b.as_deref(),
            image_a: self.image_a.as_deref(),
            image_b: self.image_b.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuizRequest {
    pub content: Option<String>,
    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub description_a: Option<String>,
    pub description_b: Option<String>,
    pub image_a: Option<String>,
    pub image_b: Option<String>,
}

impl UpdateQuizRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        let required = [&self.content, &self.option_a, &self.option_b];
        if required
            .into_iter()
            .flatten()
            .any(|v| v.trim().is_empty())
        {
            return Err("content / optionA / optionB cannot be empty");
        }
        validate_refs(self.image_a.as_deref(), self.image_b.as_deref())
    }

    pub fn as_patch(&self) -> QuizPatch<'_> {
        QuizPatch {
            content: self.content.as_deref(),
            option_a: self.option_a.as_deref(),
            option_b: self.option_b.as_deref(),
            description_a: self.description_a.as_deref(),
            description_b: self.description_b.as_deref(),
            image_a: self.image_a.as_deref(),
            image_b: self.image_b.as_deref(),
        }
    }
}

fn validate_refs(image_a: Option<&str>, image_b: Option<&str>) -> Result<(), &'static str> {
    if [image_a, image_b]
        .into_iter()
        .flatten()
        .any(|r| r.len() > REF_MAX)
    {
        return Err("image reference must be <= 512 chars");
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResponse {
    pub quiz_id: i64,
    pub author_user_id: i64,
    pub content: String,
    pub option_a: String,
    pub option_b: String,
    pub description_a: Option<String>,
    pub description_b: Option<String>,
    pub image_a: Option<String>,
    pub image_b: Option<String>,
    pub view: i64,
    pub preference: i64,
    pub categories: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl QuizResponse {
    pub fn from_row(row: QuizRow, categories: Vec<String>) -> Self {
        Self {
            quiz_id: row.quiz_id,
            author_user_id: row.author_user_id,
            content: row.content,
            option_a: row.option_a,
            option_b: row.option_b,
            description_a: row.description_a,
            description_b: row.description_b,
            image_a: row.image_a,
            image_b: row.image_b,
            view: row.view,
            preference: row.preference,
            categories,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_uses_camel_case_and_defaults_categories() {
        let req: CreateQuizRequest = serde_json::from_str(
            r#"{"content":"pick one","optionA":"cats","optionB":"dogs"}"#,
        )
        .unwrap();

        assert!(req.validate().is_ok());
        assert!(req.category.is_empty());
        assert_eq!(req.as_new_quiz().option_b, "dogs");
    }

    #[test]
    fn create_request_requires_both_options() {
        let req: CreateQuizRequest =
            serde_json::from_str(r#"{"content":"pick one","optionA":"cats","optionB":" "}"#)
                .unwrap();

        assert!(req.validate().is_err());
    }

    #[test]
    fn update_request_rejects_blank_required_fields() {
        let ok: UpdateQuizRequest = serde_json::from_str(r#"{"descriptionA":""}"#).unwrap();
        assert!(ok.validate().is_ok());

        let blank: UpdateQuizRequest = serde_json::from_str(r#"{"optionA":""}"#).unwrap();
        assert!(blank.validate().is_err());
    }

    #[test]
    fn oversized_image_reference_is_rejected() {
        let req = UpdateQuizRequest {
            content: None,
            option_a: None,
            option_b: None,
            description_a: None,
            description_b: None,
            image_a: Some("x".repeat(REF_MAX + 1)),
            image_b: None,
        };
        assert!(req.validate().is_err());
    }
}
