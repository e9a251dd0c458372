/*
 * Responsibility
 * - decode → sink 保存 までの 1 メッセージ単位の処理
 * - 空の推薦リストは正常終了 (sink は呼ばない)
 * - decode に失敗したメッセージは何も書かない
 */
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::ingest::decoder::{
    self, DecodeError, FavoriteCategoryUpdate, RecommendedQuiz,
};

#[async_trait]
pub trait FavoriteCategorySink: Send + Sync {
    async fn save(&self, update: &FavoriteCategoryUpdate) -> Result<(), RepoError>;
}

#[async_trait]
pub trait RecommendationSink: Send + Sync {
    /// Persist all rows or none of them. Returns the number of rows written.
    async fn save_all(&self, rows: &[RecommendedQuiz]) -> Result<u64, RepoError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Saved { rows: u64 },
    NoRecommendations,
}

/// Coarse classification of a dropped message, used as a log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestErrorKind {
    DecodeMalformed,
    SinkFailure,
}

impl IngestErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestErrorKind::DecodeMalformed => "decode_malformed",
            IngestErrorKind::SinkFailure => "sink_failure",
        }
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("malformed message: {0}")]
    Decode(#[from] DecodeError),

    #[error("failed to persist message")]
    Sink(#[from] RepoError),
}

impl IngestError {
    pub fn kind(&self) -> IngestErrorKind {
        match self {
            IngestError::Decode(err) => err.kind(),
            IngestError::Sink(_) => IngestErrorKind::SinkFailure,
        }
    }
}

#[derive(Clone)]
pub struct RecommendService {
    favorites: Arc<dyn FavoriteCategorySink>,
    recommendations: Arc<dyn RecommendationSink>,
}

impl RecommendService {
    pub fn new(
        favorites: Arc<dyn FavoriteCategorySink>,
        recommendations: Arc<dyn RecommendationSink>,
    ) -> Self {
        Self {
            favorites,
            recommendations,
        }
    }

    pub async fn update_favorite_category(&self, raw: &str) -> Result<IngestOutcome, IngestError> {
        let update = decoder::decode_favorite_category(raw)?;

        self.favorites.save(&update).await?;

        tracing::info!(
            user_id = update.user_id,
            category = %update.category,
            "favorite category updated"
        );
        Ok(IngestOutcome::Saved { rows: 1 })
    }

    pub async fn update_recommend_quiz(&self, raw: &str) -> Result<IngestOutcome, IngestError> {
        let update = decoder::decode_recommendation(raw)?;

        if update.quiz_ids.is_empty() {
            tracing::warn!(
                user_id = update.user_id,
                "recommendedQuizIds is empty, nothing to update"
            );
            return Ok(IngestOutcome::NoRecommendations);
        }

        let rows = self.recommendations.save_all(&update.rows()).await?;

        tracing::info!(
            user_id = update.user_id,
            quiz_ids = ?update.quiz_ids,
            rows,
            "recommended quizzes updated"
        );
        Ok(IngestOutcome::Saved { rows })
    }
}

/// Recording sinks shared by the service and consumer tests.
#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct RecordingSink {
        pub favorites: Mutex<Vec<FavoriteCategoryUpdate>>,
        pub recommendations: Mutex<Vec<Vec<RecommendedQuiz>>>,
        pub fail: bool,
    }

    impl RecordingSink {
        pub fn favorites(&self) -> Vec<FavoriteCategoryUpdate> {
            self.favorites.lock().unwrap().clone()
        }

        pub fn recommendation_batches(&self) -> Vec<Vec<RecommendedQuiz>> {
            self.recommendations.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FavoriteCategorySink for RecordingSink {
        async fn save(&self, update: &FavoriteCategoryUpdate) -> Result<(), RepoError> {
            if self.fail {
                return Err(RepoError::Db(sqlx::Error::PoolClosed));
            }
            self.favorites.lock().unwrap().push(update.clone());
            Ok(())
        }
    }

    #[async_trait]
    impl RecommendationSink for RecordingSink {
        async fn save_all(&self, rows: &[RecommendedQuiz]) -> Result<u64, RepoError> {
            if self.fail {
                return Err(RepoError::Db(sqlx::Error::PoolClosed));
            }
            self.recommendations.lock().unwrap().push(rows.to_vec());
            Ok(rows.len() as u64)
        }
    }

    pub fn service(sink: &Arc<RecordingSink>) -> RecommendService {
        RecommendService::new(sink.clone(), sink.clone())
    }
}
