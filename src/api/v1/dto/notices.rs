/*
 * Responsibility
 * - Notices の request/response DTO
 * - validate() は形式チェックのみ (権限は handler)
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repos::notice_repo::NoticeRow;

const TITLE_MAX: usize = 200;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoticeRequest {
    pub title: String,
    pub content: String,
}

impl CreateNoticeRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("title is required");
        }
        if self.title.chars().count() > TITLE_MAX {
            return Err("title must be <= 200 chars");
        }
        if self.content.trim().is_empty() {
            return Err("content is required");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoticeRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl UpdateNoticeRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err("title cannot be empty");
            }
            if title.chars().count() > TITLE_MAX {
                return Err("title must be <= 200 chars");
            }
        }
        if let Some(content) = &self.content
            && content.trim().is_empty()
        {
            return Err("content cannot be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeResponse {
    pub notice_id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<NoticeRow> for NoticeResponse {
    fn from(row: NoticeRow) -> Self {
        Self {
            notice_id: row.notice_id,
            title: row.title,
            content: row.content,
            author_id: row.author_id,
            views: row.views,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
