/*
 * Responsibility
 * - 推薦エンジンから届く `key:value,...` 形式のテキストを型付きレコードに変換する
 * - 純粋関数のみ (I/O なし、共有状態なし)。並行に呼んでよい
 *
 * Shapes
 * - favorite category : `userId:42,category:sports`
 *   すべての `,` で分割
 * - recommendation    : `userId:3,recommendedQuizIds:10,11,12`
 *   英字が直後に続く `,` でだけ分割 (数字の前の `,` は id リストの内側)
 *
 * 共通
 * - pair は最初の `:` で key / value に分け、両方 trim
 * - 同じ key が複数あれば最後の値が勝つ
 * - 空の pair (末尾の `,` など) は無視、`:` のない pair は不正
 */
use std::collections::HashMap;

use thiserror::Error;

use crate::services::ingest::service::IngestErrorKind;

pub const USER_ID: &str = "userId";
pub const CATEGORY: &str = "category";
pub const RECOMMENDED_QUIZ_IDS: &str = "recommendedQuizIds";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteCategoryUpdate {
    pub user_id: i64,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationUpdate {
    pub user_id: i64,
    pub quiz_ids: Vec<i64>,
}

/// One persisted recommendation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendedQuiz {
    pub user_id: i64,
    pub quiz_id: i64,
}

impl RecommendationUpdate {
    /// Flatten into one row per recommended quiz, keeping order.
    pub fn rows(&self) -> Vec<RecommendedQuiz> {
        self.quiz_ids
            .iter()
            .map(|&quiz_id| RecommendedQuiz {
                user_id: self.user_id,
                quiz_id,
            })
            .collect()
    }
}

/// A message that does not follow its shape's grammar.
///
/// Every variant is fatal for the one message being decoded and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed pair {pair:?} (expected `key:value`)")]
    MalformedPair { pair: String },

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("field '{0}' is empty")]
    EmptyField(&'static str),

    #[error("field '{field}' is not a valid integer: {value:?}")]
    InvalidInteger { field: &'static str, value: String },
}

impl DecodeError {
    /// Every decode failure is the same kind to callers: the message is dropped.
    pub fn kind(&self) -> IngestErrorKind {
        IngestErrorKind::DecodeMalformed
    }
}

pub fn decode_favorite_category(raw: &str) -> Result<FavoriteCategoryUpdate, DecodeError> {
    let fields = collect_fields(raw.split(','))?;

    let user_id = user_id(&fields)?;
    let category = fields
        .get(CATEGORY)
        .copied()
        .ok_or(DecodeError::MissingField(CATEGORY))?;

    if category.is_empty() {
        return Err(DecodeError::EmptyField(CATEGORY));
    }

    Ok(FavoriteCategoryUpdate {
        user_id,
        category: category.to_string(),
    })
}

pub fn decode_recommendation(raw: &str) -> Result<RecommendationUpdate, DecodeError> {
    let fields = collect_fields(split_before_letter(raw))?;

    let user_id = user_id(&fields)?;

    let quiz_ids = match fields.get(RECOMMENDED_QUIZ_IDS) {
        None => Vec::new(),
        Some(ids) if ids.is_empty() => Vec::new(),
        // 1 つでも数値でなければメッセージ全体が不正 (部分保存しない)
        Some(ids) => ids
            .split(',')
            .map(|token| parse_id(RECOMMENDED_QUIZ_IDS, token.trim()))
            .collect::<Result<Vec<_>, _>>()?,
    };

    Ok(RecommendationUpdate { user_id, quiz_ids })
}

/// Split at every `,` that is immediately followed by an ASCII letter.
fn split_before_letter(raw: &str) -> impl Iterator<Item = &str> {
    let bytes = raw.as_bytes();
    let mut start = 0;
    let mut pieces = Vec::new();

    for (i, b) in bytes.iter().enumerate() {
        if *b == b',' && bytes.get(i + 1).is_some_and(u8::is_ascii_alphabetic) {
            pieces.push(&raw[start..i]);
            start = i + 1;
        }
    }
    pieces.push(&raw[start..]);

    pieces.into_iter()
}

fn collect_fields<'a>(
    pairs: impl Iterator<Item = &'a str>,
) -> Result<HashMap<&'a str, &'a str>, DecodeError> {
    let mut fields = HashMap::new();

    for pair in pairs {
        if pair.trim().is_empty() {
            continue;
        }

        let malformed = || DecodeError::MalformedPair {
            pair: pair.to_string(),
        };

        let (key, value) = pair.split_once(':').ok_or_else(malformed)?;
        let key = key.trim();
        if key.is_empty() {
            return Err(malformed());
        }

        fields.insert(key, value.trim());
    }

    Ok(fields)
}

fn user_id(fields: &HashMap<&str, &str>) -> Result<i64, DecodeError> {
    let raw = fields
        .get(USER_ID)
        .copied()
        .ok_or(DecodeError::MissingField(USER_ID))?;

    let id = parse_id(USER_ID, raw)?;
    if id <= 0 {
        return Err(DecodeError::InvalidInteger {
            field: USER_ID,
            value: raw.to_string(),
        });
    }

    Ok(id)
}

fn parse_id(field: &'static str, raw: &str) -> Result<i64, DecodeError> {
    raw.parse::<i64>().map_err(|_| DecodeError::InvalidInteger {
        field,
        value: raw.to_string(),
    })
}
