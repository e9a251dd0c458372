/*
 * Responsibility
 * - リクエスト単位の認証ゲート (header → token 検証 → identity 解決 → AuthCtx)
 * - axum に依存しない純粋なロジック。middleware はこれを呼んで extensions に載せるだけ
 *
 * Outcome
 * - Ok(Some(ctx)) : 認証済み
 * - Ok(None)      : 匿名 (issuance path / header なし)
 * - Err(_)        : リクエストを業務ロジックに入れてはいけない
 */
use async_trait::async_trait;
use thiserror::Error;

use crate::api::v1::extractors::AuthCtx;
use crate::repos::error::RepoError;
use crate::services::auth::{AccessJwtError, Role, TokenVerifier};

/// Paths containing this segment belong to token issuance and are never gated.
pub const ISSUANCE_MARKER: &str = "token/";

/// Stored identity of a user, as resolved from the users table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub role: Role,
}

#[async_trait]
pub trait IdentityLookup: Send + Sync {
    async fn find_by_id(&self, user_id: i64) -> Result<Option<Identity>, RepoError>;
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("access token is invalid or expired")]
    TokenInvalid(#[source] AccessJwtError),

    #[error("no user for token subject {user_id}")]
    IdentityNotFound { user_id: i64 },

    #[error("identity lookup failed")]
    Lookup(#[from] RepoError),
}

pub fn is_exempt(path: &str) -> bool {
    path.contains(ISSUANCE_MARKER)
}

/// Authorization header → token.
///
/// `None` only for a missing or whitespace-only header. A `Bearer ` scheme
/// prefix is optional; `Bearer ` with nothing after it yields an empty token,
/// which the verifier rejects.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let raw = header?;
    if raw.trim().is_empty() {
        return None;
    }
    let raw = raw.trim_start();

    let token = raw
        .strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))
        .unwrap_or(raw)
        .trim();

    Some(token)
}

pub async fn authenticate(
    verifier: &dyn TokenVerifier,
    identities: &dyn IdentityLookup,
    path: &str,
    authorization: Option<&str>,
) -> Result<Option<AuthCtx>, AuthError> {
    if is_exempt(path) {
        return Ok(None);
    }

    let Some(token) = bearer_token(authorization) else {
        return Ok(None);
    };

    let verified = verifier.verify(token).map_err(AuthError::TokenInvalid)?;

    let identity = identities
        .find_by_id(verified.user_id)
        .await?
        .ok_or(AuthError::IdentityNotFound {
            user_id: verified.user_id,
        })?;

    // users テーブルの role が正。claim とずれていれば記録だけ残す
    if verified.role != identity.role {
        tracing::debug!(
            user_id = verified.user_id,
            claim_role = %verified.role,
            stored_role = %identity.role,
            "role claim differs from stored role"
        );
    }

    Ok(Some(AuthCtx::new(verified.user_id, identity.role)))
}
