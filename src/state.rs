/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - db: PgPool, auth: TokenVerifier, identities: IdentityLookup
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 * - リクエスト固有の値 (AuthCtx など) はここに置かない。request extensions を使う
 */
use std::sync::Arc;

use crate::services::auth::{IdentityLookup, TokenVerifier};

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub auth: Arc<dyn TokenVerifier>,
    pub identities: Arc<dyn IdentityLookup>,
}

impl AppState {
    pub fn new(
        db: sqlx::PgPool,
        auth: Arc<dyn TokenVerifier>,
        identities: Arc<dyn IdentityLookup>,
    ) -> Self {
        Self {
            db,
            auth,
            identities,
        }
    }
}
