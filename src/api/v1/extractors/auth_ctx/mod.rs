/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - 認証済みリクエストのコンテキスト（AuthCtx）を handler に提供する
 * - 匿名リクエスト (AuthCtx なし) は extractor の時点で 401 にする
 * - 型定義は types、axum 依存は core
 */

mod core;
mod types;

pub use core::AuthCtxExtractor;
pub use types::AuthCtx;
