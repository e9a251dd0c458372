//! Bearer token 検証 → AuthCtx を extensions に入れる
//!
//! - token 発行系のパス (`token/` を含む) は素通り
//! - Authorization ヘッダが無い/空なら匿名として素通り (AuthCtx は入れない)
//! - ヘッダがあるのに検証できない場合は 401 で打ち切り、handler には到達させない
//!
//! AuthCtx は request extensions にだけ載るので、並行リクエスト間で共有されない。

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::services::auth::{AuthError, authenticate};
use crate::state::AppState;

/// `/api/v1/*` に認証ゲートを掛ける。
///
/// 例：
/// ```ignore
/// let v1 = api::v1::routes();
/// let v1 = middleware::auth::access::apply(v1, state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    OriginalUri(original_uri): OriginalUri,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // nest 後の req.uri() は prefix が削られているので、元の URI で判定する
    let path = original_uri.path();

    let authorization = match req.headers().get(header::AUTHORIZATION) {
        None => None,
        Some(value) => match value.to_str() {
            Ok(s) => Some(s),
            Err(_) => {
                tracing::warn!(path, "authorization header is not valid ascii");
                return Err(AppError::Unauthorized);
            }
        },
    };

    let outcome = authenticate(
        state.auth.as_ref(),
        state.identities.as_ref(),
        path,
        authorization,
    )
    .await;

    match outcome {
        Ok(Some(auth_ctx)) => {
            tracing::debug!(user_id = auth_ctx.user_id, role = %auth_ctx.role, "authenticated");
            // middleware → extractor への受け渡し
            req.extensions_mut().insert(auth_ctx);
        }
        Ok(None) => {}
        Err(err) => {
            match &err {
                AuthError::Lookup(_) => {
                    tracing::error!(error = ?err, path, "identity lookup failed")
                }
                _ => tracing::warn!(error = %err, path, "authentication rejected"),
            }
            return Err(err.into());
        }
    }

    Ok(next.run(req).await)
}
