/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - JWT の検証ロジックや identity lookup は middleware/services 側の責務
 * - ここは「型（契約）」として固定化する
 * - request extensions に載るので、リクエストをまたいで共有されることはない
 */

use crate::error::AppError;
use crate::services::auth::Role;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `user_id` は users テーブルの内部ID (token の `sub`)
/// - `role` は users テーブルに保存されている role (token の claim ではない)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthCtx {
    pub user_id: i64,
    pub role: Role,
}

impl AuthCtx {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// admin 以外は Forbidden
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// リソースの作成者本人以外は Forbidden (admin も例外扱いしない)
    pub fn require_owner(&self, owner_id: i64) -> Result<(), AppError> {
        if self.user_id == owner_id {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_check() {
        assert!(AuthCtx::new(1, Role::Admin).require_admin().is_ok());
        assert!(matches!(
            AuthCtx::new(1, Role::User).require_admin(),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn owner_check() {
        let ctx = AuthCtx::new(5, Role::Admin);
        assert!(ctx.require_owner(5).is_ok());
        assert!(matches!(ctx.require_owner(6), Err(AppError::Forbidden)));
    }
}
