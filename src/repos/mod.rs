/*
 * Responsibility
 * - SQLx を使った永続化 (テーブル単位のモジュール)
 * - services 層の trait (IdentityLookup / *Sink) の Pg 実装もここに置く
 */
pub mod error;
pub mod favorite_category_repo;
pub mod notice_repo;
pub mod quiz_repo;
pub mod recommend_quiz_repo;
pub mod user_repo;
