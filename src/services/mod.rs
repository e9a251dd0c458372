/*
 * Responsibility
 * - ビジネスロジック / 外部連携 (HTTP に依存しない)
 * - auth: 認証ゲート, ingest: 推薦エンジンからのメッセージ取り込み
 */
pub mod auth;
pub mod ingest;
