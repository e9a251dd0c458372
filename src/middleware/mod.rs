/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: 認証ゲート / cors, http, security_headers: 横断的な HTTP 関心事
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
