//! # Gateway エラー型
//!
//! 全エンドポイントで共通のエラー型。レスポンスはステータスコードと
//! エラーメッセージ（プレーンテキスト）。

use axum::http::StatusCode;
use kaisign_signer::SignerError;

/// Gatewayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 不正なリクエスト（ダイジェスト・生トランザクション・specIDの形式不正）
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),
    /// APIキーが欠落している、または一致しない
    #[error("認証に失敗: {0}")]
    Unauthorized(String),
    /// サーバー側の設定不足（APIキー、署名オラクル、RPC URL）
    #[error("サービスを利用できません: {0}")]
    ServiceUnavailable(String),
    /// 外部サービス（署名オラクル、Ethereum RPC）の失敗
    #[error("外部サービスの呼び出しに失敗: {0}")]
    BadGateway(String),
}

impl From<SignerError> for GatewayError {
    fn from(e: SignerError) -> Self {
        match e {
            SignerError::Configuration(_) => GatewayError::ServiceUnavailable(e.to_string()),
            _ if e.is_client_error() => GatewayError::BadRequest(e.to_string()),
            _ => GatewayError::BadGateway(e.to_string()),
        }
    }
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GatewayError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::BadGateway(_) => StatusCode::BAD_GATEWAY,
        };
        (status, self.to_string()).into_response()
    }
}
