//! # APIキー認証
//!
//! `/kms/*`、`/eth/*`、IPFSメタデータの各エンドポイントは `X-API-Key` ヘッダーが
//! `BACKEND_API_KEY` と一致する場合のみ受け付ける。
//!
//! - `BACKEND_API_KEY` が未設定: 503（保護対象のエンドポイントは全て拒否）
//! - ヘッダーの欠落・不一致: 401

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;

use crate::config::GatewayState;
use crate::error::GatewayError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// APIキーを検証するミドルウェア。
pub async fn require_api_key(
    State(state): State<Arc<GatewayState>>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let expected = state.config.api_key.as_deref().ok_or_else(|| {
        GatewayError::ServiceUnavailable("BACKEND_API_KEYが未設定です".to_string())
    })?;

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| GatewayError::Unauthorized("X-API-Keyヘッダーがありません".to_string()))?;

    if !constant_time_compare(provided, expected) {
        tracing::warn!(path = %request.uri().path(), "APIキーが一致しません");
        return Err(GatewayError::Unauthorized("APIキーが一致しません".to_string()));
    }

    Ok(next.run(request).await)
}

/// 長さに依存しない定数時間の文字列比較。
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    let max_len = a.len().max(b.len());

    // 長さが異なる場合に一致しないよう、別々の値でパディングする
    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];
    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);
    (lengths_equal & contents_equal).into()
}
