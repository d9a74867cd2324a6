//! # Ethereum JSON-RPC クライアント
//!
//! 生トランザクションの中継とレジストリへの `eth_call` で共有する。
//! リトライは行わない。

use std::time::Duration;

use kaisign_types::{JsonRpcRequest, JsonRpcResponse};

/// JSON-RPC呼び出しのエラー。
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("RPCへの送信に失敗: {0}")]
    Transport(String),
    #[error("RPCがエラーを返しました: HTTP {status} - {body}")]
    Status { status: u16, body: String },
    #[error("RPCレスポンスのパースに失敗: {0}")]
    Decode(String),
    #[error("RPCエラー: {0}")]
    JsonRpc(serde_json::Value),
}

/// JSON-RPCリクエストを送信し、レスポンス本文をそのまま返す。
///
/// HTTPステータスが2xx以外、または `error` メンバーを含む場合はエラー。
pub async fn call(
    client: &reqwest::Client,
    url: &str,
    request: &JsonRpcRequest,
    timeout: Duration,
) -> Result<serde_json::Value, RpcError> {
    let response = client
        .post(url)
        .json(request)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| RpcError::Transport(e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| RpcError::Transport(format!("レスポンス読み取り失敗: {e}")))?;

    if !status.is_success() {
        return Err(RpcError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let value: serde_json::Value =
        serde_json::from_str(&body).map_err(|e| RpcError::Decode(e.to_string()))?;
    let envelope: JsonRpcResponse =
        serde_json::from_value(value.clone()).map_err(|e| RpcError::Decode(e.to_string()))?;
    if let Some(error) = envelope.error {
        return Err(RpcError::JsonRpc(error));
    }
    Ok(value)
}

/// `eth_call` を `latest` ブロックで実行し、`result` の16進文字列を返す。
pub async fn eth_call(
    client: &reqwest::Client,
    url: &str,
    to: &str,
    data: &str,
    timeout: Duration,
) -> Result<String, RpcError> {
    let request = JsonRpcRequest::new(
        "eth_call",
        serde_json::json!([{ "to": to, "data": data }, "latest"]),
    );
    let response = call(client, url, &request, timeout).await?;
    response
        .get("result")
        .and_then(|r| r.as_str())
        .map(str::to_string)
        .ok_or_else(|| RpcError::Decode("resultが文字列ではありません".to_string()))
}
