//! # POST /eth/sendRawTransaction
//!
//! 署名済みトランザクションを `eth_sendRawTransaction` でEthereum RPCに中継する。
//! 中継先は `SEPOLIA_RPC_URL`、未設定なら `ALCHEMY_RPC_URL`。

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::Json;
use kaisign_types::{JsonRpcRequest, RawTransactionRequest};

use crate::config::GatewayState;
use crate::error::GatewayError;
use crate::rpc;

const RELAY_TIMEOUT: Duration = Duration::from_secs(30);

/// 生トランザクションが `0x` + 16進数か検証する。
fn validate_raw_transaction(raw: &str) -> Result<(), GatewayError> {
    let hex_str = raw.strip_prefix("0x").ok_or_else(|| {
        GatewayError::BadRequest("rawは0xで始まる16進数である必要があります".to_string())
    })?;
    if hex_str.is_empty() {
        return Err(GatewayError::BadRequest("rawが空です".to_string()));
    }
    hex::decode(hex_str)
        .map_err(|e| GatewayError::BadRequest(format!("rawが16進数ではありません: {e}")))?;
    Ok(())
}

/// POST /eth/sendRawTransaction — RPCへの中継。
///
/// 成功時はJSON-RPCレスポンスをそのまま返す。RPCの失敗・JSON-RPCエラーは502。
pub async fn handle_send_raw_transaction(
    State(state): State<Arc<GatewayState>>,
    Json(body): Json<RawTransactionRequest>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let rpc_url = state.config.relay_rpc_url.as_deref().ok_or_else(|| {
        GatewayError::ServiceUnavailable(
            "RPC URL（SEPOLIA_RPC_URL / ALCHEMY_RPC_URL）が未設定です".to_string(),
        )
    })?;
    validate_raw_transaction(&body.raw)?;

    let request = JsonRpcRequest::new("eth_sendRawTransaction", serde_json::json!([body.raw]));
    let response = rpc::call(&state.http_client, rpc_url, &request, RELAY_TIMEOUT)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "トランザクションの中継に失敗");
            GatewayError::BadGateway(e.to_string())
        })?;

    tracing::info!(
        tx_hash = %response.get("result").and_then(|r| r.as_str()).unwrap_or_default(),
        "トランザクションを中継"
    );
    Ok(Json(response))
}
