//! # POST /getIPFSMetadata, POST /getBatchIPFSMetadata
//!
//! specIDからKaiSignレジストリ経由でERC-7730メタデータを取得し、
//! デプロイ情報（コントラクトアドレス、チェーンID）を返す。
//! `/api/py/` プレフィックス付きのパスも同じハンドラで受け付ける。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use kaisign_types::{
    BatchIpfsMetadataRequest, BatchIpfsMetadataResponse, IpfsMetadataRequest,
    IpfsMetadataResponse,
};

use crate::config::GatewayState;
use crate::error::GatewayError;
use crate::ipfs::validate_spec_id;

/// POST /getIPFSMetadata — 単一specIDの解決。
///
/// specIDの形式不正は400。レジストリ・IPFSの失敗は200で `error` に格納する。
pub async fn handle_ipfs_metadata(
    State(state): State<Arc<GatewayState>>,
    Json(body): Json<IpfsMetadataRequest>,
) -> Result<Json<IpfsMetadataResponse>, GatewayError> {
    validate_spec_id(&body.spec_id).map_err(GatewayError::BadRequest)?;
    Ok(Json(state.metadata.resolve(&body.spec_id).await))
}

/// POST /getBatchIPFSMetadata — 複数specIDの並行解決。
///
/// 各specIDは独立に処理し、結果はリクエストと同じ順序で返す。
pub async fn handle_batch_ipfs_metadata(
    State(state): State<Arc<GatewayState>>,
    Json(body): Json<BatchIpfsMetadataRequest>,
) -> Json<BatchIpfsMetadataResponse> {
    let handles: Vec<_> = body
        .spec_ids
        .iter()
        .cloned()
        .map(|spec_id| {
            let state = state.clone();
            tokio::spawn(async move { state.metadata.resolve(&spec_id).await })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (spec_id, handle) in body.spec_ids.iter().zip(handles) {
        let result = handle.await.unwrap_or_else(|e| {
            tracing::warn!(spec_id = %spec_id, error = %e, "specIDの処理が中断されました");
            IpfsMetadataResponse::failed(spec_id, format!("処理エラー: {e}"))
        });
        results.push(result);
    }

    Json(BatchIpfsMetadataResponse { results })
}
