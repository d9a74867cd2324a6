//! # GET /kms/address
//!
//! 署名オラクルの公開鍵から導出したEthereumアドレスを返す。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use kaisign_types::AddressResponse;

use crate::config::GatewayState;
use crate::error::GatewayError;

/// GET /kms/address — EIP-55チェックサム付きアドレス。
///
/// 公開鍵は初回のみオラクルから取得し、以降はキャッシュを使う。
pub async fn handle_kms_address(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<AddressResponse>, GatewayError> {
    let signer = state.signer()?;
    let address = signer.address().await?;
    Ok(Json(AddressResponse {
        address: address.to_checksum(None),
    }))
}
