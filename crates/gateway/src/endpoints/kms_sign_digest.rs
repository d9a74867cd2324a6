//! # POST /kms/signDigest
//!
//! 32バイトのダイジェストに署名オラクルで署名し、Ethereum互換の
//! `(r, s, v, yParity)` を返す。sは常にlow-s。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use kaisign_types::{SignDigestRequest, SignDigestResponse};

use crate::config::GatewayState;
use crate::error::GatewayError;

/// POST /kms/signDigest — ダイジェストへの署名。
///
/// ダイジェストが不正なら400（オラクルは呼ばない）、オラクルの失敗は502。
pub async fn handle_kms_sign_digest(
    State(state): State<Arc<GatewayState>>,
    Json(body): Json<SignDigestRequest>,
) -> Result<Json<SignDigestResponse>, GatewayError> {
    let signer = state.signer()?;
    let signature = signer.sign_digest(&body.digest).await?;

    tracing::info!(
        key_id = %signer.key_handle(),
        y_parity = signature.y_parity,
        recovery_verified = signature.is_recovery_verified(),
        "ダイジェストに署名"
    );

    Ok(Json(SignDigestResponse {
        r: signature.r_hex(),
        s: signature.s_hex(),
        v: signature.v,
        y_parity: signature.y_parity,
    }))
}
