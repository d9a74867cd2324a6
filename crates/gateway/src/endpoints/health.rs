//! # GET /health
//!
//! 認証不要のヘルスチェック。`/` と `/api/py` も同じ内容を返す。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use kaisign_types::HealthResponse;

use crate::config::GatewayState;

pub async fn handle_health(State(state): State<Arc<GatewayState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        signer: state.signer_backend().map(str::to_string),
    })
}
