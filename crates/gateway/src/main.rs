//! # KaiSign Backend Gateway
//!
//! リモート署名オラクル（AWS KMS）をEthereum署名器として公開するHTTPサーバー。
//!
//! ## API エンドポイント
//! - `GET /kms/address` — 署名鍵のEthereumアドレス
//! - `POST /kms/signDigest` — ダイジェストへの署名（low-s、v/yParity付き）
//! - `POST /eth/sendRawTransaction` — 署名済みトランザクションのRPC中継
//! - `POST /getIPFSMetadata` — specIDからERC-7730メタデータのデプロイ情報を取得
//! - `POST /getBatchIPFSMetadata` — 上記の複数specID版
//! - `GET /health` — ヘルスチェック（認証不要）
//!
//! `/health` 以外は `X-API-Key` ヘッダーによるAPIキー認証が必要。

mod auth;
mod config;
mod endpoints;
mod error;
mod ipfs;
mod rpc;

use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use kaisign_signer::SignerConfig;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{GatewayConfig, GatewayState};

/// CORSレイヤーを構築する。`*` が含まれる場合は全オリジンを許可する（認証情報なし）。
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(auth::API_KEY_HEADER),
        ]);

    if allowed_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    cors.allow_origin(origins).allow_credentials(true)
}

/// axumルーターを構築する。
fn router(state: Arc<GatewayState>) -> axum::Router {
    let guarded = axum::Router::new()
        .route("/kms/address", get(endpoints::handle_kms_address))
        .route("/kms/signDigest", post(endpoints::handle_kms_sign_digest))
        .route(
            "/eth/sendRawTransaction",
            post(endpoints::handle_send_raw_transaction),
        )
        .route("/getIPFSMetadata", post(endpoints::handle_ipfs_metadata))
        .route(
            "/api/py/getIPFSMetadata",
            post(endpoints::handle_ipfs_metadata),
        )
        .route(
            "/getBatchIPFSMetadata",
            post(endpoints::handle_batch_ipfs_metadata),
        )
        .route(
            "/api/py/getBatchIPFSMetadata",
            post(endpoints::handle_batch_ipfs_metadata),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    axum::Router::new()
        .route("/health", get(endpoints::handle_health))
        .route("/", get(endpoints::handle_health))
        .route("/api/py", get(endpoints::handle_health))
        .merge(guarded)
        .layer(cors_layer(&state.config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// エントリポイント
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = GatewayConfig::from_env();
    if config.api_key.is_none() {
        tracing::warn!("BACKEND_API_KEYが未設定です。保護対象のエンドポイントは全て503を返します");
    }

    // 署名オラクルの設定不足では起動を止めず、/kms/* が503を返す
    let signer = match SignerConfig::from_env() {
        Ok(signer_config) => signer_config.build().await,
        Err(e) => Err(e),
    };
    let signer = signer.map_err(|e| {
        tracing::warn!(error = %e, "署名オラクルを初期化できません。/kms/* は503を返します");
        e.to_string()
    });
    if let Ok(adapter) = &signer {
        tracing::info!(
            backend = adapter.backend(),
            key_id = %adapter.key_handle(),
            "署名オラクルを設定"
        );
    }

    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(GatewayState::new(config, signer));
    let app = router(state);

    tracing::info!("Gatewayを {} で起動します", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// テスト
// ---------------------------------------------------------------------------
