//! # エンドポイントテスト用共通ヘルパー
//!
//! モックサーバー（RPC、IPFSゲートウェイ）と、テスト用Gatewayの起動。

use std::collections::HashMap;
use std::sync::Arc;

use kaisign_signer::oracle::mock::MockOracle;
use kaisign_signer::{KeyHandle, SigningAdapter};

use crate::config::{GatewayConfig, GatewayState};

pub const TEST_API_KEY: &str = "test-api-key";

pub const FIXTURE_PRIVATE_KEY: &str =
    "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
pub const FIXTURE_ADDRESS: &str = "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23";

/// テスト用モックHTTPサーバーを起動し、ベースURL（`http://127.0.0.1:<port>`）を返す。
pub async fn start_mock_server(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    format!("http://127.0.0.1:{port}")
}

/// APIキーのみ設定した環境変数からGateway設定を構築する。
pub fn test_config(pairs: &[(&str, &str)]) -> GatewayConfig {
    let mut vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    vars.entry("BACKEND_API_KEY".to_string())
        .or_insert_with(|| TEST_API_KEY.to_string());
    GatewayConfig::from_vars(&vars)
}

/// フィクスチャ鍵のモックオラクルを使う署名アダプタ。
pub fn fixture_signer() -> SigningAdapter {
    let oracle = MockOracle::from_hex(FIXTURE_PRIVATE_KEY).unwrap();
    SigningAdapter::new(KeyHandle::new("mock"), Arc::new(oracle))
}

/// ルーター全体をテスト用に起動し、ベースURLを返す。
pub async fn spawn_gateway(
    config: GatewayConfig,
    signer: Result<SigningAdapter, String>,
) -> String {
    let state = Arc::new(GatewayState::new(config, signer));
    start_mock_server(crate::router(state)).await
}

/// `string` 型の戻り値をABIエンコードする（オフセット、長さ、32バイト境界までパディングしたデータ）。
pub fn abi_string(value: &str) -> String {
    let mut out = String::from("0x");
    out.push_str(&format!("{:064x}", 32));
    out.push_str(&format!("{:064x}", value.len()));
    let mut data = hex::encode(value);
    while data.len() % 64 != 0 {
        data.push('0');
    }
    out.push_str(&data);
    out
}
