//! # KaiSign Backend 共有型定義
//!
//! HTTP境界を通過するリクエスト・レスポンスをRust構造体として提供する。
//!
//! ## エンコーディング規則
//! - 16進数: ダイジェスト、署名成分、生トランザクション（`0x`プレフィックス付き）
//! - EIP-55: Ethereumアドレス（チェックサム付き16進数）

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /kms
// ---------------------------------------------------------------------------

/// GET /kms/address レスポンス。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressResponse {
    /// EIP-55チェックサム付きEthereumアドレス
    pub address: String,
}

/// POST /kms/signDigest リクエスト。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignDigestRequest {
    /// 署名対象の32バイトダイジェスト（`0x` + 64桁の16進数）
    pub digest: String,
}

/// POST /kms/signDigest レスポンス。
///
/// `v` はレガシー形式（27/28）、`yParity` はEIP-2718 typed transaction形式（0/1）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignDigestResponse {
    /// `0x` + 64桁の16進数
    pub r: String,
    /// `0x` + 64桁の16進数（low-s正規化済み）
    pub s: String,
    /// 27 + yParity
    pub v: u8,
    /// リカバリID（0 or 1）
    #[serde(rename = "yParity")]
    pub y_parity: u8,
}

// ---------------------------------------------------------------------------
// /eth
// ---------------------------------------------------------------------------

/// POST /eth/sendRawTransaction リクエスト。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTransactionRequest {
    /// 署名済みトランザクション（`0x`プレフィックス付き16進数）
    pub raw: String,
}

/// JSON-RPC 2.0 リクエスト。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: serde_json::Value,
}

impl JsonRpcRequest {
    /// `id = 1` のJSON-RPC 2.0 リクエストを構築する。
    pub fn new(method: &str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: 1,
            method: method.to_string(),
            params,
        }
    }
}

/// JSON-RPC 2.0 レスポンス。`result` と `error` のどちらか一方が入る。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// IPFSメタデータ
// ---------------------------------------------------------------------------

/// POST /getIPFSMetadata リクエスト。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpfsMetadataRequest {
    /// KaiSignレジストリのspecID（`0x` + 64桁の16進数）
    pub spec_id: String,
}

/// POST /getIPFSMetadata レスポンス。
///
/// 取得に失敗した場合も `error` を埋めて200で返す。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpfsMetadataResponse {
    pub spec_id: String,
    #[serde(default)]
    pub ipfs_hash: Option<String>,
    /// ERC-7730メタデータに記載されたコントラクトアドレス
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl IpfsMetadataResponse {
    /// エラーのみを含むレスポンスを構築する。
    pub fn failed(spec_id: &str, error: impl Into<String>) -> Self {
        Self {
            spec_id: spec_id.to_string(),
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// POST /getBatchIPFSMetadata リクエスト。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchIpfsMetadataRequest {
    pub spec_ids: Vec<String>,
}

/// POST /getBatchIPFSMetadata レスポンス。リクエストと同じ順序で返す。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchIpfsMetadataResponse {
    pub results: Vec<IpfsMetadataResponse>,
}

// ---------------------------------------------------------------------------
// ヘルスチェック
// ---------------------------------------------------------------------------

/// GET /health レスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// 署名オラクルのバックエンド名（未設定ならnull）
    pub signer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// yParityがcamelCaseでシリアライズされることを確認
    #[test]
    fn test_sign_digest_response_field_names() {
        let response = SignDigestResponse {
            r: format!("0x{}", "11".repeat(32)),
            s: format!("0x{}", "22".repeat(32)),
            v: 28,
            y_parity: 1,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["yParity"], 1);
        assert_eq!(value["v"], 28);
        assert!(value.get("y_parity").is_none());
    }

    /// resultのみのJSON-RPCレスポンスがパースできることを確認
    #[test]
    fn test_json_rpc_response_result_only() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":"0xabc"}"#;
        let response: JsonRpcResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.result.unwrap(), "0xabc");
        assert!(response.error.is_none());
    }

    /// 欠けたフィールドがNoneとして扱われることを確認
    #[test]
    fn test_ipfs_metadata_response_defaults() {
        let response: IpfsMetadataResponse =
            serde_json::from_str(r#"{"spec_id":"0x01"}"#).unwrap();
        assert_eq!(response.spec_id, "0x01");
        assert!(response.ipfs_hash.is_none());
        assert!(response.error.is_none());

        let failed = IpfsMetadataResponse::failed("0x02", "boom");
        assert_eq!(failed.error.as_deref(), Some("boom"));
        assert!(failed.chain_id.is_none());
    }
}
