//! # Gateway設定・共有状態
//!
//! 環境変数からの設定読み込みとGatewayの共有状態の定義。
//!
//! | 環境変数 | 内容 | 既定値 |
//! |---------|------|--------|
//! | `BACKEND_API_KEY` | `X-API-Key` ヘッダーで要求するAPIキー | なし（保護対象は全て503） |
//! | `SEPOLIA_RPC_URL` / `ALCHEMY_RPC_URL` | 生トランザクションの中継先 | なし（503） |
//! | `ALCHEMY_RPC_URL` | KaiSignレジストリの参照先 | なし |
//! | `KAISIGN_CONTRACT_ADDRESS` | KaiSignレジストリのアドレス | [`DEFAULT_REGISTRY_ADDRESS`] |
//! | `IPFS_GATEWAYS` | IPFSゲートウェイ（カンマ区切り） | [`DEFAULT_IPFS_GATEWAYS`] |
//! | `ALLOWED_ORIGINS` | CORSの許可オリジン（カンマ区切り） | `http://localhost:3000` |
//! | `BIND_ADDR` | 待ち受けアドレス | `0.0.0.0:8000` |
//!
//! 署名オラクルの設定は `kaisign_signer::SignerConfig` を参照。

use std::collections::HashMap;

use kaisign_signer::SigningAdapter;

use crate::error::GatewayError;
use crate::ipfs::MetadataResolver;

pub const DEFAULT_REGISTRY_ADDRESS: &str = "0xB55D4406916e20dF5B965E15dd3ff85fa8B11dCf";

pub const DEFAULT_IPFS_GATEWAYS: [&str; 3] = [
    "https://ipfs.io/ipfs",
    "https://gateway.pinata.cloud/ipfs",
    "https://cloudflare-ipfs.com/ipfs",
];

const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Gatewayの設定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub api_key: Option<String>,
    /// eth_sendRawTransactionの送信先
    pub relay_rpc_url: Option<String>,
    /// レジストリへのeth_callの送信先
    pub registry_rpc_url: Option<String>,
    pub registry_address: String,
    pub ipfs_gateways: Vec<String>,
    pub allowed_origins: Vec<String>,
    pub bind_addr: String,
}

impl GatewayConfig {
    /// プロセスの環境変数から読み取る。
    pub fn from_env() -> Self {
        Self::from_vars(&std::env::vars().collect())
    }

    /// 環境変数のマップから読み取る。
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let get = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let list = |name: &str, default: &[&str]| {
            get(name)
                .map(|v| split_list(&v))
                .filter(|items| !items.is_empty())
                .unwrap_or_else(|| default.iter().map(|s| s.to_string()).collect())
        };

        let ipfs_gateways = list("IPFS_GATEWAYS", &DEFAULT_IPFS_GATEWAYS[..])
            .into_iter()
            .map(|g| g.trim_end_matches('/').to_string())
            .collect();

        Self {
            api_key: get("BACKEND_API_KEY"),
            relay_rpc_url: get("SEPOLIA_RPC_URL").or_else(|| get("ALCHEMY_RPC_URL")),
            registry_rpc_url: get("ALCHEMY_RPC_URL"),
            registry_address: get("KAISIGN_CONTRACT_ADDRESS")
                .unwrap_or_else(|| DEFAULT_REGISTRY_ADDRESS.to_string()),
            ipfs_gateways,
            allowed_origins: list("ALLOWED_ORIGINS", &[DEFAULT_ALLOWED_ORIGIN][..]),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Gatewayの共有状態。
pub struct GatewayState {
    pub config: GatewayConfig,
    /// 署名アダプタ。設定不足の場合はエラーメッセージを保持し、/kms/* は503を返す。
    pub signer: Result<SigningAdapter, String>,
    /// HTTPクライアント
    pub http_client: reqwest::Client,
    /// IPFSメタデータの解決
    pub metadata: MetadataResolver,
}

impl GatewayState {
    pub fn new(config: GatewayConfig, signer: Result<SigningAdapter, String>) -> Self {
        let http_client = reqwest::Client::new();
        let metadata = MetadataResolver::new(
            http_client.clone(),
            config.registry_rpc_url.clone(),
            config.registry_address.clone(),
            config.ipfs_gateways.clone(),
        );
        Self {
            config,
            signer,
            http_client,
            metadata,
        }
    }

    /// 署名アダプタを返す。未設定なら503。
    pub fn signer(&self) -> Result<&SigningAdapter, GatewayError> {
        self.signer
            .as_ref()
            .map_err(|e| GatewayError::ServiceUnavailable(e.clone()))
    }

    /// 署名オラクルのバックエンド名（未設定ならNone）。
    pub fn signer_backend(&self) -> Option<&str> {
        self.signer.as_ref().ok().map(|s| s.backend())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::from_vars(&HashMap::new());
        assert!(config.api_key.is_none());
        assert!(config.relay_rpc_url.is_none());
        assert!(config.registry_rpc_url.is_none());
        assert_eq!(config.registry_address, DEFAULT_REGISTRY_ADDRESS);
        assert_eq!(config.ipfs_gateways, DEFAULT_IPFS_GATEWAYS.to_vec());
        assert_eq!(config.allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.bind_addr, "0.0.0.0:8000");
    }

    /// SEPOLIA_RPC_URLが優先され、未設定ならALCHEMY_RPC_URLで中継する
    #[test]
    fn test_relay_rpc_url_precedence() {
        let both = GatewayConfig::from_vars(&vars(&[
            ("SEPOLIA_RPC_URL", "https://sepolia.example"),
            ("ALCHEMY_RPC_URL", "https://alchemy.example"),
        ]));
        assert_eq!(both.relay_rpc_url.as_deref(), Some("https://sepolia.example"));
        assert_eq!(both.registry_rpc_url.as_deref(), Some("https://alchemy.example"));

        let alchemy_only =
            GatewayConfig::from_vars(&vars(&[("ALCHEMY_RPC_URL", "https://alchemy.example")]));
        assert_eq!(
            alchemy_only.relay_rpc_url.as_deref(),
            Some("https://alchemy.example")
        );
    }

    #[test]
    fn test_lists_are_split_and_trimmed() {
        let config = GatewayConfig::from_vars(&vars(&[
            ("IPFS_GATEWAYS", " http://a/ipfs/ , ,http://b/ipfs"),
            ("ALLOWED_ORIGINS", "https://app.kaisign.io,http://localhost:3000"),
            ("BACKEND_API_KEY", "  "),
        ]));
        assert_eq!(config.ipfs_gateways, vec!["http://a/ipfs", "http://b/ipfs"]);
        assert_eq!(
            config.allowed_origins,
            vec!["https://app.kaisign.io", "http://localhost:3000"]
        );
        assert!(config.api_key.is_none());
    }
}
