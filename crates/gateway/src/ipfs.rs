//! # IPFSメタデータの解決
//!
//! specID からERC-7730メタデータのデプロイ情報を引く。
//!
//! ## 処理フロー
//! 1. KaiSignレジストリの `getIPFSByHash(bytes32)` を `eth_call` で呼び、IPFSハッシュを得る
//! 2. 設定済みのIPFSゲートウェイを順に試し、最初に取得できたJSONを採用する
//! 3. `context.contract.deployments[0]`（旧形式は `context.eip712.deployments[0]`）から
//!    コントラクトアドレスとチェーンIDを取り出す
//!
//! 失敗はHTTPエラーにせず、レスポンスの `error` に格納する。

use std::time::Duration;

use kaisign_types::IpfsMetadataResponse;

use crate::rpc;

/// `getIPFSByHash(bytes32)` の関数セレクタ
pub const GET_IPFS_BY_HASH_SELECTOR: &str = "0xe90ffed8";

const REGISTRY_TIMEOUT: Duration = Duration::from_secs(30);
const GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

/// specIDが `0x` + 64桁の16進数か検証する。
pub fn validate_spec_id(spec_id: &str) -> Result<(), String> {
    let valid = spec_id.len() == 66
        && spec_id.starts_with("0x")
        && spec_id[2..].bytes().all(|b| b.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err("specIDの形式が不正です（0x + 64桁の16進数）".to_string())
    }
}

/// レジストリ呼び出しのcalldata。呼び出し前に [`validate_spec_id`] を通すこと。
pub fn registry_calldata(spec_id: &str) -> String {
    format!("{GET_IPFS_BY_HASH_SELECTOR}{}", &spec_id[2..])
}

/// ABIエンコードされた動的 `string` の戻り値をデコードする。
///
/// 先頭32バイト（オフセット）を読み飛ばし、次の32バイトを長さとして読む。
/// 空・長さ0・UTF-8として不正な場合は `None`。
pub fn decode_abi_string(result: &str) -> Option<String> {
    let data = result.strip_prefix("0x").unwrap_or(result);
    if data.len() < 128 {
        return None;
    }

    let length_hex = data.get(64..128)?.trim_start_matches('0');
    let length = if length_hex.is_empty() {
        0
    } else {
        usize::from_str_radix(length_hex, 16).ok()?
    };
    if length == 0 {
        return None;
    }

    let end = 128usize.saturating_add(length.saturating_mul(2)).min(data.len());
    let bytes = hex::decode(data.get(128..end)?).ok()?;
    let value = String::from_utf8(bytes).ok()?;
    (!value.is_empty()).then_some(value)
}

/// メタデータJSONからデプロイ情報（コントラクトアドレス、チェーンID）を取り出す。
pub fn extract_deployment(metadata: &serde_json::Value) -> (Option<String>, Option<u64>) {
    for section in ["contract", "eip712"] {
        let deployment = metadata
            .pointer(&format!("/context/{section}/deployments/0"))
            .filter(|d| d.is_object());
        if let Some(deployment) = deployment {
            let address = deployment
                .get("address")
                .and_then(|a| a.as_str())
                .map(str::to_string);
            if address.is_some() {
                let chain_id = deployment.get("chainId").and_then(|c| c.as_u64());
                return (address, chain_id);
            }
        }
    }
    (None, None)
}

/// specIDからIPFSメタデータを解決する。
pub struct MetadataResolver {
    client: reqwest::Client,
    rpc_url: Option<String>,
    registry_address: String,
    gateways: Vec<String>,
}

impl MetadataResolver {
    pub fn new(
        client: reqwest::Client,
        rpc_url: Option<String>,
        registry_address: String,
        gateways: Vec<String>,
    ) -> Self {
        Self {
            client,
            rpc_url,
            registry_address,
            gateways,
        }
    }

    /// レジストリからIPFSハッシュを取得する。未登録なら `Ok(None)`。
    pub async fn fetch_ipfs_hash(&self, spec_id: &str) -> Result<Option<String>, String> {
        let rpc_url = self
            .rpc_url
            .as_deref()
            .ok_or_else(|| "ALCHEMY_RPC_URLが未設定です".to_string())?;
        let result = rpc::eth_call(
            &self.client,
            rpc_url,
            &self.registry_address,
            &registry_calldata(spec_id),
            REGISTRY_TIMEOUT,
        )
        .await
        .map_err(|e| e.to_string())?;
        Ok(decode_abi_string(&result))
    }

    /// ゲートウェイを順に試し、メタデータのデプロイ情報を返す。
    pub async fn fetch_metadata(
        &self,
        ipfs_hash: &str,
    ) -> Result<(Option<String>, Option<u64>), String> {
        for gateway in &self.gateways {
            let url = format!("{gateway}/{ipfs_hash}");
            match self.fetch_json(&url).await {
                Ok(metadata) => return Ok(extract_deployment(&metadata)),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "IPFSゲートウェイからの取得に失敗");
                }
            }
        }
        Err("全てのIPFSゲートウェイからの取得に失敗しました".to_string())
    }

    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, reqwest::Error> {
        self.client
            .get(url)
            .timeout(GATEWAY_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    /// 1つのspecIDを解決する。失敗は `error` に格納して返す。
    pub async fn resolve(&self, spec_id: &str) -> IpfsMetadataResponse {
        if let Err(e) = validate_spec_id(spec_id) {
            return IpfsMetadataResponse::failed(spec_id, e);
        }

        let ipfs_hash = match self.fetch_ipfs_hash(spec_id).await {
            Ok(Some(hash)) => hash,
            Ok(None) => {
                return IpfsMetadataResponse::failed(
                    spec_id,
                    "このspecIDに対応するIPFSハッシュがありません",
                )
            }
            Err(e) => {
                tracing::warn!(spec_id = %spec_id, error = %e, "レジストリの参照に失敗");
                return IpfsMetadataResponse::failed(
                    spec_id,
                    format!("このspecIDに対応するIPFSハッシュを取得できません: {e}"),
                );
            }
        };

        match self.fetch_metadata(&ipfs_hash).await {
            Ok((contract_address, chain_id)) => IpfsMetadataResponse {
                spec_id: spec_id.to_string(),
                ipfs_hash: Some(ipfs_hash),
                contract_address,
                chain_id,
                error: None,
            },
            Err(e) => IpfsMetadataResponse {
                spec_id: spec_id.to_string(),
                ipfs_hash: Some(ipfs_hash),
                error: Some(format!("IPFSメタデータの取得に失敗: {e}")),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::test_helpers::abi_string;

    #[test]
    fn test_validate_spec_id() {
        assert!(validate_spec_id(&format!("0x{}", "ab".repeat(32))).is_ok());
        assert!(validate_spec_id(&"ab".repeat(33)).is_err());
        assert!(validate_spec_id(&format!("0x{}", "ab".repeat(31))).is_err());
        assert!(validate_spec_id(&format!("0x{}", "zz".repeat(32))).is_err());
        assert!(validate_spec_id("").is_err());
    }

    #[test]
    fn test_registry_calldata() {
        let spec_id = format!("0x{}", "01".repeat(32));
        assert_eq!(
            registry_calldata(&spec_id),
            format!("0xe90ffed8{}", "01".repeat(32))
        );
    }

    #[test]
    fn test_decode_abi_string() {
        let hash = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";
        assert_eq!(decode_abi_string(&abi_string(hash)).as_deref(), Some(hash));

        assert_eq!(decode_abi_string("0x"), None);
        assert_eq!(decode_abi_string(&abi_string("")), None);
        // 長さフィールドより短いデータは残りを使う
        let truncated = &abi_string("bafy")[..2 + 128 + 4];
        assert_eq!(decode_abi_string(truncated).as_deref(), Some("ba"));
        // UTF-8として不正
        let invalid = format!("0x{:064x}{:064x}{}", 32, 2, "fffe");
        assert_eq!(decode_abi_string(&invalid), None);
    }

    #[test]
    fn test_extract_deployment() {
        let current = serde_json::json!({
            "context": {"contract": {"deployments": [
                {"chainId": 11155111, "address": "0x1111111111111111111111111111111111111111"},
                {"chainId": 1, "address": "0x2222222222222222222222222222222222222222"}
            ]}}
        });
        assert_eq!(
            extract_deployment(&current),
            (
                Some("0x1111111111111111111111111111111111111111".to_string()),
                Some(11155111)
            )
        );

        let legacy = serde_json::json!({
            "context": {"eip712": {"deployments": [
                {"chainId": 1, "address": "0x3333333333333333333333333333333333333333"}
            ]}}
        });
        assert_eq!(
            extract_deployment(&legacy),
            (
                Some("0x3333333333333333333333333333333333333333".to_string()),
                Some(1)
            )
        );

        let empty = serde_json::json!({"context": {"contract": {"deployments": []}}});
        assert_eq!(extract_deployment(&empty), (None, None));
    }
}
