//! # 署名アダプタの設定
//!
//! 環境変数からオラクルのバックエンドとキーIDを読み取り、[`SigningAdapter`] を構築する。
//!
//! | 環境変数 | 内容 |
//! |---------|------|
//! | `MOCK_MODE` | `true` ならモックオラクル |
//! | `MOCK_SIGNER_KEY` | モックオラクルの秘密鍵（16進数、未設定ならランダム） |
//! | `AWS_KMS_KEY_ID` | KMSのキーID / ARN / エイリアス |
//! | `AWS_REGION` / `AWS_DEFAULT_REGION` | KMSのリージョン |
//! | `KMS_RECOVERY_STRICT` | `true` ならリカバリIDのフォールバックを行わない |

use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::{RecoveryFallback, SigningAdapter};
use crate::error::SignerError;
use crate::oracle::mock::MockOracle;
use crate::oracle::{KeyHandle, KeyOracle};

/// オラクルのバックエンド選択。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleBackend {
    /// メモリ内鍵（秘密鍵の16進数、Noneならランダム）
    Mock { private_key: Option<String> },
    /// AWS KMS
    AwsKms { key_id: String, region: String },
}

/// 署名アダプタの設定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerConfig {
    pub backend: OracleBackend,
    pub recovery_fallback: RecoveryFallback,
}

impl SignerConfig {
    /// プロセスの環境変数から読み取る。
    pub fn from_env() -> Result<Self, SignerError> {
        Self::from_vars(&std::env::vars().collect())
    }

    /// 環境変数のマップから読み取る。
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, SignerError> {
        let get = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let flag = |name: &str| get(name).is_some_and(|v| v.eq_ignore_ascii_case("true"));

        let recovery_fallback = if flag("KMS_RECOVERY_STRICT") {
            RecoveryFallback::Reject
        } else {
            RecoveryFallback::YParity
        };

        if flag("MOCK_MODE") {
            return Ok(Self {
                backend: OracleBackend::Mock {
                    private_key: get("MOCK_SIGNER_KEY"),
                },
                recovery_fallback,
            });
        }

        let key_id = get("AWS_KMS_KEY_ID")
            .ok_or_else(|| SignerError::Configuration("AWS_KMS_KEY_IDが未設定です".into()))?;
        let region = get("AWS_REGION")
            .or_else(|| get("AWS_DEFAULT_REGION"))
            .ok_or_else(|| {
                SignerError::Configuration("AWS_REGION / AWS_DEFAULT_REGIONが未設定です".into())
            })?;

        Ok(Self {
            backend: OracleBackend::AwsKms { key_id, region },
            recovery_fallback,
        })
    }

    /// 設定に従ってオラクルを初期化し、アダプタを構築する。
    pub async fn build(&self) -> Result<SigningAdapter, SignerError> {
        let (key, oracle): (KeyHandle, Arc<dyn KeyOracle>) = match &self.backend {
            OracleBackend::Mock { private_key } => {
                let oracle = match private_key {
                    Some(hex) => MockOracle::from_hex(hex)?,
                    None => MockOracle::random(),
                };
                tracing::info!("MockOracleで起動します");
                (KeyHandle::new("mock"), Arc::new(oracle))
            }
            OracleBackend::AwsKms { key_id, region } => {
                (KeyHandle::new(key_id.clone()), aws_oracle(region).await?)
            }
        };

        Ok(SigningAdapter::new(key, oracle).with_recovery_fallback(self.recovery_fallback))
    }
}

#[cfg(feature = "vendor-aws")]
async fn aws_oracle(region: &str) -> Result<Arc<dyn KeyOracle>, SignerError> {
    tracing::info!(region = %region, "AwsKmsOracleで起動します");
    Ok(Arc::new(
        crate::oracle::aws::AwsKmsOracle::from_region(region).await?,
    ))
}

#[cfg(not(feature = "vendor-aws"))]
async fn aws_oracle(_region: &str) -> Result<Arc<dyn KeyOracle>, SignerError> {
    Err(SignerError::Configuration(
        "AWS KMSを使用するにはfeature `vendor-aws` を有効にしてください".into(),
    ))
}
