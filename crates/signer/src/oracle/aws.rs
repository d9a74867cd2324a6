//! # AWS KMS オラクル
//!
//! `ECC_SECG_P256K1` 鍵を保持するAWS KMSを署名オラクルとして使用する。
//!
//! - `GetPublicKey`: DERエンコードされたSubjectPublicKeyInfoを返す
//! - `Sign`: `MessageType::Digest` を指定するため、KMSはダイジェストを再ハッシュしない。
//!   `ECDSA_SHA_256` はアルゴリズム名の指定に過ぎない。
//!
//! SDKレベルのリトライは無効化する。

use aws_config::retry::RetryConfig;
use aws_credential_types::provider::error::CredentialsError;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_config::BehaviorVersion;
use aws_sdk_kms::config::Region;
use aws_sdk_kms::error::DisplayErrorContext;
use aws_sdk_kms::primitives::Blob;
use aws_sdk_kms::types::{MessageType, SigningAlgorithmSpec};
use aws_sdk_kms::Client;

use kaisign_crypto::Digest;

use super::{KeyHandle, KeyOracle};
use crate::error::SignerError;

/// AWS KMSによる署名オラクル実装。
pub struct AwsKmsOracle {
    client: Client,
}

impl AwsKmsOracle {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// 指定リージョンのKMSクライアントを構築する。
    /// 認証情報はAWS SDKのデフォルトチェーン（環境変数、プロファイル、IMDS等）から取得する。
    ///
    /// 認証情報を取得できない場合は [`SignerError::Configuration`]。
    pub async fn from_region(region: &str) -> Result<Self, SignerError> {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .retry_config(RetryConfig::disabled())
            .load()
            .await;
        verify_credentials(config.credentials_provider()).await?;
        tracing::info!(region = %region, "AWS KMSクライアントを初期化");
        Ok(Self::new(Client::new(&config)))
    }
}

/// 認証情報チェーンから実際に認証情報を取得できるか確認する。
/// `load()` はチェーンを評価しないため、起動時にここで解決しておく。
async fn verify_credentials(provider: Option<SharedCredentialsProvider>) -> Result<(), SignerError> {
    let provider = provider.ok_or_else(|| {
        SignerError::Configuration("AWS認証情報プロバイダが設定されていません".into())
    })?;
    provider
        .provide_credentials()
        .await
        .map_err(|e| credentials_error(&e))?;
    Ok(())
}

fn credentials_error(e: &CredentialsError) -> SignerError {
    SignerError::Configuration(format!(
        "AWS認証情報を取得できません: {}",
        DisplayErrorContext(e)
    ))
}

#[async_trait::async_trait]
impl KeyOracle for AwsKmsOracle {
    fn backend(&self) -> &str {
        "aws-kms"
    }

    async fn get_public_key(&self, key: &KeyHandle) -> Result<Vec<u8>, SignerError> {
        let output = self
            .client
            .get_public_key()
            .key_id(key.as_str())
            .send()
            .await
            .map_err(|e| {
                SignerError::Oracle(format!("GetPublicKeyに失敗: {}", DisplayErrorContext(&e)))
            })?;

        // 空の公開鍵はキャッシュ側でInvalidKeyとして扱う
        Ok(output
            .public_key()
            .map(|blob| blob.as_ref().to_vec())
            .unwrap_or_default())
    }

    async fn sign_digest(&self, key: &KeyHandle, digest: &Digest) -> Result<Vec<u8>, SignerError> {
        let output = self
            .client
            .sign()
            .key_id(key.as_str())
            .message(Blob::new(digest.to_vec()))
            .message_type(MessageType::Digest)
            .signing_algorithm(SigningAlgorithmSpec::EcdsaSha256)
            .send()
            .await
            .map_err(|e| SignerError::Oracle(format!("Signに失敗: {}", DisplayErrorContext(&e))))?;

        output
            .signature()
            .map(|blob| blob.as_ref().to_vec())
            .ok_or_else(|| SignerError::Oracle("KMSが署名を返しませんでした".into()))
    }
}
