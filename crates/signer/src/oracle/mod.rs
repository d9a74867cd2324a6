//! # 署名オラクルの抽象化
//!
//! secp256k1鍵を保持するリモート署名サービスを抽象化するトレイト。
//! オラクルは不透明なリクエスト/レスポンス型のサービスとして扱い、
//! 鍵の管理そのものは行わない。
//!
//! 現在の実装:
//! - `aws` — AWS KMS（`GetPublicKey` / `Sign`）
//! - `mock` — ローカル開発・テスト用（メモリ内鍵）

#[cfg(feature = "vendor-aws")]
pub mod aws;
pub mod mock;

use std::fmt;

use kaisign_crypto::Digest;

use crate::error::SignerError;

/// オラクル上の鍵の識別子（AWS KMSならキーID、ARN、エイリアス）。
/// アダプタの生存期間中は変更されない。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyHandle(String);

impl KeyHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 署名オラクルのトレイト。
///
/// 実装はリトライを行わないこと（署名リクエストの重複を避ける）。
#[async_trait::async_trait]
pub trait KeyOracle: Send + Sync {
    /// バックエンド名（ログ・ヘルスチェック用）。
    fn backend(&self) -> &str;

    /// DERエンコードされたSubjectPublicKeyInfoを取得する。
    async fn get_public_key(&self, key: &KeyHandle) -> Result<Vec<u8>, SignerError>;

    /// ハッシュ済みダイジェストに署名し、DERエンコードされたECDSA署名を返す。
    ///
    /// オラクル側で再ハッシュしてはならない。
    async fn sign_digest(&self, key: &KeyHandle, digest: &Digest) -> Result<Vec<u8>, SignerError>;
}
