//! # ローカル開発用モックオラクル
//!
//! AWS KMSが利用できない開発環境・テストで使用するモック実装。
//! メモリ内のsecp256k1鍵でRFC 6979の決定的署名を行い、KMSと同じく
//! DERエンコードされた署名とSubjectPublicKeyInfoを返す。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use k256::ecdsa::{Signature, SigningKey};
use k256::pkcs8::EncodePublicKey;

use kaisign_crypto::{curve, Digest};

use super::{KeyHandle, KeyOracle};
use crate::error::SignerError;

/// モック署名オラクル。
pub struct MockOracle {
    signing_key: SigningKey,
    /// trueの場合、署名のsを N - s に置き換えて返す（KMSのhigh-s出力の再現）
    force_high_s: bool,
    /// 公開鍵取得時に挟む遅延（同時初回アクセスの再現用）
    fetch_delay: Option<Duration>,
    public_key_fetches: AtomicUsize,
    sign_requests: AtomicUsize,
}

impl MockOracle {
    pub fn new(signing_key: SigningKey) -> Self {
        Self {
            signing_key,
            force_high_s: false,
            fetch_delay: None,
            public_key_fetches: AtomicUsize::new(0),
            sign_requests: AtomicUsize::new(0),
        }
    }

    /// ランダムな鍵で初期化する。
    pub fn random() -> Self {
        Self::new(SigningKey::random(&mut rand::rngs::OsRng))
    }

    /// 16進数の秘密鍵（`0x`プレフィックス任意）から初期化する。
    pub fn from_hex(private_key: &str) -> Result<Self, SignerError> {
        let trimmed = private_key.trim();
        let hex_str = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(hex_str).map_err(|e| {
            SignerError::Configuration(format!("MOCK_SIGNER_KEYが16進数ではありません: {e}"))
        })?;
        let signing_key = SigningKey::from_slice(&bytes)
            .map_err(|_| SignerError::Configuration("MOCK_SIGNER_KEYが不正な秘密鍵です".into()))?;
        Ok(Self::new(signing_key))
    }

    pub fn with_high_s(mut self, force_high_s: bool) -> Self {
        self.force_high_s = force_high_s;
        self
    }

    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    /// これまでに公開鍵が取得された回数。
    pub fn public_key_fetches(&self) -> usize {
        self.public_key_fetches.load(Ordering::SeqCst)
    }

    /// これまでに受け付けた署名リクエストの回数。
    pub fn sign_requests(&self) -> usize {
        self.sign_requests.load(Ordering::SeqCst)
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

#[async_trait::async_trait]
impl KeyOracle for MockOracle {
    fn backend(&self) -> &str {
        "mock"
    }

    async fn get_public_key(&self, _key: &KeyHandle) -> Result<Vec<u8>, SignerError> {
        self.public_key_fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }

        let public_key = k256::PublicKey::from(self.signing_key.verifying_key());
        let der = public_key
            .to_public_key_der()
            .map_err(|e| SignerError::Oracle(format!("公開鍵のエンコードに失敗: {e}")))?;
        Ok(der.as_bytes().to_vec())
    }

    async fn sign_digest(&self, _key: &KeyHandle, digest: &Digest) -> Result<Vec<u8>, SignerError> {
        self.sign_requests.fetch_add(1, Ordering::SeqCst);

        let (signature, _) = self
            .signing_key
            .sign_prehash_recoverable(digest)
            .map_err(|e| SignerError::Oracle(format!("署名に失敗: {e}")))?;

        let signature = if self.force_high_s {
            let (r, s) = signature.split_bytes();
            let mut s_bytes = [0u8; 32];
            s_bytes.copy_from_slice(&s);
            let high_s = curve::negate_scalar(&s_bytes)
                .ok_or_else(|| SignerError::Oracle("sが範囲外です".into()))?;

            let mut rs = [0u8; 64];
            rs[..32].copy_from_slice(&r);
            rs[32..].copy_from_slice(&high_s);
            Signature::from_slice(&rs).map_err(|e| SignerError::Oracle(e.to_string()))?
        } else {
            signature
        };

        Ok(signature.to_der().as_bytes().to_vec())
    }
}
