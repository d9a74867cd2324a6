//! # 署名アダプタ
//!
//! オラクルのDER署名をEthereum互換の `(r, s, v, yParity)` に変換する。
//! 正規化（low-s）は必ずリカバリIDの特定より先に行う。


use std::sync::Arc;

use kaisign_crypto::{
    normalize, resolve_recovery_id, Address, Digest, PublicKey, RecoveryResolution,
};

use crate::cache::PublicKeyCache;
use crate::error::SignerError;
use crate::oracle::{KeyHandle, KeyOracle};

/// どのリカバリID候補も公開鍵に一致しなかった場合の扱い。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecoveryFallback {
    /// 公開鍵のyパリティをリカバリIDとして採用し、warnログを出す
    #[default]
    YParity,
    /// [`SignerError::RecoveryFailed`] を返す
    Reject,
}

/// Ethereum互換の署名。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthereumSignature {
    pub r: [u8; 32],
    /// low-s正規化済み
    pub s: [u8; 32],
    /// 27 + yParity
    pub v: u8,
    pub y_parity: u8,
    /// リカバリIDが公開鍵との一致で確認されたか、フォールバックによる推定か
    pub recovery: RecoveryResolution,
}

impl EthereumSignature {
    fn new(r: [u8; 32], s: [u8; 32], recovery: RecoveryResolution) -> Self {
        let recovery_id = recovery.id();
        Self {
            r,
            s,
            v: recovery_id.v(),
            y_parity: recovery_id.to_byte(),
            recovery,
        }
    }

    /// リカバリIDが公開鍵の復元で検証済みなら true。
    /// false の場合、`y_parity` は公開鍵のyパリティによる推定値。
    pub fn is_recovery_verified(&self) -> bool {
        self.recovery.is_matched()
    }

    pub fn r_hex(&self) -> String {
        format!("0x{}", hex::encode(self.r))
    }

    pub fn s_hex(&self) -> String {
        format!("0x{}", hex::encode(self.s))
    }

    /// `r ‖ s ‖ v` の65バイト表現。
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }
}

/// `0x` + 64桁の16進数（`0x`は任意）を32バイトのダイジェストとしてパースする。
pub fn parse_digest(digest_hex: &str) -> Result<Digest, SignerError> {
    let trimmed = digest_hex.trim();
    let hex_str = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = hex::decode(hex_str)
        .map_err(|e| SignerError::InvalidDigest(format!("16進数として解釈できません: {e}")))?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        SignerError::InvalidDigest(format!("32バイトである必要があります（{len}バイト）"))
    })
}

/// リモート署名オラクルをEthereum署名器として扱うアダプタ。
///
/// 1つのKeyHandleに束縛され、`Arc` で共有して使う。
pub struct SigningAdapter {
    oracle: Arc<dyn KeyOracle>,
    cache: PublicKeyCache,
    fallback: RecoveryFallback,
}

impl SigningAdapter {
    pub fn new(key: KeyHandle, oracle: Arc<dyn KeyOracle>) -> Self {
        let cache = PublicKeyCache::new(key, oracle.clone());
        Self {
            oracle,
            cache,
            fallback: RecoveryFallback::default(),
        }
    }

    pub fn with_recovery_fallback(mut self, fallback: RecoveryFallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn backend(&self) -> &str {
        self.oracle.backend()
    }

    pub fn key_handle(&self) -> &KeyHandle {
        self.cache.key_handle()
    }

    pub async fn address(&self) -> Result<Address, SignerError> {
        self.cache.address().await
    }

    pub async fn public_key(&self) -> Result<PublicKey, SignerError> {
        self.cache.public_key().await
    }

    /// 16進数のダイジェストに署名する。
    ///
    /// ダイジェストが不正な場合はオラクルを呼ばずに [`SignerError::InvalidDigest`]。
    pub async fn sign_digest(&self, digest_hex: &str) -> Result<EthereumSignature, SignerError> {
        let digest = parse_digest(digest_hex)?;
        self.sign_prehashed(&digest).await
    }

    /// 32バイトのダイジェストに署名する。再ハッシュは行わない。
    pub async fn sign_prehashed(&self, digest: &Digest) -> Result<EthereumSignature, SignerError> {
        let der = self.oracle.sign_digest(self.cache.key_handle(), digest).await?;
        let signature = normalize(&der)?;
        if signature.s_flipped {
            tracing::debug!(key_id = %self.cache.key_handle(), "high-s署名をlow-sに正規化");
        }

        let public_key = self.cache.public_key().await?;
        let recovery = resolve_recovery_id(digest, &signature, &public_key);
        if let RecoveryResolution::Fallback(id) = recovery {
            match self.fallback {
                RecoveryFallback::YParity => {
                    tracing::warn!(
                        key_id = %self.cache.key_handle(),
                        digest = %hex::encode(digest),
                        y_parity = id.to_byte(),
                        "公開鍵に一致するリカバリIDがないため、公開鍵のyパリティで代用"
                    );
                }
                RecoveryFallback::Reject => return Err(SignerError::RecoveryFailed),
            }
        }

        Ok(EthereumSignature::new(signature.r, signature.s, recovery))
    }
}
