//! # 署名の正規化
//!
//! 署名オラクルが返すDER形式のECDSA署名 `SEQUENCE { r INTEGER, s INTEGER }`
//! をデコードし、Ethereumが要求するlow-s形式（EIP-2）に正規化する。
//!
//! (r, s) と (r, N − s) はどちらもECDSAとして有効だが、復元される
//! Rのyパリティが反転する。リカバリIDの特定は必ず正規化後の署名で行うこと。

use k256::ecdsa::Signature;

use crate::curve;
use crate::CryptoError;

/// low-s正規化済みの署名。不変条件: `s <= N/2`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalSignature {
    /// 32バイトのビッグエンディアン
    pub r: [u8; 32],
    /// 32バイトのビッグエンディアン（`<= N/2`）
    pub s: [u8; 32],
    /// オラクルの署名が high-s で、`N - s` に置き換えた場合に true
    pub s_flipped: bool,
}

/// DER署名をデコードし、low-s形式に正規化する。
///
/// DERとして不正な場合、INTEGERが2つでない場合、r または s が
/// [1, N-1] の範囲外の場合は [`CryptoError::MalformedSignature`]。
pub fn normalize(der: &[u8]) -> Result<CanonicalSignature, CryptoError> {
    let signature =
        Signature::from_der(der).map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
    let (r_bytes, s_bytes) = signature.split_bytes();

    let mut r = [0u8; 32];
    r.copy_from_slice(&r_bytes);
    let mut s = [0u8; 32];
    s.copy_from_slice(&s_bytes);

    normalize_scalars(r, s)
}

/// 32バイトの (r, s) にlow-s正規化を適用する。
pub fn normalize_scalars(r: [u8; 32], s: [u8; 32]) -> Result<CanonicalSignature, CryptoError> {
    if curve::scalar_from_bytes(&r).is_none() {
        return Err(CryptoError::MalformedSignature("rが範囲外です".into()));
    }
    if !curve::is_high_s(&s) {
        if curve::scalar_from_bytes(&s).is_none() {
            return Err(CryptoError::MalformedSignature("sが範囲外です".into()));
        }
        return Ok(CanonicalSignature {
            r,
            s,
            s_flipped: false,
        });
    }

    let low_s = curve::negate_scalar(&s)
        .ok_or_else(|| CryptoError::MalformedSignature("sが範囲外です".into()))?;
    Ok(CanonicalSignature {
        r,
        s: low_s,
        s_flipped: true,
    })
}
