//! # 公開鍵とEthereumアドレス
//!
//! 署名オラクルの公開鍵（DERエンコードされたSubjectPublicKeyInfo）を
//! パースし、Ethereumアドレスを導出する。
//!
//! アドレス = keccak256(x ‖ y) の末尾20バイト（EIP-55チェックサム付きで表示）。

use alloy_primitives::{keccak256, Address};
use k256::pkcs8::DecodePublicKey;
use k256::AffinePoint;

use crate::curve;
use crate::CryptoError;

/// secp256k1公開鍵のアフィン座標。曲線上の点であることは構築時に検証済み。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    x: [u8; 32],
    y: [u8; 32],
}

impl PublicKey {
    /// DERエンコードされたSubjectPublicKeyInfoからパースする。
    ///
    /// アルゴリズムOIDが `id-ecPublicKey`、曲線OIDが `secp256k1` 以外の場合や、
    /// 点が曲線上にない場合は [`CryptoError::InvalidPublicKey`]。
    pub fn from_spki_der(der: &[u8]) -> Result<Self, CryptoError> {
        if der.is_empty() {
            return Err(CryptoError::InvalidPublicKey("空の公開鍵です".into()));
        }
        let key = k256::PublicKey::from_public_key_der(der)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Self::from_affine(key.as_affine())
    }

    /// アフィン座標から構築する。曲線方程式を満たさない場合はエラー。
    pub fn from_coordinates(x: [u8; 32], y: [u8; 32]) -> Result<Self, CryptoError> {
        curve::point_from_coordinates(&x, &y)
            .ok_or_else(|| CryptoError::InvalidPublicKey("曲線上の点ではありません".into()))?;
        Ok(Self { x, y })
    }

    /// SEC1非圧縮形式（`0x04 ‖ x ‖ y`、65バイト）から構築する。
    #[cfg(test)]
    pub fn from_uncompressed(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 65 || bytes[0] != 0x04 {
            return Err(CryptoError::InvalidPublicKey(
                "非圧縮形式（65バイト、0x04始まり）ではありません".into(),
            ));
        }
        let mut x = [0u8; 32];
        let mut y = [0u8; 32];
        x.copy_from_slice(&bytes[1..33]);
        y.copy_from_slice(&bytes[33..65]);
        Self::from_coordinates(x, y)
    }

    pub fn from_affine(point: &AffinePoint) -> Result<Self, CryptoError> {
        let (x, y) = curve::point_coordinates(point)
            .ok_or_else(|| CryptoError::InvalidPublicKey("無限遠点です".into()))?;
        Ok(Self { x, y })
    }

    pub fn x(&self) -> &[u8; 32] {
        &self.x
    }

    pub fn y(&self) -> &[u8; 32] {
        &self.y
    }

    pub fn y_is_odd(&self) -> bool {
        self.y[31] & 1 == 1
    }

    #[cfg(test)]
    pub fn to_uncompressed(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[0] = 0x04;
        out[1..33].copy_from_slice(&self.x);
        out[33..].copy_from_slice(&self.y);
        out
    }

    /// 復元した点がこの公開鍵と同じか（x, y 両方を比較）。
    pub fn matches(&self, point: &AffinePoint) -> bool {
        match curve::point_coordinates(point) {
            Some((x, y)) => x == self.x && y == self.y,
            None => false,
        }
    }

    pub fn address(&self) -> Address {
        address_from_public_key(self)
    }
}

/// 公開鍵からEthereumアドレスを導出する。
pub fn address_from_public_key(public_key: &PublicKey) -> Address {
    let mut xy = [0u8; 64];
    xy[..32].copy_from_slice(&public_key.x);
    xy[32..].copy_from_slice(&public_key.y);
    let hash = keccak256(xy);
    Address::from_slice(&hash[12..])
}
