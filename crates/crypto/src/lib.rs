//! # KaiSign 暗号処理
//!
//! リモート署名オラクル（AWS KMS等）が返すsecp256k1署名を
//! Ethereum互換の署名へ変換するための純粋な暗号ロジック。I/Oは持たない。
//!
//! ## 構成
//! | モジュール | 役割 |
//! |-----------|------|
//! | [`curve`] | スカラー・点の検証、点の復元（point recovery） |
//! | [`signature`] | DER署名のデコードとlow-s正規化 |
//! | [`recovery`] | 既知の公開鍵に一致するリカバリIDの特定 |
//! | [`public_key`] | SPKI公開鍵のパースとEthereumアドレス導出 |

pub mod curve;
pub mod public_key;
pub mod recovery;
pub mod signature;

pub use alloy_primitives::Address;
pub use public_key::{address_from_public_key, PublicKey};
pub use recovery::{resolve_recovery_id, RecoveryId, RecoveryResolution};
pub use signature::{normalize, CanonicalSignature};

/// 署名対象の32バイトダイジェスト（keccak-256等でハッシュ済み）。
pub type Digest = [u8; 32];

/// 暗号処理のエラー型
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    /// DER署名のデコードに失敗
    #[error("DER署名のデコードに失敗しました: {0}")]
    MalformedSignature(String),
    /// 公開鍵が不正（SPKIのパース失敗、曲線外の点、secp256k1以外）
    #[error("公開鍵が不正です: {0}")]
    InvalidPublicKey(String),
    /// スカラー値が [1, N-1] の範囲外
    #[error("スカラー値が範囲外です: {0}")]
    ScalarOutOfRange(&'static str),
    /// x座標に対応する曲線上の点が存在しない
    #[error("x座標に対応する曲線上の点が存在しません")]
    PointNotOnCurve,
    /// 点の復元に失敗（無限遠点）
    #[error("公開鍵の復元に失敗しました")]
    RecoveryFailed,
}
