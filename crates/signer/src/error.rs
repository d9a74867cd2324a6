//! # 署名アダプタのエラー型

use kaisign_crypto::CryptoError;

/// 署名アダプタのエラー型。
///
/// どの失敗もリトライしない。呼び出し側の誤りは [`SignerError::InvalidDigest`] のみ。
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// キーID・リージョン・認証情報等の設定不足
    #[error("署名オラクルの設定が不正です: {0}")]
    Configuration(String),
    /// ダイジェストが16進数でない、または32バイトでない
    #[error("ダイジェストが不正です: {0}")]
    InvalidDigest(String),
    /// オラクルが返した署名をDERとしてデコードできない
    #[error("オラクルの署名が不正です: {0}")]
    MalformedSignature(String),
    /// オラクルの公開鍵が存在しない、またはsecp256k1のEC公開鍵でない
    #[error("オラクルの公開鍵が不正です: {0}")]
    InvalidKey(String),
    /// オラクルとの通信・サービスエラー
    #[error("署名オラクルの呼び出しに失敗: {0}")]
    Oracle(String),
    /// 公開鍵に一致するリカバリIDが見つからない（厳格モードのみ）
    #[error("リカバリIDを特定できませんでした")]
    RecoveryFailed,
}

impl SignerError {
    /// 呼び出し側の入力誤りによるエラーか。
    pub fn is_client_error(&self) -> bool {
        matches!(self, SignerError::InvalidDigest(_))
    }
}

impl From<CryptoError> for SignerError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::MalformedSignature(msg) => SignerError::MalformedSignature(msg),
            CryptoError::InvalidPublicKey(msg) => SignerError::InvalidKey(msg),
            CryptoError::ScalarOutOfRange(_) | CryptoError::PointNotOnCurve => {
                SignerError::MalformedSignature(e.to_string())
            }
            CryptoError::RecoveryFailed => SignerError::RecoveryFailed,
        }
    }
}
