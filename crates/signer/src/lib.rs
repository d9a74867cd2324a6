//! # KaiSign 署名アダプタ
//!
//! リモート署名オラクル（AWS KMS）が保持するsecp256k1鍵で、32バイトの
//! ダイジェストにEthereum互換の署名 `(r, s, v, yParity)` を付与する。
//!
//! ## 処理フロー
//! 1. ダイジェストの検証（`0x` + 64桁の16進数）
//! 2. オラクルへの署名リクエスト（ハッシュ済みダイジェストとして送信）
//! 3. DER署名のデコードとlow-s正規化
//! 4. キャッシュ済み公開鍵との突き合わせによるリカバリIDの特定
//! 5. `v = 27 + yParity` の組み立て
//!
//! オラクルの実装は [`oracle::KeyOracle`] トレイトで抽象化する。
//!
//! | 実装 | 用途 |
//! |------|------|
//! | [`oracle::aws::AwsKmsOracle`] | AWS KMS（feature `vendor-aws`） |
//! | [`oracle::mock::MockOracle`] | ローカル開発・テスト用（メモリ内鍵） |

pub mod adapter;
pub mod cache;
pub mod config;
pub mod error;
pub mod oracle;

pub use adapter::{parse_digest, EthereumSignature, RecoveryFallback, SigningAdapter};
pub use cache::PublicKeyCache;
pub use config::{OracleBackend, SignerConfig};
pub use error::SignerError;
pub use oracle::{KeyHandle, KeyOracle};
