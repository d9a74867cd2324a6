//! # 公開鍵キャッシュ
//!
//! オラクルの公開鍵とそこから導出したEthereumアドレスを、アダプタ単位で
//! 一度だけ取得して保持する。TTLはない。
//!
//! 初回アクセスが同時に発生しても、オラクルへの取得リクエストは1回のみ。
//! 他の呼び出し側は同じ結果を待つ。取得に失敗した場合はキャッシュされず、
//! 次の呼び出しで再取得する。

use std::sync::Arc;

use tokio::sync::OnceCell;

use kaisign_crypto::{Address, PublicKey};

use crate::error::SignerError;
use crate::oracle::{KeyHandle, KeyOracle};

#[derive(Debug, Clone, Copy)]
struct CachedKey {
    public_key: PublicKey,
    address: Address,
}

/// 1つのKeyHandleに対する公開鍵キャッシュ。
pub struct PublicKeyCache {
    key: KeyHandle,
    oracle: Arc<dyn KeyOracle>,
    cell: OnceCell<CachedKey>,
}

impl PublicKeyCache {
    pub fn new(key: KeyHandle, oracle: Arc<dyn KeyOracle>) -> Self {
        Self {
            key,
            oracle,
            cell: OnceCell::new(),
        }
    }

    pub fn key_handle(&self) -> &KeyHandle {
        &self.key
    }

    /// 公開鍵を返す。未取得ならオラクルから取得する。
    pub async fn public_key(&self) -> Result<PublicKey, SignerError> {
        Ok(self.load().await?.public_key)
    }

    /// 公開鍵から導出したEthereumアドレスを返す。
    pub async fn address(&self) -> Result<Address, SignerError> {
        Ok(self.load().await?.address)
    }

    /// 取得済みかどうか。
    #[cfg(test)]
    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    async fn load(&self) -> Result<&CachedKey, SignerError> {
        self.cell.get_or_try_init(|| self.fetch()).await
    }

    async fn fetch(&self) -> Result<CachedKey, SignerError> {
        let der = self.oracle.get_public_key(&self.key).await?;
        if der.is_empty() {
            return Err(SignerError::InvalidKey(format!(
                "オラクルが公開鍵を返しませんでした (key_id={})",
                self.key
            )));
        }

        let public_key = PublicKey::from_spki_der(&der)?;
        let address = public_key.address();
        tracing::info!(
            key_id = %self.key,
            backend = self.oracle.backend(),
            address = %address.to_checksum(None),
            "署名オラクルの公開鍵を取得"
        );
        Ok(CachedKey {
            public_key,
            address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use kaisign_crypto::Digest;

    use crate::oracle::mock::MockOracle;

    const FIXTURE_PRIVATE_KEY: &str =
        "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    /// 公開鍵として固定のバイト列を返し、最初の `failures` 回は失敗するオラクル
    struct StaticKeyOracle {
        der: Vec<u8>,
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl KeyOracle for StaticKeyOracle {
        fn backend(&self) -> &str {
            "static"
        }

        async fn get_public_key(&self, _key: &KeyHandle) -> Result<Vec<u8>, SignerError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(SignerError::Oracle("一時的な障害".into()));
            }
            Ok(self.der.clone())
        }

        async fn sign_digest(
            &self,
            _key: &KeyHandle,
            _digest: &Digest,
        ) -> Result<Vec<u8>, SignerError> {
            Err(SignerError::Oracle("未対応".into()))
        }
    }

    #[tokio::test]
    async fn test_address_is_cached() {
        let oracle = Arc::new(MockOracle::from_hex(FIXTURE_PRIVATE_KEY).unwrap());
        let cache = PublicKeyCache::new(KeyHandle::new("mock"), oracle.clone());
        assert!(!cache.is_loaded());

        let first = cache.address().await.unwrap();
        let second = cache.address().await.unwrap();
        let _ = cache.public_key().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.to_checksum(None),
            "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23"
        );
        assert_eq!(oracle.public_key_fetches(), 1);
        assert!(cache.is_loaded());
    }

    /// 空の公開鍵はInvalidKey
    #[tokio::test]
    async fn test_empty_key_is_invalid() {
        let oracle = Arc::new(StaticKeyOracle {
            der: Vec::new(),
            failures: 0,
            calls: AtomicUsize::new(0),
        });
        let cache = PublicKeyCache::new(KeyHandle::new("empty"), oracle);
        assert!(matches!(
            cache.public_key().await,
            Err(SignerError::InvalidKey(_))
        ));
    }

    /// secp256k1以外の曲線（P-256）の公開鍵はInvalidKey
    #[tokio::test]
    async fn test_wrong_curve_is_invalid() {
        // prime256v1 の生成元をSPKIに包んだもの
        let p256_spki = hex::decode(concat!(
            "3059301306072a8648ce3d020106082a8648ce3d030107034200",
            "046b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296",
            "4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5"
        ))
        .unwrap();
        let oracle = Arc::new(StaticKeyOracle {
            der: p256_spki,
            failures: 0,
            calls: AtomicUsize::new(0),
        });
        let cache = PublicKeyCache::new(KeyHandle::new("p256"), oracle);
        assert!(matches!(
            cache.address().await,
            Err(SignerError::InvalidKey(_))
        ));
    }

    /// 取得失敗はキャッシュされず、次の呼び出しで再取得されることを確認
    #[tokio::test]
    async fn test_failed_fetch_is_retried() {
        let der = hex::decode("3056301006072a8648ce3d020106052b8104000a034200044e3b81af9c2234cad09d679ce6035ed1392347ce64ce405f5dcd36228a25de6e47fd35c4215d1edf53e6f83de344615ce719bdb0fd878f6ed76f06dd277956de").unwrap();
        let oracle = Arc::new(StaticKeyOracle {
            der,
            failures: 1,
            calls: AtomicUsize::new(0),
        });
        let cache = PublicKeyCache::new(KeyHandle::new("flaky"), oracle.clone());

        assert!(matches!(cache.address().await, Err(SignerError::Oracle(_))));
        assert!(!cache.is_loaded());

        let address = cache.address().await.unwrap();
        assert_eq!(
            address.to_checksum(None),
            "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23"
        );
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 2);
    }
}
