//! # リカバリIDの特定
//!
//! 署名オラクルはリカバリIDを返さないため、正規化済みの (r, s) と
//! ダイジェストから候補 0, 1 の順に公開鍵を復元し、既知の公開鍵と
//! 一致するものを採用する。

use crate::curve;
use crate::public_key::PublicKey;
use crate::signature::CanonicalSignature;
use crate::Digest;

/// リカバリID（復元される点Rのyパリティ）。値は 0 または 1。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecoveryId(u8);

impl RecoveryId {
    pub const EVEN: Self = Self(0);
    pub const ODD: Self = Self(1);

    pub fn from_parity(y_is_odd: bool) -> Self {
        if y_is_odd {
            Self::ODD
        } else {
            Self::EVEN
        }
    }

    /// 0 または 1
    pub fn to_byte(self) -> u8 {
        self.0
    }

    pub fn is_y_odd(self) -> bool {
        self.0 == 1
    }

    /// レガシー形式の `v`（27 + リカバリID）
    pub fn v(self) -> u8 {
        27 + self.0
    }
}

/// リカバリID特定の結果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryResolution {
    /// 復元した公開鍵が既知の公開鍵と一致した
    Matched(RecoveryId),
    /// どの候補も一致しなかったため、公開鍵のyパリティで代用した
    Fallback(RecoveryId),
}

impl RecoveryResolution {
    pub fn id(self) -> RecoveryId {
        match self {
            Self::Matched(id) | Self::Fallback(id) => id,
        }
    }

    pub fn is_matched(self) -> bool {
        matches!(self, Self::Matched(_))
    }
}

/// 既知の公開鍵に一致するリカバリIDを特定する。
///
/// 候補 0, 1 を順に試し、復元した点の (x, y) が `public_key` と一致した
/// 最初の候補を返す。復元自体が失敗した候補は不一致として扱う。
/// どちらも一致しない場合は `public_key` のyパリティを
/// [`RecoveryResolution::Fallback`] として返す。
///
/// `signature` は正規化済みでなければならない。正規化前の high-s 署名を
/// 渡すと逆のリカバリIDが返る。
pub fn resolve_recovery_id(
    digest: &Digest,
    signature: &CanonicalSignature,
    public_key: &PublicKey,
) -> RecoveryResolution {
    for candidate in [RecoveryId::EVEN, RecoveryId::ODD] {
        let recovered =
            curve::recover_point(digest, &signature.r, &signature.s, candidate.is_y_odd());
        if let Ok(point) = recovered {
            if public_key.matches(&point) {
                return RecoveryResolution::Matched(candidate);
            }
        }
    }
    RecoveryResolution::Fallback(RecoveryId::from_parity(public_key.y_is_odd()))
}
