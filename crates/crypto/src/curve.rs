//! # secp256k1 曲線演算
//!
//! 署名のリカバリIDを特定するために必要な最小限の群演算。
//! スカラー・体の演算そのものは `k256` に委ね、ここではECDSAの
//! 公開鍵復元 `Q = r⁻¹(sR − eG)` を組み立てる。
//!
//! スカラーと座標はすべて32バイトのビッグエンディアンで受け渡す。

use k256::elliptic_curve::ff::PrimeField;
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::{AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint, Scalar, U256};

use crate::{CryptoError, Digest};

/// secp256k1の位数 N
pub const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// floor(N / 2)。low-s判定の境界値（この値以下ならlow-s）。
pub const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// 32バイトのビッグエンディアン値を [1, N-1] のスカラーとして読む。
/// 0 または N 以上なら `None`。
pub fn scalar_from_bytes(bytes: &[u8; 32]) -> Option<Scalar> {
    let scalar: Option<Scalar> = Scalar::from_repr(FieldBytes::clone_from_slice(bytes)).into();
    scalar.filter(|s| !bool::from(s.is_zero()))
}

/// スカラーを32バイトのビッグエンディアン値に変換する。
pub fn scalar_to_bytes(scalar: &Scalar) -> [u8; 32] {
    field_bytes_to_array(&scalar.to_repr())
}

fn field_bytes_to_array(bytes: &FieldBytes) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(bytes);
    out
}

/// `N - s` を計算する。`s` が [1, N-1] の範囲外なら `None`。
pub fn negate_scalar(s: &[u8; 32]) -> Option<[u8; 32]> {
    scalar_from_bytes(s).map(|scalar| scalar_to_bytes(&-scalar))
}

/// `s > N/2` かどうか。
pub fn is_high_s(s: &[u8; 32]) -> bool {
    *s > SECP256K1_HALF_ORDER
}

/// x座標とyのパリティから曲線上の点を復元する（SEC1圧縮形式の展開）。
///
/// x が体の位数以上、または `x³ + 7` が平方剰余でない場合は `None`。
pub fn decompress_point(x: &[u8; 32], y_is_odd: bool) -> Option<AffinePoint> {
    let mut compressed = [0u8; 33];
    compressed[0] = if y_is_odd { 0x03 } else { 0x02 };
    compressed[1..].copy_from_slice(x);

    let encoded = EncodedPoint::from_bytes(compressed).ok()?;
    Option::from(AffinePoint::from_encoded_point(&encoded))
}

/// アフィン座標 (x, y) が曲線方程式 `y² = x³ + 7` を満たす場合に点を返す。
pub fn point_from_coordinates(x: &[u8; 32], y: &[u8; 32]) -> Option<AffinePoint> {
    let encoded = EncodedPoint::from_affine_coordinates(
        FieldBytes::from_slice(x),
        FieldBytes::from_slice(y),
        false,
    );
    Option::from(AffinePoint::from_encoded_point(&encoded))
}

/// 点のアフィン座標を返す。無限遠点は `None`。
pub fn point_coordinates(point: &AffinePoint) -> Option<([u8; 32], [u8; 32])> {
    let encoded = point.to_encoded_point(false);
    let x = field_bytes_to_array(encoded.x()?);
    let y = field_bytes_to_array(encoded.y()?);
    Some((x, y))
}

/// ECDSA署名 (r, s) とダイジェストから署名者の公開鍵の点を復元する。
///
/// `R` は x座標が `r`、yのパリティが `y_is_odd` の点。
/// `Q = r⁻¹ · (s·R − e·G)`、ここで `e` はダイジェストを N で還元した値。
///
/// x座標が `r + N` となる候補（リカバリID 2, 3）は扱わない。
pub fn recover_point(
    digest: &Digest,
    r: &[u8; 32],
    s: &[u8; 32],
    y_is_odd: bool,
) -> Result<AffinePoint, CryptoError> {
    let r_scalar = scalar_from_bytes(r).ok_or(CryptoError::ScalarOutOfRange("r"))?;
    let s_scalar = scalar_from_bytes(s).ok_or(CryptoError::ScalarOutOfRange("s"))?;
    let big_r = decompress_point(r, y_is_odd).ok_or(CryptoError::PointNotOnCurve)?;

    let e = <Scalar as Reduce<U256>>::reduce_bytes(FieldBytes::from_slice(digest));
    let r_inv: Scalar =
        Option::from(r_scalar.invert()).ok_or(CryptoError::ScalarOutOfRange("r"))?;

    let u1 = -(e * r_inv);
    let u2 = s_scalar * r_inv;
    let q = ProjectivePoint::GENERATOR * u1 + ProjectivePoint::from(big_r) * u2;

    if q == ProjectivePoint::IDENTITY {
        return Err(CryptoError::RecoveryFailed);
    }
    Ok(AffinePoint::from(q))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h32(s: &str) -> [u8; 32] {
        hex::decode(s).unwrap().try_into().unwrap()
    }

    const GX: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const GY: &str = "483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8";

    /// 生成元Gの圧縮形式展開が既知の座標と一致することを確認
    #[test]
    fn test_decompress_generator() {
        let point = decompress_point(&h32(GX), false).unwrap();
        let (x, y) = point_coordinates(&point).unwrap();
        assert_eq!(x, h32(GX));
        assert_eq!(y, h32(GY));

        // 奇数パリティを指定すると -G（y = p - Gy）になる
        let neg = decompress_point(&h32(GX), true).unwrap();
        let (_, neg_y) = point_coordinates(&neg).unwrap();
        assert_ne!(neg_y, h32(GY));
        assert_eq!(neg_y[31] & 1, 1);
    }

    /// x³ + 7 が平方剰余でないx座標は展開できないことを確認
    #[test]
    fn test_decompress_rejects_non_residue() {
        // x = 5: 5³ + 7 = 132 はsecp256k1の体で平方非剰余
        let mut x = [0u8; 32];
        x[31] = 5;
        assert!(decompress_point(&x, false).is_none());
        assert!(decompress_point(&[0xFF; 32], false).is_none());
    }

    /// 曲線方程式を満たさない座標が拒否されることを確認
    #[test]
    fn test_point_from_coordinates_validates_curve() {
        assert!(point_from_coordinates(&h32(GX), &h32(GY)).is_some());

        let mut bad_y = h32(GY);
        bad_y[31] ^= 0x01;
        assert!(point_from_coordinates(&h32(GX), &bad_y).is_none());
    }

    /// スカラーの範囲チェック（0とN以上を拒否）
    #[test]
    fn test_scalar_range() {
        assert!(scalar_from_bytes(&[0u8; 32]).is_none());
        assert!(scalar_from_bytes(&SECP256K1_ORDER).is_none());
        assert!(scalar_from_bytes(&[0xFF; 32]).is_none());

        let mut n_minus_1 = SECP256K1_ORDER;
        n_minus_1[31] -= 1;
        assert!(scalar_from_bytes(&n_minus_1).is_some());
    }

    /// N - s の計算とlow-s境界値
    #[test]
    fn test_negate_and_half_order_boundary() {
        let mut one = [0u8; 32];
        one[31] = 1;
        let mut n_minus_1 = SECP256K1_ORDER;
        n_minus_1[31] -= 1;
        assert_eq!(negate_scalar(&one).unwrap(), n_minus_1);
        assert_eq!(negate_scalar(&n_minus_1).unwrap(), one);
        assert!(negate_scalar(&[0u8; 32]).is_none());

        assert!(!is_high_s(&SECP256K1_HALF_ORDER));
        let mut above = SECP256K1_HALF_ORDER;
        above[31] += 1;
        assert!(is_high_s(&above));
        // N - (N/2 + 1) = N/2
        assert_eq!(negate_scalar(&above).unwrap(), SECP256K1_HALF_ORDER);
    }

    /// 既知の署名から公開鍵が復元できることを確認（k256の実装と突き合わせ）
    #[test]
    fn test_recover_point_matches_k256() {
        use k256::ecdsa::{RecoveryId as K256RecoveryId, SigningKey, VerifyingKey};

        let signing_key = SigningKey::from_slice(&[0x42; 32]).unwrap();
        let digest = [0x5a; 32];
        let (signature, recid) = signing_key.sign_prehash_recoverable(&digest).unwrap();
        let (r, s) = signature.split_bytes();
        let r: [u8; 32] = r.as_slice().try_into().unwrap();
        let s: [u8; 32] = s.as_slice().try_into().unwrap();

        let recovered = recover_point(&digest, &r, &s, recid.is_y_odd()).unwrap();
        let expected = VerifyingKey::recover_from_prehash(
            &digest,
            &signature,
            K256RecoveryId::new(recid.is_y_odd(), false),
        )
        .unwrap();
        assert_eq!(recovered, *expected.as_affine());
        assert_eq!(recovered, *signing_key.verifying_key().as_affine());

        // 逆のパリティでは別の点になる
        let other = recover_point(&digest, &r, &s, !recid.is_y_odd()).unwrap();
        assert_ne!(other, recovered);
    }

    /// r, s が範囲外の場合はエラーになることを確認
    #[test]
    fn test_recover_point_rejects_out_of_range() {
        let digest = [0u8; 32];
        let valid = h32(GX);
        assert_eq!(
            recover_point(&digest, &[0u8; 32], &valid, false),
            Err(CryptoError::ScalarOutOfRange("r"))
        );
        assert_eq!(
            recover_point(&digest, &valid, &SECP256K1_ORDER, false),
            Err(CryptoError::ScalarOutOfRange("s"))
        );
    }
}
