//! Elliptic-curve passthroughs.
//!
//! Groups, keys and points are opaque handles over a small curve
//! enumeration selected by the caller's numeric curve id. The bridge only
//! decodes, forwards to the curve crates and re-encodes; points travel as
//! SEC1 encodings and scalars/coordinates as big-number handles.

use elliptic_curve::ff::PrimeField;
use elliptic_curve::sec1::{
    Coordinates, EncodedPoint, FromEncodedPoint, ModulusSize, ToEncodedPoint,
};
use elliptic_curve::{CurveArithmetic, FieldBytes, Group};
use k256::Secp256k1;
use p256::NistP256;
use p384::NistP384;

use crate::bn::BigNum;

/// Caller curve id for NIST P-256.
pub const CURVE_ID_P256: i32 = 415;
/// Caller curve id for secp256k1.
pub const CURVE_ID_K256: i32 = 714;
/// Caller curve id for NIST P-384.
pub const CURVE_ID_P384: i32 = 715;

/// The curves the bridge can forward to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveId {
    /// NIST P-256.
    P256,
    /// secp256k1.
    K256,
    /// NIST P-384.
    P384,
}

impl CurveId {
    /// Map a caller curve id; unknown ids are rejected.
    pub const fn from_id(id: i32) -> Option<Self> {
        match id {
            CURVE_ID_P256 => Some(Self::P256),
            CURVE_ID_K256 => Some(Self::K256),
            CURVE_ID_P384 => Some(Self::P384),
            _ => None,
        }
    }

    /// Bit length of the underlying field.
    pub const fn degree(self) -> i32 {
        match self {
            Self::P256 | Self::K256 => 256,
            Self::P384 => 384,
        }
    }

    /// Byte length of a field element.
    pub const fn field_len(self) -> usize {
        match self {
            Self::P256 | Self::K256 => 32,
            Self::P384 => 48,
        }
    }
}

/// Elliptic-curve passthrough failures, flattened to 0 at the FFI edge.
#[derive(Debug, thiserror::Error)]
pub enum EcError {
    /// A handle built for one curve was used with another.
    #[error("curve mismatch between handles")]
    CurveMismatch,
    /// The encoded point is not on the curve.
    #[error("invalid point encoding")]
    InvalidPoint,
    /// The scalar bytes are not a valid field element.
    #[error("invalid scalar")]
    InvalidScalar,
    /// A coordinate or scalar wider than the field.
    #[error("value does not fit the field")]
    ValueRange,
    /// The point at infinity has no affine coordinates.
    #[error("point at infinity")]
    Infinity,
    /// Key operations that need a private scalar which was never set.
    #[error("no private key set")]
    MissingPrivateKey,
}

/// An elliptic-curve group handle.
#[derive(Debug, Clone, Copy)]
pub struct EcGroup {
    curve: CurveId,
}

impl EcGroup {
    /// Create a group for a caller curve id.
    pub const fn new(id: i32) -> Option<Self> {
        match CurveId::from_id(id) {
            Some(curve) => Some(Self { curve }),
            None => None,
        }
    }

    /// The curve this group forwards to.
    pub const fn curve(&self) -> CurveId {
        self.curve
    }

    /// Bit length of the underlying field.
    pub const fn degree(&self) -> i32 {
        self.curve.degree()
    }
}

/// An elliptic-curve key handle: a curve plus an optional private scalar.
#[derive(Debug)]
pub struct EcKey {
    curve: CurveId,
    private: Option<Box<BigNum>>,
}

impl EcKey {
    /// Create an empty key for a caller curve id.
    pub fn new(id: i32) -> Option<Self> {
        CurveId::from_id(id).map(|curve| Self {
            curve,
            private: None,
        })
    }

    /// The curve this key belongs to.
    pub const fn curve(&self) -> CurveId {
        self.curve
    }

    /// Store a copy of the private scalar.
    pub fn set_private_key(&mut self, scalar: &BigNum) {
        self.private = Some(Box::new(scalar.clone()));
    }

    /// Borrow the private scalar, if set. The returned reference is owned
    /// by the key, mirroring the subsystem's get0 contract.
    pub fn private_key(&self) -> Option<&BigNum> {
        self.private.as_deref()
    }
}

#[derive(Clone)]
enum PointData {
    P256(EncodedPoint<NistP256>),
    K256(EncodedPoint<Secp256k1>),
    P384(EncodedPoint<NistP384>),
}

/// An elliptic-curve point handle, stored as its SEC1 encoding.
#[derive(Clone)]
pub struct EcPoint {
    data: PointData,
}

impl std::fmt::Debug for EcPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcPoint")
            .field("curve", &self.curve())
            .finish_non_exhaustive()
    }
}

fn field_bytes_from_be<C: elliptic_curve::Curve>(bytes: &[u8]) -> Result<FieldBytes<C>, EcError> {
    let mut out = FieldBytes::<C>::default();
    let len = out.len();
    if bytes.len() > len {
        return Err(EcError::ValueRange);
    }
    out[len - bytes.len()..].copy_from_slice(bytes);
    Ok(out)
}

fn scalar_from_be<C: CurveArithmetic>(bytes: &[u8]) -> Result<C::Scalar, EcError> {
    let repr = field_bytes_from_be::<C>(bytes)?;
    Option::<C::Scalar>::from(C::Scalar::from_repr(repr)).ok_or(EcError::InvalidScalar)
}

fn decode_point<C>(encoded: &EncodedPoint<C>) -> Result<C::AffinePoint, EcError>
where
    C: CurveArithmetic,
    C::AffinePoint: FromEncodedPoint<C>,
    C::FieldBytesSize: ModulusSize,
{
    Option::<C::AffinePoint>::from(C::AffinePoint::from_encoded_point(encoded))
        .ok_or(EcError::InvalidPoint)
}

fn from_affine_generic<C>(x: &[u8], y: &[u8]) -> Result<EncodedPoint<C>, EcError>
where
    C: CurveArithmetic,
    C::AffinePoint: FromEncodedPoint<C> + ToEncodedPoint<C>,
    C::FieldBytesSize: ModulusSize,
{
    let x = field_bytes_from_be::<C>(x)?;
    let y = field_bytes_from_be::<C>(y)?;
    let encoded = EncodedPoint::<C>::from_affine_coordinates(&x, &y, false);
    decode_point::<C>(&encoded)?;
    Ok(encoded)
}

fn coordinates_generic<C>(encoded: &EncodedPoint<C>) -> Result<(Vec<u8>, Vec<u8>), EcError>
where
    C: elliptic_curve::Curve,
    C::FieldBytesSize: ModulusSize,
{
    match encoded.coordinates() {
        Coordinates::Uncompressed { x, y } => Ok((x.to_vec(), y.to_vec())),
        _ => Err(EcError::Infinity),
    }
}

/// Compute `n * G + m * q` in one pass, either term optional.
fn mul_generic<C>(
    n: Option<&[u8]>,
    qm: Option<(&EncodedPoint<C>, &[u8])>,
) -> Result<EncodedPoint<C>, EcError>
where
    C: CurveArithmetic,
    C::AffinePoint: FromEncodedPoint<C> + ToEncodedPoint<C>,
    C::FieldBytesSize: ModulusSize,
{
    let mut acc = C::ProjectivePoint::identity();
    if let Some(n) = n {
        acc += C::ProjectivePoint::generator() * scalar_from_be::<C>(n)?;
    }
    if let Some((q, m)) = qm {
        let q = decode_point::<C>(q)?;
        acc += C::ProjectivePoint::from(q) * scalar_from_be::<C>(m)?;
    }
    let acc: C::AffinePoint = acc.into();
    Ok(acc.to_encoded_point(false))
}

fn ecdh_generic<C>(private: &[u8], public: &EncodedPoint<C>) -> Result<Vec<u8>, EcError>
where
    C: CurveArithmetic,
    C::AffinePoint: FromEncodedPoint<C> + ToEncodedPoint<C>,
    C::FieldBytesSize: ModulusSize,
{
    let d = scalar_from_be::<C>(private)?;
    let q = decode_point::<C>(public)?;
    let shared = C::ProjectivePoint::from(q) * d;
    if bool::from(shared.is_identity()) {
        return Err(EcError::Infinity);
    }
    let shared: C::AffinePoint = shared.into();
    let encoded = shared.to_encoded_point(false);
    coordinates_generic::<C>(&encoded).map(|(x, _)| x)
}

impl EcPoint {
    /// Create the identity point of the group's curve.
    pub fn new(group: &EcGroup) -> Self {
        let data = match group.curve() {
            CurveId::P256 => PointData::P256(EncodedPoint::<NistP256>::identity()),
            CurveId::K256 => PointData::K256(EncodedPoint::<Secp256k1>::identity()),
            CurveId::P384 => PointData::P384(EncodedPoint::<NistP384>::identity()),
        };
        Self { data }
    }

    /// The curve this point belongs to.
    pub fn curve(&self) -> CurveId {
        match self.data {
            PointData::P256(_) => CurveId::P256,
            PointData::K256(_) => CurveId::K256,
            PointData::P384(_) => CurveId::P384,
        }
    }

    fn check_group(&self, group: &EcGroup) -> Result<(), EcError> {
        if self.curve() == group.curve() {
            Ok(())
        } else {
            Err(EcError::CurveMismatch)
        }
    }

    /// Set the point from affine coordinates, validating it lies on the
    /// curve.
    pub fn set_affine_coordinates(
        &mut self,
        group: &EcGroup,
        x: &BigNum,
        y: &BigNum,
    ) -> Result<(), EcError> {
        self.check_group(group)?;
        let (x, y) = (x.as_be_bytes(), y.as_be_bytes());
        self.data = match group.curve() {
            CurveId::P256 => PointData::P256(from_affine_generic::<NistP256>(x, y)?),
            CurveId::K256 => PointData::K256(from_affine_generic::<Secp256k1>(x, y)?),
            CurveId::P384 => PointData::P384(from_affine_generic::<NistP384>(x, y)?),
        };
        Ok(())
    }

    /// Read the affine coordinates into big-number handles. The identity
    /// point has none and is reported as such.
    pub fn affine_coordinates(
        &self,
        group: &EcGroup,
        x: &mut BigNum,
        y: &mut BigNum,
    ) -> Result<(), EcError> {
        self.check_group(group)?;
        let (xb, yb) = match &self.data {
            PointData::P256(p) => coordinates_generic::<NistP256>(p)?,
            PointData::K256(p) => coordinates_generic::<Secp256k1>(p)?,
            PointData::P384(p) => coordinates_generic::<NistP384>(p)?,
        };
        x.set_be_bytes(&xb);
        y.set_be_bytes(&yb);
        Ok(())
    }

    /// Replace this point with `n * G + m * q`; either term may be absent,
    /// but not both.
    pub fn multiply(
        &mut self,
        group: &EcGroup,
        n: Option<&BigNum>,
        qm: Option<(&Self, &BigNum)>,
    ) -> Result<(), EcError> {
        self.check_group(group)?;
        if n.is_none() && qm.is_none() {
            return Err(EcError::InvalidScalar);
        }
        if let Some((q, _)) = qm {
            q.check_group(group)?;
        }
        let n = n.map(BigNum::as_be_bytes);
        self.data = match group.curve() {
            CurveId::P256 => {
                let qm = match &qm {
                    Some((q, m)) => match &q.data {
                        PointData::P256(p) => Some((p, m.as_be_bytes())),
                        _ => return Err(EcError::CurveMismatch),
                    },
                    None => None,
                };
                PointData::P256(mul_generic::<NistP256>(n, qm)?)
            }
            CurveId::K256 => {
                let qm = match &qm {
                    Some((q, m)) => match &q.data {
                        PointData::K256(p) => Some((p, m.as_be_bytes())),
                        _ => return Err(EcError::CurveMismatch),
                    },
                    None => None,
                };
                PointData::K256(mul_generic::<Secp256k1>(n, qm)?)
            }
            CurveId::P384 => {
                let qm = match &qm {
                    Some((q, m)) => match &q.data {
                        PointData::P384(p) => Some((p, m.as_be_bytes())),
                        _ => return Err(EcError::CurveMismatch),
                    },
                    None => None,
                };
                PointData::P384(mul_generic::<NistP384>(n, qm)?)
            }
        };
        Ok(())
    }
}

/// Derive the shared secret (the x-coordinate of `d * Q`) into `out`,
/// returning the number of bytes written. At most `out.len()` bytes are
/// copied; the full secret is one field element.
pub fn ecdh_compute(key: &EcKey, public: &EcPoint, out: &mut [u8]) -> Result<usize, EcError> {
    if key.curve() != public.curve() {
        return Err(EcError::CurveMismatch);
    }
    let private = key.private_key().ok_or(EcError::MissingPrivateKey)?;
    let secret = match &public.data {
        PointData::P256(p) => ecdh_generic::<NistP256>(private.as_be_bytes(), p)?,
        PointData::K256(p) => ecdh_generic::<Secp256k1>(private.as_be_bytes(), p)?,
        PointData::P384(p) => ecdh_generic::<NistP384>(private.as_be_bytes(), p)?,
    };
    let n = secret.len().min(out.len());
    out[..n].copy_from_slice(&secret[..n]);
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bn(hex_str: &str) -> BigNum {
        BigNum::from_be_bytes(&hex::decode(hex_str).unwrap())
    }

    #[test]
    fn unknown_curve_ids_are_rejected() {
        assert!(EcGroup::new(0).is_none());
        assert!(EcGroup::new(-1).is_none());
        assert!(EcGroup::new(416).is_none());
        assert!(EcKey::new(9999).is_none());
    }

    #[test]
    fn group_degree() {
        assert_eq!(EcGroup::new(CURVE_ID_P256).unwrap().degree(), 256);
        assert_eq!(EcGroup::new(CURVE_ID_K256).unwrap().degree(), 256);
        assert_eq!(EcGroup::new(CURVE_ID_P384).unwrap().degree(), 384);
    }

    #[test]
    fn multiplying_generator_by_one_yields_the_generator() {
        let group = EcGroup::new(CURVE_ID_P256).unwrap();
        let mut point = EcPoint::new(&group);
        point.multiply(&group, Some(&bn("01")), None).unwrap();

        let (mut x, mut y) = (BigNum::default(), BigNum::default());
        point.affine_coordinates(&group, &mut x, &mut y).unwrap();
        assert_eq!(
            hex::encode(x.as_be_bytes()),
            "6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296"
        );
        assert_eq!(
            hex::encode(y.as_be_bytes()),
            "4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5"
        );
    }

    #[test]
    fn coordinate_round_trip() {
        let group = EcGroup::new(CURVE_ID_K256).unwrap();
        let mut generator = EcPoint::new(&group);
        generator.multiply(&group, Some(&bn("01")), None).unwrap();

        let (mut x, mut y) = (BigNum::default(), BigNum::default());
        generator
            .affine_coordinates(&group, &mut x, &mut y)
            .unwrap();

        let mut rebuilt = EcPoint::new(&group);
        rebuilt.set_affine_coordinates(&group, &x, &y).unwrap();

        let (mut x2, mut y2) = (BigNum::default(), BigNum::default());
        rebuilt.affine_coordinates(&group, &mut x2, &mut y2).unwrap();
        assert_eq!(x.as_be_bytes(), x2.as_be_bytes());
        assert_eq!(y.as_be_bytes(), y2.as_be_bytes());
    }

    #[test]
    fn off_curve_coordinates_are_rejected() {
        let group = EcGroup::new(CURVE_ID_P256).unwrap();
        let mut point = EcPoint::new(&group);
        assert!(matches!(
            point.set_affine_coordinates(&group, &bn("01"), &bn("01")),
            Err(EcError::InvalidPoint)
        ));
    }

    #[test]
    fn identity_point_has_no_affine_coordinates() {
        let group = EcGroup::new(CURVE_ID_P384).unwrap();
        let point = EcPoint::new(&group);
        let (mut x, mut y) = (BigNum::default(), BigNum::default());
        assert!(matches!(
            point.affine_coordinates(&group, &mut x, &mut y),
            Err(EcError::Infinity)
        ));
    }

    #[test]
    fn handles_from_different_curves_do_not_mix() {
        let p256 = EcGroup::new(CURVE_ID_P256).unwrap();
        let p384 = EcGroup::new(CURVE_ID_P384).unwrap();
        let mut point = EcPoint::new(&p256);
        assert!(matches!(
            point.multiply(&p384, Some(&bn("02")), None),
            Err(EcError::CurveMismatch)
        ));
    }

    #[test]
    fn combined_multiplication_matches_sum() {
        // 2*G + 3*G must equal 5*G.
        let group = EcGroup::new(CURVE_ID_P256).unwrap();
        let mut three_g = EcPoint::new(&group);
        three_g.multiply(&group, Some(&bn("03")), None).unwrap();

        let mut combined = EcPoint::new(&group);
        combined
            .multiply(&group, Some(&bn("02")), Some((&three_g, &bn("01"))))
            .unwrap();

        let mut five_g = EcPoint::new(&group);
        five_g.multiply(&group, Some(&bn("05")), None).unwrap();

        let (mut x1, mut y1) = (BigNum::default(), BigNum::default());
        let (mut x2, mut y2) = (BigNum::default(), BigNum::default());
        combined.affine_coordinates(&group, &mut x1, &mut y1).unwrap();
        five_g.affine_coordinates(&group, &mut x2, &mut y2).unwrap();
        assert_eq!(x1.as_be_bytes(), x2.as_be_bytes());
        assert_eq!(y1.as_be_bytes(), y2.as_be_bytes());
    }

    #[test]
    fn ecdh_agreement_is_symmetric() {
        for id in [CURVE_ID_P256, CURVE_ID_K256, CURVE_ID_P384] {
            let group = EcGroup::new(id).unwrap();
            let (da, db) = (bn("0123456789abcdef"), bn("fedcba9876543210"));

            let mut qa = EcPoint::new(&group);
            qa.multiply(&group, Some(&da), None).unwrap();
            let mut qb = EcPoint::new(&group);
            qb.multiply(&group, Some(&db), None).unwrap();

            let mut key_a = EcKey::new(id).unwrap();
            key_a.set_private_key(&da);
            let mut key_b = EcKey::new(id).unwrap();
            key_b.set_private_key(&db);

            let mut shared_a = vec![0u8; group.curve().field_len()];
            let mut shared_b = vec![0u8; group.curve().field_len()];
            let na = ecdh_compute(&key_a, &qb, &mut shared_a).unwrap();
            let nb = ecdh_compute(&key_b, &qa, &mut shared_b).unwrap();

            assert_eq!(na, group.curve().field_len());
            assert_eq!(shared_a[..na], shared_b[..nb]);
        }
    }

    #[test]
    fn ecdh_without_private_key_fails() {
        let group = EcGroup::new(CURVE_ID_P256).unwrap();
        let mut q = EcPoint::new(&group);
        q.multiply(&group, Some(&bn("02")), None).unwrap();
        let key = EcKey::new(CURVE_ID_P256).unwrap();
        let mut out = [0u8; 32];
        assert!(matches!(
            ecdh_compute(&key, &q, &mut out),
            Err(EcError::MissingPrivateKey)
        ));
    }
}
