//! The curve-parameter binder (`prepare_ec_param`, `§4.5`)
//!
//! Given the currently selected EC key file, this materializes which curve it belongs to and
//! loads that curve's public parameters plus the file's private scalar into one working value,
//! the same role `SlaveSecurityManagerBuilder::create_security_manager` plays in the teacher:
//! gather everything needed for the crypto step into one struct before doing any arithmetic.

use crate::error::Error;
use crate::keystore::{FileType, KeyPartId, KeyStore};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Which curve a `0x22`/`0x23` EC key file is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurveId {
    P192,
    P256,
    P384,
    P521,
    Secp256k1,
}

/// How the curve's `a` coefficient is special-cased, mirroring the hint the source records
/// alongside the curve tag so the EC kernel can shortcut the general doubling formula.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialA {
    Zero,
    MinusThree,
    General,
}

impl CurveId {
    /// Private-scalar / coordinate byte length for this curve.
    pub fn scalar_size(&self) -> usize {
        match self {
            CurveId::P192 => 24,
            CurveId::P256 | CurveId::Secp256k1 => 32,
            CurveId::P384 => 48,
            CurveId::P521 => 66,
        }
    }

    /// `§4.4` step 4: curves whose scalar size exceeds 60 bytes need the DER long-form outer
    /// length. Only secp521r1 qualifies among the supported curves.
    pub fn needs_long_form_der(&self) -> bool {
        self.scalar_size() > 60
    }

    pub fn special_a(&self) -> SpecialA {
        match self {
            CurveId::Secp256k1 => SpecialA::Zero,
            CurveId::P192 | CurveId::P256 | CurveId::P384 | CurveId::P521 => SpecialA::MinusThree,
        }
    }

    /// Selects a curve from (file type, private-scalar length), per `§4.5`:
    /// "If file type = `0x23`, select secp256k1. Else select from {P-192, P-256, P-384, P-521}
    /// by private-scalar length ∈ {24, 32, 48, 66}."
    pub fn from_file(file_type: FileType, scalar_len: usize) -> Result<CurveId, Error> {
        if file_type == FileType::EcOsEidSecp256k1 {
            return Ok(CurveId::Secp256k1);
        }
        match scalar_len {
            24 => Ok(CurveId::P192),
            32 => Ok(CurveId::P256),
            48 => Ok(CurveId::P384),
            66 => Ok(CurveId::P521),
            _ => Err(Error::IncorrectFileType),
        }
    }

    /// Selects a curve purely from (file type, declared file size in bits) — used by key
    /// generation, which has no private scalar yet to measure.
    pub fn from_file_size(file_type: FileType, size_bits: u16) -> Result<CurveId, Error> {
        if file_type == FileType::EcOsEidSecp256k1 {
            return Ok(CurveId::Secp256k1);
        }
        match size_bits {
            192 => Ok(CurveId::P192),
            256 => Ok(CurveId::P256),
            384 => Ok(CurveId::P384),
            521 => Ok(CurveId::P521),
            _ => Err(Error::IncorrectFileType),
        }
    }

    pub fn prime(&self) -> &'static [u8] {
        match self {
            CurveId::P192 => &P192_PRIME,
            CurveId::P256 => &P256_PRIME,
            CurveId::P384 => &P384_PRIME,
            CurveId::P521 => &P521_PRIME,
            CurveId::Secp256k1 => &SECP256K1_PRIME,
        }
    }

    pub fn order(&self) -> &'static [u8] {
        match self {
            CurveId::P192 => &P192_ORDER,
            CurveId::P256 => &P256_ORDER,
            CurveId::P384 => &P384_ORDER,
            CurveId::P521 => &P521_ORDER,
            CurveId::Secp256k1 => &SECP256K1_ORDER,
        }
    }

    pub fn a(&self) -> &'static [u8] {
        match self {
            CurveId::P192 => &P192_A,
            CurveId::P256 => &P256_A,
            CurveId::P384 => &P384_A,
            CurveId::P521 => &P521_A,
            CurveId::Secp256k1 => &SECP256K1_A,
        }
    }

    pub fn b(&self) -> &'static [u8] {
        match self {
            CurveId::P192 => &P192_B,
            CurveId::P256 => &P256_B,
            CurveId::P384 => &P384_B,
            CurveId::P521 => &P521_B,
            CurveId::Secp256k1 => &SECP256K1_B,
        }
    }

    /// Generator point `(X, Y)`, each `scalar_size()` bytes, big-endian.
    pub fn generator(&self) -> (&'static [u8], &'static [u8]) {
        match self {
            CurveId::P192 => (&P192_GX, &P192_GY),
            CurveId::P256 => (&P256_GX, &P256_GY),
            CurveId::P384 => (&P384_GX, &P384_GY),
            CurveId::P521 => (&P521_GX, &P521_GY),
            CurveId::Secp256k1 => (&SECP256K1_GX, &SECP256K1_GY),
        }
    }
}

/// The working structure `prepare_ec_param` produces: the bound curve plus the private scalar,
/// reverse-copied into little-endian working form as the spec requires. Zeroized on drop since
/// it carries the raw private key.
#[derive(ZeroizeOnDrop)]
pub struct CurveParams {
    #[zeroize(skip)]
    pub curve: CurveId,
    pub private_scalar_le: Vec<u8>,
}

/// Binds curve parameters and the private scalar from the currently selected EC key file
/// (`§4.5`). `size_override` lets key generation pick a curve before any private scalar exists.
pub fn prepare_ec_param(
    store: &dyn KeyStore,
    size_override: Option<u16>,
) -> Result<CurveParams, Error> {
    let file_type = store.file_type()?;
    if file_type != FileType::EcNist && file_type != FileType::EcOsEidSecp256k1 {
        return Err(Error::IncorrectFileType);
    }

    let curve = if let Some(bits) = size_override {
        CurveId::from_file_size(file_type, bits)?
    } else {
        let mut scalar_be = vec![0u8; 66];
        let len = store.key_read_part(&mut scalar_be, KeyPartId::EcPrivate)?;
        scalar_be.truncate(len);
        CurveId::from_file(file_type, len)?
    };

    let mut scalar_be = vec![0u8; curve.scalar_size()];
    let len = store.key_read_part(&mut scalar_be, KeyPartId::EcPrivate)?;
    if len != curve.scalar_size() {
        return Err(Error::IncorrectFileType);
    }

    let private_scalar_le = crate::bignum::reverse_copy(&scalar_be);
    scalar_be.zeroize();

    Ok(CurveParams { curve, private_scalar_le })
}

// NIST/SEC curve domain parameters, big-endian, one constant table per curve exactly as
// `§6`'s `get_constant(out, id)` boundary would hand them back.

static P192_PRIME: [u8; 24] = hex24("fffffffffffffffffffffffffffffffeffffffffffffffff");
static P192_A: [u8; 24] = hex24("fffffffffffffffffffffffffffffffefffffffffffffffc");
static P192_B: [u8; 24] = hex24("64210519e59c80e70fa7e9ab72243049feb8deecc146b9b1");
static P192_GX: [u8; 24] = hex24("188da80eb03090f67cbf20eb43a18800f4ff0afd82ff1012");
static P192_GY: [u8; 24] = hex24("07192b95ffc8da78631011ed6b24cdd573f977a11e794811");
static P192_ORDER: [u8; 24] = hex24("ffffffffffffffffffffffff99def836146bc9b1b4d22831");

static P256_PRIME: [u8; 32] =
    hex32("ffffffff00000001000000000000000000000000ffffffffffffffffffffffff");
static P256_A: [u8; 32] =
    hex32("ffffffff00000001000000000000000000000000fffffffffffffffffffffffc");
static P256_B: [u8; 32] =
    hex32("5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b");
static P256_GX: [u8; 32] =
    hex32("6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296");
static P256_GY: [u8; 32] =
    hex32("4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5");
static P256_ORDER: [u8; 32] =
    hex32("ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551");

static P384_PRIME: [u8; 48] = hex48(
    "fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffeffffffff0000000000000000ffffffff",
);
static P384_A: [u8; 48] = hex48(
    "fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffeffffffff0000000000000000fffffffc",
);
static P384_B: [u8; 48] = hex48(
    "b3312fa7e23ee7e4988e056be3f82d19181d9c6efe8141120314088f5013875ac656398d8a2ed19d2a85c8edd3ec2aef",
);
static P384_GX: [u8; 48] = hex48(
    "aa87ca22be8b05378eb1c71ef320ad746e1d3b628ba79b9859f741e082542a385502f25dbf55296c3a545e3872760ab7",
);
static P384_GY: [u8; 48] = hex48(
    "3617de4a96262c6f5d9e98bf9292dc29f8f41dbd289a147ce9da3113b5f0b8c00a60b1ce1d7e819d7a431d7c90ea0e5f",
);
static P384_ORDER: [u8; 48] = hex48(
    "ffffffffffffffffffffffffffffffffffffffffffffffffc7634d81f4372ddf581a0db248b0a77aecec196accc52973",
);

static P521_PRIME: [u8; 66] = hex66(
    "01ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
);
static P521_A: [u8; 66] = hex66(
    "01fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffc",
);
static P521_B: [u8; 66] = hex66(
    "0051953eb9618e1c9a1f929a21a0b68540eea2da725b99b315f3b8b489918ef109e156193951ec7e937b1652c0bd3bb1bf073573df883d2c34f1ef451fd46b503f00",
);
static P521_GX: [u8; 66] = hex66(
    "00c6858e06b70404e9cd9e3ecb662395b4429c648139053fb521f828af606b4d3dbaa14b5e77efe75928fe1dc127a2ffa8de3348b3c1856a429bf97e7e31c2e5bd66",
);
static P521_GY: [u8; 66] = hex66(
    "011839296a789a3bc0045c8a5fb42c7d1bd998f54449579b446817afbd17273e662c97ee72995ef42640c550b9013fad0761353c7086a272c24088be94769fd16650",
);
static P521_ORDER: [u8; 66] = hex66(
    "01fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffa51868783bf2f966b7fcc0148f709a5d03bb5c9b8899c47aebb6fb71e91386409",
);

static SECP256K1_PRIME: [u8; 32] =
    hex32("fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2f");
static SECP256K1_A: [u8; 32] =
    hex32("0000000000000000000000000000000000000000000000000000000000000000");
static SECP256K1_B: [u8; 32] =
    hex32("0000000000000000000000000000000000000000000000000000000000000007");
static SECP256K1_GX: [u8; 32] =
    hex32("79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798");
static SECP256K1_GY: [u8; 32] =
    hex32("483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8");
static SECP256K1_ORDER: [u8; 32] =
    hex32("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141");

const fn hex_nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        _ => 0,
    }
}

const fn hex24(s: &str) -> [u8; 24] {
    hex_n::<24>(s)
}
const fn hex32(s: &str) -> [u8; 32] {
    hex_n::<32>(s)
}
const fn hex48(s: &str) -> [u8; 48] {
    hex_n::<48>(s)
}
const fn hex66(s: &str) -> [u8; 66] {
    hex_n::<66>(s)
}

/// Decodes a hex literal into a fixed-size big-endian byte array at compile time, right-aligning
/// (left-zero-padding) so the odd-length P-521 literals above still land on byte boundaries.
const fn hex_n<const N: usize>(s: &str) -> [u8; N] {
    let bytes = s.as_bytes();
    let mut out = [0u8; N];
    let nibbles = bytes.len();
    let mut i = 0;
    while i < nibbles {
        let nibble = hex_nibble(bytes[nibbles - 1 - i]);
        let byte_index = N - 1 - i / 2;
        if i % 2 == 0 {
            out[byte_index] = nibble;
        } else {
            out[byte_index] |= nibble << 4;
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p256_generator_is_33_bytes_per_coordinate() {
        let (gx, gy) = CurveId::P256.generator();
        assert_eq!(gx.len(), 32);
        assert_eq!(gy.len(), 32);
    }

    #[test]
    fn curve_selection_by_scalar_length() {
        assert_eq!(
            CurveId::from_file(FileType::EcNist, 32).unwrap(),
            CurveId::P256
        );
        assert_eq!(
            CurveId::from_file(FileType::EcNist, 66).unwrap(),
            CurveId::P521
        );
        assert_eq!(
            CurveId::from_file(FileType::EcOsEidSecp256k1, 32).unwrap(),
            CurveId::Secp256k1
        );
    }

    #[test]
    fn p521_needs_long_form_der() {
        assert!(CurveId::P521.needs_long_form_der());
        assert!(!CurveId::P256.needs_long_form_der());
    }
}
