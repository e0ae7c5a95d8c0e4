//! ECDSA sign formatting (`sign_ec_raw`, `§4.4`).
//!
//! Binds curve parameters, invokes the [`EcKernel`], and DER-encodes `(r, s)` as
//! `SEQUENCE { INTEGER r, INTEGER s }`.

use crate::curves::CurveParams;
use crate::error::Error;
use crate::kernels::EcKernel;

/// `sign_ec_raw` (`§4.4`): `hash_be` is truncated/zero-padded to the curve's scalar size, signed,
/// and the resulting `(r, s)` pair DER-encoded.
pub fn sign_ec_raw(
    kernel: &dyn EcKernel,
    params: &CurveParams,
    hash_be: &[u8],
) -> Result<Vec<u8>, Error> {
    let scalar_size = params.curve.scalar_size();
    let digest_be = crate::bignum::BigNum::from_be_bytes(hash_be.to_vec()).fit_to_width(scalar_size);
    let digest_le = crate::bignum::reverse_copy(&digest_be);

    let (r_le, s_le) = kernel.sign(params, &digest_le)?;
    let r_be = crate::bignum::reverse_copy(&r_le);
    let s_be = crate::bignum::reverse_copy(&s_le);

    Ok(encode_der_signature(&r_be, &s_be, params.curve.needs_long_form_der()))
}

/// Encodes a minimal-length `INTEGER`: strips leading zero bytes (keeping at least one byte),
/// then reinserts exactly one `0x00` if the high bit of the first remaining byte is set.
fn encode_integer(magnitude_be: &[u8]) -> Vec<u8> {
    let mut trimmed = magnitude_be;
    while trimmed.len() > 1 && trimmed[0] == 0x00 {
        trimmed = &trimmed[1..];
    }
    let mut value = Vec::with_capacity(trimmed.len() + 1);
    if trimmed[0] & 0x80 != 0 {
        value.push(0x00);
    }
    value.extend_from_slice(trimmed);

    let mut out = Vec::with_capacity(value.len() + 2);
    out.push(0x02);
    out.push(value.len() as u8);
    out.extend_from_slice(&value);
    out
}

/// `§4.4` step 4: `30 [len] 02 [len_r] [maybe 00] r_be 02 [len_s] [maybe 00] s_be`, long-form
/// outer length (`81 LL`) when `use_long_form` (secp521r1).
///
/// The known simplification from `§4.4`'s tie-break note is preserved verbatim: the inner integer
/// lengths never themselves need the long form here because they're bounded by a 66-byte P-521
/// coordinate plus one leading-zero byte (67 bytes, still a single-byte DER length), so only the
/// outer `SEQUENCE` length can cross the short-form boundary.
fn encode_der_signature(r_be: &[u8], s_be: &[u8], use_long_form: bool) -> Vec<u8> {
    let r_int = encode_integer(r_be);
    let s_int = encode_integer(s_be);
    let body_len = r_int.len() + s_int.len();

    let mut out = Vec::with_capacity(body_len + 4);
    out.push(0x30);
    if use_long_form {
        out.push(0x81);
        out.push(body_len as u8);
    } else {
        out.push(body_len as u8);
    }
    out.extend_from_slice(&r_int);
    out.extend_from_slice(&s_int);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_integer_adds_leading_zero_when_high_bit_set() {
        let der = encode_integer(&[0x80, 0x01]);
        assert_eq!(der, vec![0x02, 0x03, 0x00, 0x80, 0x01]);
    }

    #[test]
    fn encode_integer_strips_redundant_leading_zeros() {
        let der = encode_integer(&[0x00, 0x00, 0x7F]);
        assert_eq!(der, vec![0x02, 0x01, 0x7F]);
    }

    #[test]
    fn short_form_for_p256_sized_signature() {
        let r = [0x7F; 32];
        let s = [0x01; 32];
        let der = encode_der_signature(&r, &s, false);
        assert_eq!(der[0], 0x30);
        assert_ne!(der[1], 0x81);
    }

    #[test]
    fn long_form_for_p521_sized_signature() {
        let r = [0x7F; 66];
        let s = [0x01; 66];
        let der = encode_der_signature(&r, &s, true);
        assert_eq!(der[0], 0x30);
        assert_eq!(der[1], 0x81);
    }
}
