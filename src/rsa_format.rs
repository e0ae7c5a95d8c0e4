//! RSA sign/decrypt formatting (`rsa_raw`, `§4.3`).
//!
//! PKCS#1 v1.5 padding and the SHA-1 `DigestInfo` prefix live here, above the [`RsaKernel`]
//! boundary; the kernel only ever sees a fully padded, modulus-sized buffer, the same separation
//! `sign_ec_raw`/`ecdsa_format` keeps between DER encoding and the bare `(r, s)` the EC kernel
//! produces.

use crate::error::Error;
use crate::keystore::{FileType, KeyPartId, KeyStore};
use crate::kernels::{RsaKernel, RsaPrivateKeyMaterial};
use zeroize::Zeroize;

/// The SHA-1 `DigestInfo` prefix prepended ahead of a bare 20-byte digest when `flag=1`
/// (`sign_algo=0x12`): `SEQUENCE { SEQUENCE { OID sha1, NULL }, OCTET STRING (20 bytes) }` minus
/// the octet string itself.
const SHA1_DIGEST_INFO_PREFIX: [u8; 15] = [
    0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a, 0x05, 0x00, 0x04, 0x14,
];

/// Formatting flag carried by `sign_algo`: `§4.2` maps `{0x00, 0x02, 0x12}` to `{0, 2, 1}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RsaFormat {
    /// `flag=0`: raw, message length must equal the modulus size.
    Raw,
    /// `flag=1`: bare SHA-1 digest; prepend the `DigestInfo` prefix and pad as `DigestInfoPresent`.
    Sha1,
    /// `flag=2`: `DigestInfo` already present in the input; apply PKCS#1 v1.5 type-1 padding.
    DigestInfoPresent,
}

fn rsa_key_material(store: &dyn KeyStore) -> Result<RsaPrivateKeyMaterial, Error> {
    if store.file_type()? != FileType::RsaKey {
        return Err(Error::IncorrectFileType);
    }
    let modulus_bits = store.file_size_bits()?;
    let modulus_len = ((modulus_bits as usize) + 7) / 8;
    let half_len = modulus_len / 2;

    let mut read = |part: KeyPartId| -> Result<Vec<u8>, Error> {
        let mut buf = vec![0u8; half_len];
        let len = store.key_read_part(&mut buf, part)?;
        if len != half_len {
            return Err(Error::ReferencedDataNotFound);
        }
        Ok(buf)
    };

    Ok(RsaPrivateKeyMaterial {
        p: read(KeyPartId::RsaP)?,
        q: read(KeyPartId::RsaQ)?,
        d_p: read(KeyPartId::RsaDp)?,
        d_q: read(KeyPartId::RsaDq)?,
        q_inv: read(KeyPartId::RsaQInv)?,
        modulus_len,
    })
}

/// PKCS#1 v1.5 type-1 padding: `00 01 FF..FF 00 <payload>`, at least 8 `FF` bytes, fit to
/// `modulus_len` total.
fn pad_type1(payload: &[u8], modulus_len: usize) -> Result<Vec<u8>, Error> {
    if payload.len() + 11 > modulus_len {
        return Err(Error::ConditionsNotSatisfied);
    }
    let mut out = vec![0u8; modulus_len];
    out[0] = 0x00;
    out[1] = 0x01;
    let ff_len = modulus_len - payload.len() - 3;
    for b in out[2..2 + ff_len].iter_mut() {
        *b = 0xFF;
    }
    out[2 + ff_len] = 0x00;
    out[modulus_len - payload.len()..].copy_from_slice(payload);
    Ok(out)
}

/// `rsa_raw` (`§4.3`): formats `message_be` per `format`, invokes the kernel, and for decrypt
/// paths (`sign_algo=0x02`) strips the PKCS#1 v1.5 type-2 padding on the way back out.
pub fn rsa_raw(
    store: &dyn KeyStore,
    kernel: &dyn RsaKernel,
    message_be: &[u8],
    format: RsaFormat,
    strip_type2_padding: bool,
) -> Result<Vec<u8>, Error> {
    let key = rsa_key_material(store)?;
    let modulus_len = key.modulus_len;

    let mut formatted_be = match format {
        RsaFormat::Raw => {
            // A raw message must be exactly one modulus wide. This is a security-environment
            // precondition, not a transport-layer length error, so it fails with "conditions not
            // satisfied" rather than "wrong length" (scenario 5).
            if message_be.len() != modulus_len {
                return Err(Error::ConditionsNotSatisfied);
            }
            message_be.to_vec()
        }
        RsaFormat::Sha1 => {
            if message_be.len() != 20 {
                return Err(Error::WrongLength);
            }
            let mut digest_info = Vec::with_capacity(SHA1_DIGEST_INFO_PREFIX.len() + 20);
            digest_info.extend_from_slice(&SHA1_DIGEST_INFO_PREFIX);
            digest_info.extend_from_slice(message_be);
            pad_type1(&digest_info, modulus_len)?
        }
        RsaFormat::DigestInfoPresent => pad_type1(message_be, modulus_len)?,
    };

    let mut message_le = crate::bignum::reverse_copy(&formatted_be);
    let mut out_le = vec![0u8; modulus_len];

    let result = kernel.private_op(&key, &message_le, &mut out_le);
    formatted_be.zeroize();
    message_le.zeroize();

    if result.is_err() {
        out_le.zeroize();
        return Err(Error::ConditionsNotSatisfied);
    }

    let result_be = crate::bignum::reverse_copy(&out_le);
    out_le.zeroize();

    if strip_type2_padding {
        strip_pkcs1_type2(&result_be)
    } else {
        Ok(result_be)
    }
}

/// The decrypt post-pass (`§4.3`, `§8`): `00 02 <>=8 non-zero bytes> 00 <payload>`.
fn strip_pkcs1_type2(block: &[u8]) -> Result<Vec<u8>, Error> {
    if block.len() < 11 || block[0] != 0x00 || block[1] != 0x02 {
        return Err(Error::ConditionsNotSatisfied);
    }
    let mut i = 2;
    while i < block.len() && block[i] != 0x00 {
        i += 1;
    }
    if i >= block.len() || i - 2 < 8 {
        return Err(Error::ConditionsNotSatisfied);
    }
    Ok(block[i + 1..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_type1_has_minimum_eight_ff_bytes() {
        let padded = pad_type1(&[0xAA; 10], 128).unwrap();
        assert_eq!(padded[0], 0x00);
        assert_eq!(padded[1], 0x01);
        let ff_count = padded[2..].iter().take_while(|&&b| b == 0xFF).count();
        assert!(ff_count >= 8);
        assert_eq!(padded[2 + ff_count], 0x00);
        assert_eq!(&padded[128 - 10..], &[0xAA; 10][..]);
    }

    #[test]
    fn pad_type1_rejects_payload_too_large() {
        assert!(pad_type1(&[0u8; 120], 128).is_err());
    }

    #[test]
    fn strip_type2_extracts_payload() {
        let mut block = vec![0x00, 0x02];
        block.extend_from_slice(&[0x11; 8]);
        block.push(0x00);
        block.extend_from_slice(b"hello");
        assert_eq!(strip_pkcs1_type2(&block).unwrap(), b"hello");
    }

    #[test]
    fn strip_type2_rejects_short_padding() {
        let mut block = vec![0x00, 0x02];
        block.extend_from_slice(&[0x11; 4]);
        block.push(0x00);
        block.extend_from_slice(b"hello");
        assert!(strip_pkcs1_type2(&block).is_err());
    }
}
