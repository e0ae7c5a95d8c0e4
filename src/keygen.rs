//! GENERATE KEY (`INS=0x46`, `§4.8`).

use crate::card::CardConfig;
use crate::curves::CurveId;
use crate::error::Error;
use crate::keystore::{FileType, KeyPartId, KeyStore};
use crate::kernels::{EcKernel, RsaKernel};

/// DER encoding of `INTEGER 65537` (`0x010001`), the only public exponent this card issues
/// (`§4.8`): `SEQUENCE { INTEGER 1 (version/placeholder), OCTET STRING len 3, 01 00 01 }` as the
/// fixed optional input body the command accepts verbatim, anything else rejected.
const PUBLIC_EXPONENT_65537_DER: [u8; 7] = [0x30, 0x05, 0x81, 0x03, 0x01, 0x00, 0x01];

/// GENERATE KEY on an RSA file (`§4.8`): the optional input, if present, MUST be exactly
/// [`PUBLIC_EXPONENT_65537_DER`]. Splits the modulus into two part-files for 2048-bit keys.
pub fn generate_rsa_key(
    store: &mut dyn KeyStore,
    config: &CardConfig,
    kernel: &dyn RsaKernel,
    input: &[u8],
) -> Result<(), Error> {
    if !input.is_empty() && input != PUBLIC_EXPONENT_65537_DER {
        return Err(Error::InvalidData);
    }
    if store.file_type()? != FileType::RsaKey {
        return Err(Error::IncorrectFileType);
    }

    let bits = store.file_size_bits()?;
    if !config.rsa_modulus_size_is_valid(bits) {
        return Err(Error::IncorrectFileType);
    }

    log::debug!("generating {bits}-bit RSA key");
    let parts = kernel.generate(bits)?;

    store.key_write_part(KeyPartId::RsaP, &parts.p)?;
    store.key_write_part(KeyPartId::RsaQ, &parts.q)?;
    store.key_write_part(KeyPartId::RsaDp, &parts.d_p)?;
    store.key_write_part(KeyPartId::RsaDq, &parts.d_q)?;
    store.key_write_part(KeyPartId::RsaQInv, &parts.q_inv)?;

    if bits == 2048 {
        let half = parts.modulus.len() / 2;
        store.key_write_part(KeyPartId::RsaModulusPart1, &parts.modulus[..half])?;
        store.key_write_part(KeyPartId::RsaModulusPart2, &parts.modulus[half..])?;
    } else {
        store.key_write_part(KeyPartId::RsaModulus, &parts.modulus)?;
    }

    Ok(())
}

/// GENERATE KEY on an EC file (`§4.8`): no input body permitted. Returns the public point TLV
/// (tag `0x86`) to hand back to the caller.
pub fn generate_ec_key(store: &mut dyn KeyStore, kernel: &dyn EcKernel, input: &[u8]) -> Result<Vec<u8>, Error> {
    if !input.is_empty() {
        return Err(Error::InvalidData);
    }

    let file_type = store.file_type()?;
    if file_type != FileType::EcNist && file_type != FileType::EcOsEidSecp256k1 {
        return Err(Error::IncorrectFileType);
    }
    let bits = store.file_size_bits()?;
    let curve = CurveId::from_file_size(file_type, bits)?;

    log::debug!("generating EC key on {curve:?}");
    let (private_be, public_point) = kernel.generate(curve)?;

    store.key_write_part(KeyPartId::EcPrivate, &private_be)?;
    store.key_write_part(KeyPartId::EcPublic, &public_point)?;

    Ok(crate::tlv::encode_tlv(0x86, &public_point))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::FileKeyStore;
    use crate::kernels::ec_kernel::DefaultEcKernel;
    use crate::kernels::rsa_kernel::DefaultRsaKernel;

    #[test]
    fn generates_1024_bit_rsa_key_with_valid_exponent_body() {
        let mut store = FileKeyStore::new();
        store.create_file(0x4401, FileType::RsaKey, 1024);
        store.select(0x4401);

        let config = CardConfig::default();
        let kernel = DefaultRsaKernel::default();
        generate_rsa_key(&mut store, &config, &kernel, &PUBLIC_EXPONENT_65537_DER).unwrap();

        let mut out = [0u8; 64];
        let len = store.key_read_part(&mut out, KeyPartId::RsaP).unwrap();
        assert_eq!(len, 64);
    }

    #[test]
    fn rejects_non_default_exponent_body() {
        let mut store = FileKeyStore::new();
        store.create_file(0x4401, FileType::RsaKey, 1024);
        store.select(0x4401);

        let config = CardConfig::default();
        let kernel = DefaultRsaKernel::default();
        let result = generate_rsa_key(&mut store, &config, &kernel, &[0x01, 0x00, 0x00, 0x01]);
        assert!(matches!(result, Err(Error::InvalidData)));
    }

    #[test]
    fn generates_p256_key_and_returns_point_tlv() {
        let mut store = FileKeyStore::new();
        store.create_file(0x4501, FileType::EcNist, 256);
        store.select(0x4501);

        let kernel = DefaultEcKernel::default();
        let tlv = generate_ec_key(&mut store, &kernel, &[]).unwrap();
        assert_eq!(tlv[0], 0x86);
        assert_eq!(tlv[1] as usize, tlv.len() - 2);
        assert_eq!(tlv[2], 0x04);
    }

    #[test]
    fn ec_keygen_rejects_nonempty_input() {
        let mut store = FileKeyStore::new();
        store.create_file(0x4501, FileType::EcNist, 256);
        store.select(0x4501);

        let kernel = DefaultEcKernel::default();
        assert!(generate_ec_key(&mut store, &kernel, &[0x00]).is_err());
    }
}
