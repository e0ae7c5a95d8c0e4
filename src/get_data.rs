//! GET DATA (`INS=0xCA`, `P1=0x01`, `§4.9`).

use crate::card::CardConfig;
use crate::curves::CurveId;
use crate::error::Error;
use crate::keystore::{FileType, KeyPartId, KeyStore};

const RSA_ALGO_ID: [u8; 2] = [0x92, 0x00];

const SEL_RSA_DESCRIPTOR: u8 = 0x00;
const SEL_RSA_MODULUS: u8 = 0x01;
const SEL_RSA_PUBLIC_EXPONENT: u8 = 0x02;
const SEL_EC_POINT: u8 = 0x86;
const SEL_CARD_ID: u8 = 0xA0;
const SEL_CARD_CAPABILITIES: u8 = 0xAA;
const SEL_ACCESS_CONDITION: u8 = 0xAC;

fn read_part(store: &dyn KeyStore, part: KeyPartId, max_len: usize) -> Result<Vec<u8>, Error> {
    let mut buf = vec![0u8; max_len];
    let len = store.key_read_part(&mut buf, part)?;
    buf.truncate(len);
    Ok(buf)
}

fn rsa_descriptor(store: &dyn KeyStore) -> Result<Vec<u8>, Error> {
    let bits = store.file_size_bits()?;
    let exponent = read_part(store, KeyPartId::RsaPublicExponent, 8).unwrap_or_else(|_| vec![0x01, 0x00, 0x01]);
    let mut out = Vec::with_capacity(4 + exponent.len());
    out.extend_from_slice(&RSA_ALGO_ID);
    out.extend_from_slice(&bits.to_be_bytes());
    out.extend_from_slice(&exponent);
    Ok(out)
}

fn ec_public_point_tlv(store: &dyn KeyStore) -> Result<Vec<u8>, Error> {
    let point = read_part(store, KeyPartId::EcPublic, 1 + 2 * 66)?;
    Ok(crate::tlv::encode_tlv(0x30, &point))
}

/// `0x81..=0x85`: curve parameter access, per `§4.9`: prime, a, b, generator (`Y || X`, note the
/// reversed coordinate order relative to the uncompressed point encoding), order.
fn curve_parameter(store: &dyn KeyStore, selector: u8) -> Result<Vec<u8>, Error> {
    let file_type = store.file_type()?;
    if file_type != FileType::EcNist && file_type != FileType::EcOsEidSecp256k1 {
        return Err(Error::IncorrectFileType);
    }
    let bits = store.file_size_bits()?;
    let curve = CurveId::from_file_size(file_type, bits)?;

    Ok(match selector {
        0x81 => curve.prime().to_vec(),
        0x82 => curve.a().to_vec(),
        0x83 => curve.b().to_vec(),
        0x84 => {
            let (gx, gy) = curve.generator();
            let mut out = gy.to_vec();
            out.extend_from_slice(gx);
            out
        }
        0x85 => curve.order().to_vec(),
        _ => unreachable!("caller already matched 0x81..=0x85"),
    })
}

/// `0xB0..=0xBF`: PIN info for PIN `selector & 0x0F`, packed as
/// `tries_left, max_tries, min_length, max_length`.
fn pin_info(store: &dyn KeyStore, selector: u8) -> Result<Vec<u8>, Error> {
    let info = store.return_pin_info(selector & 0x0F)?;
    Ok(vec![info.tries_left, info.max_tries, info.min_length, info.max_length])
}

/// `INS=0xCA P1=0x01` (`§4.9`). `config` backs the card-wide `0xA0`/`0xAA` selectors when the
/// key store itself has nothing configured.
pub fn get_data(store: &dyn KeyStore, config: &CardConfig, p1: u8, p2: u8) -> Result<Vec<u8>, Error> {
    if p1 != 0x01 {
        return Err(Error::IncorrectP1P2);
    }

    match p2 {
        SEL_RSA_DESCRIPTOR => rsa_descriptor(store),
        SEL_RSA_MODULUS => {
            let bits = store.file_size_bits()?;
            if bits == 2048 {
                let mut modulus = read_part(store, KeyPartId::RsaModulusPart1, 128)?;
                modulus.extend(read_part(store, KeyPartId::RsaModulusPart2, 128)?);
                Ok(modulus)
            } else {
                read_part(store, KeyPartId::RsaModulus, 256)
            }
        }
        SEL_RSA_PUBLIC_EXPONENT => read_part(store, KeyPartId::RsaPublicExponent, 8),
        SEL_EC_POINT => ec_public_point_tlv(store),
        0x81..=0x85 => curve_parameter(store, p2),
        SEL_CARD_ID => {
            let from_store = store.card_id();
            Ok(from_store.unwrap_or_else(|_| config.card_id()).to_vec())
        }
        SEL_CARD_CAPABILITIES => {
            let from_store = store.card_capabilities();
            Ok(from_store.unwrap_or_else(|_| config.capabilities()).to_vec())
        }
        SEL_ACCESS_CONDITION => {
            let ac = store.access_condition()?;
            Ok(vec![ac.0, ac.1])
        }
        0xA1..=0xA6 => store.list_files(p2),
        0xB0..=0xBF => pin_info(store, p2),
        _ => Err(Error::ReferencedDataNotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::FileKeyStore;

    #[test]
    fn returns_modulus_from_scenario_four() {
        let mut store = FileKeyStore::new();
        store.create_file(0x4401, FileType::RsaKey, 1024);
        store.select(0x4401);
        store.key_write_part(KeyPartId::RsaModulus, &[0xAB; 128]).unwrap();

        let config = CardConfig::default();
        let modulus = get_data(&store, &config, 0x01, SEL_RSA_MODULUS).unwrap();
        assert_eq!(modulus.len(), 128);
        assert_eq!(modulus, vec![0xAB; 128]);
    }

    #[test]
    fn unknown_selector_is_referenced_data_not_found() {
        let store = FileKeyStore::new();
        let config = CardConfig::default();
        let result = get_data(&store, &config, 0x01, 0x55);
        assert!(matches!(result, Err(Error::ReferencedDataNotFound)));
    }

    #[test]
    fn wrong_p1_is_incorrect_p1p2() {
        let store = FileKeyStore::new();
        let config = CardConfig::default();
        assert!(matches!(get_data(&store, &config, 0x00, 0x01), Err(Error::IncorrectP1P2)));
    }

    #[test]
    fn card_id_falls_back_to_config() {
        let store = FileKeyStore::new();
        let config = CardConfig::builder().card_id([0x77; 20]).build();
        let id = get_data(&store, &config, 0x01, SEL_CARD_ID).unwrap();
        assert_eq!(id, vec![0x77; 20]);
    }
}
