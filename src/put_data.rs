//! PUT DATA (`INS=0xDA`, `P1=0x01`, `§4.9`).

use crate::curves::CurveId;
use crate::error::Error;
use crate::keystore::{FileType, KeyPartId, KeyStore, Lifecycle};

const SEL_INITIALIZE_APPLET: u8 = 0xE0;
const SEL_PIN_RANGE_START: u8 = 0x01;
const SEL_PIN_RANGE_END: u8 = 0x0E;
const SEL_KEY_UPLOAD_START: u8 = 0x80;
const SEL_KEY_UPLOAD_END: u8 = 0x8B;
const SEL_SYMMETRIC_UPLOAD: u8 = 0xA0;

fn expected_len_for_rsa_part(part: KeyPartId, modulus_len: usize) -> Option<usize> {
    let half = modulus_len / 2;
    match part {
        KeyPartId::RsaP
        | KeyPartId::RsaQ
        | KeyPartId::RsaDp
        | KeyPartId::RsaDq
        | KeyPartId::RsaQInv
        | KeyPartId::RsaNPrimeP
        | KeyPartId::RsaNPrimeQ
        | KeyPartId::RsaModulusPart1
        | KeyPartId::RsaModulusPart2 => Some(half),
        KeyPartId::RsaModulus => Some(modulus_len),
        KeyPartId::RsaPublicExponent => None,
        _ => None,
    }
}

fn upload_rsa_part(store: &mut dyn KeyStore, part: KeyPartId, data: &[u8]) -> Result<(), Error> {
    let bits = store.file_size_bits()?;
    let modulus_len = ((bits as usize) + 7) / 8;
    if let Some(expected) = expected_len_for_rsa_part(part, modulus_len) {
        if data.len() != expected {
            return Err(Error::WrongLength);
        }
    }
    store.key_write_part(part, data)
}

fn upload_ec_part(store: &mut dyn KeyStore, part: KeyPartId, data: &[u8]) -> Result<(), Error> {
    let file_type = store.file_type()?;
    let bits = store.file_size_bits()?;
    let curve = CurveId::from_file_size(file_type, bits)?;
    let scalar_size = curve.scalar_size();

    let expected = match part {
        KeyPartId::EcPrivate => scalar_size,
        KeyPartId::EcPublic => 1 + 2 * scalar_size,
        _ => return Err(Error::IncorrectParametersInData),
    };
    if data.len() != expected {
        return Err(Error::WrongLength);
    }
    store.key_write_part(part, data)
}

/// `0x80..=0x8B`: upload one key part. The wire part-id is `p2 - 0x80`, the same numbering
/// [`KeyPartId::from_wire`] already decodes for the companion-bit form used elsewhere (`§3`);
/// only the non-companion ids `0x01..=0x0B` are reachable through this selector range, since
/// `0x0C` (the symmetric part) is uploaded through [`SEL_SYMMETRIC_UPLOAD`] instead.
fn upload_key_part(store: &mut dyn KeyStore, p2: u8, data: &[u8]) -> Result<(), Error> {
    let wire_id = p2 - SEL_KEY_UPLOAD_START;
    let part = KeyPartId::from_wire(wire_id)?;

    match store.file_type()? {
        FileType::RsaKey => upload_rsa_part(store, part, data),
        FileType::EcNist | FileType::EcOsEidSecp256k1 => upload_ec_part(store, part, data),
        _ => Err(Error::IncorrectFileType),
    }
}

fn upload_symmetric_key(store: &mut dyn KeyStore, data: &[u8]) -> Result<(), Error> {
    match store.file_type()? {
        FileType::Des => {
            if !matches!(data.len(), 7 | 8 | 16 | 24) {
                return Err(Error::WrongLength);
            }
        }
        FileType::Aes => {
            if !matches!(data.len(), 16 | 24 | 32) {
                return Err(Error::WrongLength);
            }
        }
        _ => return Err(Error::IncorrectFileType),
    }
    store.key_write_part(KeyPartId::Symmetric, data)
}

/// `INS=0xDA P1=0x01` (`§4.9`).
pub fn put_data(store: &mut dyn KeyStore, p1: u8, p2: u8, data: &[u8]) -> Result<(), Error> {
    if p1 != 0x01 {
        return Err(Error::IncorrectP1P2);
    }

    match p2 {
        SEL_INITIALIZE_APPLET => {
            if !data.is_empty() {
                return Err(Error::LcLeInconsistent);
            }
            store.set_lifecycle(Lifecycle::Initialization)
        }
        SEL_PIN_RANGE_START..=SEL_PIN_RANGE_END => store.initialize_pin(p2, data),
        SEL_KEY_UPLOAD_START..=SEL_KEY_UPLOAD_END => upload_key_part(store, p2, data),
        SEL_SYMMETRIC_UPLOAD => upload_symmetric_key(store, data),
        _ => Err(Error::ReferencedDataNotFound),
    }
}
