//! Symmetric cipher path (`§4.7`): DES/3DES or AES single-block encipher/decipher.

use crate::error::Error;
use crate::keystore::{FileType, KeyPartId, KeyStore};
use crate::kernels::BlockCipher;

/// `0x80`: the "experimental class" CLA marker symmetric operations require (`§4.7`).
const SYMMETRIC_CLA: u8 = 0x80;

/// Distributes parity bits across a 7-byte seed to produce the 8-byte DES key `des_56to64` would
/// (`§4.7`): each output byte takes 7 bits from the seed and an odd-parity bit in bit 0.
fn des_56_to_64(seed: &[u8; 7]) -> [u8; 8] {
    let mut bits = [0u8; 56];
    for (byte_idx, byte) in seed.iter().enumerate() {
        for bit_idx in 0..8 {
            bits[byte_idx * 8 + bit_idx] = (byte >> (7 - bit_idx)) & 1;
        }
    }
    let mut out = [0u8; 8];
    for (i, chunk) in bits.chunks(7).enumerate() {
        let mut byte = 0u8;
        for (bit_idx, &bit) in chunk.iter().enumerate() {
            byte |= bit << (7 - bit_idx);
        }
        let ones: u32 = chunk.iter().map(|&b| b as u32).sum();
        let parity = if ones % 2 == 0 { 1 } else { 0 };
        out[i] = byte | parity;
    }
    out
}

/// Expands the stored key material to the form the cipher needs, per `§4.7`: 7 bytes via
/// `des_56to64`, 16 bytes (2-key 3DES) derives a third sub-key equal to the first.
fn expand_des_key(raw: &[u8]) -> Result<Vec<u8>, Error> {
    match raw.len() {
        7 => {
            let seed: [u8; 7] = raw.try_into().unwrap();
            Ok(des_56_to_64(&seed).to_vec())
        }
        8 | 24 => Ok(raw.to_vec()),
        16 => {
            let mut expanded = raw.to_vec();
            expanded.extend_from_slice(&raw[..8]);
            Ok(expanded)
        }
        _ => Err(Error::WrongLength),
    }
}

fn read_symmetric_key(store: &dyn KeyStore) -> Result<Vec<u8>, Error> {
    let mut buf = vec![0u8; 32];
    let len = store.key_read_part(&mut buf, KeyPartId::Symmetric)?;
    buf.truncate(len);
    Ok(buf)
}

/// Runs one block through the cipher selected by the currently selected file's type (`§4.7`).
/// `cla` MUST be [`SYMMETRIC_CLA`]; anything else is *Function not supported*.
pub fn cipher_block(
    store: &dyn KeyStore,
    des_kernel: &dyn BlockCipher,
    aes_kernel: &dyn BlockCipher,
    cla: u8,
    block: &mut [u8],
    encrypt: bool,
) -> Result<(), Error> {
    if cla != SYMMETRIC_CLA {
        return Err(Error::FunctionNotSupported);
    }

    let file_type = store.file_type()?;
    let raw_key = read_symmetric_key(store)?;

    let (kernel, key): (&dyn BlockCipher, Vec<u8>) = match file_type {
        FileType::Des => {
            if block.len() != 8 {
                return Err(Error::WrongLength);
            }
            (des_kernel, expand_des_key(&raw_key)?)
        }
        FileType::Aes => {
            if block.len() != 16 {
                return Err(Error::WrongLength);
            }
            if !matches!(raw_key.len(), 16 | 24 | 32) {
                return Err(Error::WrongLength);
            }
            (aes_kernel, raw_key)
        }
        _ => return Err(Error::IncorrectFileType),
    };

    if encrypt {
        kernel.encrypt_block(&key, block)
    } else {
        kernel.decrypt_block(&key, block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn des_56_to_64_sets_odd_parity() {
        let seed = [0u8; 7];
        let expanded = des_56_to_64(&seed);
        for byte in expanded {
            assert_eq!(byte.count_ones() % 2, 1);
        }
    }

    #[test]
    fn expand_2key_3des_derives_third_subkey() {
        let raw = [0xAAu8; 16];
        let expanded = expand_des_key(&raw).unwrap();
        assert_eq!(expanded.len(), 24);
        assert_eq!(&expanded[16..], &raw[..8]);
    }

    #[test]
    fn expand_rejects_unsupported_length() {
        assert!(expand_des_key(&[0u8; 10]).is_err());
    }
}
