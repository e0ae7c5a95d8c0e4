//! A reference [`BlockCipher`] backed by the `des` and `aes` crates.
//!
//! Key-size dispatch (56/64/2-key-3DES/3-key-3DES, AES-128/192/256) happens one level up in
//! `symmetric.rs`, which already knows the file type; this kernel only runs a single block
//! through whichever cipher it's handed, the same narrow job `des_run`/`aes_run` have in `§4.7`.

use super::BlockCipher;
use crate::error::Error;
use cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use des::{TdesEde2, TdesEde3};

#[derive(Default)]
pub struct DefaultDesKernel;

#[derive(Default)]
pub struct DefaultAesKernel;

impl BlockCipher for DefaultDesKernel {
    fn block_size(&self) -> usize {
        8
    }

    fn encrypt_block(&self, key: &[u8], block: &mut [u8]) -> Result<(), Error> {
        if block.len() != 8 {
            return Err(Error::WrongLength);
        }
        let mut generic_block = cipher::generic_array::GenericArray::clone_from_slice(block);
        match key.len() {
            8 => {
                let cipher = des::Des::new_from_slice(key)
                    .map_err(|e| Error::Kernel(format!("bad DES key: {e}")))?;
                cipher.encrypt_block(&mut generic_block);
            }
            16 => {
                let cipher = TdesEde2::new_from_slice(key)
                    .map_err(|e| Error::Kernel(format!("bad 2-key 3DES key: {e}")))?;
                cipher.encrypt_block(&mut generic_block);
            }
            24 => {
                let cipher = TdesEde3::new_from_slice(key)
                    .map_err(|e| Error::Kernel(format!("bad 3-key 3DES key: {e}")))?;
                cipher.encrypt_block(&mut generic_block);
            }
            _ => return Err(Error::WrongLength),
        }
        block.copy_from_slice(&generic_block);
        Ok(())
    }

    fn decrypt_block(&self, key: &[u8], block: &mut [u8]) -> Result<(), Error> {
        if block.len() != 8 {
            return Err(Error::WrongLength);
        }
        let mut generic_block = cipher::generic_array::GenericArray::clone_from_slice(block);
        match key.len() {
            8 => {
                let cipher = des::Des::new_from_slice(key)
                    .map_err(|e| Error::Kernel(format!("bad DES key: {e}")))?;
                cipher.decrypt_block(&mut generic_block);
            }
            16 => {
                let cipher = TdesEde2::new_from_slice(key)
                    .map_err(|e| Error::Kernel(format!("bad 2-key 3DES key: {e}")))?;
                cipher.decrypt_block(&mut generic_block);
            }
            24 => {
                let cipher = TdesEde3::new_from_slice(key)
                    .map_err(|e| Error::Kernel(format!("bad 3-key 3DES key: {e}")))?;
                cipher.decrypt_block(&mut generic_block);
            }
            _ => return Err(Error::WrongLength),
        }
        block.copy_from_slice(&generic_block);
        Ok(())
    }
}

impl BlockCipher for DefaultAesKernel {
    fn block_size(&self) -> usize {
        16
    }

    fn encrypt_block(&self, key: &[u8], block: &mut [u8]) -> Result<(), Error> {
        if block.len() != 16 {
            return Err(Error::WrongLength);
        }
        let mut generic_block = cipher::generic_array::GenericArray::clone_from_slice(block);
        match key.len() {
            16 => aes::Aes128::new_from_slice(key)
                .map_err(|e| Error::Kernel(format!("bad AES-128 key: {e}")))?
                .encrypt_block(&mut generic_block),
            24 => aes::Aes192::new_from_slice(key)
                .map_err(|e| Error::Kernel(format!("bad AES-192 key: {e}")))?
                .encrypt_block(&mut generic_block),
            32 => aes::Aes256::new_from_slice(key)
                .map_err(|e| Error::Kernel(format!("bad AES-256 key: {e}")))?
                .encrypt_block(&mut generic_block),
            _ => return Err(Error::WrongLength),
        }
        block.copy_from_slice(&generic_block);
        Ok(())
    }

    fn decrypt_block(&self, key: &[u8], block: &mut [u8]) -> Result<(), Error> {
        if block.len() != 16 {
            return Err(Error::WrongLength);
        }
        let mut generic_block = cipher::generic_array::GenericArray::clone_from_slice(block);
        match key.len() {
            16 => aes::Aes128::new_from_slice(key)
                .map_err(|e| Error::Kernel(format!("bad AES-128 key: {e}")))?
                .decrypt_block(&mut generic_block),
            24 => aes::Aes192::new_from_slice(key)
                .map_err(|e| Error::Kernel(format!("bad AES-192 key: {e}")))?
                .decrypt_block(&mut generic_block),
            32 => aes::Aes256::new_from_slice(key)
                .map_err(|e| Error::Kernel(format!("bad AES-256 key: {e}")))?
                .decrypt_block(&mut generic_block),
            _ => return Err(Error::WrongLength),
        }
        block.copy_from_slice(&generic_block);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aes128_decrypt_inverts_encrypt() {
        let kernel = DefaultAesKernel;
        let key = [0x2Bu8; 16];
        let mut block = [0x11u8; 16];
        let original = block;
        kernel.encrypt_block(&key, &mut block).unwrap();
        assert_ne!(block, original);
        kernel.decrypt_block(&key, &mut block).unwrap();
        assert_eq!(block, original);
    }

    #[test]
    fn des_rejects_wrong_block_length() {
        let kernel = DefaultDesKernel;
        let key = [0u8; 8];
        let mut block = [0u8; 7];
        assert!(kernel.encrypt_block(&key, &mut block).is_err());
    }
}
