//! PERFORM SECURITY OPERATION dispatcher (`INS=0x2A`, `§4.2`).

use crate::curves::prepare_ec_param;
use crate::ecdsa_format::sign_ec_raw;
use crate::error::Error;
use crate::keystore::{FileType, KeyStore};
use crate::kernels::{BlockCipher, EcKernel, RsaKernel};
use crate::rsa_format::{rsa_raw, RsaFormat};
use crate::session::{Operation, Session, SignAlgo};

const P1_SIGN: u8 = 0x9E;
const P2_SIGN: u8 = 0x9A;
const P1_DECRYPT: u8 = 0x80;
const P1_ENCRYPT: u8 = 0x84;

const P2_TWO_PART: u8 = 0x86;
const P2_SINGLE_SHOT: u8 = 0x84;

const FRAGMENT_FIRST: u8 = 0x81;
const FRAGMENT_FINAL: u8 = 0x82;
const FRAGMENT_NONE: u8 = 0x00;

const MAX_CIPHERTEXT_LEN: usize = 256;

/// The collaborators the dispatcher needs; bundled so call sites don't thread five trait objects
/// through every nested function.
pub struct Kernels<'a> {
    pub rsa: &'a dyn RsaKernel,
    pub ec: &'a dyn EcKernel,
    pub des: &'a dyn BlockCipher,
    pub aes: &'a dyn BlockCipher,
}

fn check_environment(session: &Session, store: &dyn KeyStore, expected: Operation) -> Result<(), Error> {
    if session.operation() != expected {
        return Err(Error::ConditionsNotSatisfied);
    }
    let selected = store.selected_file_id()?;
    let armed = session.key_file_id().ok_or(Error::ConditionsNotSatisfied)?;
    if selected != armed {
        return Err(Error::ConditionsNotSatisfied);
    }
    Ok(())
}

fn sign(session: &Session, store: &dyn KeyStore, kernels: &Kernels, message: &[u8]) -> Result<Vec<u8>, Error> {
    check_environment(session, store, Operation::Sign)?;
    let algo = session.sign_algo().ok_or(Error::ConditionsNotSatisfied)?;

    match algo {
        SignAlgo::RawEcdsa => {
            let params = prepare_ec_param(store, None)?;
            sign_ec_raw(kernels.ec, &params, message)
        }
        SignAlgo::RawModulus => rsa_raw(store, kernels.rsa, message, RsaFormat::Raw, false),
        SignAlgo::DigestInfoPadded => rsa_raw(store, kernels.rsa, message, RsaFormat::DigestInfoPresent, false),
        SignAlgo::Sha1PreOid => rsa_raw(store, kernels.rsa, message, RsaFormat::Sha1, false),
    }
}

/// Resolves a two-part/single-shot cipher-text delivery (`§4.3`) into the full ciphertext to run
/// through `rsa_raw`, or `None` if this call was just staging the first fragment.
fn assemble_ciphertext(session: &mut Session, p2: u8, data: &[u8]) -> Result<Option<Vec<u8>>, Error> {
    match p2 {
        P2_TWO_PART => {
            let (indicator, rest) = data.split_first().ok_or(Error::WrongLength)?;
            match *indicator {
                FRAGMENT_FIRST => {
                    session.stage_fragment(rest.to_vec());
                    Ok(None)
                }
                FRAGMENT_FINAL => {
                    let first = session.take_fragment().ok_or(Error::InvalidData)?;
                    let mut full = first;
                    full.extend_from_slice(rest);
                    if full.len() > MAX_CIPHERTEXT_LEN {
                        return Err(Error::InvalidData);
                    }
                    Ok(Some(full))
                }
                FRAGMENT_NONE => {
                    session.clear_pending();
                    Ok(Some(rest.to_vec()))
                }
                _ => Err(Error::InvalidData),
            }
        }
        P2_SINGLE_SHOT => {
            session.clear_pending();
            Ok(Some(data.to_vec()))
        }
        _ => Err(Error::IncorrectP1P2),
    }
}

fn decrypt(
    session: &mut Session,
    store: &dyn KeyStore,
    kernels: &Kernels,
    cla: u8,
    p2: u8,
    data: &[u8],
) -> Result<Option<Vec<u8>>, Error> {
    check_environment(session, store, Operation::Decrypt)?;

    let ciphertext = match assemble_ciphertext(session, p2, data)? {
        Some(bytes) => bytes,
        None => return Ok(None),
    };

    let algo = session.sign_algo().ok_or(Error::ConditionsNotSatisfied)?;
    match store.file_type()? {
        FileType::RsaKey => {
            let strip_padding = matches!(algo, SignAlgo::DigestInfoPadded);
            rsa_raw(store, kernels.rsa, &ciphertext, RsaFormat::Raw, strip_padding).map(Some)
        }
        FileType::Des | FileType::Aes => {
            let mut block = ciphertext;
            crate::symmetric::cipher_block(store, kernels.des, kernels.aes, cla, &mut block, false)?;
            Ok(Some(block))
        }
        _ => Err(Error::IncorrectFileType),
    }
}

fn encrypt(
    session: &mut Session,
    store: &dyn KeyStore,
    kernels: &Kernels,
    cla: u8,
    data: &[u8],
) -> Result<Vec<u8>, Error> {
    check_environment(session, store, Operation::Encrypt)?;
    match store.file_type()? {
        FileType::Des | FileType::Aes => {
            let mut block = data.to_vec();
            crate::symmetric::cipher_block(store, kernels.des, kernels.aes, cla, &mut block, true)?;
            Ok(block)
        }
        _ => Err(Error::IncorrectFileType),
    }
}

/// `INS=0x2A` (`§4.2`). Returns `None` when this call only staged the first half of a two-part
/// decipher and there is nothing to return yet.
pub fn perform_security_operation(
    session: &mut Session,
    store: &dyn KeyStore,
    kernels: &Kernels,
    cla: u8,
    p1: u8,
    p2: u8,
    data: &[u8],
) -> Result<Option<Vec<u8>>, Error> {
    let result = match p1 {
        P1_SIGN if p2 == P2_SIGN => sign(session, store, kernels, data).map(Some),
        P1_DECRYPT => decrypt(session, store, kernels, cla, p2, data),
        P1_ENCRYPT => encrypt(session, store, kernels, cla, data).map(Some),
        _ => Err(Error::IncorrectParametersInData),
    };

    // `Ok(None)` is a two-part decipher's first fragment staged, nothing else: the
    // environment must stay armed for the closing fragment. Every other outcome, a completed
    // sign/decrypt/encrypt or any failure, consumes or breaks the environment and clears it
    // (`§7`).
    match &result {
        Ok(None) => {}
        Ok(Some(_)) | Err(_) => session.invalidate(),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::{FileKeyStore, KeyPartId};
    use crate::kernels::cipher_kernel::{DefaultAesKernel, DefaultDesKernel};
    use crate::kernels::ec_kernel::DefaultEcKernel;
    use crate::kernels::rsa_kernel::DefaultRsaKernel;

    fn test_kernels() -> (DefaultRsaKernel, DefaultEcKernel, DefaultDesKernel, DefaultAesKernel) {
        (
            DefaultRsaKernel::default(),
            DefaultEcKernel::default(),
            DefaultDesKernel::default(),
            DefaultAesKernel::default(),
        )
    }

    #[test]
    fn sign_requires_matching_environment() {
        let mut session = Session::new();
        let store = FileKeyStore::new();
        let (rsa, ec, des, aes) = test_kernels();
        let kernels = Kernels { rsa: &rsa, ec: &ec, des: &des, aes: &aes };

        let result = perform_security_operation(&mut session, &store, &kernels, 0x00, P1_SIGN, P2_SIGN, &[]);
        assert!(matches!(result, Err(Error::ConditionsNotSatisfied)));
    }

    #[test]
    fn two_part_decipher_stages_then_joins() {
        let mut session = Session::new();
        let mut store = FileKeyStore::new();
        store.create_file(0x4401, FileType::RsaKey, 1024);
        store.select(0x4401);

        let rsa_kernel = DefaultRsaKernel::default();
        let parts = rsa_kernel.generate(1024).unwrap();
        store.key_write_part(KeyPartId::RsaP, &parts.p).unwrap();
        store.key_write_part(KeyPartId::RsaQ, &parts.q).unwrap();
        store.key_write_part(KeyPartId::RsaDp, &parts.d_p).unwrap();
        store.key_write_part(KeyPartId::RsaDq, &parts.d_q).unwrap();
        store.key_write_part(KeyPartId::RsaQInv, &parts.q_inv).unwrap();

        session.arm(Operation::Decrypt, SignAlgo::RawModulus, 0x4401, false);

        let (_, ec, des, aes) = test_kernels();
        let kernels = Kernels { rsa: &rsa_kernel, ec: &ec, des: &des, aes: &aes };

        let mut first = vec![FRAGMENT_FIRST];
        first.extend_from_slice(&[0xAB; 64]);
        let staged = perform_security_operation(&mut session, &store, &kernels, 0x00, P1_DECRYPT, P2_TWO_PART, &first).unwrap();
        assert!(staged.is_none());

        let mut second = vec![FRAGMENT_FINAL];
        second.extend_from_slice(&[0xCD; 64]);
        let result = perform_security_operation(&mut session, &store, &kernels, 0x00, P1_DECRYPT, P2_TWO_PART, &second);
        assert!(result.is_ok());
    }

    #[test]
    fn second_fragment_without_first_is_rejected() {
        let mut session = Session::new();
        let mut store = FileKeyStore::new();
        store.create_file(0x4401, FileType::RsaKey, 1024);
        store.select(0x4401);
        session.arm(Operation::Decrypt, SignAlgo::RawModulus, 0x4401, false);

        let (rsa, ec, des, aes) = test_kernels();
        let kernels = Kernels { rsa: &rsa, ec: &ec, des: &des, aes: &aes };

        let mut second = vec![FRAGMENT_FINAL];
        second.extend_from_slice(&[0xCD; 64]);
        let result = perform_security_operation(&mut session, &store, &kernels, 0x00, P1_DECRYPT, P2_TWO_PART, &second);
        assert!(result.is_err());
    }
}
