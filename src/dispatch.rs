//! The top-level `INS` router (`§2`: "transport → command dispatcher → ... → response staging").
//!
//! Ties every command handler to one [`Command`]-in, [`Response`]-out entry point, the same role
//! `bo_tie::att::server::Server::process_acl_data` plays for ATT opcodes: look at one byte,
//! forward to the matching handler, collapse any error into the wire's error currency.

use crate::activate::activate_applet;
use crate::apdu::{Command, Response};
use crate::card::CardConfig;
use crate::ecdh::handle_general_authenticate;
use crate::error::Error;
use crate::get_data::get_data;
use crate::keygen::{generate_ec_key, generate_rsa_key};
use crate::keystore::{FileType, KeyStore};
use crate::kernels::{BlockCipher, EcKernel, RsaKernel};
use crate::mse::manage_security_environment;
use crate::pso::{perform_security_operation, Kernels};
use crate::put_data::put_data;
use crate::session::Session;

const INS_MANAGE_SECURITY_ENVIRONMENT: u8 = 0x22;
const INS_PERFORM_SECURITY_OPERATION: u8 = 0x2A;
const INS_GENERATE_KEY: u8 = 0x46;
const INS_GENERAL_AUTHENTICATE: u8 = 0x86;
const INS_GET_DATA: u8 = 0xCA;
const INS_PUT_DATA: u8 = 0xDA;
const INS_ACTIVATE_APPLET: u8 = 0x44;

/// Every collaborator the dispatcher needs to service one command.
pub struct Card<'a> {
    pub config: &'a CardConfig,
    pub rsa: &'a dyn RsaKernel,
    pub ec: &'a dyn EcKernel,
    pub des: &'a dyn BlockCipher,
    pub aes: &'a dyn BlockCipher,
}

impl<'a> Card<'a> {
    fn kernels(&self) -> Kernels<'a> {
        Kernels { rsa: self.rsa, ec: self.ec, des: self.des, aes: self.aes }
    }
}

fn generate_key(store: &mut dyn KeyStore, card: &Card, input: &[u8]) -> Result<Vec<u8>, Error> {
    match store.file_type()? {
        FileType::RsaKey => {
            generate_rsa_key(store, card.config, card.rsa, input)?;
            Ok(Vec::new())
        }
        FileType::EcNist | FileType::EcOsEidSecp256k1 => generate_ec_key(store, card.ec, input),
        _ => Err(Error::IncorrectFileType),
    }
}

/// Dispatches one parsed [`Command`] to its handler and collapses the result into a [`Response`],
/// the way every other handler's `Result<T, Error>` ultimately does at this one seam.
pub fn dispatch(session: &mut Session, store: &mut dyn KeyStore, card: &Card, command: &Command) -> Response {
    log::trace!(
        "dispatch CLA={:#04X} INS={:#04X} P1={:#04X} P2={:#04X} Lc={}",
        command.cla,
        command.ins,
        command.p1,
        command.p2,
        command.data.len()
    );

    let result = match command.ins {
        INS_MANAGE_SECURITY_ENVIRONMENT => {
            manage_security_environment(session, command.p1, command.p2, &command.data)
                .map(|()| Vec::new())
        }
        INS_PERFORM_SECURITY_OPERATION => perform_security_operation(
            session,
            store,
            &card.kernels(),
            command.cla,
            command.p1,
            command.p2,
            &command.data,
        )
        .map(Option::unwrap_or_default),
        INS_GENERATE_KEY => generate_key(store, card, &command.data),
        INS_GENERAL_AUTHENTICATE => {
            handle_general_authenticate(session, store, card.ec, command.p1, command.p2, &command.data)
        }
        INS_GET_DATA => get_data(store, card.config, command.p1, command.p2),
        INS_PUT_DATA => put_data(store, command.p1, command.p2, &command.data).map(|()| Vec::new()),
        INS_ACTIVATE_APPLET => activate_applet(session, store, &command.data).map(|()| Vec::new()),
        _ => Err(Error::FunctionNotSupported),
    };

    match result {
        Ok(data) => Response::ok(data),
        Err(err) => Response::error(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardConfig;
    use crate::keystore::{FileKeyStore, KeyPartId};
    use crate::kernels::cipher_kernel::{DefaultAesKernel, DefaultDesKernel};
    use crate::kernels::ec_kernel::DefaultEcKernel;
    use crate::kernels::rsa_kernel::DefaultRsaKernel;

    fn test_card<'a>(
        config: &'a CardConfig,
        rsa: &'a DefaultRsaKernel,
        ec: &'a DefaultEcKernel,
        des: &'a DefaultDesKernel,
        aes: &'a DefaultAesKernel,
    ) -> Card<'a> {
        Card { config, rsa, ec, des, aes }
    }

    #[test]
    fn unknown_instruction_is_function_not_supported() {
        let mut session = Session::new();
        let mut store = FileKeyStore::new();
        let (config, rsa, ec, des, aes) = (
            CardConfig::default(),
            DefaultRsaKernel::default(),
            DefaultEcKernel::default(),
            DefaultDesKernel::default(),
            DefaultAesKernel::default(),
        );
        let card = test_card(&config, &rsa, &ec, &des, &aes);
        let command = Command::new(0x00, 0xFF, 0x00, 0x00, Vec::new(), None);
        let response = dispatch(&mut session, &mut store, &card, &command);
        assert_eq!(response.status_word, crate::error::StatusWord::FUNCTION_NOT_SUPPORTED);
    }

    #[test]
    fn scenario_six_mse_bad_algorithm_is_rejected() {
        let mut session = Session::new();
        let mut store = FileKeyStore::new();
        let (config, rsa, ec, des, aes) = (
            CardConfig::default(),
            DefaultRsaKernel::default(),
            DefaultEcKernel::default(),
            DefaultDesKernel::default(),
            DefaultAesKernel::default(),
        );
        let card = test_card(&config, &rsa, &ec, &des, &aes);

        let body = vec![0x80, 0x01, 0x7F, 0x81, 0x02, 0x44, 0x01];
        let command = Command::new(0x00, INS_MANAGE_SECURITY_ENVIRONMENT, 0x41, 0xB6, body, None);
        let response = dispatch(&mut session, &mut store, &card, &command);
        assert_eq!(response.status_word, crate::error::StatusWord::FUNCTION_NOT_SUPPORTED);
        assert_eq!(session.operation(), crate::session::Operation::None);
    }

    #[test]
    fn scenario_one_end_to_end_sign() {
        let mut session = Session::new();
        let mut store = FileKeyStore::new();
        store.create_file(0x4401, FileType::RsaKey, 1024);
        store.select(0x4401);

        let rsa = DefaultRsaKernel::default();
        let parts = rsa.generate(1024).unwrap();
        store.key_write_part(KeyPartId::RsaP, &parts.p).unwrap();
        store.key_write_part(KeyPartId::RsaQ, &parts.q).unwrap();
        store.key_write_part(KeyPartId::RsaDp, &parts.d_p).unwrap();
        store.key_write_part(KeyPartId::RsaDq, &parts.d_q).unwrap();
        store.key_write_part(KeyPartId::RsaQInv, &parts.q_inv).unwrap();
        store.key_write_part(KeyPartId::RsaModulus, &parts.modulus).unwrap();

        let (config, ec, des, aes) = (
            CardConfig::default(),
            DefaultEcKernel::default(),
            DefaultDesKernel::default(),
            DefaultAesKernel::default(),
        );
        let card = test_card(&config, &rsa, &ec, &des, &aes);

        let mse_body = vec![0x80, 0x01, 0x12, 0x81, 0x02, 0x44, 0x01];
        let mse_cmd = Command::new(0x00, INS_MANAGE_SECURITY_ENVIRONMENT, 0x41, 0xB6, mse_body, None);
        let mse_response = dispatch(&mut session, &mut store, &card, &mse_cmd);
        assert_eq!(mse_response.status_word, crate::error::StatusWord::OK);

        let digest = [0x42u8; 20];
        let sign_cmd = Command::new(0x00, INS_PERFORM_SECURITY_OPERATION, 0x9E, 0x9A, digest.to_vec(), None);
        let sign_response = dispatch(&mut session, &mut store, &card, &sign_cmd);
        assert_eq!(sign_response.data.len(), 128);

        let n = rsa::BigUint::from_bytes_be(&parts.modulus);
        let e = rsa::BigUint::from(65537u32);
        let sig = rsa::BigUint::from_bytes_be(&sign_response.data);
        let recovered = sig.modpow(&e, &n);
        let recovered_be = {
            let mut v = recovered.to_bytes_be();
            while v.len() < 128 {
                v.insert(0, 0);
            }
            v
        };

        assert_eq!(&recovered_be[recovered_be.len() - 20..], &digest[..]);
    }
}
