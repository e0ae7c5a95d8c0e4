//! MANAGE SECURITY ENVIRONMENT (`INS=0x22`, `§4.1`).

use crate::error::Error;
use crate::session::{Operation, Session, SignAlgo};
use crate::tlv::parse_all;

const TAG_ALGORITHM: u8 = 0x80;
const TAG_KEY_FILE_ID: u8 = 0x81;
const TAG_KEY_REF_83: u8 = 0x83;
const TAG_KEY_REF_84: u8 = 0x84;
const TAG_IV_PRESENT: u8 = 0x87;

const P1_RESTORE: u8 = 0xF3;
const P1_SET_ALIAS: u8 = 0xA4;
const P1_SET_41: u8 = 0x41;
const P1_SET_81: u8 = 0x81;

const P2_SIGN: u8 = 0xB6;
const P2_CIPHER: u8 = 0xB8;
const P2_ECDH: u8 = 0xA4;

/// Processes one MANAGE SECURITY ENVIRONMENT command. Every entry invalidates the current
/// environment first (`§4.1`); only a fully successful SET leaves it armed.
pub fn manage_security_environment(
    session: &mut Session,
    p1: u8,
    p2: u8,
    data: &[u8],
) -> Result<(), Error> {
    session.invalidate();

    if p1 == P1_RESTORE {
        // `§9` open question: RESTORE is a stub — it does not re-arm the environment. Preserved
        // deliberately rather than "fixed".
        if !data.is_empty() {
            return Err(Error::LcLeInconsistent);
        }
        return Ok(());
    }

    let (effective_p1, effective_p2) = if p1 == P1_SET_ALIAS {
        (P1_SET_41, P1_SET_ALIAS)
    } else {
        (p1, p2)
    };

    if effective_p1 != P1_SET_41 && effective_p1 != P1_SET_81 {
        return Err(Error::IncorrectP1P2);
    }

    let tlvs = parse_all(data)?;

    let mut algo = None;
    let mut key_file_id = None;
    let mut iv_present = false;

    for tlv in &tlvs {
        match tlv.tag {
            TAG_ALGORITHM => {
                if tlv.value.len() != 1 {
                    return Err(Error::IncorrectParametersInData);
                }
                algo = Some(
                    SignAlgo::from_wire(tlv.value[0]).ok_or(Error::FunctionNotSupported)?,
                );
            }
            TAG_KEY_FILE_ID => {
                if tlv.value.len() != 2 {
                    return Err(Error::IncorrectParametersInData);
                }
                key_file_id = Some(u16::from_be_bytes([tlv.value[0], tlv.value[1]]));
            }
            TAG_KEY_REF_83 | TAG_KEY_REF_84 => {
                // `§9` quirk: some real-world clients set this to `0x01`. The spec text is
                // explicit that only `0x00` is accepted, and the quirk note says to preserve
                // behavior rather than silently relax it, so a non-zero value here still fails
                // exactly like any other malformed CRDO.
                if tlv.value.len() != 1 || tlv.value[0] != 0x00 {
                    return Err(Error::IncorrectParametersInData);
                }
            }
            TAG_IV_PRESENT => {
                iv_present = true;
            }
            _ => return Err(Error::IncorrectParametersInData),
        }
    }

    let (algo, key_file_id) = match (algo, key_file_id) {
        (Some(a), Some(k)) => (a, k),
        _ => return Err(Error::FunctionNotSupported),
    };

    let operation = match effective_p2 {
        P2_SIGN => Operation::Sign,
        P2_CIPHER => {
            if effective_p1 == P1_SET_81 {
                Operation::Encrypt
            } else {
                Operation::Decrypt
            }
        }
        P2_ECDH => Operation::Ecdh,
        _ => return Err(Error::IncorrectP1P2),
    };

    session.arm(operation, algo, key_file_id, iv_present);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_clears_environment_and_succeeds() {
        let mut session = Session::new();
        session.arm(Operation::Sign, SignAlgo::RawEcdsa, 0x4401, false);
        manage_security_environment(&mut session, P1_RESTORE, 0x00, &[]).unwrap();
        assert_eq!(session.operation(), Operation::None);
    }

    #[test]
    fn restore_rejects_nonempty_body() {
        let mut session = Session::new();
        assert!(manage_security_environment(&mut session, P1_RESTORE, 0x00, &[0x00]).is_err());
    }

    #[test]
    fn sets_sign_environment_from_scenario_one() {
        let mut session = Session::new();
        let body = [0x80, 0x01, 0x12, 0x81, 0x02, 0x44, 0x01, 0x83, 0x01, 0x00];
        manage_security_environment(&mut session, P1_SET_41, P2_SIGN, &body).unwrap();
        assert_eq!(session.operation(), Operation::Sign);
        assert_eq!(session.sign_algo(), Some(SignAlgo::Sha1PreOid));
        assert_eq!(session.key_file_id(), Some(0x4401));
    }

    #[test]
    fn sets_ecdh_environment_from_scenario_two() {
        let mut session = Session::new();
        let body = [0x80, 0x01, 0x04, 0x81, 0x02, 0x45, 0x01];
        manage_security_environment(&mut session, P1_SET_ALIAS, 0x00, &body).unwrap();
        assert_eq!(session.operation(), Operation::Ecdh);
        assert_eq!(session.key_file_id(), Some(0x4501));
    }

    #[test]
    fn unsupported_algorithm_byte_clears_environment() {
        let mut session = Session::new();
        let body = [0x80, 0x01, 0x7F, 0x81, 0x02, 0x44, 0x01];
        let result = manage_security_environment(&mut session, P1_SET_41, P2_SIGN, &body);
        assert!(matches!(result, Err(Error::FunctionNotSupported)));
        assert_eq!(session.operation(), Operation::None);
    }

    #[test]
    fn missing_key_file_id_tag_fails() {
        let mut session = Session::new();
        let body = [0x80, 0x01, 0x00];
        let result = manage_security_environment(&mut session, P1_SET_41, P2_SIGN, &body);
        assert!(matches!(result, Err(Error::FunctionNotSupported)));
    }

    #[test]
    fn key_reference_other_than_zero_is_rejected() {
        let mut session = Session::new();
        let body = [0x80, 0x01, 0x00, 0x81, 0x02, 0x44, 0x01, 0x83, 0x01, 0x01];
        let result = manage_security_environment(&mut session, P1_SET_41, P2_SIGN, &body);
        assert!(matches!(result, Err(Error::IncorrectParametersInData)));
    }
}
