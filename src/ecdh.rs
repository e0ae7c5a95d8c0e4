//! ECDH derivation / GENERAL AUTHENTICATE responder (`INS=0x86`, `§4.6`).

use crate::curves::{prepare_ec_param, CurveParams};
use crate::error::Error;
use crate::keystore::KeyStore;
use crate::kernels::EcKernel;
use crate::session::{Operation, Session};
use crate::tlv::{parse_all, Tlv};

const DYNAMIC_AUTH_TEMPLATE: u8 = 0x7C;
const KEY_IDENTIFIER: u8 = 0x80;
const PEER_PUBLIC_KEY: u8 = 0x85;
const UNCOMPRESSED_POINT_PREFIX: u8 = 0x04;

/// Parses the body of a GENERAL AUTHENTICATE command and returns the peer's uncompressed point
/// `(X, Y)`, each `scalar_size` bytes, big-endian (`§4.6`).
fn parse_peer_point(body: &[u8], scalar_size: usize) -> Result<(Vec<u8>, Vec<u8>), Error> {
    // `parse_all` reports malformed BER-TLV as `IncorrectParametersInData` (the MSE CRDO status
    // word); this command's body-parsing section uses *Invalid data* for every malformed case
    // instead (`§4.6`), so remap here rather than propagate the wrong status word.
    let outer = parse_all(body).map_err(|_| Error::InvalidData)?;
    let template = outer
        .iter()
        .find(|tlv| tlv.tag == DYNAMIC_AUTH_TEMPLATE)
        .ok_or(Error::InvalidData)?;

    let inner = parse_all(template.value).map_err(|_| Error::InvalidData)?;
    let mut peer_point: Option<&Tlv> = None;
    for tlv in &inner {
        match tlv.tag {
            KEY_IDENTIFIER => continue,
            PEER_PUBLIC_KEY => peer_point = Some(tlv),
            _ => return Err(Error::InvalidData),
        }
    }

    let point = peer_point.ok_or(Error::InvalidData)?;
    let expected_len = 1 + 2 * scalar_size;
    if point.value.len() != expected_len || point.value[0] != UNCOMPRESSED_POINT_PREFIX {
        return Err(Error::InvalidData);
    }

    let x = point.value[1..1 + scalar_size].to_vec();
    let y = point.value[1 + scalar_size..].to_vec();
    Ok((x, y))
}

/// Computes `d·P` for the peer point carried in `body` and returns the big-endian X-coordinate
/// of the result (`§4.6`: "`Y'` is discarded; this matches X-coordinate ECDH").
pub fn general_authenticate(
    kernel: &dyn EcKernel,
    params: &CurveParams,
    body: &[u8],
) -> Result<Vec<u8>, Error> {
    let scalar_size = params.curve.scalar_size();
    let (peer_x, peer_y) = parse_peer_point(body, scalar_size)?;
    kernel.derive(params, &peer_x, &peer_y)
}

/// `INS=0x86` (`§4.6`). Preconditions: `operation = Ecdh`, the selected file matches the armed
/// key file, and `P1 = P2 = 0x00`.
pub fn handle_general_authenticate(
    session: &Session,
    store: &dyn KeyStore,
    kernel: &dyn EcKernel,
    p1: u8,
    p2: u8,
    body: &[u8],
) -> Result<Vec<u8>, Error> {
    if p1 != 0x00 || p2 != 0x00 {
        return Err(Error::IncorrectP1P2);
    }
    if session.operation() != Operation::Ecdh {
        return Err(Error::ConditionsNotSatisfied);
    }
    let armed = session.key_file_id().ok_or(Error::ConditionsNotSatisfied)?;
    if store.selected_file_id()? != armed {
        return Err(Error::ConditionsNotSatisfied);
    }

    let params = prepare_ec_param(store, None)?;
    general_authenticate(kernel, &params, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_uncompressed_peer_point() {
        let mut value = vec![0x04];
        value.extend_from_slice(&[0xAA; 32]);
        value.extend_from_slice(&[0xBB; 32]);

        let mut inner = vec![PEER_PUBLIC_KEY, value.len() as u8];
        inner.extend_from_slice(&value);

        let mut body = vec![DYNAMIC_AUTH_TEMPLATE, inner.len() as u8];
        body.extend_from_slice(&inner);

        let (x, y) = parse_peer_point(&body, 32).unwrap();
        assert_eq!(x, vec![0xAA; 32]);
        assert_eq!(y, vec![0xBB; 32]);
    }

    #[test]
    fn rejects_missing_outer_template() {
        let body = vec![0x7D, 0x00];
        assert!(matches!(parse_peer_point(&body, 32), Err(Error::InvalidData)));
    }

    #[test]
    fn rejects_unrecognized_inner_tag() {
        let mut body = vec![DYNAMIC_AUTH_TEMPLATE, 0x02];
        body.extend_from_slice(&[0x99, 0x00]);
        assert!(matches!(parse_peer_point(&body, 32), Err(Error::InvalidData)));
    }

    #[test]
    fn general_authenticate_rejects_wrong_p1p2() {
        use crate::keystore::FileKeyStore;
        use crate::kernels::ec_kernel::DefaultEcKernel;

        let session = Session::new();
        let store = FileKeyStore::new();
        let kernel = DefaultEcKernel::default();
        let result = handle_general_authenticate(&session, &store, &kernel, 0x01, 0x00, &[]);
        assert!(matches!(result, Err(Error::IncorrectP1P2)));
    }

    #[test]
    fn general_authenticate_derives_shared_x_coordinate() {
        use crate::keystore::{FileKeyStore, FileType, KeyPartId};
        use crate::kernels::ec_kernel::DefaultEcKernel;
        use crate::session::SignAlgo;

        let kernel = DefaultEcKernel::default();
        let (card_private, _card_public) = kernel.generate(crate::curves::CurveId::P256).unwrap();
        let (_peer_private, peer_public) = kernel.generate(crate::curves::CurveId::P256).unwrap();

        let mut store = FileKeyStore::new();
        store.create_file(0x4501, FileType::EcNist, 256);
        store.select(0x4501);
        store.key_write_part(KeyPartId::EcPrivate, &card_private).unwrap();

        let mut session = Session::new();
        session.arm(Operation::Ecdh, SignAlgo::RawEcdsa, 0x4501, false);

        let mut inner = vec![PEER_PUBLIC_KEY, peer_public.len() as u8];
        inner.extend_from_slice(&peer_public);
        let mut body = vec![DYNAMIC_AUTH_TEMPLATE, inner.len() as u8];
        body.extend_from_slice(&inner);

        let shared_x = handle_general_authenticate(&session, &store, &kernel, 0x00, 0x00, &body).unwrap();
        assert_eq!(shared_x.len(), 32);
    }
}
