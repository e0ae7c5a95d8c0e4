//! A reference [`EcKernel`] backed by the per-curve RustCrypto crates (`p256`, `p384`, `p521`,
//! `k256`).
//!
//! One concrete function per curve, generated by a macro the same way `bo_tie::att::TransferFormat`
//! is implemented once per integer width via `impl_transfer_format_for_number!` — the four
//! supported curves (`§4.5`) don't share a single Rust type, so rather than fight the generics
//! this mirrors them with near-identical monomorphic bodies.

use super::EcKernel;
use crate::curves::{CurveId, CurveParams};
use crate::error::Error;
use ecdsa::signature::hazmat::PrehashSigner;
use elliptic_curve::ecdh::diffie_hellman;
use elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use elliptic_curve::{AffinePoint, FieldBytes};
use rand_core::OsRng;

/// The default, RustCrypto-backed kernel. Stateless.
#[derive(Default)]
pub struct DefaultEcKernel;

macro_rules! curve_impl {
    ($module:ident, $curve:ty) => {
        mod $module {
            use super::*;
            use $curve as Curve;

            pub fn sign(private_scalar_be: &[u8], digest: &[u8]) -> Result<(Vec<u8>, Vec<u8>), Error> {
                let signing_key = ecdsa::SigningKey::<Curve>::from_bytes(
                    FieldBytes::<Curve>::from_slice(private_scalar_be),
                )
                .map_err(|e| Error::Kernel(format!("bad EC private key: {e}")))?;

                let signature: ecdsa::Signature<Curve> = signing_key
                    .sign_prehash(digest)
                    .map_err(|e| Error::Kernel(format!("ECDSA signing failed: {e}")))?;

                let (r, s) = signature.split_bytes();
                Ok((r.to_vec(), s.to_vec()))
            }

            pub fn generate() -> Result<(Vec<u8>, Vec<u8>), Error> {
                let signing_key = ecdsa::SigningKey::<Curve>::random(&mut OsRng);
                let verifying_key = signing_key.verifying_key();
                let private_be = signing_key.to_bytes().to_vec();
                let public_uncompressed = verifying_key.to_encoded_point(false).as_bytes().to_vec();
                Ok((private_be, public_uncompressed))
            }

            pub fn derive(
                private_scalar_be: &[u8],
                peer_x_be: &[u8],
                peer_y_be: &[u8],
            ) -> Result<Vec<u8>, Error> {
                let secret_scalar = elliptic_curve::SecretKey::<Curve>::from_bytes(
                    FieldBytes::<Curve>::from_slice(private_scalar_be),
                )
                .map_err(|e| Error::Kernel(format!("bad EC private key: {e}")))?;

                let encoded = elliptic_curve::sec1::EncodedPoint::<Curve>::from_affine_coordinates(
                    FieldBytes::<Curve>::from_slice(peer_x_be),
                    FieldBytes::<Curve>::from_slice(peer_y_be),
                    false,
                );

                let peer_affine: AffinePoint<Curve> =
                    Option::from(AffinePoint::<Curve>::from_encoded_point(&encoded))
                        .ok_or(Error::InvalidData)?;

                let shared = diffie_hellman(&secret_scalar.to_nonzero_scalar(), &peer_affine);
                Ok(shared.raw_secret_bytes().to_vec())
            }
        }
    };
}

curve_impl!(p192_impl, p192::NistP192);
curve_impl!(p256_impl, p256::NistP256);
curve_impl!(p384_impl, p384::NistP384);
curve_impl!(p521_impl, p521::NistP521);
curve_impl!(k256_impl, k256::Secp256k1);

impl EcKernel for DefaultEcKernel {
    fn sign(&self, params: &CurveParams, digest_le: &[u8]) -> Result<(Vec<u8>, Vec<u8>), Error> {
        let private_be = crate::bignum::reverse_copy(&params.private_scalar_le);
        let digest_be = crate::bignum::reverse_copy(digest_le);
        match params.curve {
            CurveId::P192 => p192_impl::sign(&private_be, &digest_be),
            CurveId::P256 => p256_impl::sign(&private_be, &digest_be),
            CurveId::P384 => p384_impl::sign(&private_be, &digest_be),
            CurveId::P521 => p521_impl::sign(&private_be, &digest_be),
            CurveId::Secp256k1 => k256_impl::sign(&private_be, &digest_be),
        }
        .map(|(r, s)| (crate::bignum::reverse_copy(&r), crate::bignum::reverse_copy(&s)))
    }

    fn generate(&self, curve: CurveId) -> Result<(Vec<u8>, Vec<u8>), Error> {
        match curve {
            CurveId::P192 => p192_impl::generate(),
            CurveId::P256 => p256_impl::generate(),
            CurveId::P384 => p384_impl::generate(),
            CurveId::P521 => p521_impl::generate(),
            CurveId::Secp256k1 => k256_impl::generate(),
        }
    }

    fn derive(
        &self,
        params: &CurveParams,
        peer_x_be: &[u8],
        peer_y_be: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let private_be = crate::bignum::reverse_copy(&params.private_scalar_le);
        match params.curve {
            CurveId::P192 => p192_impl::derive(&private_be, peer_x_be, peer_y_be),
            CurveId::P256 => p256_impl::derive(&private_be, peer_x_be, peer_y_be),
            CurveId::P384 => p384_impl::derive(&private_be, peer_x_be, peer_y_be),
            CurveId::P521 => p521_impl::derive(&private_be, peer_x_be, peer_y_be),
            CurveId::Secp256k1 => k256_impl::derive(&private_be, peer_x_be, peer_y_be),
        }
    }
}
