//! The arithmetic-kernel boundary (`§1`, `§6`)
//!
//! "The arithmetic kernels: modular-inverse-backed RSA (...), EC arithmetic (...), symmetric
//! block ciphers (...), and constant tables (...). Their correctness is assumed; the core
//! consumes them." In this crate that boundary is three traits; the core (`rsa_format`,
//! `ecdsa_format`, `ecdh`, `symmetric`) only ever calls through them, the same way
//! `bo_tie::sm::toolbox` only ever calls into `ring::agreement` rather than implementing its own
//! field arithmetic.

pub mod cipher_kernel;
pub mod ec_kernel;
pub mod rsa_kernel;

use crate::curves::CurveParams;
use crate::error::Error;

/// Fixed-modulus raw RSA: `c = m^e mod n` / `m = c^d mod n`, plus CRT key generation.
///
/// Every buffer here is little-endian, matching "all arithmetic in the reversed little-endian
/// buffer" (`§4.3`); the endian flip back to wire order happens in `rsa_format`, never inside a
/// kernel implementation.
pub trait RsaKernel {
    /// Applies the private-key (CRT) operation to `message_le` (already padded/formatted,
    /// exactly `key.modulus_len` bytes) and writes the result into `out_le` (also
    /// `key.modulus_len` bytes).
    fn private_op(
        &self,
        key: &RsaPrivateKeyMaterial,
        message_le: &[u8],
        out_le: &mut [u8],
    ) -> Result<(), Error>;

    /// Generates an RSA key pair with the fixed public exponent 65537 (`§4.8`).
    fn generate(&self, modulus_bits: u16) -> Result<RsaPrivateParts, Error>;
}

/// The CRT key material `rsa_raw` hands to the kernel, read straight out of the key store
/// (`§3`), big-endian.
pub struct RsaPrivateKeyMaterial {
    pub p: Vec<u8>,
    pub q: Vec<u8>,
    pub d_p: Vec<u8>,
    pub d_q: Vec<u8>,
    pub q_inv: Vec<u8>,
    pub modulus_len: usize,
}

/// The CRT representation of a freshly generated RSA private key (`§3`).
pub struct RsaPrivateParts {
    pub p: Vec<u8>,
    pub q: Vec<u8>,
    pub d_p: Vec<u8>,
    pub d_q: Vec<u8>,
    pub q_inv: Vec<u8>,
    pub modulus: Vec<u8>,
}

/// ECDSA signing, EC key generation, and scalar-point derivation (ECDH), each bound to a
/// particular curve via [`CurveParams`].
pub trait EcKernel {
    /// Signs a little-endian, curve-scalar-sized digest, returning `(r, s)` as little-endian
    /// big-nums of the same width (`§4.4`).
    fn sign(&self, params: &CurveParams, digest_le: &[u8]) -> Result<(Vec<u8>, Vec<u8>), Error>;

    /// Generates a fresh key pair on the curve named by `params.curve`, ignoring any existing
    /// scalar in `params` (`§4.8`). Returns `(private_scalar_be, public_point_uncompressed)`.
    fn generate(&self, curve: crate::curves::CurveId) -> Result<(Vec<u8>, Vec<u8>), Error>;

    /// Computes `d * peer_point` and returns the big-endian X coordinate (`§4.6`).
    fn derive(
        &self,
        params: &CurveParams,
        peer_x_be: &[u8],
        peer_y_be: &[u8],
    ) -> Result<Vec<u8>, Error>;
}

/// Single-block symmetric encipher/decipher (`§4.7`).
pub trait BlockCipher {
    fn block_size(&self) -> usize;
    fn encrypt_block(&self, key: &[u8], block: &mut [u8]) -> Result<(), Error>;
    fn decrypt_block(&self, key: &[u8], block: &mut [u8]) -> Result<(), Error>;
}
