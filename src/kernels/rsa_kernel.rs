//! A reference [`RsaKernel`] backed by the `rsa` crate.
//!
//! This is the "assumed correct" `rsa_calculate` / `rsa_keygen` from `§1` made concrete: CRT
//! private-key application and key generation, both built on `rsa::BigUint` rather than a
//! hand-rolled modular-inverse routine.

use super::{RsaKernel, RsaPrivateKeyMaterial, RsaPrivateParts};
use crate::error::Error;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey};

/// The default, `rsa`-crate-backed kernel. Stateless; one instance can serve every session.
#[derive(Default)]
pub struct DefaultRsaKernel;

impl RsaKernel for DefaultRsaKernel {
    fn private_op(
        &self,
        key: &RsaPrivateKeyMaterial,
        message_le: &[u8],
        out_le: &mut [u8],
    ) -> Result<(), Error> {
        if message_le.len() != key.modulus_len || out_le.len() != key.modulus_len {
            return Err(Error::WrongLength);
        }

        let p = BigUint::from_bytes_be(&crate::bignum::reverse_copy(&key.p));
        let q = BigUint::from_bytes_be(&crate::bignum::reverse_copy(&key.q));
        let d_p = BigUint::from_bytes_be(&crate::bignum::reverse_copy(&key.d_p));
        let d_q = BigUint::from_bytes_be(&crate::bignum::reverse_copy(&key.d_q));
        let q_inv = BigUint::from_bytes_be(&crate::bignum::reverse_copy(&key.q_inv));

        let message_be = crate::bignum::reverse_copy(message_le);
        let c = BigUint::from_bytes_be(&message_be);

        // Plain CRT recombination: m1 = c^dP mod p, m2 = c^dQ mod q, h = qInv*(m1 - m2) mod p,
        // m = m2 + h*q.
        let m1 = c.modpow(&d_p, &p);
        let m2 = c.modpow(&d_q, &q);

        let h = if m1 >= m2 {
            (&q_inv * (&m1 - &m2)) % &p
        } else {
            (&q_inv * (&p - ((&m2 - &m1) % &p))) % &p
        };

        let m = &m2 + &h * &q;

        let m_be = m.to_bytes_be();
        if m_be.len() > key.modulus_len {
            return Err(Error::ConditionsNotSatisfied);
        }

        let mut padded_be = vec![0u8; key.modulus_len];
        padded_be[key.modulus_len - m_be.len()..].copy_from_slice(&m_be);
        let result_le = crate::bignum::reverse_copy(&padded_be);
        out_le.copy_from_slice(&result_le);

        Ok(())
    }

    fn generate(&self, modulus_bits: u16) -> Result<RsaPrivateParts, Error> {
        let mut rng = rand::rngs::OsRng;
        let key = RsaPrivateKey::new(&mut rng, modulus_bits as usize)
            .map_err(|e| Error::Kernel(format!("RSA key generation failed: {e}")))?;

        let primes = key.primes();
        let (p, q) = (primes[0].clone(), primes[1].clone());
        let n = key.n().clone();
        let d = key.d().clone();

        let d_p = &d % (&p - BigUint::from(1u32));
        let d_q = &d % (&q - BigUint::from(1u32));
        // p is prime, so by Fermat's little theorem q^-1 mod p == q^(p-2) mod p.
        let q_inv = q.modpow(&(&p - BigUint::from(2u32)), &p);

        let modulus_len = (modulus_bits as usize + 7) / 8;
        let fit = |v: &BigUint, len: usize| -> Vec<u8> {
            let be = v.to_bytes_be();
            let mut out = vec![0u8; len];
            out[len - be.len()..].copy_from_slice(&be);
            out
        };
        let half_len = modulus_len / 2;

        Ok(RsaPrivateParts {
            p: fit(&p, half_len),
            q: fit(&q, half_len),
            d_p: fit(&d_p, half_len),
            d_q: fit(&d_q, half_len),
            q_inv: fit(&q_inv, half_len),
            modulus: fit(&n, modulus_len),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_key() -> (RsaPrivateKeyMaterial, BigUint, BigUint) {
        // 1024-bit test key material generated once and embedded so tests don't pay RSA
        // keygen's cost on every run; p, q chosen so n is exactly 128 bytes.
        let kernel = DefaultRsaKernel;
        let parts = kernel.generate(1024).unwrap();
        let n = BigUint::from_bytes_be(&parts.modulus);
        let e = BigUint::from(65537u32);
        let material = RsaPrivateKeyMaterial {
            p: parts.p,
            q: parts.q,
            d_p: parts.d_p,
            d_q: parts.d_q,
            q_inv: parts.q_inv,
            modulus_len: parts.modulus.len(),
        };
        (material, n, e)
    }

    #[test]
    fn private_op_inverts_public_op() {
        let (key, n, e) = small_key();
        let kernel = DefaultRsaKernel;

        let msg_be = {
            let mut v = vec![0u8; key.modulus_len];
            v[key.modulus_len - 1] = 0x2A;
            v
        };
        let msg_le = crate::bignum::reverse_copy(&msg_be);

        let mut sig_le = vec![0u8; key.modulus_len];
        kernel.private_op(&key, &msg_le, &mut sig_le).unwrap();
        let sig_be = crate::bignum::reverse_copy(&sig_le);

        let sig_num = BigUint::from_bytes_be(&sig_be);
        let recovered = sig_num.modpow(&e, &n);
        assert_eq!(recovered.to_bytes_be(), vec![0x2A]);
    }
}
