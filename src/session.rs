//! The security environment and response-staging state (`§3`, `§5`, `§9`).
//!
//! The original runs these as process-global mutable statics guarded only by the single-threaded
//! cooperative scheduler. Here they live in one owned [`Session`] value; the dispatcher takes
//! `&mut Session`, so the borrow checker is the thing enforcing "only the command currently
//! executing may touch this" instead of programmer discipline.

/// Which cryptographic operation the security environment has armed (`§3`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Operation {
    #[default]
    None,
    Sign,
    Decrypt,
    Encrypt,
    Ecdh,
}

/// The `sign_algo` byte recognized by `§4.1`'s tag `0x80`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignAlgo {
    /// `0x00`: raw, message length must equal the modulus size.
    RawModulus,
    /// `0x02`: PKCS#1 v1.5 type-1 padding, `DigestInfo` already present in the input.
    DigestInfoPadded,
    /// `0x12`: PKCS#1 v1.5 type-1 padding, SHA-1 `DigestInfo` prefix prepended by us.
    Sha1PreOid,
    /// `0x04`: raw ECDSA.
    RawEcdsa,
}

impl SignAlgo {
    pub fn from_wire(byte: u8) -> Option<SignAlgo> {
        match byte {
            0x00 => Some(SignAlgo::RawModulus),
            0x02 => Some(SignAlgo::DigestInfoPadded),
            0x12 => Some(SignAlgo::Sha1PreOid),
            0x04 => Some(SignAlgo::RawEcdsa),
            _ => None,
        }
    }
}

/// The fragment held across a two-part (`ENVELOPE`-style) decipher (`§3`, `§4.3`).
///
/// Replaces the spec's `R_TMP` flag-plus-shared-buffer with an explicit variant: there is no
/// state where `pending` is both "holds a fragment" and "is ready to return data" at once, so a
/// sum type rules that combination out at compile time rather than by convention.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Pending {
    #[default]
    None,
    /// The first fragment of a two-part decipher, staged by a leading `0x81` indicator byte.
    DecipherFragment(Vec<u8>),
}

/// The security environment plus response-staging state threaded through the dispatcher (`§3`,
/// `§5`).
///
/// An ordinary owned value with no interior mutability: the dispatcher takes `&mut Session`, so
/// there is exactly one mutable borrow in flight per command, the same single-writer invariant
/// the C original needed programmer discipline (no locking, no globals) to uphold.
#[derive(Debug, Default)]
pub struct Session {
    operation: Operation,
    sign_algo: Option<SignAlgo>,
    key_file_id: Option<u16>,
    iv_present: bool,
    pending: Pending,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn sign_algo(&self) -> Option<SignAlgo> {
        self.sign_algo
    }

    pub fn key_file_id(&self) -> Option<u16> {
        self.key_file_id
    }

    pub fn iv_present(&self) -> bool {
        self.iv_present
    }

    pub fn pending(&self) -> &Pending {
        &self.pending
    }

    /// Invalidates the environment. Called on session reset, on entry to every SET/RESTORE,
    /// and on any operation failure (`§7`).
    pub fn invalidate(&mut self) {
        log::trace!("security environment invalidated");
        self.operation = Operation::None;
        self.sign_algo = None;
        self.key_file_id = None;
        self.iv_present = false;
    }

    /// Arms the environment after a successful SET (`§4.1`). Only called once both required
    /// CRDOs (`0x80`, `0x81`) have been seen and `P2` resolved to an [`Operation`].
    pub fn arm(&mut self, operation: Operation, sign_algo: SignAlgo, key_file_id: u16, iv_present: bool) {
        log::debug!(
            "security environment armed: operation={:?} sign_algo={:?} key_file_id={:#06X}",
            operation,
            sign_algo,
            key_file_id
        );
        self.operation = operation;
        self.sign_algo = Some(sign_algo);
        self.key_file_id = Some(key_file_id);
        self.iv_present = iv_present;
    }

    pub fn stage_fragment(&mut self, fragment: Vec<u8>) {
        self.pending = Pending::DecipherFragment(fragment);
    }

    /// Takes and clears the staged fragment, if any. Consumed by the second half of a two-part
    /// decipher; also cleared by any non-matching next command (`§3`).
    pub fn take_fragment(&mut self) -> Option<Vec<u8>> {
        match std::mem::take(&mut self.pending) {
            Pending::None => None,
            Pending::DecipherFragment(bytes) => Some(bytes),
        }
    }

    pub fn clear_pending(&mut self) {
        self.pending = Pending::None;
    }
}
