//! The APDU transport boundary (`card_io_*`, `§6`).
//!
//! Byte-level I/O and the NULL-byte keep-alive stretching during long operations are explicitly
//! out of scope for the command processor (`§1`); this crate only ever reaches the transport
//! through [`Transport`], the same way `bo_tie`'s Security Manager is handed a `ConnectionChannel`
//! trait object rather than a raw socket.

/// The cooperative hand-off the spec calls out in `§9`: "model as a cooperative `Progress`
/// callback the kernels can invoke; the transport decides whether to emit null bytes." Long
/// arithmetic paths call [`Transport::keep_alive`] before blocking; a transport backed by real
/// hardware uses it to start emitting NULL bytes, a test transport can make it a no-op.
pub trait Transport {
    /// Confirms the command header has been read and the transport is ready to deliver the
    /// remaining `Lc` bytes of the command body.
    fn confirm_header(&mut self, cla: u8, ins: u8, p1: u8, p2: u8);

    /// Reads the remaining command bytes (`Lc` of them) into the message buffer.
    fn read_command_body(&mut self, len: usize) -> Vec<u8>;

    /// Called immediately before a long arithmetic operation (RSA private-key op, EC scalar
    /// multiplication) blocks the single command-processing thread.
    fn keep_alive(&mut self);
}

/// A transport that does no real I/O and never emits keep-alives; used by the test suite and by
/// embedders that already have the command bytes in hand (e.g. from a PC/SC reader driver one
/// layer up).
#[derive(Default)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn confirm_header(&mut self, _cla: u8, _ins: u8, _p1: u8, _p2: u8) {}

    fn read_command_body(&mut self, _len: usize) -> Vec<u8> {
        Vec::new()
    }

    fn keep_alive(&mut self) {
        log::trace!("keep-alive (null transport, no-op)");
    }
}
