//! Command and response APDUs
//!
//! Mirrors the way `bo_tie::att::pdu` separates an opcode/parameter pair from the bytes that
//! carry it on the wire: [`Command`] is the parsed header plus body of an incoming APDU, and
//! [`Response`] is what [`crate::dispatch::dispatch`] hands back to the transport to encode.

/// A parsed ISO 7816-4 command APDU (case 1/2/3/4, short length form only — this card never
/// negotiates extended length).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    /// The command data field, if any (`Lc` bytes).
    pub data: Vec<u8>,
    /// The expected response length (`Le`), if the client supplied one.
    pub le: Option<u16>,
}

impl Command {
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8, data: Vec<u8>, le: Option<u16>) -> Self {
        Command { cla, ins, p1, p2, data, le }
    }
}

/// The outcome of processing one [`Command`]: a status word and, on the data-ready path, the
/// response body. This is the Rust expression of the spec's "response buffer" (`§3`): rather
/// than mutating a shared 256-byte scratch buffer and a side flag, the dispatcher returns an
/// owned value and the borrow checker throws away the scratch the moment this is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status_word: crate::error::StatusWord,
    pub data: Vec<u8>,
}

impl Response {
    pub fn ok(data: Vec<u8>) -> Self {
        let status_word = if data.is_empty() {
            crate::error::StatusWord::OK
        } else {
            crate::error::StatusWord::data_ready(data.len())
        };
        Response { status_word, data }
    }

    pub fn no_data() -> Self {
        Response { status_word: crate::error::StatusWord::OK, data: Vec::new() }
    }

    pub fn error(err: crate::error::Error) -> Self {
        log::error!("command failed: {}", err);
        Response { status_word: err.status_word(), data: Vec::new() }
    }
}
