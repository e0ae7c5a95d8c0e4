//! The status-word taxonomy
//!
//! Every fallible operation in the card returns one of these instead of being allowed to
//! propagate an arbitrary error up to the transport. This mirrors how `bo_tie::att::Error` and
//! `bo_tie::att::pdu::Error` are the only error currency crossing the ATT protocol boundary: a
//! small, closed set of variants that map directly onto values defined by the spec the protocol
//! implements (there: the Bluetooth Core Spec; here: ISO 7816-4).

use core::fmt;

/// An ISO 7816-4 status word, as it would be returned in `SW1 SW2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusWord(pub u16);

impl StatusWord {
    pub const OK: StatusWord = StatusWord(0x9000);
    pub const WRONG_LENGTH: StatusWord = StatusWord(0x6700);
    pub const INCORRECT_FILE_TYPE: StatusWord = StatusWord(0x6981);
    pub const INVALID_DATA: StatusWord = StatusWord(0x6984);
    pub const CONDITIONS_NOT_SATISFIED: StatusWord = StatusWord(0x6985);
    pub const INCORRECT_PARAMETERS_IN_DATA: StatusWord = StatusWord(0x6A80);
    pub const FUNCTION_NOT_SUPPORTED: StatusWord = StatusWord(0x6A81);
    pub const FILE_NOT_FOUND: StatusWord = StatusWord(0x6A82);
    pub const INCORRECT_P1P2: StatusWord = StatusWord(0x6A86);
    pub const LC_LE_INCONSISTENT: StatusWord = StatusWord(0x6A87);
    pub const REFERENCED_DATA_NOT_FOUND: StatusWord = StatusWord(0x6A88);

    /// `0x61xx` "data ready", where `xx` is the response length (`0` stands for 256).
    pub fn data_ready(len: usize) -> StatusWord {
        let xx = if len == 256 { 0 } else { len as u16 };
        StatusWord(0x6100 | xx)
    }

    pub fn is_ok(&self) -> bool {
        self.0 == 0x9000
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

/// The error currency of the whole crate.
///
/// Every handler in the dispatcher returns `Result<T, Error>`; the top-level [`dispatch`](crate::dispatch::dispatch)
/// call collapses any `Err` into a status word via [`Error::status_word`], the same way a
/// `bo_tie::att::Error` is collapsed into an Error Response PDU at the ATT server boundary.
#[derive(Debug)]
pub enum Error {
    /// `0x6700`. Command or field length didn't match what was expected.
    WrongLength,
    /// `0x6981`. The selected file isn't of the type the command requires.
    IncorrectFileType,
    /// `0x6984`. Data supplied to the command was malformed (bad TLV, bad point encoding, ...).
    InvalidData,
    /// `0x6985`. A precondition on the security environment or padding wasn't met.
    ConditionsNotSatisfied,
    /// `0x6A80`. A CRDO/TLV tag inside the command data field was unrecognized or malformed.
    IncorrectParametersInData,
    /// `0x6A81`. The requested algorithm or mode isn't implemented.
    FunctionNotSupported,
    /// `0x6A82`. The referenced file doesn't exist.
    FileNotFound,
    /// `0x6A86`. `P1`/`P2` aren't a valid combination for this instruction.
    IncorrectP1P2,
    /// `0x6A87`. `Lc`/`Le` are inconsistent with each other or the instruction.
    LcLeInconsistent,
    /// `0x6A88`. The GET DATA selector doesn't name anything this card exposes.
    ReferencedDataNotFound,
    /// A lower-level kernel or key-store failure that doesn't have a more specific status word.
    ///
    /// Carries the underlying cause for logging; it is never rendered to the wire beyond
    /// `0x6985`.
    Kernel(String),
}

impl Error {
    pub fn status_word(&self) -> StatusWord {
        match self {
            Error::WrongLength => StatusWord::WRONG_LENGTH,
            Error::IncorrectFileType => StatusWord::INCORRECT_FILE_TYPE,
            Error::InvalidData => StatusWord::INVALID_DATA,
            Error::ConditionsNotSatisfied => StatusWord::CONDITIONS_NOT_SATISFIED,
            Error::IncorrectParametersInData => StatusWord::INCORRECT_PARAMETERS_IN_DATA,
            Error::FunctionNotSupported => StatusWord::FUNCTION_NOT_SUPPORTED,
            Error::FileNotFound => StatusWord::FILE_NOT_FOUND,
            Error::IncorrectP1P2 => StatusWord::INCORRECT_P1P2,
            Error::LcLeInconsistent => StatusWord::LC_LE_INCONSISTENT,
            Error::ReferencedDataNotFound => StatusWord::REFERENCED_DATA_NOT_FOUND,
            Error::Kernel(_) => StatusWord::CONDITIONS_NOT_SATISFIED,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::WrongLength => write!(f, "wrong length"),
            Error::IncorrectFileType => write!(f, "incorrect file type"),
            Error::InvalidData => write!(f, "invalid data"),
            Error::ConditionsNotSatisfied => write!(f, "conditions not satisfied"),
            Error::IncorrectParametersInData => write!(f, "incorrect parameters in data field"),
            Error::FunctionNotSupported => write!(f, "function not supported"),
            Error::FileNotFound => write!(f, "file not found"),
            Error::IncorrectP1P2 => write!(f, "incorrect P1/P2"),
            Error::LcLeInconsistent => write!(f, "Lc/Le inconsistent"),
            Error::ReferencedDataNotFound => write!(f, "referenced data not found"),
            Error::Kernel(msg) => write!(f, "kernel error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
