//! A MyEID-compatible cryptographic smart-card applet emulator.
//!
//! This crate is the APDU-level command processor: it parses ISO 7816-4 commands, maintains the
//! security-environment state machine, and dispatches to RSA/EC/symmetric primitives with the
//! padding and encoding MyEID-compatible clients expect. The arithmetic kernels (RSA, EC,
//! block ciphers) and the persistent file system are consumed only through the traits in
//! [`kernels`] and [`keystore`]; reference implementations of both are provided so the crate is
//! runnable end to end.
//!
//! [`dispatch::dispatch`] is the single entry point: hand it a parsed [`apdu::Command`] plus the
//! mutable [`session::Session`] and [`keystore::KeyStore`] for the current card, and it returns
//! an [`apdu::Response`] ready to encode back onto the wire.

pub mod activate;
pub mod apdu;
pub mod bignum;
pub mod card;
pub mod curves;
pub mod dispatch;
pub mod ecdh;
pub mod ecdsa_format;
pub mod error;
pub mod get_data;
pub mod keygen;
pub mod kernels;
pub mod keystore;
pub mod mse;
pub mod pso;
pub mod put_data;
pub mod rsa_format;
pub mod session;
pub mod symmetric;
pub mod tlv;
pub mod transport;

pub use apdu::{Command, Response};
pub use card::CardConfig;
pub use dispatch::{dispatch, Card};
pub use error::{Error, Result, StatusWord};
pub use session::Session;
