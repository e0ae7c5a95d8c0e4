//! The file-system boundary (`fs_*`, `§6`)
//!
//! File selection, access control, and key-part storage are explicitly out of scope for the
//! command processor (`§1`); the core only ever reaches them through [`KeyStore`]. This mirrors
//! how `bo_tie`'s Security Manager never touches an L2CAP socket directly — it's handed a
//! `ConnectionChannel` trait object and calls `send`/`receive` on it.
//!
//! [`FileKeyStore`] is the crate's reference implementation: a directory of `bincode`-encoded
//! key parts, one file per (card file id, part id). It exists so the crate is runnable and so
//! the property tests in `tests/` have something real to drive; a production deployment would
//! likely swap this for whatever the actual card OS's file system looks like.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use zeroize::Zeroize;

/// File types this card recognizes (`§3`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FileType {
    RsaKey,
    EcNist,
    EcOsEidSecp256k1,
    Des,
    Aes,
    Other(u8),
}

impl FileType {
    pub fn from_tag(tag: u8) -> FileType {
        match tag {
            0x11 => FileType::RsaKey,
            0x22 => FileType::EcNist,
            0x23 => FileType::EcOsEidSecp256k1,
            0x19 => FileType::Des,
            0x29 => FileType::Aes,
            other => FileType::Other(other),
        }
    }

    pub fn tag(&self) -> u8 {
        match self {
            FileType::RsaKey => 0x11,
            FileType::EcNist => 0x22,
            FileType::EcOsEidSecp256k1 => 0x23,
            FileType::Des => 0x19,
            FileType::Aes => 0x29,
            FileType::Other(b) => *b,
        }
    }
}

/// The part-id byte a key part is tagged with in storage (`§3`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyPartId {
    RsaP,
    RsaQ,
    RsaDp,
    RsaDq,
    RsaQInv,
    RsaModulus,
    RsaModulusPart1,
    RsaModulusPart2,
    RsaPublicExponent,
    /// Precomputed Montgomery companion `n' = -N^-1 mod 2^w` for `p` (bit 5 of the on-wire
    /// part-id selects this companion form, `§3`).
    RsaNPrimeP,
    RsaNPrimeQ,
    EcPrivate,
    EcPublic,
    Symmetric,
}

impl KeyPartId {
    /// Decodes the on-wire part-id byte used by PUT DATA key upload (`§4.9`). Bit 5 (`0x20`)
    /// selects the `n'` companion form for RSA `p`/`q` parts.
    pub fn from_wire(byte: u8) -> Result<KeyPartId, Error> {
        let companion = byte & 0x20 != 0;
        match byte & !0x20 {
            0x01 => Ok(if companion { KeyPartId::RsaNPrimeP } else { KeyPartId::RsaP }),
            0x02 => Ok(if companion { KeyPartId::RsaNPrimeQ } else { KeyPartId::RsaQ }),
            0x03 => Ok(KeyPartId::RsaDp),
            0x04 => Ok(KeyPartId::RsaDq),
            0x05 => Ok(KeyPartId::RsaQInv),
            0x06 => Ok(KeyPartId::RsaModulus),
            0x07 => Ok(KeyPartId::RsaModulusPart1),
            0x08 => Ok(KeyPartId::RsaModulusPart2),
            0x09 => Ok(KeyPartId::RsaPublicExponent),
            0x0A => Ok(KeyPartId::EcPrivate),
            0x0B => Ok(KeyPartId::EcPublic),
            0x0C => Ok(KeyPartId::Symmetric),
            _ => Err(Error::IncorrectParametersInData),
        }
    }
}

/// PIN metadata exposed through GET DATA `0xB0..0xBF` (`§4.9`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinInfo {
    pub tries_left: u8,
    pub max_tries: u8,
    pub min_length: u8,
    pub max_length: u8,
}

/// An access-condition byte pair, as returned by GET DATA `0xAC`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessCondition(pub u8, pub u8);

/// Card lifecycle states, as tracked by ACTIVATE APPLET / PUT DATA applet init (`§4.9`, `§4.10`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    Creation,
    Initialization,
    Operational,
    Terminated,
}

/// The file-system boundary the command processor consumes (`fs_*`, `§6`).
///
/// All operations are relative to "the currently selected file", matching the spec's stateful
/// `fs_get_selected()`; selection itself (and access-control evaluation) is out of scope and
/// assumed to have already happened before a command reaches this crate.
pub trait KeyStore {
    fn selected_file_id(&self) -> Result<u16, Error>;
    fn file_type(&self) -> Result<FileType, Error>;
    /// File size in bits (RSA modulus bits, EC curve bits, or symmetric key bits).
    fn file_size_bits(&self) -> Result<u16, Error>;

    /// Reads a key part belonging to the currently selected file into `out`, returning the
    /// number of bytes written. `out` MUST be large enough for the largest part this card
    /// supports (2048-bit RSA modulus half = 128 bytes is the largest single part).
    fn key_read_part(&self, out: &mut [u8], part: KeyPartId) -> Result<usize, Error>;

    /// Writes a key part to the currently selected file.
    fn key_write_part(&mut self, part: KeyPartId, data: &[u8]) -> Result<(), Error>;

    fn return_pin_info(&self, pin_ref: u8) -> Result<PinInfo, Error>;
    fn list_files(&self, selector: u8) -> Result<Vec<u8>, Error>;
    fn access_condition(&self) -> Result<AccessCondition, Error>;
    fn initialize_pin(&mut self, pin_ref: u8, value: &[u8]) -> Result<(), Error>;
    fn erase_card(&mut self) -> Result<(), Error>;
    fn lifecycle(&self) -> Result<Lifecycle, Error>;
    fn set_lifecycle(&mut self, lifecycle: Lifecycle) -> Result<(), Error>;

    /// 20-byte card identity exposed through GET DATA `0xA0`.
    fn card_id(&self) -> Result<[u8; 20], Error>;
    /// 11-byte card capability descriptor exposed through GET DATA `0xAA`.
    fn card_capabilities(&self) -> Result<[u8; 11], Error>;
}

/// One card file's worth of key parts, as held by [`FileKeyStore`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct StoredFile {
    file_type: Option<FileType>,
    size_bits: u16,
    parts: BTreeMap<u8, Vec<u8>>,
}

fn part_tag(part: KeyPartId) -> u8 {
    match part {
        KeyPartId::RsaP => 0x01,
        KeyPartId::RsaQ => 0x02,
        KeyPartId::RsaDp => 0x03,
        KeyPartId::RsaDq => 0x04,
        KeyPartId::RsaQInv => 0x05,
        KeyPartId::RsaModulus => 0x06,
        KeyPartId::RsaModulusPart1 => 0x07,
        KeyPartId::RsaModulusPart2 => 0x08,
        KeyPartId::RsaPublicExponent => 0x09,
        KeyPartId::RsaNPrimeP => 0x01 | 0x20,
        KeyPartId::RsaNPrimeQ => 0x02 | 0x20,
        KeyPartId::EcPrivate => 0x0A,
        KeyPartId::EcPublic => 0x0B,
        KeyPartId::Symmetric => 0x0C,
    }
}

/// A `bincode`-persisted directory of card files, keyed by 16-bit file id.
///
/// Serialization uses the same `serde` + `bincode` pair the teacher crate already depends on
/// (`Cargo.toml`: `serde`, `bincode`) rather than a hand-rolled format.
#[derive(Default, Serialize, Deserialize)]
pub struct FileKeyStore {
    files: BTreeMap<u16, StoredFile>,
    selected: Option<u16>,
    pins: BTreeMap<u8, (PinInfo, Vec<u8>)>,
    lifecycle: Lifecycle,
    card_id_bytes: [u8; 20],
    capabilities: [u8; 11],
    #[serde(skip)]
    backing_path: Option<PathBuf>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Lifecycle::Creation
    }
}

impl FileKeyStore {
    pub fn new() -> Self {
        FileKeyStore::default()
    }

    /// Loads from a `bincode`-encoded file if it exists, otherwise starts empty. Subsequent
    /// `save` calls write back to the same path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let mut store = if path.exists() {
            let bytes = std::fs::read(&path)
                .map_err(|e| Error::Kernel(format!("reading key store: {e}")))?;
            bincode::deserialize(&bytes)
                .map_err(|e| Error::Kernel(format!("decoding key store: {e}")))?
        } else {
            FileKeyStore::default()
        };
        store.backing_path = Some(path);
        Ok(store)
    }

    pub fn save(&self) -> Result<(), Error> {
        if let Some(path) = &self.backing_path {
            let bytes = bincode::serialize(self)
                .map_err(|e| Error::Kernel(format!("encoding key store: {e}")))?;
            std::fs::write(path, bytes)
                .map_err(|e| Error::Kernel(format!("writing key store: {e}")))?;
        }
        Ok(())
    }

    pub fn select(&mut self, file_id: u16) {
        self.selected = Some(file_id);
    }

    pub fn create_file(&mut self, file_id: u16, file_type: FileType, size_bits: u16) {
        self.files.insert(
            file_id,
            StoredFile { file_type: Some(file_type), size_bits, parts: BTreeMap::new() },
        );
    }

    pub fn set_card_id(&mut self, bytes: [u8; 20]) {
        self.card_id_bytes = bytes;
    }

    pub fn set_capabilities(&mut self, bytes: [u8; 11]) {
        self.capabilities = bytes;
    }

    fn selected(&self) -> Result<&StoredFile, Error> {
        let id = self.selected.ok_or(Error::FileNotFound)?;
        self.files.get(&id).ok_or(Error::FileNotFound)
    }

    fn selected_mut(&mut self) -> Result<&mut StoredFile, Error> {
        let id = self.selected.ok_or(Error::FileNotFound)?;
        self.files.get_mut(&id).ok_or(Error::FileNotFound)
    }
}

impl KeyStore for FileKeyStore {
    fn selected_file_id(&self) -> Result<u16, Error> {
        self.selected.ok_or(Error::FileNotFound)
    }

    fn file_type(&self) -> Result<FileType, Error> {
        self.selected()?.file_type.ok_or(Error::FileNotFound)
    }

    fn file_size_bits(&self) -> Result<u16, Error> {
        Ok(self.selected()?.size_bits)
    }

    fn key_read_part(&self, out: &mut [u8], part: KeyPartId) -> Result<usize, Error> {
        let file = self.selected()?;
        let bytes = file.parts.get(&part_tag(part)).ok_or(Error::ReferencedDataNotFound)?;
        if bytes.len() > out.len() {
            return Err(Error::WrongLength);
        }
        out[..bytes.len()].copy_from_slice(bytes);
        Ok(bytes.len())
    }

    fn key_write_part(&mut self, part: KeyPartId, data: &[u8]) -> Result<(), Error> {
        let tag = part_tag(part);
        let file = self.selected_mut()?;
        file.parts.insert(tag, data.to_vec());
        Ok(())
    }

    fn return_pin_info(&self, pin_ref: u8) -> Result<PinInfo, Error> {
        self.pins
            .get(&pin_ref)
            .map(|(info, _)| info.clone())
            .ok_or(Error::ReferencedDataNotFound)
    }

    fn list_files(&self, _selector: u8) -> Result<Vec<u8>, Error> {
        let mut out = Vec::with_capacity(self.files.len() * 2);
        for id in self.files.keys() {
            out.extend_from_slice(&id.to_be_bytes());
        }
        Ok(out)
    }

    fn access_condition(&self) -> Result<AccessCondition, Error> {
        self.selected()?;
        Ok(AccessCondition(0x00, 0x00))
    }

    fn initialize_pin(&mut self, pin_ref: u8, value: &[u8]) -> Result<(), Error> {
        let info = PinInfo {
            tries_left: 3,
            max_tries: 3,
            min_length: 4,
            max_length: 16,
        };
        let mut stored = value.to_vec();
        self.pins.insert(pin_ref, (info, stored.clone()));
        stored.zeroize();
        Ok(())
    }

    fn erase_card(&mut self) -> Result<(), Error> {
        self.files.clear();
        self.pins.clear();
        self.selected = None;
        self.lifecycle = Lifecycle::Creation;
        Ok(())
    }

    fn lifecycle(&self) -> Result<Lifecycle, Error> {
        Ok(self.lifecycle)
    }

    fn set_lifecycle(&mut self, lifecycle: Lifecycle) -> Result<(), Error> {
        self.lifecycle = lifecycle;
        Ok(())
    }

    fn card_id(&self) -> Result<[u8; 20], Error> {
        Ok(self.card_id_bytes)
    }

    fn card_capabilities(&self) -> Result<[u8; 11], Error> {
        Ok(self.capabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_key_part() {
        let mut store = FileKeyStore::new();
        store.create_file(0x4401, FileType::RsaKey, 1024);
        store.select(0x4401);
        store.key_write_part(KeyPartId::RsaModulus, &[0xAB; 128]).unwrap();

        let mut out = [0u8; 256];
        let len = store.key_read_part(&mut out, KeyPartId::RsaModulus).unwrap();
        assert_eq!(len, 128);
        assert_eq!(&out[..128], &[0xAB; 128][..]);
    }

    #[test]
    fn unselected_file_is_not_found() {
        let store = FileKeyStore::new();
        assert!(matches!(store.file_type(), Err(Error::FileNotFound)));
    }

    #[test]
    fn part_tag_round_trips_through_wire_decoding() {
        for (part, wire) in [
            (KeyPartId::RsaP, 0x01u8),
            (KeyPartId::RsaNPrimeP, 0x21),
            (KeyPartId::RsaQ, 0x02),
            (KeyPartId::RsaNPrimeQ, 0x22),
            (KeyPartId::EcPrivate, 0x0A),
        ] {
            assert_eq!(KeyPartId::from_wire(wire).unwrap(), part);
            assert_eq!(part_tag(part), wire);
        }
    }
}
