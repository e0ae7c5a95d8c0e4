//! A minimal BER-TLV walker
//!
//! The source this crate emulates only ever needs one-byte tags, and lengths that are either a
//! single byte (`0x00..=0x7F`) or the `0x81 LL` long form. Anything else (multi-byte tags,
//! `0x82`+ long-form lengths, indefinite length) is rejected rather than guessed at, matching
//! `§9`'s re-architecture guidance: "a single BER-TLV iterator that handles one-byte and
//! `0x81 LL` length forms and rejects multi-byte long-form, matching source behavior."

use crate::error::Error;

/// One decoded tag/value pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tlv<'a> {
    pub tag: u8,
    pub value: &'a [u8],
}

/// Iterates the top-level tag/value pairs of a BER-TLV encoded byte string.
///
/// `Tlv::next` surfaces parse errors as `Some(Err(_))` rather than silently truncating, so a
/// caller can distinguish "no more TLVs" from "the rest of the buffer is garbage".
pub struct TlvIter<'a> {
    remaining: &'a [u8],
}

impl<'a> TlvIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        TlvIter { remaining: data }
    }
}

impl<'a> Iterator for TlvIter<'a> {
    type Item = Result<Tlv<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }

        let tag = self.remaining[0];

        let (len, len_width) = match self.remaining.get(1) {
            None => return Some(Err(Error::IncorrectParametersInData)),
            Some(&0x81) => match self.remaining.get(2) {
                Some(&l) => (l as usize, 2),
                None => return Some(Err(Error::IncorrectParametersInData)),
            },
            Some(&l) if l < 0x80 => (l as usize, 1),
            Some(_) => return Some(Err(Error::IncorrectParametersInData)),
        };

        let value_start = 1 + len_width;
        let value_end = value_start + len;

        if value_end > self.remaining.len() {
            return Some(Err(Error::IncorrectParametersInData));
        }

        let value = &self.remaining[value_start..value_end];
        self.remaining = &self.remaining[value_end..];

        Some(Ok(Tlv { tag, value }))
    }
}

/// Parses every TLV in `data`, failing on the first malformed entry.
pub fn parse_all(data: &[u8]) -> Result<Vec<Tlv<'_>>, Error> {
    TlvIter::new(data).collect()
}

/// Encodes one tag/value pair using the same length forms [`TlvIter`] parses: a one-byte short
/// form for `value.len() < 0x80`, otherwise the `0x81 LL` long form. `value.len()` must fit in a
/// `u8` (true of everything this card emits: the largest is a 133-byte P-521 uncompressed point).
pub fn encode_tlv(tag: u8, value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len() + 3);
    out.push(tag);
    if value.len() < 0x80 {
        out.push(value.len() as u8);
    } else {
        out.push(0x81);
        out.push(value.len() as u8);
    }
    out.extend_from_slice(value);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_form() {
        let data = [0x80u8, 0x01, 0x12, 0x81, 0x02, 0x44, 0x01];
        let tlvs = parse_all(&data).unwrap();
        assert_eq!(tlvs.len(), 2);
        assert_eq!(tlvs[0], Tlv { tag: 0x80, value: &[0x12] });
        assert_eq!(tlvs[1], Tlv { tag: 0x81, value: &[0x44, 0x01] });
    }

    #[test]
    fn parses_long_form() {
        let mut data = vec![0x85u8, 0x81, 65];
        data.extend(vec![0xAB; 65]);
        let tlvs = parse_all(&data).unwrap();
        assert_eq!(tlvs.len(), 1);
        assert_eq!(tlvs[0].tag, 0x85);
        assert_eq!(tlvs[0].value.len(), 65);
    }

    #[test]
    fn rejects_truncated_value() {
        let data = [0x80u8, 0x05, 0x01];
        assert!(parse_all(&data).is_err());
    }

    #[test]
    fn rejects_multibyte_long_form() {
        let data = [0x80u8, 0x82, 0x01, 0x00];
        assert!(parse_all(&data).is_err());
    }

    #[test]
    fn empty_input_yields_no_tlvs() {
        assert_eq!(parse_all(&[]).unwrap().len(), 0);
    }

    #[test]
    fn encode_tlv_uses_short_form_under_0x80() {
        let encoded = encode_tlv(0x86, &[0xAB; 32]);
        assert_eq!(&encoded[..2], &[0x86, 32]);
        assert_eq!(encoded.len(), 34);
    }

    #[test]
    fn encode_tlv_uses_long_form_at_or_above_0x80() {
        let value = [0x04u8; 133];
        let encoded = encode_tlv(0x86, &value);
        assert_eq!(&encoded[..3], &[0x86, 0x81, 133]);
        assert_eq!(encoded.len(), 136);

        let tlvs = parse_all(&encoded).unwrap();
        assert_eq!(tlvs.len(), 1);
        assert_eq!(tlvs[0].tag, 0x86);
        assert_eq!(tlvs[0].value, &value[..]);
    }
}
