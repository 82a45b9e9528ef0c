use crate::import_stdlib;
import_stdlib!();

use crate::conformance::DecoderFlags;
use crate::error::{Error, Result};

/// The eight CBOR major types (§3 "Encoded item (on the wire)").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MajorType {
    Unsigned = 0,
    Negative = 1,
    ByteString = 2,
    Text = 3,
    Array = 4,
    Map = 5,
    Tagged = 6,
    Simple = 7,
}

impl MajorType {
    fn from_bits(bits: u8) -> Self {
        match bits {
            0 => MajorType::Unsigned,
            1 => MajorType::Negative,
            2 => MajorType::ByteString,
            3 => MajorType::Text,
            4 => MajorType::Array,
            5 => MajorType::Map,
            6 => MajorType::Tagged,
            7 => MajorType::Simple,
            _ => unreachable!("3-bit field"),
        }
    }

    fn bits(self) -> u8 {
        self as u8
    }
}

/// Additional-info value meaning "the length/argument is indefinite"
/// (§3, §4.1).
pub const INDEFINITE: u8 = 31;
/// One-byte extension marker.
pub const AI_1: u8 = 24;
/// Two-byte extension marker.
pub const AI_2: u8 = 25;
/// Four-byte extension marker.
pub const AI_4: u8 = 26;
/// Eight-byte extension marker.
pub const AI_8: u8 = 27;

/// A decoded CBOR head: the 1-to-9-byte prefix of every item (§3, §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Head {
    pub major: MajorType,
    pub info: u8,
    pub arg: u64,
    /// Total bytes consumed from the input for this head (1, 2, 3, 5, or 9).
    pub len: usize,
}

impl Head {
    pub fn is_indefinite(&self) -> bool {
        self.info == INDEFINITE
    }
}

/// Decodes one head from the front of `input` (§4.1 "Decode head").
///
/// When `flags` contains `ONLY_PREFERRED_NUMBERS`, a head whose argument
/// could have been encoded in fewer bytes fails with
/// [`Error::PreferredConformance`]. When `flags` contains `NO_INDEF_LENGTH`,
/// additional-info 31 fails with [`Error::IndefArraysDisabled`] (the caller
/// distinguishes aggregate vs. string disablement by major type).
pub fn decode_head(input: &[u8], flags: DecoderFlags) -> Result<Head> {
    let &first = input.first().ok_or(Error::HitEnd)?;
    let major = MajorType::from_bits(first >> 5);
    let info = first & 0x1f;

    if info == 28 || info == 29 || info == 30 {
        return Err(Error::Unsupported(info));
    }

    if info == INDEFINITE {
        if flags.contains(DecoderFlags::NO_INDEF_LENGTH) {
            return Err(match major {
                MajorType::ByteString | MajorType::Text => Error::IndefStringsDisabled,
                _ => Error::IndefArraysDisabled,
            });
        }
        return Ok(Head { major, info, arg: 0, len: 1 });
    }

    if info < AI_1 {
        return Ok(Head { major, info, arg: info as u64, len: 1 });
    }

    let extra = match info {
        AI_1 => 1,
        AI_2 => 2,
        AI_4 => 4,
        AI_8 => 8,
        _ => unreachable!("28-31 handled above"),
    };
    let bytes = input.get(1..1 + extra).ok_or(Error::HitEnd)?;
    let mut arg: u64 = 0;
    for &b in bytes {
        arg = (arg << 8) | b as u64;
    }

    if flags.contains(DecoderFlags::ONLY_PREFERRED_NUMBERS) && !is_preferred(info, arg) {
        return Err(Error::PreferredConformance);
    }

    Ok(Head { major, info, arg, len: 1 + extra })
}

fn is_preferred(info: u8, arg: u64) -> bool {
    match info {
        AI_1 => arg >= AI_1 as u64,
        AI_2 => arg > u8::MAX as u64,
        AI_4 => arg > u16::MAX as u64,
        AI_8 => arg > u32::MAX as u64,
        _ => true,
    }
}

/// Encodes the shortest head for `major`/`arg` into `out`, returning the
/// number of bytes written (§4.1 "Encode head", §4.11).
pub fn encode_head(out: &mut [u8], major: MajorType, arg: u64) -> Result<usize> {
    let prefix = major.bits() << 5;
    let needed = head_len(arg);
    if out.len() < needed {
        return Err(Error::BufferTooSmall(needed, out.len()));
    }
    if arg < AI_1 as u64 {
        out[0] = prefix | arg as u8;
        return Ok(1);
    }
    if arg <= u8::MAX as u64 {
        out[0] = prefix | AI_1;
        out[1] = arg as u8;
        return Ok(2);
    }
    if arg <= u16::MAX as u64 {
        out[0] = prefix | AI_2;
        out[1..3].copy_from_slice(&(arg as u16).to_be_bytes());
        return Ok(3);
    }
    if arg <= u32::MAX as u64 {
        out[0] = prefix | AI_4;
        out[1..5].copy_from_slice(&(arg as u32).to_be_bytes());
        return Ok(5);
    }
    out[0] = prefix | AI_8;
    out[1..9].copy_from_slice(&arg.to_be_bytes());
    Ok(9)
}

/// The number of bytes [`encode_head`] will write for `arg`, without
/// writing anything. Used by the encoder's nesting stack to reserve the
/// worst case and backpatch on close (§4.11).
pub fn head_len(arg: u64) -> usize {
    if arg < AI_1 as u64 {
        1
    } else if arg <= u8::MAX as u64 {
        2
    } else if arg <= u16::MAX as u64 {
        3
    } else if arg <= u32::MAX as u64 {
        5
    } else {
        9
    }
}

/// Encodes an indefinite-length opener for `major` (array/map/bytes/text
/// only) into `out`.
pub fn encode_indefinite_head(out: &mut [u8], major: MajorType) -> Result<usize> {
    if out.is_empty() {
        return Err(Error::BufferTooSmall(1, 0));
    }
    out[0] = (major.bits() << 5) | INDEFINITE;
    Ok(1)
}

/// Encodes the break marker (0xFF) that closes an indefinite-length
/// aggregate into `out`.
pub fn encode_break(out: &mut [u8]) -> Result<usize> {
    if out.is_empty() {
        return Err(Error::BufferTooSmall(1, 0));
    }
    out[0] = 0xff;
    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_argument_round_trips() {
        let mut buf = [0u8; 9];
        let n = encode_head(&mut buf, MajorType::Unsigned, 5).unwrap();
        assert_eq!(n, 1);
        let head = decode_head(&buf[..n], DecoderFlags::empty()).unwrap();
        assert_eq!(head.arg, 5);
        assert_eq!(head.major, MajorType::Unsigned);
    }

    #[test]
    fn preferred_form_widths() {
        assert_eq!(head_len(0), 1);
        assert_eq!(head_len(23), 1);
        assert_eq!(head_len(24), 2);
        assert_eq!(head_len(255), 2);
        assert_eq!(head_len(256), 3);
        assert_eq!(head_len(65535), 3);
        assert_eq!(head_len(65536), 5);
        assert_eq!(head_len(u32::MAX as u64), 5);
        assert_eq!(head_len(u32::MAX as u64 + 1), 9);
    }

    #[test]
    fn rejects_non_preferred_when_configured() {
        // 0x18 0x05 encodes 5 in the 1-byte extension form, which is not
        // preferred (5 fits inline).
        let buf = [0x18u8, 0x05];
        assert!(decode_head(&buf, DecoderFlags::empty()).is_ok());
        assert!(decode_head(&buf, DecoderFlags::ONLY_PREFERRED_NUMBERS).is_err());
    }

    #[test]
    fn reserved_additional_info_is_unsupported() {
        let buf = [0x1cu8];
        assert!(matches!(decode_head(&buf, DecoderFlags::empty()), Err(Error::Unsupported(28))));
    }

    #[test]
    fn indefinite_can_be_disabled() {
        let buf = [0x9fu8];
        assert!(decode_head(&buf, DecoderFlags::empty()).unwrap().is_indefinite());
        assert!(decode_head(&buf, DecoderFlags::NO_INDEF_LENGTH).is_err());
    }

    #[test]
    fn truncated_argument_hits_end() {
        let buf = [0x19u8, 0x01]; // two-byte extension, only one byte present
        assert!(matches!(decode_head(&buf, DecoderFlags::empty()), Err(Error::HitEnd)));
    }
}
