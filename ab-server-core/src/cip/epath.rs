//! CIP EPATH parsing: a tagged-segment stream with variable alignment,
//! modeled as a sum type rather than ad-hoc cursor math — `spec.md` §9.

use crate::wire::{Codec, Window, WireError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Symbolic(String),
    Logical1(u8),
    Logical2(u16),
    Logical4(u32),
}

const SYMBOLIC_MARKER: u8 = 0x91;
const LOGICAL1_MARKER: u8 = 0x28;
const LOGICAL2_MARKER: u8 = 0x29;
const LOGICAL4_MARKER: u8 = 0x2A;

/// Parses `byte_len` bytes of `buf[win]` starting at `win.begin` into a
/// sequence of segments. `byte_len` is `2 * path_size` from the request
/// header (`spec.md` §4.5.3).
pub fn parse_epath(buf: &[u8], win: Window, byte_len: usize) -> Result<Vec<Segment>, WireError> {
    let path_win = win.truncate(byte_len)?;
    let mut offset = 0usize;
    let mut segments = Vec::new();

    while offset < byte_len {
        let marker = Codec::get_u8(buf, path_win, offset)?;
        offset += 1;
        match marker {
            SYMBOLIC_MARKER => {
                let name_len = Codec::get_u8(buf, path_win, offset)? as usize;
                offset += 1;
                let name_bytes = Codec::get_bytes(buf, path_win, offset, name_len)?;
                let name = String::from_utf8_lossy(name_bytes).into_owned();
                offset += name_len;
                if name_len % 2 == 1 {
                    offset += 1; // pad byte
                }
                segments.push(Segment::Symbolic(name));
            }
            LOGICAL1_MARKER => {
                let value = Codec::get_u8(buf, path_win, offset)?;
                offset += 1;
                segments.push(Segment::Logical1(value));
            }
            LOGICAL2_MARKER => {
                offset += 1; // pad byte
                let value = Codec::get_u16_le(buf, path_win, offset)?;
                offset += 2;
                segments.push(Segment::Logical2(value));
            }
            LOGICAL4_MARKER => {
                offset += 1; // pad byte
                let value = Codec::get_u32_le(buf, path_win, offset)?;
                offset += 4;
                segments.push(Segment::Logical4(value));
            }
            _ => {
                return Err(WireError::ShortBuffer {
                    needed: offset,
                    available: byte_len,
                })
            }
        }
    }

    Ok(segments)
}

/// Extracts the tag name from a parsed EPATH, if the first segment is
/// symbolic. Per `spec.md` §9's open-question resolution, name matching
/// MUST compare against this parsed name, not raw request bytes.
pub fn tag_name(segments: &[Segment]) -> Option<&str> {
    match segments.first() {
        Some(Segment::Symbolic(name)) => Some(name.as_str()),
        _ => None,
    }
}

/// Extracts the 0-3 trailing numeric index segments as plain `u32`s.
pub fn indices(segments: &[Segment]) -> Vec<u32> {
    segments[1.min(segments.len())..]
        .iter()
        .map(|s| match *s {
            Segment::Logical1(v) => v as u32,
            Segment::Logical2(v) => v as u32,
            Segment::Logical4(v) => v,
            Segment::Symbolic(_) => 0,
        })
        .collect()
}
