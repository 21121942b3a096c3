use crate::wire::{Codec, Window, WireResult};

/// Writes the common CIP response header — `service|0x80, reserved=0,
/// general_status, ext_word_count, [ext words...]` — and returns the
/// sub-window left for `service_data` plus the header's byte length
/// (`spec.md` §4.5).
pub fn write_header(
    buf: &mut [u8],
    win: Window,
    service: u8,
    general_status: u8,
    extended: &[u16],
) -> WireResult<(Window, usize)> {
    Codec::put_u8(buf, win, 0, service | 0x80)?;
    Codec::put_u8(buf, win, 1, 0)?;
    Codec::put_u8(buf, win, 2, general_status)?;
    Codec::put_u8(buf, win, 3, extended.len() as u8)?;
    let mut offset = 4;
    for &word in extended {
        Codec::put_u16_le(buf, win, offset, word)?;
        offset += 2;
    }
    Ok((win.advance(offset)?, offset))
}

/// Writes a bodyless error reply and returns the total response length.
pub fn write_error(buf: &mut [u8], win: Window, service: u8, general_status: u8, extended: &[u16]) -> WireResult<usize> {
    let (_, header_len) = write_header(buf, win, service, general_status, extended)?;
    Ok(header_len)
}
