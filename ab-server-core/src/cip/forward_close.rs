//! Forward Close (0x4E) — `spec.md` §4.5.2.

use super::response::{write_error, write_header};
use super::status::general;
use crate::connection::ConnectionState;
use crate::wire::{Codec, Window, WireResult};

pub const SERVICE: u8 = 0x4E;

// Forward Close carries no O->T/T->O connection ids, so its fixed body is
// shorter than Forward Open's — but its connection EPATH is always padded
// to an even byte count, unlike Forward Open's (`spec.md` §4.5.2).
const MIN_SIZE: usize = 16;

pub fn handle(state: &mut ConnectionState, buf: &mut [u8], request: Window, response: Window) -> WireResult<usize> {
    if request.len() < MIN_SIZE {
        return write_error(buf, response, SERVICE, general::INSUFFICIENT_DATA, &[]);
    }

    let cm_path_size = Codec::get_u8(buf, request, 1)?;
    if cm_path_size != 2 {
        return write_error(buf, response, SERVICE, general::INVALID_PARAMETER, &[]);
    }
    let mut off = 6usize;

    let _secs_per_tick = Codec::get_u8(buf, request, off)?;
    off += 1;
    let _timeout_ticks = Codec::get_u8(buf, request, off)?;
    off += 1;
    let conn_serial_number = Codec::get_u16_le(buf, request, off)?;
    off += 2;
    let vendor_id = Codec::get_u16_le(buf, request, off)?;
    off += 2;
    let orig_serial_number = Codec::get_u32_le(buf, request, off)?;
    off += 4;

    let path_size_words = Codec::get_u8(buf, request, off)? as usize;
    off += 1;
    let _reserved = Codec::get_u8(buf, request, off)?;
    off += 1;
    let mut path_len = path_size_words * 2;
    // Forward Close's path is padded to an even length even for an odd
    // word count's worth of symbolic-segment bytes; the Connection Manager
    // EPATH here is always the fixed 4/6/16-byte form, so this just needs
    // to read exactly `path_size_words * 2` bytes.
    let path_bytes = Codec::get_bytes(buf, request, off, path_len)?.to_vec();
    path_len = path_bytes.len();
    let _ = path_len;

    let expected = state.template.expected_epath();
    if path_bytes != expected {
        return write_error(buf, response, SERVICE, general::PATH_DESTINATION_UNKNOWN, &[]);
    }

    let matches = state.cip_connection.as_ref().is_some_and(|c| {
        c.connection_serial_number == conn_serial_number
            && c.vendor_id == vendor_id
            && c.originator_serial_number == orig_serial_number
    });
    if !matches {
        return write_error(buf, response, SERVICE, general::INVALID_PARAMETER, &[]);
    }

    state.cip_connection = None;

    let (body, header_len) = write_header(buf, response, SERVICE, general::SUCCESS, &[])?;
    Codec::put_u16_le(buf, body, 0, conn_serial_number)?;
    Codec::put_u16_le(buf, body, 2, vendor_id)?;
    Codec::put_u32_le(buf, body, 4, orig_serial_number)?;
    Codec::put_u8(buf, body, 8, 0)?; // application_reply_size
    Codec::put_u8(buf, body, 9, 0)?; // reserved

    Ok(header_len + 10)
}
