//! Read Tag (0x4C) / Read Tag Fragmented (0x52) — `spec.md` §4.5.3.

use super::epath::{indices, parse_epath, tag_name};
use super::response::{write_error, write_header};
use super::status::general;
use crate::connection::ConnectionState;
use crate::wire::{Codec, Window, WireResult};

pub const SERVICE_READ_TAG: u8 = 0x4C;
pub const SERVICE_READ_TAG_FRAGMENTED: u8 = 0x52;

/// Bytes of CIP reply header (4) + 2-byte type code that the response
/// window must still hold room for after `write_header` (`spec.md` §4.5.3).
const TYPE_HEADER_SIZE: usize = 2;

pub fn handle(state: &mut ConnectionState, buf: &mut [u8], request: Window, response: Window) -> WireResult<usize> {
    let service = Codec::get_u8(buf, request, 0)?;
    let fragmented = service == SERVICE_READ_TAG_FRAGMENTED;

    if fragmented && state.template.family.is_omron() {
        return write_error(buf, response, service, general::UNSUPPORTED_SERVICE, &[]);
    }

    if request.len() < 4 {
        return write_error(buf, response, service, general::INSUFFICIENT_DATA, &[]);
    }
    let path_size_words = Codec::get_u8(buf, request, 1)? as usize;
    let path_byte_len = path_size_words * 2;
    let mut off = 2usize;

    let segments = match parse_epath(buf, request, path_byte_len) {
        Ok(s) => s,
        Err(_) => return write_error(buf, response, service, general::PATH_DESTINATION_UNKNOWN, &[]),
    };
    off += path_byte_len;

    let name = match tag_name(&segments) {
        Some(n) => n,
        None => return write_error(buf, response, service, general::PATH_DESTINATION_UNKNOWN, &[]),
    };
    let tag = match state.template.tags.find_by_name(name) {
        Some(t) => t,
        None => return write_error(buf, response, service, general::PATH_DESTINATION_UNKNOWN, &[]),
    };

    let idx = indices(&segments);
    if idx.len() != tag.num_dimensions() {
        return write_error(buf, response, service, general::INVALID_PARAMETER, &[]);
    }
    for (i, &value) in idx.iter().enumerate() {
        if value >= tag.dims[i] {
            return write_error(buf, response, service, general::INVALID_PARAMETER, &[]);
        }
    }
    let element_offset = match idx.len() {
        0 => 0u32,
        1 => idx[0],
        2 => idx[0] * tag.dims[1] + idx[1],
        _ => (idx[0] * tag.dims[1] + idx[1]) * tag.dims[2] + idx[2],
    };
    let byte_offset = element_offset as usize * tag.elem_size;

    if request.len() < off + 2 {
        return write_error(buf, response, service, general::INSUFFICIENT_DATA, &[]);
    }
    let mut element_count = Codec::get_u16_le(buf, request, off)? as u32;
    off += 2;

    if state.template.family.is_omron() && element_count == 1 {
        element_count = tag.elem_count;
    }

    let byte_offset = if fragmented {
        if request.len() < off + 4 {
            return write_error(buf, response, service, general::INSUFFICIENT_DATA, &[]);
        }
        let frag_offset = Codec::get_u32_le(buf, request, off)? as usize;
        off += 4;
        byte_offset + frag_offset
    } else {
        byte_offset
    };
    let _ = off;

    let total_request_bytes = element_count as usize * tag.elem_size;
    if byte_offset.saturating_add(total_request_bytes) > tag.byte_len() {
        return write_error(buf, response, service, general::INVALID_PARAMETER, &[]);
    }

    let (body, header_len) = write_header(buf, response, service, general::SUCCESS, &[])?;
    let available = body.len().saturating_sub(TYPE_HEADER_SIZE);
    let max_whole_elements = if tag.elem_size == 0 { 0 } else { available / tag.elem_size };
    let fits = total_request_bytes <= available;
    let copy_elements = if fits {
        element_count as usize
    } else {
        max_whole_elements.min(element_count as usize)
    };
    let copy_bytes = copy_elements * tag.elem_size;

    let data = tag.read(byte_offset, copy_bytes).map_err(|_| crate::wire::WireError::ShortBuffer {
        needed: byte_offset + copy_bytes,
        available: tag.byte_len(),
    })?;

    if !fits {
        // Overwrite the header with the partial-transfer status now that we
        // know the true outcome (`spec.md` §4.5.3).
        write_header(buf, response, service, general::PARTIAL_TRANSFER, &[])?;
    }

    Codec::put_u16_le(buf, body, 0, tag.cip_type.code())?;
    Codec::put_bytes(buf, body, TYPE_HEADER_SIZE, &data)?;

    Ok(header_len + TYPE_HEADER_SIZE + data.len())
}
