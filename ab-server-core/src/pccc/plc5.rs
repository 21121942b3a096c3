//! PLC/5 typed read (0x01) / typed write (0x00) — `spec.md` §4.6.

use super::{error, MAX_TRANSFER_BYTES};
use crate::connection::ConnectionState;
use crate::wire::{Codec, Window, WireError};

const ADDRESS_MARKER: u8 = 0x06;

struct Address {
    offset: u16,
    transfer_size: u16,
    data_file_num: u16,
    data_file_element: u8,
}

fn parse(buf: &[u8], request: Window, off: usize) -> Result<Address, u8> {
    let get_u16 = |o| Codec::get_u16_le(buf, request, o).map_err(|_: WireError| error::COMMAND_COULD_NOT_BE_DECODED);
    let get_u8 = |o| Codec::get_u8(buf, request, o).map_err(|_: WireError| error::COMMAND_COULD_NOT_BE_DECODED);

    let offset = get_u16(off)?;
    let transfer_size = get_u16(off + 2)?;
    let marker = get_u8(off + 4)?;
    if marker != ADDRESS_MARKER {
        return Err(error::ADDRESS_NOT_USABLE);
    }
    let data_file_num = get_u8(off + 5)? as u16;
    let data_file_element = get_u8(off + 6)?;

    Ok(Address {
        offset,
        transfer_size,
        data_file_num,
        data_file_element,
    })
}

pub fn read(state: &mut ConnectionState, buf: &mut [u8], request: Window, off: usize, body: Window) -> Result<usize, u8> {
    let addr = parse(buf, request, off)?;
    let tag = state
        .template
        .tags
        .find_by_data_file(addr.data_file_num)
        .ok_or(error::ADDRESS_NOT_USABLE)?;

    let start = addr.offset as usize + addr.data_file_element as usize * tag.elem_size;
    let total = addr.transfer_size as usize * tag.elem_size;
    if total > MAX_TRANSFER_BYTES {
        return Err(error::FILE_WRONG_SIZE);
    }
    if start.saturating_add(total) > tag.byte_len() {
        return Err(error::FILE_WRONG_SIZE);
    }

    let data = tag.read(start, total).map_err(|_| error::FILE_WRONG_SIZE)?;
    Codec::put_bytes(buf, body, 4, &data).map_err(|_| error::FILE_WRONG_SIZE)?;
    Ok(data.len())
}

pub fn write(state: &mut ConnectionState, buf: &mut [u8], request: Window, off: usize, _body: Window) -> Result<usize, u8> {
    let addr = parse(buf, request, off)?;
    let tag = state
        .template
        .tags
        .find_by_data_file(addr.data_file_num)
        .ok_or(error::ADDRESS_NOT_USABLE)?;

    let start = addr.offset as usize + addr.data_file_element as usize * tag.elem_size;
    let total = addr.transfer_size as usize * tag.elem_size;
    if total > MAX_TRANSFER_BYTES {
        return Err(error::FILE_WRONG_SIZE);
    }
    if start.saturating_add(total) > tag.byte_len() {
        return Err(error::FILE_WRONG_SIZE);
    }

    let data_off = off + 7;
    let data = Codec::get_bytes(buf, request, data_off, total).map_err(|_| error::COMMAND_COULD_NOT_BE_DECODED)?.to_vec();
    tag.write(start, &data).map_err(|_| error::FILE_WRONG_SIZE)?;
    Ok(0)
}
