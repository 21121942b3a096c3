//! PCCC dispatcher, tunneled through CIP service 0x4B — `spec.md` §4.6.
//!
//! PCCC is older and terser than CIP: fixed-position fields, a single
//! 1-byte error code rather than a general/extended pair, and a hard
//! 240-byte transfer cap.

mod plc5;
mod slc;

use crate::connection::ConnectionState;
use crate::wire::{Codec, Window, WireResult};

pub const SERVICE: u8 = 0x4B;

/// `07 3d f3 45 43 50 21` — fixed prefix preceding every PCCC request body,
/// after the 6-byte Connection Manager EPATH (`spec.md` §4.6).
const PCCC_PREFIX: [u8; 7] = [0x07, 0x3d, 0xf3, 0x45, 0x43, 0x50, 0x21];

pub mod error {
    pub const ADDRESS_NOT_USABLE: u8 = 0x06;
    pub const FILE_WRONG_SIZE: u8 = 0x07;
    pub const COMMAND_COULD_NOT_BE_DECODED: u8 = 0x0E;
}

const CMD_PLC5_WRITE: u8 = 0x00;
const CMD_PLC5_READ: u8 = 0x01;
const CMD_SLC_READ: u8 = 0xA2;
const CMD_SLC_WRITE: u8 = 0xAA;

pub const MAX_TRANSFER_BYTES: usize = 240;

pub fn handle(state: &mut ConnectionState, buf: &mut [u8], request: Window, response: Window) -> WireResult<usize> {
    let cm_path_size = Codec::get_u8(buf, request, 1)?;
    let cm_path_bytes = cm_path_size as usize * 2;
    let prefix_start = 2 + cm_path_bytes;

    let prefix = Codec::get_bytes(buf, request, prefix_start, PCCC_PREFIX.len())?;
    if prefix != PCCC_PREFIX {
        return crate::cip::response::write_error(
            buf,
            response,
            SERVICE,
            crate::cip::status::general::INVALID_PARAMETER,
            &[],
        );
    }
    let mut off = prefix_start + PCCC_PREFIX.len();

    let pccc_prefix = Codec::get_u16_le(buf, request, off)?;
    off += 2;
    if pccc_prefix != 0x000F {
        return crate::cip::response::write_error(
            buf,
            response,
            SERVICE,
            crate::cip::status::general::INVALID_PARAMETER,
            &[],
        );
    }
    off += 2; // 2 ignored bytes
    let transaction_seq = Codec::get_u16_le(buf, request, off)?;
    off += 2;
    let command = Codec::get_u8(buf, request, off)?;
    off += 1;

    let (body, header_len) = crate::cip::response::write_header(
        buf,
        response,
        SERVICE,
        crate::cip::status::general::SUCCESS,
        &[],
    )?;

    let pccc_result = match command {
        CMD_PLC5_WRITE => plc5::write(state, buf, request, off, body),
        CMD_PLC5_READ => plc5::read(state, buf, request, off, body),
        CMD_SLC_READ => slc::read(state, buf, request, off, body),
        CMD_SLC_WRITE => slc::write(state, buf, request, off, body),
        _ => Err(error::COMMAND_COULD_NOT_BE_DECODED),
    };

    match pccc_result {
        Ok(payload_len) => {
            Codec::put_u8(buf, body, 0, 0x4F)?;
            Codec::put_u8(buf, body, 1, 0x00)?;
            Codec::put_u16_le(buf, body, 2, transaction_seq)?;
            Ok(header_len + 4 + payload_len)
        }
        Err(err_code) => {
            Codec::put_u8(buf, body, 0, 0x4F)?;
            Codec::put_u8(buf, body, 1, 0xF0)?;
            Codec::put_u16_le(buf, body, 2, transaction_seq)?;
            Codec::put_u8(buf, body, 4, err_code)?;
            Ok(header_len + 5)
        }
    }
}
