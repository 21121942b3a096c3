//! The 24-byte EIP encapsulation header — `spec.md` §4.3.

use crate::wire::{Codec, Window, WireResult};

pub const HEADER_LEN: usize = 24;

pub const CMD_REGISTER_SESSION: u16 = 0x0065;
pub const CMD_UNREGISTER_SESSION: u16 = 0x0066;
pub const CMD_SEND_RR_DATA: u16 = 0x006F;
pub const CMD_SEND_UNIT_DATA: u16 = 0x0070;

#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub command: u16,
    pub length: u16,
    pub session_handle: u32,
    pub status: u32,
    pub sender_context: [u8; 8],
    pub options: u32,
}

impl Header {
    pub fn decode(buf: &[u8], win: Window) -> WireResult<Self> {
        let mut sender_context = [0u8; 8];
        sender_context.copy_from_slice(Codec::get_bytes(buf, win, 12, 8)?);
        Ok(Header {
            command: Codec::get_u16_le(buf, win, 0)?,
            length: Codec::get_u16_le(buf, win, 2)?,
            session_handle: Codec::get_u32_le(buf, win, 4)?,
            status: Codec::get_u32_le(buf, win, 8)?,
            sender_context,
            options: Codec::get_u32_le(buf, win, 20)?,
        })
    }

    pub fn encode(&self, buf: &mut [u8], win: Window) -> WireResult<()> {
        Codec::put_u16_le(buf, win, 0, self.command)?;
        Codec::put_u16_le(buf, win, 2, self.length)?;
        Codec::put_u32_le(buf, win, 4, self.session_handle)?;
        Codec::put_u32_le(buf, win, 8, self.status)?;
        Codec::put_bytes(buf, win, 12, &self.sender_context)?;
        Codec::put_u32_le(buf, win, 20, self.options)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_encode_round_trips() {
        let mut buf = vec![0u8; 48];
        let win = Window::new(0, 24);
        let header = Header {
            command: CMD_REGISTER_SESSION,
            length: 4,
            session_handle: 0xAABBCCDD,
            status: 0,
            sender_context: [1, 2, 3, 4, 5, 6, 7, 8],
            options: 0,
        };
        header.encode(&mut buf, win).unwrap();
        let decoded = Header::decode(&buf, win).unwrap();
        assert_eq!(decoded.command, header.command);
        assert_eq!(decoded.session_handle, header.session_handle);
        assert_eq!(decoded.sender_context, header.sender_context);
    }
}
