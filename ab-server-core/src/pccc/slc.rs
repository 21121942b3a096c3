//! SLC/MicroLogix protected typed logical read (0xA2) / write (0xAA) —
//! `spec.md` §4.6.

use super::{error, MAX_TRANSFER_BYTES};
use crate::connection::ConnectionState;
use crate::wire::{Codec, Window};

struct Address {
    transfer_size: u8,
    data_file_num: u8,
    data_file_type: u8,
    data_file_element: u8,
}

fn parse(buf: &[u8], request: Window, off: usize) -> Result<Address, u8> {
    let get_u8 = |o| Codec::get_u8(buf, request, o).map_err(|_| error::COMMAND_COULD_NOT_BE_DECODED);

    let transfer_size = get_u8(off)?;
    let data_file_num = get_u8(off + 1)?;
    let data_file_type = get_u8(off + 2)?;
    let data_file_element = get_u8(off + 3)?;
    let subelement = get_u8(off + 4)?;
    if subelement != 0 {
        return Err(error::ADDRESS_NOT_USABLE);
    }

    Ok(Address {
        transfer_size,
        data_file_num,
        data_file_type,
        data_file_element,
    })
}

pub fn read(state: &mut ConnectionState, buf: &mut [u8], request: Window, off: usize, body: Window) -> Result<usize, u8> {
    let addr = parse(buf, request, off)?;
    let tag = state
        .template
        .tags
        .find_by_data_file(addr.data_file_num as u16)
        .ok_or(error::ADDRESS_NOT_USABLE)?;

    let expected_type = tag.pccc_type.map(|t| t.code()).unwrap_or(0);
    if addr.data_file_type != expected_type {
        return Err(error::ADDRESS_NOT_USABLE);
    }

    let start = addr.data_file_element as usize * tag.elem_size;
    let total = addr.transfer_size as usize;
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
        .find_by_data_file(addr.data_file_num as u16)
        .ok_or(error::ADDRESS_NOT_USABLE)?;

    let expected_type = tag.pccc_type.map(|t| t.code()).unwrap_or(0);
    if addr.data_file_type != expected_type {
        return Err(error::ADDRESS_NOT_USABLE);
    }

    let start = addr.data_file_element as usize * tag.elem_size;
    let total = addr.transfer_size as usize;
    if total > MAX_TRANSFER_BYTES {
        return Err(error::FILE_WRONG_SIZE);
    }
    if start.saturating_add(total) > tag.byte_len() {
        return Err(error::FILE_WRONG_SIZE);
    }

    let data_off = off + 5;
    let data = Codec::get_bytes(buf, request, data_off, total)
        .map_err(|_| error::COMMAND_COULD_NOT_BE_DECODED)?
        .to_vec();
    tag.write(start, &data).map_err(|_| error::FILE_WRONG_SIZE)?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::PlcFamily;
    use crate::tag::{PcccType, Tag, TagStore};
    use crate::template::TemplateConnection;
    use std::sync::Arc;
    use std::time::Duration;

    fn state_with_tag(tag: Tag) -> ConnectionState {
        let template = Arc::new(TemplateConnection {
            family: PlcFamily::Slc500,
            path: None,
            port: 44818,
            reject_fo_count: 0,
            delay: Duration::ZERO,
            tags: Arc::new(TagStore::new(vec![], vec![tag])),
        });
        ConnectionState::new(template)
    }

    #[test]
    fn reads_bytes_at_the_requested_element() {
        let tag = Tag::new_pccc(7, PcccType::Int, 10);
        tag.write(3 * 2, &[0xAA, 0xBB]).unwrap();
        let mut st = state_with_tag(tag);

        let req = [2u8, 7, PcccType::Int.code(), 3, 0];
        let mut buf = vec![0u8; 64];
        buf[..req.len()].copy_from_slice(&req);
        let req_win = Window::new(0, req.len());
        let body = Window::new(req.len(), 64);

        let n = read(&mut st, &mut buf, req_win, 0, body).unwrap();
        assert_eq!(n, 2);
        assert_eq!(Codec::get_bytes(&buf, body, 4, 2).unwrap(), &[0xAA, 0xBB]);
    }

    #[test]
    fn nonzero_subelement_is_rejected() {
        let tag = Tag::new_pccc(7, PcccType::Int, 10);
        let mut st = state_with_tag(tag);

        let req = [2u8, 7, PcccType::Int.code(), 3, 1];
        let mut buf = vec![0u8; 64];
        buf[..req.len()].copy_from_slice(&req);
        let req_win = Window::new(0, req.len());
        let body = Window::new(req.len(), 64);

        assert_eq!(read(&mut st, &mut buf, req_win, 0, body), Err(error::ADDRESS_NOT_USABLE));
    }

    #[test]
    fn mismatched_data_file_type_is_rejected() {
        let tag = Tag::new_pccc(7, PcccType::Int, 10);
        let mut st = state_with_tag(tag);

        let req = [2u8, 7, PcccType::Dint.code(), 3, 0];
        let mut buf = vec![0u8; 64];
        buf[..req.len()].copy_from_slice(&req);
        let req_win = Window::new(0, req.len());
        let body = Window::new(req.len(), 64);

        assert_eq!(read(&mut st, &mut buf, req_win, 0, body), Err(error::ADDRESS_NOT_USABLE));
    }
}
