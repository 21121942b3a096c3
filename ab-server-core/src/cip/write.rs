//! Write Tag (0x4D) / Write Tag Fragmented (0x53) — `spec.md` §4.5.4.

use super::epath::{indices, parse_epath, tag_name};
use super::response::{write_error, write_header};
use super::status::{extended as ext, general};
use crate::connection::ConnectionState;
use crate::tag::CipType;
use crate::wire::{Codec, Window, WireResult};

pub const SERVICE_WRITE_TAG: u8 = 0x4D;
pub const SERVICE_WRITE_TAG_FRAGMENTED: u8 = 0x53;

pub fn handle(state: &mut ConnectionState, buf: &mut [u8], request: Window, response: Window) -> WireResult<usize> {
    let service = Codec::get_u8(buf, request, 0)?;
    let fragmented = service == SERVICE_WRITE_TAG_FRAGMENTED;

    if request.len() < 2 {
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

    if request.len() < off + 4 {
        return write_error(buf, response, service, general::INSUFFICIENT_DATA, &[]);
    }
    let data_type = Codec::get_u16_le(buf, request, off)?;
    off += 2;
    let element_count = Codec::get_u16_le(buf, request, off)? as u32;
    off += 2;

    if CipType::from_code(data_type) != Some(tag.cip_type) {
        return write_error(buf, response, service, general::INVALID_PARAMETER, &[]);
    }
    if element_count > tag.elem_count {
        return write_error(buf, response, service, general::INVALID_PARAMETER, &[]);
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

    let payload_len = element_count as usize * tag.elem_size;
    if byte_offset.saturating_add(payload_len) > tag.byte_len() {
        return write_error(
            buf,
            response,
            service,
            general::INVALID_PARAMETER,
            &[ext::TOO_MUCH_DATA],
        );
    }
    if request.len() < off + payload_len {
        return write_error(buf, response, service, general::INSUFFICIENT_DATA, &[]);
    }
    let payload = Codec::get_bytes(buf, request, off, payload_len)?.to_vec();

    tag.write(byte_offset, &payload)
        .map_err(|_| crate::wire::WireError::ShortBuffer {
            needed: byte_offset + payload.len(),
            available: tag.byte_len(),
        })?;

    let (_, header_len) = write_header(buf, response, service, general::SUCCESS, &[])?;
    Ok(header_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::PlcFamily;
    use crate::tag::{Tag, TagStore};
    use crate::template::TemplateConnection;
    use std::sync::Arc;
    use std::time::Duration;

    fn epath_for(name: &str, index: Option<u8>) -> Vec<u8> {
        let mut p = vec![0x91, name.len() as u8];
        p.extend_from_slice(name.as_bytes());
        if name.len() % 2 == 1 {
            p.push(0);
        }
        if let Some(i) = index {
            p.push(0x28);
            p.push(i);
        }
        p
    }

    fn state_with_tag(tag: Tag) -> ConnectionState {
        let template = Arc::new(TemplateConnection {
            family: PlcFamily::ControlLogix,
            path: Some((0, 0)),
            port: 44818,
            reject_fo_count: 0,
            delay: Duration::ZERO,
            tags: Arc::new(TagStore::new(vec![tag], vec![])),
        });
        ConnectionState::new(template)
    }

    #[test]
    fn writes_an_indexed_dint_element() {
        let tag = Tag::new_cip("MyTag".into(), CipType::Dint, [10, 1, 1], true);
        let mut st = state_with_tag(tag);

        let path = epath_for("MyTag", Some(3));
        let mut req = vec![SERVICE_WRITE_TAG, (path.len() / 2) as u8];
        req.extend_from_slice(&path);
        req.extend_from_slice(&CipType::Dint.code().to_le_bytes());
        req.extend_from_slice(&1u16.to_le_bytes());
        req.extend_from_slice(&[0xEF, 0xBE, 0xAD, 0xDE]);

        let mut buf = vec![0u8; 256];
        buf[..req.len()].copy_from_slice(&req);
        let req_win = Window::new(0, req.len());
        let resp_win = Window::new(128, 256);

        handle(&mut st, &mut buf, req_win, resp_win).unwrap();
        assert_eq!(Codec::get_u8(&buf, resp_win, 2).unwrap(), general::SUCCESS);

        let tag = st.template.tags.find_by_name("MyTag").unwrap();
        assert_eq!(tag.read(3 * 4, 4).unwrap(), vec![0xEF, 0xBE, 0xAD, 0xDE]);
    }

    #[test]
    fn wrong_data_type_is_rejected() {
        let tag = Tag::new_cip("MyTag".into(), CipType::Dint, [10, 1, 1], true);
        let mut st = state_with_tag(tag);

        let path = epath_for("MyTag", Some(0));
        let mut req = vec![SERVICE_WRITE_TAG, (path.len() / 2) as u8];
        req.extend_from_slice(&path);
        req.extend_from_slice(&CipType::Int.code().to_le_bytes());
        req.extend_from_slice(&1u16.to_le_bytes());
        req.extend_from_slice(&[0x01, 0x00]);

        let mut buf = vec![0u8; 256];
        buf[..req.len()].copy_from_slice(&req);
        let req_win = Window::new(0, req.len());
        let resp_win = Window::new(128, 256);

        handle(&mut st, &mut buf, req_win, resp_win).unwrap();
        assert_eq!(Codec::get_u8(&buf, resp_win, 2).unwrap(), general::INVALID_PARAMETER);
    }

    #[test]
    fn element_count_exceeding_tag_capacity_is_rejected() {
        let tag = Tag::new_cip("MyTag".into(), CipType::Dint, [2, 1, 1], true);
        let mut st = state_with_tag(tag);

        let path = epath_for("MyTag", Some(0));
        let mut req = vec![SERVICE_WRITE_TAG, (path.len() / 2) as u8];
        req.extend_from_slice(&path);
        req.extend_from_slice(&CipType::Dint.code().to_le_bytes());
        req.extend_from_slice(&5u16.to_le_bytes());
        req.extend_from_slice(&[0u8; 20]);

        let mut buf = vec![0u8; 256];
        buf[..req.len()].copy_from_slice(&req);
        let req_win = Window::new(0, req.len());
        let resp_win = Window::new(128, 256);

        handle(&mut st, &mut buf, req_win, resp_win).unwrap();
        assert_eq!(Codec::get_u8(&buf, resp_win, 2).unwrap(), general::INVALID_PARAMETER);
    }
}
