//! Forward Open (classic 0x54 and extended 0x5B) — `spec.md` §4.5.1.

use rand::Rng;

use super::response::write_header;
use super::status::{extended as ext, general};
use crate::connection::{CipConnection, ConnectionState};
use crate::wire::{Codec, Window, WireResult};

pub const SERVICE_CLASSIC: u8 = 0x54;
pub const SERVICE_EXTENDED: u8 = 0x5B;

const CLASSIC_MIN_SIZE: usize = 42;
const EXTENDED_MIN_SIZE: usize = 46;

/// `request` begins at the service byte; `response` is the window this
/// reply's bytes (header onward) are written into.
pub fn handle(state: &mut ConnectionState, buf: &mut [u8], request: Window, response: Window) -> WireResult<usize> {
    let service = Codec::get_u8(buf, request, 0)?;
    let extended = service == SERVICE_EXTENDED;
    let min_size = if extended { EXTENDED_MIN_SIZE } else { CLASSIC_MIN_SIZE };

    if request.len() < min_size {
        return super::response::write_error(buf, response, service, general::INSUFFICIENT_DATA, &[]);
    }

    // Skip the 6-byte Connection Manager EPATH (service byte already read).
    let cm_path_size = Codec::get_u8(buf, request, 1)?;
    if cm_path_size != 2 {
        return super::response::write_error(buf, response, service, general::INVALID_PARAMETER, &[]);
    }
    let mut off = 6usize;

    let secs_per_tick = Codec::get_u8(buf, request, off)?;
    off += 1;
    let timeout_ticks = Codec::get_u8(buf, request, off)?;
    off += 1;
    let _o_to_t_conn_id = Codec::get_u32_le(buf, request, off)?; // ignored; server generates its own
    off += 4;
    let t_to_o_conn_id = Codec::get_u32_le(buf, request, off)?;
    off += 4;
    let conn_serial_number = Codec::get_u16_le(buf, request, off)?;
    off += 2;
    let vendor_id = Codec::get_u16_le(buf, request, off)?;
    off += 2;
    let orig_serial_number = Codec::get_u32_le(buf, request, off)?;
    off += 4;
    let _timeout_multiplier = Codec::get_u8(buf, request, off)?;
    off += 1 + 3; // + reserved
    let o_to_t_rpi = Codec::get_u32_le(buf, request, off)?;
    off += 4;
    let (o_to_t_params, width) = if extended {
        (Codec::get_u32_le(buf, request, off)?, 4)
    } else {
        (Codec::get_u16_le(buf, request, off)? as u32, 2)
    };
    off += width;
    let t_to_o_rpi = Codec::get_u32_le(buf, request, off)?;
    off += 4;
    let (t_to_o_params, width) = if extended {
        (Codec::get_u32_le(buf, request, off)?, 4)
    } else {
        (Codec::get_u16_le(buf, request, off)? as u32, 2)
    };
    off += width;
    let _transport_class = Codec::get_u8(buf, request, off)?;
    off += 1;

    let path_size_words = Codec::get_u8(buf, request, off)? as usize;
    off += 1;
    let path_bytes = Codec::get_bytes(buf, request, off, path_size_words * 2)?.to_vec();

    let expected = state.template.expected_epath();
    if path_bytes != expected {
        return super::response::write_error(buf, response, service, general::PATH_DESTINATION_UNKNOWN, &[]);
    }

    if state.reject_fo_remaining > 0 {
        state.reject_fo_remaining -= 1;
        return super::response::write_error(buf, response, service, general::CONNECTION_FAILURE, &[ext::DUPLICATE_CONNECTION]);
    }

    let mut rng = rand::rng();
    let server_connection_id: u32 = loop {
        let v = rng.random::<u32>();
        if v != 0 {
            break v;
        }
    };
    let connection_sequence: u16 = loop {
        let v = rng.random::<u16>();
        if v != 0 {
            break v;
        }
    };

    let mask = if extended { 0x0FFF } else { 0x01FF };
    let o_to_t_offset = if extended { 0 } else { 64 };
    let o_to_t_max_packet = (o_to_t_params & mask) + o_to_t_offset;
    let t_to_o_max_packet = t_to_o_params & mask;

    state.cip_connection = Some(CipConnection {
        server_connection_id,
        client_connection_id: t_to_o_conn_id,
        connection_serial_number: conn_serial_number,
        vendor_id,
        originator_serial_number: orig_serial_number,
        connection_sequence,
        o_to_t_rpi,
        t_to_o_rpi,
        o_to_t_max_packet,
        t_to_o_max_packet,
    });
    let _ = (secs_per_tick, timeout_ticks);

    let (body, header_len) = write_header(buf, response, service, general::SUCCESS, &[])?;
    Codec::put_u32_le(buf, body, 0, server_connection_id)?;
    Codec::put_u32_le(buf, body, 4, t_to_o_conn_id)?;
    Codec::put_u16_le(buf, body, 8, conn_serial_number)?;
    Codec::put_u16_le(buf, body, 10, vendor_id)?;
    Codec::put_u32_le(buf, body, 12, orig_serial_number)?;
    Codec::put_u32_le(buf, body, 16, o_to_t_rpi)?;
    Codec::put_u32_le(buf, body, 20, t_to_o_rpi)?;
    Codec::put_u8(buf, body, 24, 0)?; // application_reply_size
    Codec::put_u8(buf, body, 25, 0)?; // reserved

    Ok(header_len + 26)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::PlcFamily;
    use crate::tag::TagStore;
    use crate::template::TemplateConnection;
    use std::sync::Arc;
    use std::time::Duration;

    fn state(family: PlcFamily, path: Option<(u8, u8)>) -> ConnectionState {
        let template = Arc::new(TemplateConnection {
            family,
            path,
            port: 44818,
            reject_fo_count: 0,
            delay: Duration::ZERO,
            tags: Arc::new(TagStore::new(vec![], vec![])),
        });
        ConnectionState::new(template)
    }

    fn build_classic_request(path: &[u8]) -> Vec<u8> {
        let mut req = vec![SERVICE_CLASSIC, 0x02, 0x20, 0x06, 0x24, 0x01];
        req.push(5); // secs_per_tick
        req.push(10); // timeout_ticks
        req.extend_from_slice(&0u32.to_le_bytes()); // o_to_t_conn_id (ignored)
        req.extend_from_slice(&0xAABBCCDDu32.to_le_bytes()); // t_to_o_conn_id
        req.extend_from_slice(&0x1234u16.to_le_bytes()); // conn_serial_number
        req.extend_from_slice(&0x5678u16.to_le_bytes()); // vendor_id
        req.extend_from_slice(&0x99887766u32.to_le_bytes()); // orig_serial_number
        req.push(1); // timeout_multiplier
        req.extend_from_slice(&[0, 0, 0]); // reserved
        req.extend_from_slice(&1000u32.to_le_bytes()); // o_to_t_rpi
        req.extend_from_slice(&0x4302u16.to_le_bytes()); // o_to_t_params
        req.extend_from_slice(&1000u32.to_le_bytes()); // t_to_o_rpi
        req.extend_from_slice(&0x4302u16.to_le_bytes()); // t_to_o_params
        req.push(0xA3); // transport_class
        req.push((path.len() / 2) as u8);
        req.extend_from_slice(path);
        req
    }

    #[test]
    fn accepts_exactly_minimum_size_classic_request() {
        let mut st = state(PlcFamily::Micro800, None);
        let path = PlcFamily::Micro800.expected_epath(None);
        let req_bytes = build_classic_request(&path);
        assert_eq!(req_bytes.len(), CLASSIC_MIN_SIZE);

        let mut buf = vec![0u8; 256];
        buf[..req_bytes.len()].copy_from_slice(&req_bytes);
        let req_win = Window::new(0, req_bytes.len());
        let resp_win = Window::new(128, 256);

        let n = handle(&mut st, &mut buf, req_win, resp_win).unwrap();
        assert_eq!(Codec::get_u8(&buf, resp_win, 0).unwrap(), SERVICE_CLASSIC | 0x80);
        assert_eq!(Codec::get_u8(&buf, resp_win, 2).unwrap(), general::SUCCESS);
        assert!(st.cip_connection.is_some());
        assert!(n > 0);
    }

    #[test]
    fn one_byte_shorter_than_minimum_is_rejected() {
        let mut st = state(PlcFamily::Micro800, None);
        let path = PlcFamily::Micro800.expected_epath(None);
        let mut req_bytes = build_classic_request(&path);
        req_bytes.truncate(req_bytes.len() - 1);

        let mut buf = vec![0u8; 256];
        buf[..req_bytes.len()].copy_from_slice(&req_bytes);
        let req_win = Window::new(0, req_bytes.len());
        let resp_win = Window::new(128, 256);

        handle(&mut st, &mut buf, req_win, resp_win).unwrap();
        assert_eq!(Codec::get_u8(&buf, resp_win, 2).unwrap(), general::INSUFFICIENT_DATA);
        assert!(st.cip_connection.is_none());
    }

    #[test]
    fn mismatched_path_returns_path_destination_unknown() {
        let mut st = state(PlcFamily::Micro800, None);
        let req_bytes = build_classic_request(&[0x20, 0x02, 0x24, 0x99]);

        let mut buf = vec![0u8; 256];
        buf[..req_bytes.len()].copy_from_slice(&req_bytes);
        let req_win = Window::new(0, req_bytes.len());
        let resp_win = Window::new(128, 256);

        handle(&mut st, &mut buf, req_win, resp_win).unwrap();
        assert_eq!(Codec::get_u8(&buf, resp_win, 2).unwrap(), general::PATH_DESTINATION_UNKNOWN);
    }

    #[test]
    fn reject_fo_counter_succeeds_on_the_n_plus_first_attempt() {
        let template = Arc::new(TemplateConnection {
            family: PlcFamily::Micro800,
            path: None,
            port: 44818,
            reject_fo_count: 2,
            delay: Duration::ZERO,
            tags: Arc::new(TagStore::new(vec![], vec![])),
        });
        let mut st = ConnectionState::new(template);
        let path = PlcFamily::Micro800.expected_epath(None);
        let req_bytes = build_classic_request(&path);

        for _ in 0..2 {
            let mut buf = vec![0u8; 256];
            buf[..req_bytes.len()].copy_from_slice(&req_bytes);
            let req_win = Window::new(0, req_bytes.len());
            let resp_win = Window::new(128, 256);
            handle(&mut st, &mut buf, req_win, resp_win).unwrap();
            assert_eq!(Codec::get_u8(&buf, resp_win, 2).unwrap(), general::CONNECTION_FAILURE);
            assert!(st.cip_connection.is_none());
        }

        let mut buf = vec![0u8; 256];
        buf[..req_bytes.len()].copy_from_slice(&req_bytes);
        let req_win = Window::new(0, req_bytes.len());
        let resp_win = Window::new(128, 256);
        handle(&mut st, &mut buf, req_win, resp_win).unwrap();
        assert_eq!(Codec::get_u8(&buf, resp_win, 2).unwrap(), general::SUCCESS);
        assert!(st.cip_connection.is_some());
    }
}
