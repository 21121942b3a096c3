//! Common Packet Format framing for Send RR Data (unconnected) and Send
//! Unit Data (connected) payloads — `spec.md` §4.4.

use super::status;
use crate::connection::ConnectionState;
use crate::wire::{Codec, Window};

const ITEM_COUNT: u16 = 2;
const ADDR_TYPE_NULL: u16 = 0x0000;
const ADDR_TYPE_CONNECTED: u16 = 0x00A1;
const DATA_TYPE_UNCONNECTED: u16 = 0x00B2;
const DATA_TYPE_CONNECTED: u16 = 0x00B1;

const UNCONNECTED_HEADER_LEN: usize = 16;
const CONNECTED_HEADER_LEN: usize = 20; // 16 + 4-byte connection_id
const CONNECTED_SEQUENCE_LEN: usize = 2;

/// Parses and dispatches a Send RR Data payload, writing the CPF-framed
/// reply into `response`. Returns the reply's total byte length, or an EIP
/// status code on a framing violation (`spec.md` §4.4.1).
pub fn handle_unconnected(
    state: &mut ConnectionState,
    buf: &mut [u8],
    payload: Window,
    response: Window,
) -> Result<usize, u32> {
    if payload.len() < UNCONNECTED_HEADER_LEN {
        return Err(status::BAD_PAYLOAD);
    }
    let interface_handle = Codec::get_u32_le(buf, payload, 0).map_err(|_| status::BAD_PAYLOAD)?;
    let router_timeout = Codec::get_u16_le(buf, payload, 4).map_err(|_| status::BAD_PAYLOAD)?;
    let item_count = Codec::get_u16_le(buf, payload, 6).map_err(|_| status::BAD_PAYLOAD)?;
    let addr_item_type = Codec::get_u16_le(buf, payload, 8).map_err(|_| status::BAD_PAYLOAD)?;
    let addr_item_length = Codec::get_u16_le(buf, payload, 10).map_err(|_| status::BAD_PAYLOAD)?;
    let data_item_type = Codec::get_u16_le(buf, payload, 12).map_err(|_| status::BAD_PAYLOAD)?;
    let data_item_length = Codec::get_u16_le(buf, payload, 14).map_err(|_| status::BAD_PAYLOAD)?;

    if item_count != ITEM_COUNT || addr_item_type != ADDR_TYPE_NULL || addr_item_length != 0 {
        return Err(status::BAD_PAYLOAD);
    }
    if data_item_type != DATA_TYPE_UNCONNECTED {
        return Err(status::BAD_PAYLOAD);
    }
    let cip_payload = payload.sub(UNCONNECTED_HEADER_LEN, payload.len() - UNCONNECTED_HEADER_LEN).map_err(|_| status::BAD_PAYLOAD)?;
    if data_item_length as usize != cip_payload.len() {
        return Err(status::BAD_PAYLOAD);
    }

    let cip_response = response.advance(UNCONNECTED_HEADER_LEN).map_err(|_| status::NO_RESOURCE)?;
    let cip_len = crate::cip::dispatch(state, buf, cip_payload, cip_response).map_err(|_| status::NO_RESOURCE)?;

    Codec::put_u32_le(buf, response, 0, interface_handle).map_err(|_| status::NO_RESOURCE)?;
    Codec::put_u16_le(buf, response, 4, router_timeout).map_err(|_| status::NO_RESOURCE)?;
    Codec::put_u16_le(buf, response, 6, ITEM_COUNT).map_err(|_| status::NO_RESOURCE)?;
    Codec::put_u16_le(buf, response, 8, ADDR_TYPE_NULL).map_err(|_| status::NO_RESOURCE)?;
    Codec::put_u16_le(buf, response, 10, 0).map_err(|_| status::NO_RESOURCE)?;
    Codec::put_u16_le(buf, response, 12, DATA_TYPE_UNCONNECTED).map_err(|_| status::NO_RESOURCE)?;
    Codec::put_u16_le(buf, response, 14, cip_len as u16).map_err(|_| status::NO_RESOURCE)?;

    Ok(UNCONNECTED_HEADER_LEN + cip_len)
}

/// Parses and dispatches a Send Unit Data payload (`spec.md` §4.4.2).
pub fn handle_connected(
    state: &mut ConnectionState,
    buf: &mut [u8],
    payload: Window,
    response: Window,
) -> Result<usize, u32> {
    if payload.len() < CONNECTED_HEADER_LEN + CONNECTED_SEQUENCE_LEN {
        return Err(status::BAD_PAYLOAD);
    }
    let interface_handle = Codec::get_u32_le(buf, payload, 0).map_err(|_| status::BAD_PAYLOAD)?;
    let router_timeout = Codec::get_u16_le(buf, payload, 4).map_err(|_| status::BAD_PAYLOAD)?;
    let item_count = Codec::get_u16_le(buf, payload, 6).map_err(|_| status::BAD_PAYLOAD)?;
    let addr_item_type = Codec::get_u16_le(buf, payload, 8).map_err(|_| status::BAD_PAYLOAD)?;
    let addr_item_length = Codec::get_u16_le(buf, payload, 10).map_err(|_| status::BAD_PAYLOAD)?;
    let connection_id = Codec::get_u32_le(buf, payload, 12).map_err(|_| status::BAD_PAYLOAD)?;
    let data_item_type = Codec::get_u16_le(buf, payload, 16).map_err(|_| status::BAD_PAYLOAD)?;
    let data_item_length = Codec::get_u16_le(buf, payload, 18).map_err(|_| status::BAD_PAYLOAD)?;

    if item_count != ITEM_COUNT || addr_item_type != ADDR_TYPE_CONNECTED || addr_item_length != 4 {
        return Err(status::BAD_PAYLOAD);
    }
    if data_item_type != DATA_TYPE_CONNECTED {
        return Err(status::BAD_PAYLOAD);
    }
    let expected_conn_id = state
        .cip_connection
        .as_ref()
        .map(|c| c.server_connection_id)
        .ok_or(status::BAD_PARAM)?;
    if connection_id != expected_conn_id {
        return Err(status::BAD_PARAM);
    }

    let connection_sequence = Codec::get_u16_le(buf, payload, CONNECTED_HEADER_LEN).map_err(|_| status::BAD_PAYLOAD)?;
    let cip_payload = payload
        .sub(
            CONNECTED_HEADER_LEN + CONNECTED_SEQUENCE_LEN,
            payload.len() - CONNECTED_HEADER_LEN - CONNECTED_SEQUENCE_LEN,
        )
        .map_err(|_| status::BAD_PAYLOAD)?;
    if data_item_length as usize != cip_payload.len() + CONNECTED_SEQUENCE_LEN {
        return Err(status::BAD_PAYLOAD);
    }

    let cip_response = response
        .advance(CONNECTED_HEADER_LEN + CONNECTED_SEQUENCE_LEN)
        .map_err(|_| status::NO_RESOURCE)?;
    let cip_len = crate::cip::dispatch(state, buf, cip_payload, cip_response).map_err(|_| status::NO_RESOURCE)?;

    Codec::put_u32_le(buf, response, 0, interface_handle).map_err(|_| status::NO_RESOURCE)?;
    Codec::put_u16_le(buf, response, 4, router_timeout).map_err(|_| status::NO_RESOURCE)?;
    Codec::put_u16_le(buf, response, 6, ITEM_COUNT).map_err(|_| status::NO_RESOURCE)?;
    Codec::put_u16_le(buf, response, 8, ADDR_TYPE_CONNECTED).map_err(|_| status::NO_RESOURCE)?;
    Codec::put_u16_le(buf, response, 10, 4).map_err(|_| status::NO_RESOURCE)?;
    Codec::put_u32_le(buf, response, 12, connection_id).map_err(|_| status::NO_RESOURCE)?;
    Codec::put_u16_le(buf, response, 16, DATA_TYPE_CONNECTED).map_err(|_| status::NO_RESOURCE)?;
    Codec::put_u16_le(buf, response, 18, (cip_len + CONNECTED_SEQUENCE_LEN) as u16).map_err(|_| status::NO_RESOURCE)?;
    Codec::put_u16_le(buf, response, CONNECTED_HEADER_LEN, connection_sequence).map_err(|_| status::NO_RESOURCE)?;

    Ok(CONNECTED_HEADER_LEN + CONNECTED_SEQUENCE_LEN + cip_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::PlcFamily;
    use crate::tag::TagStore;
    use crate::template::TemplateConnection;
    use std::sync::Arc;
    use std::time::Duration;

    fn state() -> ConnectionState {
        let template = Arc::new(TemplateConnection {
            family: PlcFamily::Micro800,
            path: None,
            port: 44818,
            reject_fo_count: 0,
            delay: Duration::ZERO,
            tags: Arc::new(TagStore::new(vec![], vec![])),
        });
        ConnectionState::new(template)
    }

    #[test]
    fn unconnected_frame_with_unknown_cip_service_is_passed_through_and_replied() {
        let mut st = state();
        let mut payload = vec![0u8; 16];
        payload[6..8].copy_from_slice(&ITEM_COUNT.to_le_bytes());
        payload[8..10].copy_from_slice(&ADDR_TYPE_NULL.to_le_bytes());
        payload[12..14].copy_from_slice(&DATA_TYPE_UNCONNECTED.to_le_bytes());
        payload[14..16].copy_from_slice(&1u16.to_le_bytes());
        payload.push(0x99); // unknown CIP service

        let mut buf = vec![0u8; 8192];
        buf[..payload.len()].copy_from_slice(&payload);
        let payload_win = Window::new(0, payload.len());
        let resp_win = Window::new(4096, 8192);

        let n = handle_unconnected(&mut st, &mut buf, payload_win, resp_win).unwrap();
        assert!(n > UNCONNECTED_HEADER_LEN);
        assert_eq!(Codec::get_u8(&buf, resp_win, 16).unwrap(), 0x99 | 0x80);
    }

    #[test]
    fn connected_frame_rejects_unknown_connection_id() {
        let mut st = state();
        let mut payload = vec![0u8; 22];
        payload[6..8].copy_from_slice(&ITEM_COUNT.to_le_bytes());
        payload[8..10].copy_from_slice(&ADDR_TYPE_CONNECTED.to_le_bytes());
        payload[10..12].copy_from_slice(&4u16.to_le_bytes());
        payload[12..16].copy_from_slice(&0x1234u32.to_le_bytes());
        payload[16..18].copy_from_slice(&DATA_TYPE_CONNECTED.to_le_bytes());
        payload[18..20].copy_from_slice(&2u16.to_le_bytes());

        let mut buf = vec![0u8; 8192];
        buf[..payload.len()].copy_from_slice(&payload);
        let payload_win = Window::new(0, payload.len());
        let resp_win = Window::new(4096, 8192);

        assert_eq!(handle_connected(&mut st, &mut buf, payload_win, resp_win), Err(status::BAD_PARAM));
    }
}
