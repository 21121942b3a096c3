//! EIP encapsulation session layer — `spec.md` §4.3. Owns the
//! UNREGISTERED/REGISTERED/CLOSED state machine and frames every other
//! protocol layer inside the 24-byte encapsulation header.

mod cpf;
mod header;
pub mod status;

use rand::Rng;

use crate::connection::{self, ConnectionState};
use crate::wire::{Codec, Window, WireResult};
use header::{Header, CMD_REGISTER_SESSION, CMD_SEND_RR_DATA, CMD_SEND_UNIT_DATA, CMD_UNREGISTER_SESSION, HEADER_LEN};

/// What the caller (the per-connection worker loop) should do once a frame
/// has been handled.
pub struct Outcome {
    /// Total reply bytes written at `connection::response_window().begin`,
    /// or `None` if nothing should be sent (e.g. Unregister Session).
    pub reply_len: Option<usize>,
    pub close_connection: bool,
}

/// Processes one full EIP frame occupying `request` (header + payload) and
/// writes the reply into `buf`'s response window.
pub fn handle_frame(state: &mut ConnectionState, buf: &mut [u8], request: Window) -> WireResult<Outcome> {
    if request.len() < HEADER_LEN {
        return Ok(Outcome {
            reply_len: None,
            close_connection: true,
        });
    }

    let req_header = Header::decode(buf, request)?;
    let payload = request.advance(HEADER_LEN)?;
    let payload = payload.truncate((req_header.length as usize).min(payload.len()))?;

    if let Some(handle) = state.session_handle {
        if req_header.session_handle != 0 && req_header.session_handle != handle {
            return reply(state, buf, &req_header, status::BAD_PARAM, Window::new(0, 0), true);
        }
    }

    match req_header.command {
        CMD_REGISTER_SESSION => handle_register_session(state, buf, &req_header, payload),
        CMD_UNREGISTER_SESSION => Ok(Outcome {
            reply_len: None,
            close_connection: true,
        }),
        CMD_SEND_RR_DATA => {
            if !state.is_registered() {
                return reply(state, buf, &req_header, status::BAD_PARAM, Window::new(0, 0), true);
            }
            let response_payload = connection::response_window().advance(HEADER_LEN)?;
            match cpf::handle_unconnected(state, buf, payload, response_payload) {
                Ok(len) => reply(state, buf, &req_header, status::SUCCESS, Window::new(0, len), false),
                Err(eip_status) => reply(state, buf, &req_header, eip_status, Window::new(0, 0), false),
            }
        }
        CMD_SEND_UNIT_DATA => {
            if !state.is_registered() {
                return reply(state, buf, &req_header, status::BAD_PARAM, Window::new(0, 0), true);
            }
            let response_payload = connection::response_window().advance(HEADER_LEN)?;
            match cpf::handle_connected(state, buf, payload, response_payload) {
                Ok(len) => reply(state, buf, &req_header, status::SUCCESS, Window::new(0, len), false),
                Err(eip_status) => reply(state, buf, &req_header, eip_status, Window::new(0, 0), false),
            }
        }
        _ => reply(state, buf, &req_header, status::UNSUPPORTED, Window::new(0, 0), false),
    }
}

fn handle_register_session(
    state: &mut ConnectionState,
    buf: &mut [u8],
    req_header: &Header,
    payload: Window,
) -> WireResult<Outcome> {
    if payload.len() != 4 {
        return reply(state, buf, req_header, status::BAD_PAYLOAD, Window::new(0, 0), true);
    }
    let protocol_version = Codec::get_u16_le(buf, payload, 0)?;
    if protocol_version != 1 {
        return reply(state, buf, req_header, status::BAD_VERSION, Window::new(0, 0), true);
    }

    let handle = loop {
        let v: u32 = rand::rng().random();
        if v != 0 {
            break v;
        }
    };
    state.session_handle = Some(handle);

    let req_payload_bytes = Codec::get_bytes(buf, payload, 0, 4)?.to_vec();
    let response_payload = connection::response_window().advance(HEADER_LEN)?;
    Codec::put_bytes(buf, response_payload, 0, &req_payload_bytes)?;

    reply(state, buf, req_header, status::SUCCESS, Window::new(0, 4), false)
}

/// Writes the 24-byte EIP header for the reply whose payload (if any) has
/// already been written at `connection::response_window()` offset
/// `HEADER_LEN`, sized `payload_len_window.len()`.
fn reply(
    state: &mut ConnectionState,
    buf: &mut [u8],
    req_header: &Header,
    eip_status: u32,
    payload_len_window: Window,
    close_connection: bool,
) -> WireResult<Outcome> {
    let resp = Header {
        command: req_header.command,
        length: payload_len_window.len() as u16,
        session_handle: state.session_handle.unwrap_or(0),
        status: eip_status,
        sender_context: req_header.sender_context,
        options: req_header.options,
    };
    let header_win = connection::response_window().truncate(HEADER_LEN)?;
    resp.encode(buf, header_win)?;
    Ok(Outcome {
        reply_len: Some(HEADER_LEN + payload_len_window.len()),
        close_connection,
    })
}
