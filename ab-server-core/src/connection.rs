//! Per-TCP-connection state: owns the request/response buffers, the
//! session handle, the CIP connection, and the connection's own
//! `reject_fo` counter — `spec.md` §3, §5.

use std::sync::Arc;

use crate::template::TemplateConnection;
use crate::wire::Window;

/// Per-connection request/response buffer size (`spec.md` §3).
pub const MAX_DEVICE_BUFFER_SIZE: usize = 8192;

/// A CIP connection opened by Forward Open, torn down by Forward Close,
/// session teardown, or socket close (`spec.md` §3).
#[derive(Debug, Clone)]
pub struct CipConnection {
    pub server_connection_id: u32,
    pub client_connection_id: u32,
    pub connection_serial_number: u16,
    pub vendor_id: u16,
    pub originator_serial_number: u32,
    pub connection_sequence: u16,
    pub o_to_t_rpi: u32,
    pub t_to_o_rpi: u32,
    pub o_to_t_max_packet: u32,
    pub t_to_o_max_packet: u32,
}

/// Everything one TCP connection owns. Never shared across connections
/// even when several connections are open concurrently (`spec.md` §9).
pub struct ConnectionState {
    pub template: Arc<TemplateConnection>,
    pub session_handle: Option<u32>,
    pub cip_connection: Option<CipConnection>,
    /// Forward-Open rejections remaining before the next one succeeds
    /// (`spec.md` §4.5.1, §8 invariant 7). Seeded from the template and
    /// private to this connection (`spec.md` §5).
    pub reject_fo_remaining: u32,
}

impl ConnectionState {
    pub fn new(template: Arc<TemplateConnection>) -> Self {
        let reject_fo_remaining = template.reject_fo_count;
        Self {
            template,
            session_handle: None,
            cip_connection: None,
            reject_fo_remaining,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.session_handle.is_some()
    }
}

/// Allocates the shared request/response buffer a connection worker reads
/// into and writes replies from: the request occupies `[0,
/// MAX_DEVICE_BUFFER_SIZE)`, the response `[MAX_DEVICE_BUFFER_SIZE,
/// 2*MAX_DEVICE_BUFFER_SIZE)`. One buffer rather than two lets inner
/// layers reserve and back-patch header windows without an extra copy
/// (`spec.md` §9). Kept separate from `ConnectionState` so callers can
/// hold `&mut ConnectionState` and `&mut [u8]` as two independent
/// borrows.
pub fn new_buf() -> Vec<u8> {
    vec![0u8; 2 * MAX_DEVICE_BUFFER_SIZE]
}

pub fn request_window() -> Window {
    Window::new(0, MAX_DEVICE_BUFFER_SIZE)
}

pub fn response_window() -> Window {
    Window::new(MAX_DEVICE_BUFFER_SIZE, 2 * MAX_DEVICE_BUFFER_SIZE)
}
