//! CIP command dispatcher — `spec.md` §4.5. Dispatch is total: every first
//! byte is either a known service or falls through to "unsupported".

pub mod epath;
mod forward_close;
mod forward_open;
mod read;
pub mod response;
pub mod status;
mod write;

use crate::connection::ConnectionState;
use crate::wire::{Codec, Window, WireResult};

/// Dispatches one CIP request in `request` and writes its reply starting
/// at `response.begin`, returning the reply's total byte length.
pub fn dispatch(state: &mut ConnectionState, buf: &mut [u8], request: Window, response: Window) -> WireResult<usize> {
    let service = Codec::get_u8(buf, request, 0)?;
    match service {
        forward_open::SERVICE_CLASSIC | forward_open::SERVICE_EXTENDED => {
            forward_open::handle(state, buf, request, response)
        }
        forward_close::SERVICE => forward_close::handle(state, buf, request, response),
        read::SERVICE_READ_TAG | read::SERVICE_READ_TAG_FRAGMENTED => read::handle(state, buf, request, response),
        write::SERVICE_WRITE_TAG | write::SERVICE_WRITE_TAG_FRAGMENTED => write::handle(state, buf, request, response),
        crate::pccc::SERVICE => crate::pccc::handle(state, buf, request, response),
        _ => response::write_error(buf, response, service, status::general::UNSUPPORTED_SERVICE, &[]),
    }
}
