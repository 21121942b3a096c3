//! Byte-exact, endian-explicit wire primitives shared by every protocol
//! layer. Nothing outside this module indexes a request/response buffer
//! directly — see `SPEC_FULL.md` §4.1.

mod codec;
mod window;

pub use codec::Codec;
pub use window::Window;

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    #[error("short buffer: needed {needed} bytes, window has {available}")]
    ShortBuffer { needed: usize, available: usize },
}

pub type WireResult<T> = std::result::Result<T, WireError>;
