use thiserror::Error;

use crate::wire::WireError;

/// Fatal errors: conditions that abort a connection or fail startup.
///
/// Protocol-level failures (EIP status words, CIP general status, PCCC
/// error bytes) are wire values returned to the client, not `SimError` —
/// see `error.rs` module docs in `SPEC_FULL.md` §7.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("request buffer too large: {0} bytes")]
    BufferTooLarge(usize),

    /// A layer function was handed a malformed `Window` (a header declared
    /// a length the shared buffer can't back). Always a bug, not a
    /// malicious-client condition — those are rejected with a wire status
    /// instead.
    #[error("malformed frame: {0}")]
    Wire(#[from] WireError),
}

pub type Result<T> = std::result::Result<T, SimError>;
