//! `ab-server-core`: the protocol engine behind `ab-server` — an
//! EtherNet/IP + CIP + PCCC device simulator for the Allen-Bradley PLC
//! family described in `SPEC_FULL.md`.
//!
//! The crate is organized the way the wire protocol layers: [`eip`] owns
//! the encapsulation session and Common Packet Format framing, [`cip`]
//! dispatches Common Industrial Protocol services (and tunnels PCCC
//! through it), [`pccc`] implements the PLC-5/SLC/MicroLogix command set,
//! and [`tag`] is the in-memory data table every read/write operates on.
//! [`server`] is the only place that touches a socket.

#![forbid(unsafe_code)]

pub mod cip;
pub mod connection;
pub mod eip;
pub mod error;
pub mod family;
pub mod pccc;
pub mod server;
pub mod tag;
pub mod template;
pub mod wire;

pub use connection::ConnectionState;
pub use error::{Result, SimError};
pub use family::PlcFamily;
pub use template::TemplateConnection;
