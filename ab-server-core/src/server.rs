//! TCP accept loop and per-connection worker — `spec.md` §5. Shaped after
//! the teacher's `TcpHandler::run`: a `tokio::select!` between `accept()`
//! and a `watch::Receiver<bool>` shutdown signal, one `tokio::spawn` per
//! accepted connection.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::connection::{self, ConnectionState};
use crate::eip;
use crate::error::Result;
use crate::template::TemplateConnection;

/// Accepts connections on `listener` until `shutdown` fires, spawning one
/// worker task per connection (`spec.md` §5).
pub async fn run(listener: TcpListener, template: Arc<TemplateConnection>, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    loop {
        let accept_fut = listener.accept();
        let result = tokio::select! {
            res = accept_fut => res,
            res = shutdown.changed() => {
                if res.is_ok() && *shutdown.borrow() {
                    info!("shutdown signal received, stopping accept loop");
                    break;
                }
                continue;
            }
        };

        let (socket, addr) = match result {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "failed to accept connection");
                continue;
            }
        };
        info!(%addr, "accepted connection");

        let template = template.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, addr, template, shutdown).await {
                warn!(%addr, error = %e, "connection worker ended with error");
            }
        });
    }
    Ok(())
}

async fn handle_connection(
    mut socket: TcpStream,
    addr: SocketAddr,
    template: Arc<TemplateConnection>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let mut state = ConnectionState::new(template.clone());
    let mut buf = connection::new_buf();

    loop {
        let frame_len = tokio::select! {
            res = read_eip_frame(&mut socket, &mut buf) => res?,
            res = shutdown.changed() => {
                if res.is_ok() && *shutdown.borrow() {
                    debug!(%addr, "shutdown signal received, closing connection");
                }
                break;
            }
        };
        let Some(frame_len) = frame_len else {
            debug!(%addr, "peer closed connection");
            break;
        };

        let req_win = connection::request_window().truncate(frame_len)?;
        let outcome = eip::handle_frame(&mut state, &mut buf, req_win)?;

        if let Some(reply_len) = outcome.reply_len {
            let resp_win = connection::response_window();
            socket.write_all(&buf[resp_win.begin..resp_win.begin + reply_len]).await?;
            if !template.delay.is_zero() {
                tokio::time::sleep(template.delay).await;
            }
        }

        if outcome.close_connection {
            break;
        }
    }

    let _ = socket.shutdown().await;
    Ok(())
}

/// Reads one EIP frame (24-byte header + its declared payload) into
/// `buf`'s request window. Returns `Ok(None)` on a clean peer close before
/// any header bytes arrive.
async fn read_eip_frame(socket: &mut TcpStream, buf: &mut [u8]) -> Result<Option<usize>> {
    const HEADER_LEN: usize = 24;
    let req = connection::request_window();
    let header_slice = &mut buf[req.begin..req.begin + HEADER_LEN];

    let mut read = 0;
    while read < HEADER_LEN {
        let n = socket.read(&mut header_slice[read..]).await?;
        if n == 0 {
            return if read == 0 { Ok(None) } else { Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into()) };
        }
        read += n;
    }

    let length = u16::from_le_bytes([header_slice[2], header_slice[3]]) as usize;
    if HEADER_LEN + length > req.len() {
        return Err(crate::error::SimError::BufferTooLarge(HEADER_LEN + length));
    }

    let mut payload_read = 0;
    while payload_read < length {
        let start = req.begin + HEADER_LEN + payload_read;
        let n = socket.read(&mut buf[start..req.begin + HEADER_LEN + length]).await?;
        if n == 0 {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
        }
        payload_read += n;
    }

    Ok(Some(HEADER_LEN + length))
}
