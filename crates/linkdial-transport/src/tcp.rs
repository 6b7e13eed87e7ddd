//! [`TcpTransport`]: a [`Transport`] over a plain TCP socket.
//!
//! Two things in linkdial talk TCP: hamlib `rigctld` control channels
//! (port 4532 by default) and `telnet` sessions, where the connected socket
//! is handed to the session exchange via [`TcpTransport::into_stream`].
//!
//! ```no_run
//! use linkdial_transport::TcpTransport;
//! use linkdial_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> linkdial_core::Result<()> {
//! let mut rig = TcpTransport::connect("localhost:4532").await?;
//! rig.send(b"f\n").await?;
//! let mut reply = [0u8; 64];
//! let n = rig.receive(&mut reply, Duration::from_secs(2)).await?;
//! # Ok(())
//! # }
//! ```

use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use linkdial_core::error::{Error, Result};
use linkdial_core::transport::Transport;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Used by [`TcpTransport::connect`]. Telnet callers pass their own.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A connected TCP peer. `stream` is `None` once closed or handed off.
#[derive(Debug)]
pub struct TcpTransport {
    peer: String,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub async fn connect(addr: &str) -> Result<Self> {
        Self::connect_with_timeout(addr, CONNECT_TIMEOUT).await
    }

    /// Connect to `host:port`, failing with [`Error::Timeout`] after `timeout`.
    pub async fn connect_with_timeout(addr: &str, timeout: Duration) -> Result<Self> {
        tracing::debug!(peer = %addr, ?timeout, "tcp connect");

        let stream = match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
            Err(_) => {
                tracing::warn!(peer = %addr, "tcp connect timed out");
                return Err(Error::Timeout);
            }
            Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => {
                tracing::warn!(peer = %addr, "tcp connect refused");
                return Err(Error::Transport(format!("connection refused: {addr}")));
            }
            Ok(Err(e)) => {
                tracing::warn!(peer = %addr, error = %e, "tcp connect failed");
                return Err(Error::Io(e));
            }
            Ok(Ok(stream)) => stream,
        };

        // rigctld commands are one short line each.
        stream
            .set_nodelay(true)
            .unwrap_or_else(|e| tracing::debug!(peer = %addr, error = %e, "TCP_NODELAY not set"));

        tracing::info!(peer = %addr, "tcp connected");
        Ok(TcpTransport {
            peer: addr.to_owned(),
            stream: Some(stream),
        })
    }

    /// The `host:port` this transport was opened against.
    pub fn addr(&self) -> &str {
        &self.peer
    }

    /// Hand the socket over to a session exchange.
    pub fn into_stream(mut self) -> Result<TcpStream> {
        self.stream.take().ok_or(Error::NotConnected)
    }

    fn open_stream(&mut self) -> Result<&mut TcpStream> {
        self.stream.as_mut().ok_or(Error::NotConnected)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.open_stream()?;
        stream.write_all(data).await.map_err(lost_or_io)?;
        stream.flush().await.map_err(lost_or_io)?;
        tracing::trace!(peer = %self.peer, len = data.len(), "tcp tx");
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let stream = self.open_stream()?;
        let n = tokio::time::timeout(timeout, stream.read(buf))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(lost_or_io)?;
        if n == 0 {
            tracing::debug!(peer = %self.peer, "tcp peer hung up");
            return Err(Error::ConnectionLost);
        }
        tracing::trace!(peer = %self.peer, len = n, "tcp rx");
        Ok(n)
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        if let Err(e) = stream.shutdown().await {
            tracing::debug!(peer = %self.peer, error = %e, "tcp shutdown failed");
        }
        tracing::debug!(peer = %self.peer, "tcp closed");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

/// Resets and broken pipes mean the peer is gone; anything else is plain I/O.
fn lost_or_io(e: std::io::Error) -> Error {
    match e.kind() {
        ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::BrokenPipe
        | ErrorKind::NotConnected => Error::ConnectionLost,
        _ => Error::Io(e),
    }
}
