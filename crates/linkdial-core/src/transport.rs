//! Transport trait for line-oriented control channels.
//!
//! The [`Transport`] trait abstracts over the byte channel to a control
//! endpoint: a hamlib `rigctld` daemon, a modem's command port. Protocol
//! clients (e.g. `RigctldRig` in `linkdial-transport`) operate on a
//! `Transport` rather than directly on a socket, enabling deterministic unit
//! testing with `MockTransport` from `linkdial-test-harness`.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to a control endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes, returning once they are written and flushed.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes into `buf`, waiting up to `timeout`.
    ///
    /// Returns the number of bytes read, or
    /// [`Error::Timeout`](crate::error::Error::Timeout) if nothing arrived.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport. Later `send`/`receive` calls return
    /// [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
