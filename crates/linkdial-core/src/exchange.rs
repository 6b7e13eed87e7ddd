//! The `Exchange` trait -- what runs once a byte stream exists.
//!
//! The session-exchange protocol (B2F, a terminal, a file transfer) is the
//! application's concern. The orchestrator hands it the stream and the
//! target and adopts its success or failure as the connect result.

use async_trait::async_trait;

use crate::error::Result;
use crate::modem::Connection;

/// Session exchange over an established connection.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Run the exchange with `target` over `conn`, consuming it.
    async fn exchange(&self, conn: Connection, target: &str) -> Result<()>;
}
