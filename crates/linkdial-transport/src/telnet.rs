//! Dialer for the `telnet` scheme.
//!
//! [`TelnetDialer`] has no modem to manage: each dial opens a fresh TCP
//! connection to the descriptor's host (or, in the shorthand form, its
//! target) and hands the socket to the session exchange, which handles the
//! gateway's login prompts.

use std::time::Duration;

use async_trait::async_trait;
use linkdial_core::descriptor::ConnectionDescriptor;
use linkdial_core::error::{Error, Result};
use linkdial_core::modem::{BusyChannel, Connection, Modem};
use linkdial_core::types::Scheme;

use crate::tcp::TcpTransport;

/// Port used when a telnet descriptor names a host without one.
pub const DEFAULT_TELNET_PORT: u16 = 8772;

/// Stateless dialer for plain TCP sessions.
#[derive(Debug, Clone)]
pub struct TelnetDialer {
    connect_timeout: Duration,
}

impl TelnetDialer {
    /// Create a dialer with a 30 second connect timeout.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a dialer with a custom connect timeout.
    pub fn with_timeout(connect_timeout: Duration) -> Self {
        TelnetDialer { connect_timeout }
    }
}

impl Default for TelnetDialer {
    fn default() -> Self {
        Self::new()
    }
}

/// The `host:port` a telnet descriptor dials.
pub fn dial_address(descriptor: &ConnectionDescriptor) -> String {
    let addr = if descriptor.host().is_empty() {
        descriptor.target()
    } else {
        descriptor.host()
    };
    let has_port = addr
        .rsplit_once(':')
        .is_some_and(|(_, port)| port.parse::<u16>().is_ok());
    if has_port {
        addr.to_string()
    } else {
        format!("{addr}:{DEFAULT_TELNET_PORT}")
    }
}

impl BusyChannel for TelnetDialer {}

#[async_trait]
impl Modem for TelnetDialer {
    fn scheme(&self) -> Scheme {
        Scheme::Telnet
    }

    async fn dial(&self, descriptor: &ConnectionDescriptor) -> Result<Connection> {
        let addr = dial_address(descriptor);
        let transport = TcpTransport::connect_with_timeout(&addr, self.connect_timeout)
            .await
            .map_err(|e| Error::Dial(format!("{addr}: {e}")))?;
        let stream = transport.into_stream()?;
        Ok(Connection {
            stream: Box::new(stream),
            remote: addr,
        })
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
