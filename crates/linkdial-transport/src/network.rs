//! A [`ModemFactory`] for schemes with a built-in network dialer.
//!
//! Only `telnet` needs no external modem software. Every other scheme is
//! reported as unavailable so the registry surfaces an initialization
//! error; applications with ARDOP, VARA, or PACTOR drivers provide their own
//! factory and may delegate to this one for `telnet`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use linkdial_core::error::{Error, Result};
use linkdial_core::modem::{Modem, ModemFactory, ModemSettings};
use linkdial_core::types::Scheme;

use crate::telnet::TelnetDialer;

/// Factory for the network-only transports.
#[derive(Debug, Clone)]
pub struct NetworkModems {
    telnet_timeout: Duration,
}

impl NetworkModems {
    /// Create a factory whose telnet dials time out after `telnet_timeout`.
    pub fn new(telnet_timeout: Duration) -> Self {
        NetworkModems { telnet_timeout }
    }
}

impl Default for NetworkModems {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl ModemFactory for NetworkModems {
    async fn open(&self, scheme: Scheme, _settings: &ModemSettings) -> Result<Arc<dyn Modem>> {
        match scheme {
            Scheme::Telnet => Ok(Arc::new(TelnetDialer::with_timeout(self.telnet_timeout))),
            other => Err(Error::Unsupported(format!("no {other} driver available"))),
        }
    }
}
